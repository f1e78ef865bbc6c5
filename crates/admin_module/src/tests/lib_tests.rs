use super::*;
use crate::{
    hashing::{HashAlgorithm, HashSettings},
    logging::RecordingLogger,
};
use shared::{domain::FlashSeverity, protocol::ModuleView};

async fn setup() -> (ModuleContext, Arc<RecordingLogger>) {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let settings = HashSettings {
        algorithm: HashAlgorithm::Argon2id,
        memory_kib: 1024,
        iterations: 2,
        parallelism: 1,
    };
    let logger = Arc::new(RecordingLogger::default());
    let ctx = ModuleContext {
        storage,
        hashing: PasswordHashFactory::new(settings, settings),
        labels: LabelCatalog::default(),
        logger: logger.clone(),
        route_path: DEFAULT_ROUTE_PATH.to_string(),
    };
    (ctx, logger)
}

fn request(session: &str, body: RequestParams, query: RequestParams) -> ModuleRequest {
    ModuleRequest {
        session_id: SessionId(session.to_string()),
        body,
        query,
        cookies: BTreeMap::from([("examples_session".to_string(), session.to_string())]),
    }
}

#[tokio::test]
async fn first_visit_renders_log_view_and_persists_default() {
    let (ctx, logger) = setup().await;
    let req = request("s1", RequestParams::default(), RequestParams::default());

    let page = handle_request(&ctx, &req).await.expect("page");
    assert!(matches!(page.view, ModuleView::Log));
    assert_eq!(page.title, "Examples");
    assert_eq!(page.subtitle, "Log");
    assert_eq!(page.flash_messages.len(), 1);
    assert_eq!(page.flash_messages[0].severity, FlashSeverity::Info);
    assert_eq!(logger.records().len(), 4);

    let stored: Option<ModuleSettings> = ctx
        .storage
        .load_module_data(&req.session_id, MODULE_IDENTIFIER)
        .await
        .expect("load");
    assert_eq!(stored, Some(ModuleSettings::for_function(ModuleFunction::Log)));
}

#[tokio::test]
async fn body_selection_is_remembered_for_the_session() {
    let (ctx, _logger) = setup().await;
    let body = RequestParams::from_json(&serde_json::json!({ "SET": { "function": "debug" } }));

    let page = handle_request(&ctx, &request("s2", body, RequestParams::default()))
        .await
        .expect("page");
    assert!(matches!(page.view, ModuleView::Debug(_)));

    let follow_up = handle_request(
        &ctx,
        &request("s2", RequestParams::default(), RequestParams::default()),
    )
    .await
    .expect("page");
    let ModuleView::Debug(debug) = follow_up.view else {
        panic!("expected debug view");
    };
    assert_eq!(debug.cookies.get("examples_session").map(String::as_str), Some("s2"));

    let other_session = handle_request(
        &ctx,
        &request("s3", RequestParams::default(), RequestParams::default()),
    )
    .await
    .expect("page");
    assert!(matches!(other_session.view, ModuleView::Log));
}

#[tokio::test]
async fn unknown_selection_falls_back_to_log() {
    let (ctx, _logger) = setup().await;
    let query = RequestParams::from_pairs([("SET[function]", "shell")]);
    let page = handle_request(&ctx, &request("s4", RequestParams::default(), query))
        .await
        .expect("page");
    assert!(matches!(page.view, ModuleView::Log));
    assert_eq!(page.doc_header.shortcut.set_function, "log");
}

#[tokio::test]
async fn password_view_is_dispatched_from_query() {
    let (ctx, logger) = setup().await;
    let query = RequestParams::from_pairs([("id", "0"), ("SET[function]", "password")]);
    let page = handle_request(&ctx, &request("s5", RequestParams::default(), query))
        .await
        .expect("page");

    let ModuleView::Password(view) = page.view else {
        panic!("expected password view");
    };
    assert!(view.success);
    assert!(view.hashed_password.starts_with("$argon2id$"));
    assert!(page.flash_messages.is_empty());
    assert!(logger.records().is_empty());

    let active: Vec<_> = page
        .doc_header
        .menu
        .iter()
        .filter(|item| item.active)
        .map(|item| item.function)
        .collect();
    assert_eq!(active, vec![ModuleFunction::Password]);
}

#[tokio::test]
async fn flash_message_is_shown_once() {
    let (ctx, _logger) = setup().await;
    let log_page = handle_request(
        &ctx,
        &request("s6", RequestParams::default(), RequestParams::default()),
    )
    .await
    .expect("page");
    assert_eq!(log_page.flash_messages.len(), 1);

    let query = RequestParams::from_pairs([("SET[function]", "debug")]);
    let debug_page = handle_request(&ctx, &request("s6", RequestParams::default(), query))
        .await
        .expect("page");
    assert!(debug_page.flash_messages.is_empty());
}

#[tokio::test]
async fn unreadable_stored_settings_fall_back_to_log() {
    let (ctx, _logger) = setup().await;
    let session = SessionId("legacy".to_string());
    ctx.storage
        .store_module_data(&session, MODULE_IDENTIFIER, &serde_json::json!({ "function": 0 }))
        .await
        .expect("store");

    let page = handle_request(
        &ctx,
        &request("legacy", RequestParams::default(), RequestParams::default()),
    )
    .await
    .expect("page");
    assert!(matches!(page.view, ModuleView::Log));

    ctx.storage
        .store_module_data(&session, MODULE_IDENTIFIER, &serde_json::json!({ "function": 0 }))
        .await
        .expect("store");
    let query = RequestParams::from_pairs([("SET[function]", "debug")]);
    let page = handle_request(&ctx, &request("legacy", RequestParams::default(), query))
        .await
        .expect("page");
    assert!(matches!(page.view, ModuleView::Debug(_)));

    let stored: Option<ModuleSettings> = ctx
        .storage
        .load_module_data(&session, MODULE_IDENTIFIER)
        .await
        .expect("load");
    assert_eq!(stored, Some(ModuleSettings::for_function(ModuleFunction::Debug)));
}
