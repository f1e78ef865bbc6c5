use super::*;
use crate::{
    hashing::{HashAlgorithm, HashSettings},
    logging::RecordingLogger,
};
use shared::domain::SessionId;
use storage::Storage;

fn light_factory() -> PasswordHashFactory {
    let settings = HashSettings {
        algorithm: HashAlgorithm::Argon2i,
        memory_kib: 1024,
        iterations: 2,
        parallelism: 1,
    };
    PasswordHashFactory::new(settings, settings)
}

fn cookies() -> BTreeMap<String, String> {
    BTreeMap::from([
        ("be_typo_user".to_string(), "abc123".to_string()),
        ("examples_session".to_string(), "s1".to_string()),
    ])
}

#[tokio::test]
async fn log_action_logs_four_records_in_severity_order() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let session = SessionId("log-session".into());
    let logger = RecordingLogger::default();
    let mut flash = FlashMessageQueue::new(&storage, &session);

    let view = log_action(&logger, &mut flash).await.expect("log action");
    assert!(matches!(view, ModuleView::Log));

    let records = logger.records();
    let levels: Vec<_> = records.iter().map(|r| r.level).collect();
    assert_eq!(
        levels,
        vec![
            LogLevel::Info,
            LogLevel::Warning,
            LogLevel::Error,
            LogLevel::Critical
        ]
    );
    let messages: Vec<_> = records.iter().map(|r| r.message.as_str()).collect();
    assert_eq!(
        messages,
        vec![
            "Everything went fine.",
            "Something went awry, check your configuration!",
            "This was not a good idea",
            "This is an utter failure!",
        ]
    );
    assert_eq!(
        records[2].context,
        vec![
            ("foo".to_string(), "bar".to_string()),
            ("bar".to_string(), LOG_COMPONENT.to_string()),
        ]
    );
    assert!(LOG_COMPONENT.starts_with("admin_module"));
    assert!(records[0].context.is_empty());
    assert!(records[1].context.is_empty());
    assert!(records[3].context.is_empty());
    assert!(logger.dumps().is_empty());
}

#[tokio::test]
async fn log_action_enqueues_exactly_one_flash_message() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let session = SessionId("flash-session".into());
    let logger = RecordingLogger::default();
    let mut flash = FlashMessageQueue::new(&storage, &session);

    log_action(&logger, &mut flash).await.expect("log action");
    let messages = flash.render_all().await.expect("render");

    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].message, "3 log entries created");
    assert_eq!(messages[0].title, "");
    assert_eq!(messages[0].severity, FlashSeverity::Info);
}

#[test]
fn debug_action_passes_cookies_through_without_command() {
    let logger = RecordingLogger::default();
    let view = debug_action(&logger, &RequestParams::default(), &cookies());

    let ModuleView::Debug(debug) = view else {
        panic!("expected debug view");
    };
    assert_eq!(debug.cookies, cookies());
    assert_eq!(debug.last_command, "");
    assert!(logger.dumps().is_empty());
}

#[test]
fn debug_action_dumps_cookies_on_trigger() {
    let logger = RecordingLogger::default();
    let body = RequestParams::from_pairs([("tx_examples_admin_examples[cmd]", "cookies")]);
    let view = debug_action(&logger, &body, &cookies());

    let ModuleView::Debug(debug) = view else {
        panic!("expected debug view");
    };
    assert_eq!(debug.cookies, cookies());
    assert_eq!(debug.last_command, "cookies");

    let dumps = logger.dumps();
    assert_eq!(dumps.len(), 1);
    assert_eq!(dumps[0].0, "cookie");
    assert_eq!(dumps[0].1["be_typo_user"], "abc123");
}

#[test]
fn debug_action_ignores_other_commands() {
    let logger = RecordingLogger::default();
    let body = RequestParams::from_pairs([("tx_examples_admin_examples[cmd]", "Cookies")]);
    let view = debug_action(&logger, &body, &BTreeMap::new());

    let ModuleView::Debug(debug) = view else {
        panic!("expected debug view");
    };
    assert!(debug.cookies.is_empty());
    assert_eq!(debug.last_command, "Cookies");
    assert!(logger.dumps().is_empty());
}

#[tokio::test]
async fn password_action_reports_success_with_verifiable_hash() {
    let factory = light_factory();
    let view = password_action(&factory).await.expect("password action");

    let ModuleView::Password(view) = view else {
        panic!("expected password view");
    };
    assert!(view.success);
    assert!(!view.hashed_password.is_empty());
    assert_eq!(view.password, "joh316");
    assert_eq!(view.mode, HashMode::Frontend);
    assert_eq!(view.modes, vec![HashMode::Frontend, HashMode::Backend]);
    assert_eq!(view.password_action, PasswordAction::Get);
    assert!(check_password(&factory, &view.hashed_password, "joh316", HashMode::Frontend)
        .await
        .expect("check"));
}

#[tokio::test]
async fn check_branch_verifies_supplied_hash() {
    let factory = light_factory();
    let hashed = get_password_hash(&factory, "joh316", HashMode::Backend)
        .await
        .expect("hash");

    let matching = run_password_demo(
        &factory,
        PasswordDemo {
            action: PasswordAction::Check,
            hashed_password: hashed.clone(),
            mode: HashMode::Backend,
            ..PasswordDemo::default()
        },
    )
    .await
    .expect("check");
    assert!(matching.success);
    assert_eq!(matching.hashed_password, hashed);

    let wrong = run_password_demo(
        &factory,
        PasswordDemo {
            action: PasswordAction::Check,
            password: "wrong".into(),
            hashed_password: hashed,
            mode: HashMode::Backend,
        },
    )
    .await
    .expect("check");
    assert!(!wrong.success);
}

#[tokio::test]
async fn invalid_hash_settings_surface_as_hashing_error() {
    let broken = HashSettings {
        memory_kib: 1,
        ..HashSettings::default()
    };
    let factory = PasswordHashFactory::new(broken, broken);
    let err = get_password_hash(&factory, "joh316", HashMode::Frontend)
        .await
        .expect_err("invalid params");
    assert!(matches!(err.code, ErrorCode::Hashing));
}
