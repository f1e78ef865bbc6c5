use std::{collections::BTreeMap, net::SocketAddr, sync::Arc};

use admin_module::{
    handle_request, logging::TracingLogger, menu::LabelCatalog, params::RequestParams,
    ModuleContext, ModuleRequest, DEFAULT_ROUTE_PATH,
};
use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use shared::{
    domain::SessionId,
    error::{ApiError, ApiException, ErrorCode},
};
use storage::Storage;
use tower_http::limit::RequestBodyLimitLayer;
use tracing::{error, info};
use url::form_urlencoded;

mod app_state;
mod config;
mod templates;

use app_state::AppState;
use config::{load_settings, prepare_database_url};

const MAX_BODY_BYTES: usize = 64 * 1024;
const MAX_SESSION_ID_LEN: usize = 64;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()))
        .init();

    let settings = load_settings();
    let database_url = prepare_database_url(&settings.database_url)?;
    let storage = Storage::new(&database_url).await.map_err(|error| {
        error!(
            %database_url,
            %error,
            "failed to open SQLite database; verify parent directory exists and permissions are correct"
        );
        error
    })?;

    let hashing = settings.hash_factory().map_err(|error| {
        error!(%error, "invalid password hashing settings");
        error
    })?;
    let module = ModuleContext {
        storage,
        hashing,
        labels: LabelCatalog::with_overrides(settings.labels.clone()),
        logger: Arc::new(TracingLogger),
        route_path: DEFAULT_ROUTE_PATH.to_string(),
    };
    let state = AppState {
        module,
        session_cookie: settings.session_cookie.clone(),
    };
    let app = build_router(Arc::new(state));

    let addr: SocketAddr = settings.server_bind.parse()?;
    info!(%addr, route = DEFAULT_ROUTE_PATH, "admin module listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: Arc<AppState>) -> Router {
    let route_path = state.module.route_path.clone();
    Router::new()
        .route("/healthz", get(healthz))
        .route(&route_path, get(module_get).post(module_post))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .with_state(state)
}

async fn healthz(State(state): State<Arc<AppState>>) -> Response {
    match state.module.storage.health_check().await {
        Ok(()) => "ok".into_response(),
        Err(error) => {
            error!(%error, "health check failed");
            (StatusCode::SERVICE_UNAVAILABLE, "storage unavailable").into_response()
        }
    }
}

async fn module_get(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    headers: HeaderMap,
    Query(query): Query<Vec<(String, String)>>,
) -> Response {
    serve_module(
        &state,
        jar,
        &headers,
        RequestParams::default(),
        RequestParams::from_pairs(query),
    )
    .await
}

async fn module_post(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    headers: HeaderMap,
    Query(query): Query<Vec<(String, String)>>,
    body: Bytes,
) -> Response {
    let body = match parse_body(&headers, &body) {
        Ok(params) => params,
        Err(rejection) => return rejection.into_response(),
    };
    serve_module(&state, jar, &headers, body, RequestParams::from_pairs(query)).await
}

async fn serve_module(
    state: &AppState,
    jar: CookieJar,
    headers: &HeaderMap,
    body: RequestParams,
    query: RequestParams,
) -> Response {
    let cookies: BTreeMap<String, String> = jar
        .iter()
        .map(|cookie| (cookie.name().to_string(), cookie.value().to_string()))
        .collect();
    let (session_id, jar) = resolve_session(jar, &state.session_cookie);

    let request = ModuleRequest {
        session_id,
        body,
        query,
        cookies,
    };
    let page = match handle_request(&state.module, &request).await {
        Ok(page) => page,
        Err(err) => {
            error!(session = %request.session_id, error = %err, "admin module request failed");
            return (jar, api_error(err)).into_response();
        }
    };

    if wants_json(headers) {
        return (jar, Json(page)).into_response();
    }

    match templates::render_page(&page, &state.module.route_path) {
        Ok(html) => (jar, Html(html)).into_response(),
        Err(err) => {
            error!(error = %err, "failed to render admin module template");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                jar,
                Json(ApiError::internal(format!("template error: {err}"))),
            )
                .into_response()
        }
    }
}

fn parse_body(
    headers: &HeaderMap,
    body: &Bytes,
) -> Result<RequestParams, (StatusCode, Json<ApiError>)> {
    if body.is_empty() {
        return Ok(RequestParams::default());
    }

    let is_json = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/json"));
    if is_json {
        let value: serde_json::Value = serde_json::from_slice(body).map_err(|e| {
            (
                StatusCode::BAD_REQUEST,
                Json(ApiError::new(
                    ErrorCode::Validation,
                    format!("invalid JSON body: {e}"),
                )),
            )
        })?;
        return Ok(RequestParams::from_json(&value));
    }

    Ok(RequestParams::from_pairs(
        form_urlencoded::parse(body).into_owned(),
    ))
}

fn resolve_session(jar: CookieJar, cookie_name: &str) -> (SessionId, CookieJar) {
    let existing = jar
        .get(cookie_name)
        .map(|cookie| cookie.value().to_string())
        .filter(|value| is_valid_session_id(value));
    if let Some(value) = existing {
        return (SessionId(value), jar);
    }

    let session_id = SessionId::generate();
    let cookie = Cookie::build((cookie_name.to_string(), session_id.0.clone()))
        .path("/admin")
        .http_only(true)
        .same_site(SameSite::Strict);
    (session_id, jar.add(cookie))
}

fn is_valid_session_id(value: &str) -> bool {
    !value.is_empty()
        && value.len() <= MAX_SESSION_ID_LEN
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

fn wants_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains("application/json"))
}

fn api_error(err: ApiException) -> (StatusCode, Json<ApiError>) {
    let status = match err.code {
        ErrorCode::Validation => StatusCode::BAD_REQUEST,
        ErrorCode::Hashing | ErrorCode::Storage | ErrorCode::Internal => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, Json(ApiError::from(err)))
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
