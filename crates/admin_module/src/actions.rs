use std::collections::BTreeMap;

use shared::{
    domain::{FlashMessage, FlashSeverity, HashMode},
    error::{ApiException, ErrorCode},
    protocol::{DebugView, ModuleView, PasswordAction, PasswordView},
};

use crate::{
    flash::FlashMessageQueue,
    hashing::{HashError, PasswordHashFactory},
    logging::{LogLevel, ModuleLogger},
    params::RequestParams,
};

/// Form namespace of the module's own commands.
pub const COMMAND_NAMESPACE: &str = "tx_examples_admin_examples";
pub const DEBUG_COOKIES_COMMAND: &str = "cookies";

pub const DEMO_PASSWORD: &str = "joh316";
pub const DEMO_MODE: HashMode = HashMode::Frontend;
pub const DEMO_ACTION: PasswordAction = PasswordAction::Get;

const LOG_COMPONENT: &str = concat!(env!("CARGO_PKG_NAME"), "::actions::log_action");

pub async fn log_action(
    logger: &dyn ModuleLogger,
    flash: &mut FlashMessageQueue<'_>,
) -> Result<ModuleView, ApiException> {
    logger.log(LogLevel::Info, "Everything went fine.", &[]);
    logger.log(
        LogLevel::Warning,
        "Something went awry, check your configuration!",
        &[],
    );
    logger.log(
        LogLevel::Error,
        "This was not a good idea",
        &[("foo", "bar"), ("bar", LOG_COMPONENT)],
    );
    logger.log(LogLevel::Critical, "This is an utter failure!", &[]);

    flash
        .add_message(FlashMessage::new(
            "3 log entries created",
            "",
            FlashSeverity::Info,
            true,
        ))
        .await?;
    Ok(ModuleView::Log)
}

pub fn debug_action(
    logger: &dyn ModuleLogger,
    body: &RequestParams,
    cookies: &BTreeMap<String, String>,
) -> ModuleView {
    let command = body
        .nested(COMMAND_NAMESPACE, "cmd")
        .unwrap_or_default()
        .to_string();
    if command == DEBUG_COOKIES_COMMAND {
        debug_cookies(logger, cookies);
    }

    ModuleView::Debug(DebugView {
        cookies: cookies.clone(),
        last_command: command,
    })
}

fn debug_cookies(logger: &dyn ModuleLogger, cookies: &BTreeMap<String, String>) {
    let value = serde_json::Value::Object(
        cookies
            .iter()
            .map(|(name, value)| (name.clone(), serde_json::Value::String(value.clone())))
            .collect(),
    );
    logger.debug_dump("cookie", &value);
}

pub async fn get_password_hash(
    factory: &PasswordHashFactory,
    password: &str,
    mode: HashMode,
) -> Result<String, ApiException> {
    let instance = factory.default_hash_instance(mode).map_err(hashing_error)?;
    let password = password.to_string();
    tokio::task::spawn_blocking(move || instance.hashed_password(&password))
        .await
        .map_err(|e| ApiException::new(ErrorCode::Internal, format!("hashing task failed: {e}")))?
        .map_err(hashing_error)
}

pub async fn check_password(
    factory: &PasswordHashFactory,
    hashed_password: &str,
    expected_password: &str,
    mode: HashMode,
) -> Result<bool, ApiException> {
    let instance = factory.default_hash_instance(mode).map_err(hashing_error)?;
    let hashed_password = hashed_password.to_string();
    let expected_password = expected_password.to_string();
    tokio::task::spawn_blocking(move || instance.check_password(&expected_password, &hashed_password))
        .await
        .map_err(|e| ApiException::new(ErrorCode::Internal, format!("hashing task failed: {e}")))
}

#[derive(Debug, Clone)]
pub struct PasswordDemo {
    pub action: PasswordAction,
    pub password: String,
    pub hashed_password: String,
    pub mode: HashMode,
}

impl Default for PasswordDemo {
    fn default() -> Self {
        Self {
            action: DEMO_ACTION,
            password: DEMO_PASSWORD.to_string(),
            hashed_password: String::new(),
            mode: DEMO_MODE,
        }
    }
}

pub async fn run_password_demo(
    factory: &PasswordHashFactory,
    demo: PasswordDemo,
) -> Result<PasswordView, ApiException> {
    let PasswordDemo {
        action,
        password,
        mut hashed_password,
        mode,
    } = demo;

    let success = match action {
        PasswordAction::Check => check_password(factory, &hashed_password, &password, mode).await?,
        PasswordAction::Get => {
            hashed_password = get_password_hash(factory, &password, mode).await?;
            true
        }
    };

    Ok(PasswordView {
        modes: HashMode::ALL.to_vec(),
        mode,
        hashed_password,
        password,
        success,
        password_action: action,
    })
}

pub async fn password_action(factory: &PasswordHashFactory) -> Result<ModuleView, ApiException> {
    let view = run_password_demo(factory, PasswordDemo::default()).await?;
    Ok(ModuleView::Password(view))
}

fn hashing_error(err: HashError) -> ApiException {
    ApiException::new(ErrorCode::Hashing, err.to_string())
}

#[cfg(test)]
#[path = "tests/actions_tests.rs"]
mod tests;
