pub mod actions;
pub mod flash;
pub mod hashing;
pub mod logging;
pub mod menu;
pub mod params;

use std::{collections::BTreeMap, sync::Arc};

use shared::{
    domain::{ModuleFunction, ModuleSettings, SessionId, MODULE_IDENTIFIER},
    error::ApiException,
    protocol::ModulePage,
};
use storage::Storage;
use tracing::{debug, warn};

use crate::{
    flash::FlashMessageQueue,
    hashing::PasswordHashFactory,
    logging::ModuleLogger,
    menu::{build_doc_header, resolve_settings, LabelCatalog, MODULE_TITLE_KEY},
    params::RequestParams,
};

pub const DEFAULT_ROUTE_PATH: &str = "/admin/examples";

#[derive(Clone)]
pub struct ModuleContext {
    pub storage: Storage,
    pub hashing: PasswordHashFactory,
    pub labels: LabelCatalog,
    pub logger: Arc<dyn ModuleLogger>,
    pub route_path: String,
}

#[derive(Debug, Clone)]
pub struct ModuleRequest {
    pub session_id: SessionId,
    pub body: RequestParams,
    pub query: RequestParams,
    pub cookies: BTreeMap<String, String>,
}

/// Resolves and persists the module settings for this request.
pub async fn menu_config(
    ctx: &ModuleContext,
    request: &ModuleRequest,
) -> Result<ModuleSettings, ApiException> {
    let raw: Option<serde_json::Value> = ctx
        .storage
        .load_module_data(&request.session_id, MODULE_IDENTIFIER)
        .await
        .map_err(ApiException::storage)?;
    let stored = raw.and_then(|value| match serde_json::from_value::<ModuleSettings>(value) {
        Ok(settings) => Some(settings),
        Err(error) => {
            warn!(session = %request.session_id, %error, "discarding unreadable module settings");
            None
        }
    });
    let settings = resolve_settings(&request.body, &request.query, stored.as_ref());

    if stored.as_ref() != Some(&settings) {
        debug!(
            session = %request.session_id,
            function = settings.function.as_deref().unwrap_or_default(),
            "persisting module settings"
        );
        ctx.storage
            .store_module_data(&request.session_id, MODULE_IDENTIFIER, &settings)
            .await
            .map_err(ApiException::storage)?;
    } else {
        ctx.storage
            .touch_session(&request.session_id)
            .await
            .map_err(ApiException::storage)?;
    }
    Ok(settings)
}

pub async fn handle_request(
    ctx: &ModuleContext,
    request: &ModuleRequest,
) -> Result<ModulePage, ApiException> {
    let settings = menu_config(ctx, request).await?;
    let function = settings.active_function();
    let doc_header = build_doc_header(&ctx.labels, &ctx.route_path, function);

    let mut flash = FlashMessageQueue::new(&ctx.storage, &request.session_id);
    let view = match function {
        ModuleFunction::Debug => {
            actions::debug_action(ctx.logger.as_ref(), &request.body, &request.cookies)
        }
        ModuleFunction::Password => actions::password_action(&ctx.hashing).await?,
        ModuleFunction::Log => actions::log_action(ctx.logger.as_ref(), &mut flash).await?,
    };
    let flash_messages = flash.render_all().await?;

    Ok(ModulePage {
        title: ctx.labels.get(MODULE_TITLE_KEY),
        subtitle: ctx.labels.function_label(function),
        doc_header,
        view,
        flash_messages,
    })
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
