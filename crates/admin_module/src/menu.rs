use std::collections::HashMap;

use shared::{
    domain::{ModuleFunction, ModuleSettings, MODULE_IDENTIFIER},
    protocol::{DocHeader, MenuItem, ShortcutButton},
};
use url::form_urlencoded;

use crate::params::RequestParams;

pub const SET_GROUP: &str = "SET";
pub const FUNCTION_KEY: &str = "function";
pub const MODULE_TITLE_KEY: &str = "mlang_tabs_tab";
pub const JUMP_MENU_IDENTIFIER: &str = "AdminExampleJumpMenu";

#[derive(Debug, Clone)]
pub struct LabelCatalog {
    labels: HashMap<String, String>,
}

impl Default for LabelCatalog {
    fn default() -> Self {
        let labels = [
            (MODULE_TITLE_KEY, "Examples"),
            ("module.menu.log", "Log"),
            ("module.menu.debug", "Debug cookies"),
            ("module.menu.password", "Password hashing"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        Self { labels }
    }
}

impl LabelCatalog {
    pub fn with_overrides(overrides: impl IntoIterator<Item = (String, String)>) -> Self {
        let mut catalog = Self::default();
        catalog.labels.extend(overrides);
        catalog
    }

    pub fn get(&self, key: &str) -> String {
        self.labels
            .get(key)
            .cloned()
            .unwrap_or_else(|| key.to_string())
    }

    pub fn function_label(&self, function: ModuleFunction) -> String {
        self.get(function.label_key())
    }
}

pub fn module_menu(labels: &LabelCatalog) -> Vec<(ModuleFunction, String)> {
    ModuleFunction::ALL
        .into_iter()
        .map(|function| (function, labels.function_label(function)))
        .collect()
}

/// Merges submitted `SET` parameters with the stored session settings.
///
/// A body `SET` group shadows the query string entirely. A submitted key that
/// names no menu entry resolves to the log entry, as does a missing or unknown
/// stored key.
pub fn resolve_settings(
    body: &RequestParams,
    query: &RequestParams,
    stored: Option<&ModuleSettings>,
) -> ModuleSettings {
    let submitted = if body.has_group(SET_GROUP) {
        body.nested(SET_GROUP, FUNCTION_KEY)
    } else {
        query.nested(SET_GROUP, FUNCTION_KEY)
    };

    let function = match submitted {
        Some(raw) => ModuleFunction::from_key(raw).unwrap_or_default(),
        None => stored.map(ModuleSettings::active_function).unwrap_or_default(),
    };
    ModuleSettings::for_function(function)
}

pub fn module_href(route_path: &str, function: ModuleFunction) -> String {
    let query = form_urlencoded::Serializer::new(String::new())
        .append_pair("id", "0")
        .append_pair("SET[function]", function.key())
        .finish();
    format!("{route_path}?{query}")
}

pub fn build_doc_header(
    labels: &LabelCatalog,
    route_path: &str,
    active: ModuleFunction,
) -> DocHeader {
    let menu = module_menu(labels)
        .into_iter()
        .map(|(function, title)| MenuItem {
            function,
            title,
            href: module_href(route_path, function),
            active: function == active,
        })
        .collect();

    DocHeader {
        menu_identifier: JUMP_MENU_IDENTIFIER.to_string(),
        menu,
        shortcut: ShortcutButton {
            route_identifier: MODULE_IDENTIFIER.to_string(),
            display_name: labels.function_label(active),
            set_function: active.key().to_string(),
        },
    }
}

#[cfg(test)]
#[path = "tests/menu_tests.rs"]
mod tests;
