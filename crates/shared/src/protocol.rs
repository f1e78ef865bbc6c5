use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::{FlashMessage, HashMode, ModuleFunction};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MenuItem {
    pub function: ModuleFunction,
    pub title: String,
    pub href: String,
    pub active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ShortcutButton {
    pub route_identifier: String,
    pub display_name: String,
    /// Value of `SET[function]` restored when the shortcut is followed.
    pub set_function: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocHeader {
    pub menu_identifier: String,
    pub menu: Vec<MenuItem>,
    pub shortcut: ShortcutButton,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PasswordAction {
    Get,
    Check,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebugView {
    pub cookies: BTreeMap<String, String>,
    pub last_command: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PasswordView {
    pub modes: Vec<HashMode>,
    pub mode: HashMode,
    pub hashed_password: String,
    pub password: String,
    pub success: bool,
    pub password_action: PasswordAction,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "view", content = "data", rename_all = "snake_case")]
pub enum ModuleView {
    Log,
    Debug(DebugView),
    Password(PasswordView),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModulePage {
    pub title: String,
    pub subtitle: String,
    pub doc_header: DocHeader,
    pub view: ModuleView,
    pub flash_messages: Vec<FlashMessage>,
}
