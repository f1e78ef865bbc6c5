use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::{ApiException, ErrorCode};

/// Identifier under which the module stores its settings in a session.
pub const MODULE_IDENTIFIER: &str = "admin_examples";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleFunction {
    #[default]
    Log,
    Debug,
    Password,
}

impl ModuleFunction {
    pub const ALL: [ModuleFunction; 3] = [
        ModuleFunction::Log,
        ModuleFunction::Debug,
        ModuleFunction::Password,
    ];

    /// Parses a submitted menu key. `0` and the empty string name the log entry.
    pub fn from_key(key: &str) -> Option<Self> {
        match key.trim() {
            "" | "0" | "log" => Some(Self::Log),
            "debug" => Some(Self::Debug),
            "password" => Some(Self::Password),
            _ => None,
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Self::Log => "log",
            Self::Debug => "debug",
            Self::Password => "password",
        }
    }

    pub fn label_key(self) -> &'static str {
        match self {
            Self::Log => "module.menu.log",
            Self::Debug => "module.menu.debug",
            Self::Password => "module.menu.password",
        }
    }
}

impl fmt::Display for ModuleFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// `function` holds the raw stored key; unknown keys resolve to the log entry.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ModuleSettings {
    #[serde(default)]
    pub function: Option<String>,
}

impl ModuleSettings {
    pub fn for_function(function: ModuleFunction) -> Self {
        Self {
            function: Some(function.key().to_string()),
        }
    }

    pub fn active_function(&self) -> ModuleFunction {
        self.function
            .as_deref()
            .and_then(ModuleFunction::from_key)
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HashMode {
    #[serde(rename = "FE")]
    Frontend,
    #[serde(rename = "BE")]
    Backend,
}

impl HashMode {
    pub const ALL: [HashMode; 2] = [HashMode::Frontend, HashMode::Backend];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Frontend => "FE",
            Self::Backend => "BE",
        }
    }
}

impl fmt::Display for HashMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HashMode {
    type Err = ApiException;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("FE") {
            Ok(Self::Frontend)
        } else if s.eq_ignore_ascii_case("BE") {
            Ok(Self::Backend)
        } else {
            Err(ApiException::new(
                ErrorCode::Validation,
                format!("unknown hash mode '{s}', expected FE or BE"),
            ))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlashSeverity {
    Notice,
    Info,
    Ok,
    Warning,
    Error,
}

impl FlashSeverity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Notice => "notice",
            Self::Info => "info",
            Self::Ok => "ok",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "notice" => Some(Self::Notice),
            "info" => Some(Self::Info),
            "ok" => Some(Self::Ok),
            "warning" => Some(Self::Warning),
            "error" => Some(Self::Error),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashMessage {
    pub message: String,
    pub title: String,
    pub severity: FlashSeverity,
    pub store_in_session: bool,
}

impl FlashMessage {
    pub fn new(
        message: impl Into<String>,
        title: impl Into<String>,
        severity: FlashSeverity,
        store_in_session: bool,
    ) -> Self {
        Self {
            message: message.into(),
            title: title.into(),
            severity,
            store_in_session,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn menu_keys_parse_with_log_aliases() {
        assert_eq!(ModuleFunction::from_key("0"), Some(ModuleFunction::Log));
        assert_eq!(ModuleFunction::from_key(""), Some(ModuleFunction::Log));
        assert_eq!(ModuleFunction::from_key("debug"), Some(ModuleFunction::Debug));
        assert_eq!(ModuleFunction::from_key("DEBUG"), None);
        assert_eq!(ModuleFunction::from_key("export"), None);
    }

    #[test]
    fn stored_settings_with_unknown_function_resolve_to_log() {
        let settings = ModuleSettings {
            function: Some("phpinfo".into()),
        };
        assert_eq!(settings.active_function(), ModuleFunction::Log);
        assert_eq!(ModuleSettings::default().active_function(), ModuleFunction::Log);
    }

    #[test]
    fn hash_mode_parsing_is_case_insensitive() {
        assert_eq!("fe".parse::<HashMode>().expect("fe"), HashMode::Frontend);
        assert_eq!("BE".parse::<HashMode>().expect("be"), HashMode::Backend);
        let err = "XX".parse::<HashMode>().expect_err("unknown mode");
        assert!(matches!(err.code, ErrorCode::Validation));
    }

    #[test]
    fn hash_mode_serializes_as_short_name() {
        let json = serde_json::to_string(&HashMode::Backend).expect("json");
        assert_eq!(json, "\"BE\"");
    }
}
