use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use admin_module::hashing::{HashAlgorithm, HashError, HashSettings, PasswordHashFactory};
use anyhow::Context;
use tracing::warn;

pub const CONFIG_FILE: &str = "server.toml";

#[derive(Debug, Clone)]
pub struct Settings {
    pub server_bind: String,
    pub database_url: String,
    pub session_cookie: String,
    pub fe_hash_algorithm: HashAlgorithm,
    pub be_hash_algorithm: HashAlgorithm,
    pub hash_memory_kib: u32,
    pub hash_iterations: u32,
    pub hash_parallelism: u32,
    pub labels: HashMap<String, String>,
}

impl Default for Settings {
    fn default() -> Self {
        let hash = HashSettings::default();
        Self {
            server_bind: "127.0.0.1:8080".into(),
            database_url: "sqlite://./data/examples.db".into(),
            session_cookie: "examples_session".into(),
            fe_hash_algorithm: hash.algorithm,
            be_hash_algorithm: hash.algorithm,
            hash_memory_kib: hash.memory_kib,
            hash_iterations: hash.iterations,
            hash_parallelism: hash.parallelism,
            labels: HashMap::new(),
        }
    }
}

impl Settings {
    pub fn hash_factory(&self) -> Result<PasswordHashFactory, HashError> {
        let base = HashSettings {
            algorithm: self.fe_hash_algorithm,
            memory_kib: self.hash_memory_kib,
            iterations: self.hash_iterations,
            parallelism: self.hash_parallelism,
        };
        let factory = PasswordHashFactory::new(
            base,
            HashSettings {
                algorithm: self.be_hash_algorithm,
                ..base
            },
        );
        factory.validate()?;
        Ok(factory)
    }
}

pub fn load_settings() -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string(CONFIG_FILE) {
        apply_file(&mut settings, &raw);
    }
    apply_env(&mut settings, |key| std::env::var(key).ok());

    settings
}

pub(crate) fn apply_file(settings: &mut Settings, raw: &str) {
    let file_cfg = match raw.parse::<toml::Table>() {
        Ok(table) => table,
        Err(error) => {
            warn!(%error, "ignoring unparsable {CONFIG_FILE}");
            return;
        }
    };
    let text = |key: &str| file_cfg.get(key).and_then(toml::Value::as_str);
    let number = |key: &str| {
        file_cfg
            .get(key)
            .and_then(toml::Value::as_integer)
            .and_then(|v| u32::try_from(v).ok())
    };

    if let Some(v) = text("bind_addr") {
        settings.server_bind = v.to_string();
    }
    if let Some(v) = text("database_url") {
        settings.database_url = v.to_string();
    }
    if let Some(v) = text("session_cookie") {
        settings.session_cookie = v.to_string();
    }
    if let Some(v) = text("fe_hash_algorithm") {
        set_algorithm(&mut settings.fe_hash_algorithm, "fe_hash_algorithm", v);
    }
    if let Some(v) = text("be_hash_algorithm") {
        set_algorithm(&mut settings.be_hash_algorithm, "be_hash_algorithm", v);
    }
    if let Some(v) = number("hash_memory_kib") {
        settings.hash_memory_kib = v;
    }
    if let Some(v) = number("hash_iterations") {
        settings.hash_iterations = v;
    }
    if let Some(v) = number("hash_parallelism") {
        settings.hash_parallelism = v;
    }

    if let Some(labels) = file_cfg.get("labels").and_then(toml::Value::as_table) {
        for (key, value) in labels {
            if let Some(label) = value.as_str() {
                settings.labels.insert(key.clone(), label.to_string());
            }
        }
    }
}

pub(crate) fn apply_env(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("SERVER_BIND") {
        settings.server_bind = v;
    }
    if let Some(v) = lookup("APP__BIND_ADDR") {
        settings.server_bind = v;
    }

    if let Some(v) = lookup("DATABASE_URL") {
        settings.database_url = v;
    }
    if let Some(v) = lookup("APP__DATABASE_URL") {
        settings.database_url = v;
    }

    if let Some(v) = lookup("APP__SESSION_COOKIE") {
        settings.session_cookie = v;
    }

    if let Some(v) = lookup("APP__FE_HASH_ALGORITHM") {
        set_algorithm(&mut settings.fe_hash_algorithm, "APP__FE_HASH_ALGORITHM", &v);
    }
    if let Some(v) = lookup("APP__BE_HASH_ALGORITHM") {
        set_algorithm(&mut settings.be_hash_algorithm, "APP__BE_HASH_ALGORITHM", &v);
    }

    if let Some(v) = lookup("APP__HASH_MEMORY_KIB") {
        if let Ok(parsed) = v.parse::<u32>() {
            settings.hash_memory_kib = parsed;
        }
    }
    if let Some(v) = lookup("APP__HASH_ITERATIONS") {
        if let Ok(parsed) = v.parse::<u32>() {
            settings.hash_iterations = parsed;
        }
    }
    if let Some(v) = lookup("APP__HASH_PARALLELISM") {
        if let Ok(parsed) = v.parse::<u32>() {
            settings.hash_parallelism = parsed;
        }
    }
}

fn set_algorithm(target: &mut HashAlgorithm, source: &str, raw: &str) {
    match raw.parse::<HashAlgorithm>() {
        Ok(algorithm) => *target = algorithm,
        Err(error) => warn!(%error, source, "keeping hash algorithm {target}"),
    }
}

pub fn prepare_database_url(raw_database_url: &str) -> anyhow::Result<String> {
    let database_url = normalize_database_url(raw_database_url);
    ensure_parent_dir_exists(&database_url)?;
    Ok(database_url)
}

fn normalize_database_url(raw_database_url: &str) -> String {
    let raw_database_url = raw_database_url.trim();

    if raw_database_url.is_empty() {
        return Settings::default().database_url;
    }

    if raw_database_url.starts_with("sqlite::memory:")
        || raw_database_url.starts_with("sqlite://")
        || raw_database_url.contains("://")
    {
        return raw_database_url.to_string();
    }

    if let Some(path) = raw_database_url.strip_prefix("sqlite:") {
        let path = path.replace('\\', "/");
        return format!("sqlite://{path}");
    }

    format!("sqlite://{}", raw_database_url.replace('\\', "/"))
}

fn ensure_parent_dir_exists(database_url: &str) -> anyhow::Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url == "sqlite::memory:" || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
