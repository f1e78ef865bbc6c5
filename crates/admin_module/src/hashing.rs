use std::{fmt, str::FromStr};

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use serde::{Deserialize, Serialize};
use shared::domain::HashMode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HashError {
    #[error("invalid argon2 parameters: {0}")]
    InvalidParams(argon2::Error),
    #[error("failed to hash password: {0}")]
    Hash(argon2::password_hash::Error),
    #[error("unknown hash algorithm '{0}', expected argon2i or argon2id")]
    UnknownAlgorithm(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    Argon2i,
    Argon2id,
}

impl HashAlgorithm {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Argon2i => "argon2i",
            Self::Argon2id => "argon2id",
        }
    }

    fn argon2(self) -> Algorithm {
        match self {
            Self::Argon2i => Algorithm::Argon2i,
            Self::Argon2id => Algorithm::Argon2id,
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HashAlgorithm {
    type Err = HashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "argon2i" => Ok(Self::Argon2i),
            "argon2id" => Ok(Self::Argon2id),
            other => Err(HashError::UnknownAlgorithm(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashSettings {
    pub algorithm: HashAlgorithm,
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for HashSettings {
    fn default() -> Self {
        Self {
            algorithm: HashAlgorithm::Argon2i,
            memory_kib: 65536,
            iterations: 16,
            parallelism: 1,
        }
    }
}

impl HashSettings {
    fn params(&self) -> Result<Params, HashError> {
        Params::new(self.memory_kib, self.iterations, self.parallelism, None)
            .map_err(HashError::InvalidParams)
    }
}

pub trait HashInstance: Send + Sync {
    fn hashed_password(&self, password: &str) -> Result<String, HashError>;

    /// False for wrong passwords and for hashes that cannot be parsed.
    fn check_password(&self, password: &str, hashed_password: &str) -> bool;

    /// True when the stored hash was produced with other settings than the
    /// current ones and should be replaced on the next successful login.
    fn is_hash_update_needed(&self, hashed_password: &str) -> bool;
}

#[derive(Debug, Clone)]
pub struct Argon2Hash {
    settings: HashSettings,
    params: Params,
}

impl Argon2Hash {
    pub fn new(settings: HashSettings) -> Result<Self, HashError> {
        let params = settings.params()?;
        Ok(Self { settings, params })
    }

    fn hasher(&self) -> Argon2<'static> {
        Argon2::new(self.settings.algorithm.argon2(), Version::V0x13, self.params.clone())
    }
}

impl HashInstance for Argon2Hash {
    fn hashed_password(&self, password: &str) -> Result<String, HashError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .hasher()
            .hash_password(password.as_bytes(), &salt)
            .map_err(HashError::Hash)?;
        Ok(hash.to_string())
    }

    fn check_password(&self, password: &str, hashed_password: &str) -> bool {
        let parsed_hash = match PasswordHash::new(hashed_password) {
            Ok(h) => h,
            Err(_) => return false,
        };
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok()
    }

    fn is_hash_update_needed(&self, hashed_password: &str) -> bool {
        let Ok(parsed_hash) = PasswordHash::new(hashed_password) else {
            return true;
        };
        if parsed_hash.algorithm.as_str() != self.settings.algorithm.as_str() {
            return true;
        }
        match Params::try_from(&parsed_hash) {
            Ok(params) => {
                params.m_cost() != self.params.m_cost()
                    || params.t_cost() != self.params.t_cost()
                    || params.p_cost() != self.params.p_cost()
            }
            Err(_) => true,
        }
    }
}

/// Hands out the default hash instance for frontend and backend passwords.
#[derive(Debug, Clone, Copy)]
pub struct PasswordHashFactory {
    frontend: HashSettings,
    backend: HashSettings,
}

impl Default for PasswordHashFactory {
    fn default() -> Self {
        Self::new(HashSettings::default(), HashSettings::default())
    }
}

impl PasswordHashFactory {
    pub fn new(frontend: HashSettings, backend: HashSettings) -> Self {
        Self { frontend, backend }
    }

    pub fn settings(&self, mode: HashMode) -> HashSettings {
        match mode {
            HashMode::Frontend => self.frontend,
            HashMode::Backend => self.backend,
        }
    }

    /// Fails when either mode carries cost parameters Argon2 rejects.
    pub fn validate(&self) -> Result<(), HashError> {
        Argon2Hash::new(self.frontend)?;
        Argon2Hash::new(self.backend)?;
        Ok(())
    }

    pub fn default_hash_instance(&self, mode: HashMode) -> Result<Box<dyn HashInstance>, HashError> {
        Ok(Box::new(Argon2Hash::new(self.settings(mode))?))
    }
}

#[cfg(test)]
#[path = "tests/hashing_tests.rs"]
mod tests;
