//! Argon2id password hashing for account logins.

use std::sync::OnceLock;

use argon2::password_hash::{
    PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng,
};
use argon2::{Algorithm, Argon2, Params, Version};

use yatube_core::ports::{AuthError, PasswordService};

/// Argon2id hashing with a configurable cost.
pub struct Argon2PasswordService {
    argon2: Argon2<'static>,
    /// Hash of a throwaway password, checked when the account does not exist.
    decoy: OnceLock<Option<String>>,
}

impl Argon2PasswordService {
    /// The library's recommended cost.
    pub fn new() -> Self {
        Self::with_params(Params::default())
    }

    /// `memory_kib` and `iterations` are Argon2's `m_cost` and `t_cost`.
    pub fn with_cost(memory_kib: u32, iterations: u32) -> Result<Self, AuthError> {
        let params = Params::new(memory_kib, iterations, Params::DEFAULT_P_COST, None)
            .map_err(|e| AuthError::HashingError(e.to_string()))?;

        Ok(Self::with_params(params))
    }

    /// Cost from `PASSWORD_HASH_MEMORY_KIB` and `PASSWORD_HASH_ITERATIONS`.
    pub fn from_env() -> Self {
        let memory_kib = env_u32("PASSWORD_HASH_MEMORY_KIB").unwrap_or(Params::DEFAULT_M_COST);
        let iterations = env_u32("PASSWORD_HASH_ITERATIONS").unwrap_or(Params::DEFAULT_T_COST);

        match Self::with_cost(memory_kib, iterations) {
            Ok(service) => service,
            Err(e) => {
                tracing::warn!("Invalid password hash cost ({}), using defaults", e);
                Self::new()
            }
        }
    }

    fn with_params(params: Params) -> Self {
        Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
            decoy: OnceLock::new(),
        }
    }

    fn decoy_hash(&self) -> Option<&str> {
        self.decoy
            .get_or_init(|| self.hash("no account has this password").ok())
            .as_deref()
    }
}

impl Default for Argon2PasswordService {
    fn default() -> Self {
        Self::new()
    }
}

impl PasswordService for Argon2PasswordService {
    fn hash(&self, password: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);

        self.argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|e| AuthError::HashingError(e.to_string()))
    }

    fn verify(&self, password: &str, stored: Option<&str>) -> Result<bool, AuthError> {
        let Some(stored) = stored else {
            if let Some(parsed) = self.decoy_hash().and_then(|h| PasswordHash::new(h).ok()) {
                let _ = self.argon2.verify_password(password.as_bytes(), &parsed);
            }
            return Ok(false);
        };

        let parsed =
            PasswordHash::new(stored).map_err(|e| AuthError::HashingError(e.to_string()))?;

        // Verification uses the parameters recorded in the hash, not ours.
        Ok(self
            .argon2
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    }

    fn needs_rehash(&self, stored: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(stored) else {
            return true;
        };
        if parsed.algorithm != Algorithm::Argon2id.ident() {
            return true;
        }

        let current = self.argon2.params();
        Params::try_from(&parsed).map_or(true, |used| {
            used.m_cost() != current.m_cost()
                || used.t_cost() != current.t_cost()
                || used.p_cost() != current.p_cost()
        })
    }
}

fn env_u32(key: &str) -> Option<u32> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}
