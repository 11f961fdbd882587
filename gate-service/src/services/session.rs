//! Opaque bearer session issuance.

use crate::models::Session;
use rand::rngs::OsRng;
use rand::RngCore;
use service_core::error::AppError;

/// Mints self-contained bearer sessions on successful verification.
/// Stateless: issued sessions are not stored and cannot be revoked here;
/// the calling layer owns any lifetime enforcement.
#[derive(Debug, Clone)]
pub struct SessionIssuer {
    role: String,
    permissions: Vec<String>,
}

impl SessionIssuer {
    pub fn new(role: String, permissions: Vec<String>) -> Self {
        Self { role, permissions }
    }

    /// Issue a session for a verified identity. Token is 32 bytes from the
    /// OS CSPRNG, hex encoded; entropy failure propagates, never degrades.
    pub fn issue(&self, identity: &str) -> Result<Session, AppError> {
        let mut token_bytes = [0u8; 32];
        OsRng.try_fill_bytes(&mut token_bytes).map_err(|e| {
            AppError::GenerationFailure(anyhow::anyhow!("OS entropy source failed: {e}"))
        })?;

        Ok(Session {
            token: hex::encode(token_bytes),
            identity: identity.to_string(),
            role: self.role.clone(),
            permissions: self.permissions.clone(),
        })
    }
}
