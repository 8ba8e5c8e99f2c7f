use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use std::{fmt, sync::Arc};
use thiserror::Error;
use ts_rs::TS;
use utoipa::ToSchema;

/// Claims
///
/// Payload expected inside a bearer token. Tokens are issued elsewhere and signed
/// with the shared secret; this service only reads them.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (sub): identifier of the user the token was issued to.
    pub sub: String,
    /// Role label, e.g. "admin" or "customer".
    pub role: String,
    /// Expiration Time (exp): seconds since the epoch.
    pub exp: usize,
    /// Issued At (iat): optional, informational only.
    #[serde(default)]
    pub iat: usize,
}

/// Principal
///
/// The identity decoded from a verified credential. It carries exactly the claims the
/// token was issued with and lives only for the request that presented the token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct Principal {
    pub subject: String,
    pub role: String,
}

impl Principal {
    pub fn has_role(&self, role: &str) -> bool {
        self.role == role
    }
}

/// Returned for every verification failure: expired, tampered, malformed or missing
/// claims all look the same to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid credential")]
pub struct InvalidCredential;

/// CredentialVerifier
///
/// Turns a raw bearer token (scheme prefix already stripped) into a `Principal`.
/// Implementations must be pure: no I/O, no lookups, no caching between calls.
pub trait CredentialVerifier: Send + Sync {
    fn verify(&self, credential: &str) -> Result<Principal, InvalidCredential>;
}

/// VerifierState
///
/// The shared, read-only verifier held in the application state.
pub type VerifierState = Arc<dyn CredentialVerifier>;

/// JwtVerifier
///
/// HS256 verifier backed by `jsonwebtoken`. Signature and `exp` are always checked,
/// with the library's default clock leeway.
#[derive(Clone)]
pub struct JwtVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl fmt::Debug for JwtVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Key material stays out of logs.
        f.debug_struct("JwtVerifier")
            .field("validation", &self.validation)
            .finish()
    }
}

impl JwtVerifier {
    pub fn from_secret(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        }
    }
}

impl CredentialVerifier for JwtVerifier {
    fn verify(&self, credential: &str) -> Result<Principal, InvalidCredential> {
        let token_data =
            decode::<Claims>(credential, &self.decoding_key, &self.validation).map_err(|e| {
                tracing::debug!(kind = ?e.kind(), "bearer token rejected");
                InvalidCredential
            })?;

        let Claims { sub, role, .. } = token_data.claims;
        if sub.trim().is_empty() || role.trim().is_empty() {
            tracing::debug!("bearer token rejected: empty sub or role claim");
            return Err(InvalidCredential);
        }

        Ok(Principal { subject: sub, role })
    }
}
