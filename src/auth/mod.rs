/// Bearer token verification.
pub mod verifier;

/// Authentication and role middleware built on the verifier.
pub mod access;

pub use access::{
    ADMIN_ROLE, AccessPolicy, authenticate, authorize, bearer_token, evaluate, require_auth,
    require_role,
};
pub use verifier::{
    Claims, CredentialVerifier, InvalidCredential, JwtVerifier, Principal, VerifierState,
};
