use async_trait::async_trait;
use axum::{
    body::{Body, to_bytes},
    http::{HeaderMap, HeaderValue, Request, StatusCode, header},
};
use jsonwebtoken::{EncodingKey, Header, encode};
use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    time::SystemTime,
};
use storefront_backend::{
    AppError, AppState, create_router,
    analytics::DateRange,
    auth::{
        ADMIN_ROLE, AccessPolicy, Claims, CredentialVerifier, InvalidCredential, JwtVerifier,
        Principal, VerifierState, authenticate, authorize, bearer_token, evaluate,
    },
    config::AppConfig,
    models::{DashboardStats, OrderRecord},
    repository::{RepoError, Repository},
    storage::MockStorageService,
};
use tower::util::ServiceExt;

// --- Test Doubles ---

#[derive(Default)]
struct StubRepository {
    stats_called: AtomicBool,
}

#[async_trait]
impl Repository for StubRepository {
    async fn get_orders(&self, _range: &DateRange) -> Result<Vec<OrderRecord>, RepoError> {
        Ok(vec![])
    }

    async fn get_stats(&self) -> Result<DashboardStats, RepoError> {
        self.stats_called.store(true, Ordering::SeqCst);
        Ok(DashboardStats {
            total_orders: 12,
            total_customers: 5,
            total_products: 40,
            pending_quotes: 2,
        })
    }
}

/// Wraps the real verifier and counts how often it is consulted.
struct CountingVerifier {
    inner: JwtVerifier,
    calls: AtomicUsize,
}

impl CountingVerifier {
    fn new() -> Self {
        Self {
            inner: JwtVerifier::from_secret(TEST_JWT_SECRET.as_bytes()),
            calls: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl CredentialVerifier for CountingVerifier {
    fn verify(&self, credential: &str) -> Result<Principal, InvalidCredential> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.verify(credential)
    }
}

// --- Helper Functions ---

const TEST_JWT_SECRET: &str = "test-secret-value-1234567890";

fn now() -> i64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap()
        .as_secs() as i64
}

fn issue_token_with_secret(sub: &str, role: &str, exp_offset: i64, secret: &str) -> String {
    let now = now();
    let claims = Claims {
        sub: sub.to_string(),
        role: role.to_string(),
        iat: now as usize,
        exp: (now + exp_offset) as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

fn issue_token(sub: &str, role: &str) -> String {
    issue_token_with_secret(sub, role, 3600, TEST_JWT_SECRET)
}

fn verifier() -> JwtVerifier {
    JwtVerifier::from_secret(TEST_JWT_SECRET.as_bytes())
}

struct TestApp {
    state: AppState,
    repo: Arc<StubRepository>,
    verifier: Arc<CountingVerifier>,
}

fn test_app() -> TestApp {
    let repo = Arc::new(StubRepository::default());
    let verifier = Arc::new(CountingVerifier::new());

    let mut config = AppConfig::default();
    config.jwt_secret = TEST_JWT_SECRET.to_string();

    let state = AppState {
        repo: repo.clone(),
        storage: Arc::new(MockStorageService::new()),
        verifier: verifier.clone() as VerifierState,
        config,
    };

    TestApp {
        state,
        repo,
        verifier,
    }
}

fn get(uri: &str, authorization: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(value) = authorization {
        builder = builder.header(header::AUTHORIZATION, value);
    }
    builder.body(Body::empty()).unwrap()
}

fn headers_with(authorization: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::AUTHORIZATION,
        HeaderValue::from_str(authorization).unwrap(),
    );
    headers
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

// --- Token Verifier ---

#[test]
fn test_verify_returns_issued_claims() {
    let token = issue_token("u1", "admin");

    let principal = verifier().verify(&token).unwrap();

    assert_eq!(
        principal,
        Principal {
            subject: "u1".to_string(),
            role: "admin".to_string(),
        }
    );
}

#[test]
fn test_verify_is_idempotent() {
    let token = issue_token("u7", "customer");
    let verifier = verifier();

    let first = verifier.verify(&token).unwrap();
    let second = verifier.verify(&token).unwrap();

    assert_eq!(first, second);
}

#[test]
fn test_verify_rejects_expired_token() {
    let token = issue_token_with_secret("u1", "admin", -3600, TEST_JWT_SECRET);
    assert_eq!(verifier().verify(&token), Err(InvalidCredential));
}

#[test]
fn test_verify_rejects_token_signed_with_other_secret() {
    let token = issue_token_with_secret("u1", "admin", 3600, "some-other-secret");
    assert_eq!(verifier().verify(&token), Err(InvalidCredential));
}

#[test]
fn test_verify_rejects_tampered_payload() {
    let token = issue_token("u1", "customer");
    let forged_claims = issue_token_with_secret("u1", "admin", 3600, "attacker-secret");

    // Keep the original signature, swap in a payload claiming admin.
    let mut parts: Vec<&str> = token.split('.').collect();
    let forged_payload = forged_claims.split('.').nth(1).unwrap();
    parts[1] = forged_payload;
    let tampered = parts.join(".");

    assert_eq!(verifier().verify(&tampered), Err(InvalidCredential));
}

#[test]
fn test_verify_rejects_malformed_token() {
    assert_eq!(verifier().verify("not-a-jwt"), Err(InvalidCredential));
    assert_eq!(verifier().verify("a.b.c"), Err(InvalidCredential));
}

#[test]
fn test_verify_rejects_missing_role_claim() {
    let claims = serde_json::json!({ "sub": "u1", "exp": now() + 3600 });
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes()),
    )
    .unwrap();

    assert_eq!(verifier().verify(&token), Err(InvalidCredential));
}

#[test]
fn test_verify_rejects_empty_role_claim() {
    let token = issue_token("u1", "");
    assert_eq!(verifier().verify(&token), Err(InvalidCredential));
}

// --- Pipeline Stages ---

#[test]
fn test_bearer_token_parsing() {
    assert_eq!(bearer_token(&headers_with("Bearer abc.def")), Some("abc.def"));
    assert_eq!(bearer_token(&headers_with("Basic dXNlcjpwYXNz")), None);
    assert_eq!(bearer_token(&headers_with("bearer abc.def")), None);
    assert_eq!(bearer_token(&headers_with("Bearer ")), None);
    assert_eq!(bearer_token(&HeaderMap::new()), None);
}

#[test]
fn test_authenticate_skips_verifier_without_header() {
    let counting = CountingVerifier::new();

    let result = authenticate(&HeaderMap::new(), &counting);

    assert!(matches!(result, Err(AppError::MissingCredential)));
    assert_eq!(counting.calls(), 0);
}

#[test]
fn test_authenticate_skips_verifier_for_wrong_scheme() {
    let counting = CountingVerifier::new();
    let token = issue_token("u1", "admin");

    let result = authenticate(&headers_with(&format!("Token {}", token)), &counting);

    assert!(matches!(result, Err(AppError::MissingCredential)));
    assert_eq!(counting.calls(), 0);
}

#[test]
fn test_authenticate_maps_invalid_credential_to_invalid_token() {
    let counting = CountingVerifier::new();
    let token = issue_token_with_secret("u1", "admin", -3600, TEST_JWT_SECRET);

    let result = authenticate(&headers_with(&format!("Bearer {}", token)), &counting);

    assert!(matches!(result, Err(AppError::InvalidToken)));
    assert_eq!(counting.calls(), 1);
}

#[test]
fn test_authorize_without_principal_is_forbidden() {
    let result = authorize(None, ADMIN_ROLE);
    assert!(matches!(result, Err(AppError::Forbidden { role: "admin" })));
}

#[test]
fn test_evaluate_role_policy() {
    let verifier = verifier();
    let admin = headers_with(&format!("Bearer {}", issue_token("u1", "admin")));
    let customer = headers_with(&format!("Bearer {}", issue_token("u2", "customer")));

    let principal = evaluate(&admin, &verifier, AccessPolicy::Role(ADMIN_ROLE)).unwrap();
    assert_eq!(principal.subject, "u1");

    let denied = evaluate(&customer, &verifier, AccessPolicy::Role(ADMIN_ROLE));
    assert!(matches!(denied, Err(AppError::Forbidden { .. })));

    let allowed = evaluate(&customer, &verifier, AccessPolicy::Authenticated).unwrap();
    assert_eq!(allowed.role, "customer");
}

#[test]
fn test_error_messages_are_generic() {
    assert_eq!(
        AppError::MissingCredential.to_string(),
        "Missing or invalid authorization header"
    );
    assert_eq!(AppError::InvalidToken.to_string(), "Invalid or expired token");
    assert_eq!(
        AppError::forbidden(ADMIN_ROLE).to_string(),
        "Admin access required"
    );
}

// --- Router Level ---

#[tokio::test]
async fn test_missing_header_returns_401_without_verifying() {
    let app = test_app();
    let router = create_router(app.state.clone());

    let response = router.oneshot(get("/me", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        response.headers().get(header::WWW_AUTHENTICATE).unwrap(),
        "Bearer"
    );
    assert_eq!(
        body_json(response).await,
        serde_json::json!({ "error": "Missing or invalid authorization header" })
    );
    assert_eq!(app.verifier.calls(), 0);
}

#[tokio::test]
async fn test_wrong_scheme_returns_401() {
    let app = test_app();
    let router = create_router(app.state.clone());
    let token = issue_token("u1", "admin");

    let response = router
        .oneshot(get("/admin/stats", Some(&format!("Basic {}", token))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(app.verifier.calls(), 0);
    assert!(!app.repo.stats_called.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_expired_token_returns_401() {
    let app = test_app();
    let router = create_router(app.state.clone());
    let token = issue_token_with_secret("u1", "admin", -3600, TEST_JWT_SECRET);

    let response = router
        .oneshot(get("/admin/stats", Some(&format!("Bearer {}", token))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        body_json(response).await,
        serde_json::json!({ "error": "Invalid or expired token" })
    );
    assert_eq!(app.verifier.calls(), 1);
    assert!(!app.repo.stats_called.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_me_returns_attached_principal() {
    let app = test_app();
    let router = create_router(app.state.clone());
    let token = issue_token("cust-42", "customer");

    let response = router
        .oneshot(get("/me", Some(&format!("Bearer {}", token))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        serde_json::json!({ "subject": "cust-42", "role": "customer" })
    );
}

#[tokio::test]
async fn test_admin_token_reaches_admin_handler() {
    let app = test_app();
    let router = create_router(app.state.clone());
    let token = issue_token("u1", "admin");

    let response = router
        .oneshot(get("/admin/stats", Some(&format!("Bearer {}", token))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(app.repo.stats_called.load(Ordering::SeqCst));
    assert_eq!(app.verifier.calls(), 1);

    let stats: DashboardStats = serde_json::from_value(body_json(response).await).unwrap();
    assert_eq!(stats.total_orders, 12);
}

#[tokio::test]
async fn test_customer_token_on_admin_route_returns_403() {
    let app = test_app();
    let router = create_router(app.state.clone());
    let token = issue_token("u2", "customer");

    let response = router
        .oneshot(get("/admin/stats", Some(&format!("Bearer {}", token))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(
        body_json(response).await,
        serde_json::json!({ "error": "Admin access required" })
    );
    assert!(!app.repo.stats_called.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_each_request_is_verified_again() {
    let app = test_app();
    let token = issue_token("u1", "admin");
    let auth_header = format!("Bearer {}", token);

    for _ in 0..3 {
        let response = create_router(app.state.clone())
            .oneshot(get("/me", Some(&auth_header)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    assert_eq!(app.verifier.calls(), 3);
}

#[tokio::test]
async fn test_public_routes_need_no_credential() {
    let app = test_app();
    let router = create_router(app.state.clone());

    let response = router.oneshot(get("/health", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(app.verifier.calls(), 0);
}
