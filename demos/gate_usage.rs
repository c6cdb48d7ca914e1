use std::sync::Arc;
use std::time::Duration;

use http::{HeaderMap, HeaderValue};
use tokengate::{
    Application, FederatedAuthenticatorConfig, GateDecision, GuardConfig, IdentityProvider,
    InMemoryTrustRegistry, JwksSignatureVerifier, JwksVerifierConfig, PathAuthPolicy,
    RequestContext, RequestGate, TenantRealm, TokenValidator, UnprotectedPaths, ValidatorConfig,
    IDP_ENTITY_ID, JWKS_URI, JWT_ASSERTION_HEADER, OIDC_AUTHENTICATOR,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "debug".into()))
        .init();

    // Registry: one external IDP plus the realm's resident issuer
    let registry = InMemoryTrustRegistry::new();
    let realm = TenantRealm::default();
    registry
        .add_provider(
            realm.clone(),
            IdentityProvider::new("https://idp.example.com").with_authenticator(
                FederatedAuthenticatorConfig::new(OIDC_AUTHENTICATOR)
                    .with_property(IDP_ENTITY_ID, "https://idp.example.com")
                    .with_property(JWKS_URI, "https://idp.example.com/keys"),
            ),
        )
        .await;
    registry
        .set_resident_provider(
            realm.clone(),
            IdentityProvider::new("LOCAL").with_authenticator(
                FederatedAuthenticatorConfig::new(OIDC_AUTHENTICATOR)
                    .with_property(IDP_ENTITY_ID, "https://sts.mesh.local"),
            ),
        )
        .await;
    registry
        .add_application(Application {
            client_key: "orders-client".to_string(),
            name: "orders".to_string(),
        })
        .await;

    let http_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(10))
        .build()?;
    let verifier = JwksSignatureVerifier::new(
        JwksVerifierConfig::new()
            .with_cache_ttl(Duration::from_secs(1800))
            .with_http_client(http_client),
    );

    let validator = TokenValidator::new(
        ValidatorConfig::new(realm)
            .with_clock_skew(Duration::from_secs(60))
            .with_call_timeout(Duration::from_secs(3)),
        Arc::new(registry),
        Arc::new(verifier),
    );

    let policy = PathAuthPolicy::new(&UnprotectedPaths::new(["^/health", "/public/.*"]))?;
    let gate = RequestGate::new(&GuardConfig::default(), Arc::new(policy), Arc::new(validator))?;

    // Example JWT token (this is just a placeholder - use a real token in practice)
    let token = "eyJhbGciOiJSUzI1NiIsInR5cCI6IkpXVCJ9...";

    for path in ["/health", "/public/info", "/orders/42"] {
        let mut headers = HeaderMap::new();
        headers.insert(JWT_ASSERTION_HEADER, HeaderValue::from_static(token));

        match gate.authorize(&RequestContext::new(path, headers)).await {
            Ok(GateDecision::Unprotected) => println!("{path}: unprotected, forwarded as is"),
            Ok(GateDecision::Authenticated { token, .. }) => {
                println!("{path}: authenticated as {} via {}", token.sub, token.provider)
            }
            Err(e) if e.is_transient() => eprintln!("{path}: temporarily unavailable: {e}"),
            Err(e) => eprintln!("{path}: rejected: {e}"),
        }
    }

    Ok(())
}
