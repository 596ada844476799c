use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{Method, Request, header},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::config::{ApiKeyDescriptor, Config, Permission};
use crate::error::AppError;

/// Auth-flow endpoints reachable without any API key (they are what issue
/// credentials in the first place). Still rate limited as sensitive.
const AUTH_FLOW_PATHS: &[&str] = &[
    "/api/v1/auth/send-verification-code",
    "/api/v1/auth/register",
    "/api/v1/auth/login",
    "/api/v1/auth/forgot-password",
    "/api/v1/auth/verify-reset-token",
    "/api/v1/auth/reset-password",
];

/// What the gating pipeline knows about the caller once the key check has
/// passed. Attached to request extensions for downstream handlers.
#[derive(Debug, Clone)]
pub enum ClientIdentity {
    /// `Authorization: Bearer ...` present; the token itself is verified by
    /// the session-auth middleware on protected routes.
    Session,
    /// A known API key from the static registry.
    ApiKey(ApiKeyDescriptor),
    /// Keyless GET to a public-read endpoint, under the strict public quota.
    PublicRead,
    /// Keyless call to an auth-flow endpoint.
    AuthFlow,
}

/// Keyless GETs are allowed on the read-only catalog surface.
pub fn is_public_read_path(path: &str) -> bool {
    let Some(rest) = path.strip_prefix("/api/v1/") else {
        return false;
    };
    let segments: Vec<&str> = rest.split('/').filter(|s| !s.is_empty()).collect();

    match segments.as_slice() {
        ["sermons"] | ["speakers"] | ["topics"] => true,
        ["sermons", _] | ["speakers", _] | ["topics", _] => true,
        ["speakers", _, "sermons"] | ["topics", _, "sermons"] => true,
        ["home", "config"] => true,
        ["launch-screen"] => true,
        ["curation", ..] => true,
        _ => false,
    }
}

pub fn is_auth_flow_path(path: &str) -> bool {
    AUTH_FLOW_PATHS.contains(&path)
}

/// Decide whether the caller may proceed, and as what identity.
///
/// Precedence: a bearer token short-circuits (session auth is verified
/// downstream); then keyless exemptions; then the registry. `Err` carries
/// the server-side reason only, never shown to the client.
pub fn authenticate(
    config: &Config,
    has_bearer: bool,
    api_key: Option<&str>,
    method: &Method,
    path: &str,
) -> Result<ClientIdentity, String> {
    if has_bearer {
        return Ok(ClientIdentity::Session);
    }

    let Some(api_key) = api_key else {
        if method == Method::GET && is_public_read_path(path) {
            return Ok(ClientIdentity::PublicRead);
        }
        if is_auth_flow_path(path) {
            return Ok(ClientIdentity::AuthFlow);
        }
        return Err(format!("no API key for {} {}", method, path));
    };

    let Some(descriptor) = config.api_keys.get(api_key) else {
        return Err("unknown API key presented".to_string());
    };

    if !descriptor.allows_endpoint(path) {
        return Err(format!("key '{}' not allowed for endpoint {}", descriptor.name, path));
    }

    if method != Method::GET && !descriptor.has_permission(Permission::Write) {
        return Err(format!("key '{}' lacks write permission for {}", descriptor.name, method));
    }

    Ok(ClientIdentity::ApiKey(descriptor.clone()))
}

pub async fn api_key_guard(
    State(config): State<Arc<Config>>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let has_bearer = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("Bearer "));
    let api_key = req
        .headers()
        .get("X-API-Key")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());

    let method = req.method().clone();
    let path = req.uri().path().to_string();

    match authenticate(&config, has_bearer, api_key.as_deref(), &method, &path) {
        Ok(identity) => {
            req.extensions_mut().insert(identity);
            next.run(req).await
        }
        Err(reason) => {
            // Log the specific reason, answer with a generic 401 so the
            // registry layout cannot be probed.
            tracing::warn!("rejected request to {} {}: {}", method, path, reason);
            AppError::Unauthorized("invalid or missing API key".to_string()).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_support::test_config;

    #[test]
    fn bearer_token_short_circuits() {
        let config = test_config();
        let identity =
            authenticate(&config, true, None, &Method::DELETE, "/api/v1/sermons/s-1").unwrap();
        assert!(matches!(identity, ClientIdentity::Session));
    }

    #[test]
    fn keyless_get_allowed_on_public_read_paths() {
        let config = test_config();
        for path in [
            "/api/v1/sermons",
            "/api/v1/sermons/sermon-1",
            "/api/v1/speakers/sp-1/sermons",
            "/api/v1/home/config",
            "/api/v1/curation/discover-config",
            "/api/v1/launch-screen",
        ] {
            let identity = authenticate(&config, false, None, &Method::GET, path).unwrap();
            assert!(matches!(identity, ClientIdentity::PublicRead), "path {}", path);
        }
    }

    #[test]
    fn keyless_mutation_on_public_path_is_rejected() {
        let config = test_config();
        assert!(authenticate(&config, false, None, &Method::POST, "/api/v1/sermons").is_err());
    }

    #[test]
    fn keyless_private_path_is_rejected() {
        let config = test_config();
        assert!(authenticate(&config, false, None, &Method::GET, "/api/v1/favorites").is_err());
        assert!(authenticate(&config, false, None, &Method::GET, "/api/v1/users").is_err());
    }

    #[test]
    fn auth_flow_paths_allowed_without_key() {
        let config = test_config();
        let identity =
            authenticate(&config, false, None, &Method::POST, "/api/v1/auth/login").unwrap();
        assert!(matches!(identity, ClientIdentity::AuthFlow));
    }

    #[test]
    fn unknown_key_is_rejected() {
        let config = test_config();
        assert!(
            authenticate(&config, false, Some("bogus"), &Method::GET, "/api/v1/sermons").is_err()
        );
    }

    #[test]
    fn key_is_scoped_to_its_endpoints() {
        let config = test_config();
        let identity = authenticate(
            &config,
            false,
            Some("share-web-key"),
            &Method::GET,
            "/api/v1/sermons/s-1",
        )
        .unwrap();
        assert!(matches!(identity, ClientIdentity::ApiKey(_)));

        assert!(
            authenticate(&config, false, Some("share-web-key"), &Method::GET, "/api/v1/users")
                .is_err()
        );
    }

    #[test]
    fn read_only_key_cannot_mutate() {
        let config = test_config();
        assert!(
            authenticate(&config, false, Some("share-web-key"), &Method::POST, "/api/v1/sermons")
                .is_err()
        );
    }

    #[test]
    fn wildcard_key_mutates_anywhere() {
        let config = test_config();
        let identity = authenticate(
            &config,
            false,
            Some("admin-panel-key"),
            &Method::DELETE,
            "/api/v1/sermons/s-1",
        )
        .unwrap();
        match identity {
            ClientIdentity::ApiKey(descriptor) => assert_eq!(descriptor.name, "Admin Panel"),
            other => panic!("unexpected identity: {:?}", other),
        }
    }

    #[test]
    fn public_read_path_matching_is_exact() {
        assert!(is_public_read_path("/api/v1/topics/t-1/sermons"));
        assert!(!is_public_read_path("/api/v1/sermons/s-1/private/extra"));
        assert!(!is_public_read_path("/api/v1/favorites"));
        assert!(!is_public_read_path("/other/sermons"));
    }
}
