use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::api::state::AppState;

/// Rejects requests whose `Host` header is not listed in
/// `server.allowed_hosts`.
pub async fn enforce_allowed_hosts(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let allowed = &state.settings.server.allowed_hosts;

    let host = request
        .headers()
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    if !host_allowed(host, allowed) {
        tracing::warn!("Rejected request for disallowed host {:?}", host);
        return (StatusCode::BAD_REQUEST, "Bad Request (400)").into_response();
    }

    next.run(request).await
}

/// Empty list or `*` allows everything. `.example.com` matches the domain
/// and any subdomain.
pub fn host_allowed(host: &str, allowed: &[String]) -> bool {
    if allowed.is_empty() || allowed.iter().any(|h| h == "*") {
        return true;
    }

    let host = strip_port(host).to_ascii_lowercase();
    if host.is_empty() {
        return false;
    }

    allowed.iter().any(|pattern| {
        let pattern = pattern.to_ascii_lowercase();
        match pattern.strip_prefix('.') {
            Some(domain) => host == domain || host.ends_with(&pattern),
            None => host == pattern,
        }
    })
}

fn strip_port(host: &str) -> &str {
    if host.starts_with('[') {
        // [::1]:8000
        return host.split(']').next().map(|h| &h[1..]).unwrap_or(host);
    }
    host.rsplit_once(':').map(|(h, _)| h).unwrap_or(host)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_empty_or_wildcard_allows_all() {
        assert!(host_allowed("anything.test", &[]));
        assert!(host_allowed("anything.test", &list(&["*"])));
    }

    #[test]
    fn test_exact_match_ignores_port() {
        let allowed = list(&["api.example.com"]);
        assert!(host_allowed("api.example.com:8000", &allowed));
        assert!(host_allowed("API.example.com", &allowed));
        assert!(!host_allowed("evil.com", &allowed));
        assert!(!host_allowed("", &allowed));
    }

    #[test]
    fn test_subdomain_pattern() {
        let allowed = list(&[".example.com"]);
        assert!(host_allowed("example.com", &allowed));
        assert!(host_allowed("admin.example.com", &allowed));
        assert!(!host_allowed("badexample.com", &allowed));
    }

    #[test]
    fn test_ipv6_host() {
        assert!(host_allowed("[::1]:8000", &list(&["::1"])));
    }
}
