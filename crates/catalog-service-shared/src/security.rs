//! Security headers stamped on every response, including rejections.

use axum::extract::{ConnectInfo, Request};
use axum::http::{HeaderMap, HeaderValue};
use axum::middleware::Next;
use axum::response::Response;

use crate::tls::TlsPeer;

const API_CSP: &str = "default-src 'self'; script-src 'self'; style-src 'self'; \
    img-src 'self' data:; object-src 'none'; frame-ancestors 'none'";

/// The documentation page loads Swagger UI from its CDN.
const DOCS_CSP: &str = "default-src 'self'; \
    script-src 'self' 'unsafe-inline' https://unpkg.com; \
    style-src 'self' 'unsafe-inline' https://unpkg.com; \
    img-src 'self' data: https://unpkg.com; \
    connect-src 'self'; frame-ancestors 'none'";

fn is_https(req: &Request) -> bool {
    req.extensions().get::<ConnectInfo<TlsPeer>>().is_some()
        || req
            .headers()
            .get("x-forwarded-proto")
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.eq_ignore_ascii_case("https"))
}

fn apply(headers: &mut HeaderMap, docs: bool, https: bool) {
    headers.insert("x-content-type-options", HeaderValue::from_static("nosniff"));
    headers.insert("x-frame-options", HeaderValue::from_static("DENY"));
    headers.insert("x-xss-protection", HeaderValue::from_static("1; mode=block"));
    headers.insert("referrer-policy", HeaderValue::from_static("no-referrer"));
    headers.insert(
        "content-security-policy",
        HeaderValue::from_static(if docs { DOCS_CSP } else { API_CSP }),
    );
    headers.insert(
        "cross-origin-opener-policy",
        HeaderValue::from_static("same-origin"),
    );
    headers.insert(
        "permissions-policy",
        HeaderValue::from_static("camera=(), microphone=(), geolocation=()"),
    );
    if https {
        headers.insert(
            "strict-transport-security",
            HeaderValue::from_static("max-age=31536000; includeSubDomains"),
        );
    }
}

pub async fn security_headers(req: Request, next: Next) -> Response {
    let docs = req.uri().path().starts_with("/api-docs");
    let https = is_https(&req);

    let mut response = next.run(req).await;
    apply(response.headers_mut(), docs, https);
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_paths_get_strict_policy() {
        let mut headers = HeaderMap::new();
        apply(&mut headers, false, false);
        assert_eq!(headers["x-content-type-options"], "nosniff");
        assert_eq!(headers["x-frame-options"], "DENY");
        assert_eq!(headers["content-security-policy"], API_CSP);
        assert!(headers.get("strict-transport-security").is_none());
    }

    #[test]
    fn docs_page_allows_cdn() {
        let mut headers = HeaderMap::new();
        apply(&mut headers, true, true);
        let csp = headers["content-security-policy"].to_str().unwrap();
        assert!(csp.contains("https://unpkg.com"));
        assert!(headers.get("strict-transport-security").is_some());
    }

    #[test]
    fn forwarded_proto_counts_as_https() {
        let req = axum::http::Request::builder()
            .header("x-forwarded-proto", "HTTPS")
            .body(axum::body::Body::empty())
            .unwrap();
        assert!(is_https(&req));
    }

    #[test]
    fn tls_connections_count_as_https() {
        let plain = axum::http::Request::builder()
            .body(axum::body::Body::empty())
            .unwrap();
        assert!(!is_https(&plain));

        let mut tls = axum::http::Request::builder()
            .body(axum::body::Body::empty())
            .unwrap();
        tls.extensions_mut()
            .insert(ConnectInfo(TlsPeer(([127, 0, 0, 1], 443).into())));
        assert!(is_https(&tls));
    }
}
