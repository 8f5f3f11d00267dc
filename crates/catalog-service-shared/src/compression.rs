//! Response compression with a per-request opt-out.

use axum::extract::Request;
use axum::http::header::ACCEPT_ENCODING;
use axum::http::HeaderName;
use axum::middleware::Next;
use axum::response::Response;
use tower_http::compression::predicate::{And, DefaultPredicate, Predicate, SizeAbove};
use tower_http::compression::CompressionLayer;

pub const NO_COMPRESSION_HEADER: HeaderName = HeaderName::from_static("x-no-compression");

pub type CatalogCompressionLayer = CompressionLayer<And<DefaultPredicate, SizeAbove>>;

/// gzip or brotli for bodies larger than `min_bytes`.
pub fn compression_layer(min_bytes: u16) -> CatalogCompressionLayer {
    CompressionLayer::new().compress_when(DefaultPredicate::new().and(SizeAbove::new(min_bytes)))
}

/// Clients sending `X-No-Compression` get an identity-encoded body.
pub async fn compression_opt_out(mut req: Request, next: Next) -> Response {
    if req.headers().contains_key(NO_COMPRESSION_HEADER) {
        req.headers_mut().remove(ACCEPT_ENCODING);
    }
    next.run(req).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::routing::get;
    use axum::Router;
    use tower::ServiceExt;

    fn app() -> Router {
        let big = "catalog ".repeat(1024);
        Router::new()
            .route("/big", get(move || async move { big }))
            .route("/small", get(|| async { "ok" }))
            .layer(compression_layer(1024))
            .layer(axum::middleware::from_fn(compression_opt_out))
    }

    async fn encoding(path: &str, opt_out: bool) -> Option<String> {
        let mut req = axum::http::Request::builder()
            .uri(path)
            .header(ACCEPT_ENCODING, "gzip");
        if opt_out {
            req = req.header(NO_COMPRESSION_HEADER, "1");
        }
        let response = app().oneshot(req.body(Body::empty()).unwrap()).await.unwrap();
        response
            .headers()
            .get("content-encoding")
            .map(|v| v.to_str().unwrap().to_string())
    }

    #[tokio::test]
    async fn large_bodies_are_compressed() {
        assert_eq!(encoding("/big", false).await.as_deref(), Some("gzip"));
    }

    #[tokio::test]
    async fn small_bodies_are_not() {
        assert_eq!(encoding("/small", false).await, None);
    }

    #[tokio::test]
    async fn opt_out_header_disables_compression() {
        assert_eq!(encoding("/big", true).await, None);
    }
}
