use axum::response::Redirect;

/// Token refresh lives behind `/api`; legacy paths are forwarded with the
/// method and body preserved.
pub(super) async fn refresh_redirect() -> Redirect {
    Redirect::temporary("/api/auth/refresh")
}
