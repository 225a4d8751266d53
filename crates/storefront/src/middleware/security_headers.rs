//! Security headers for the JSON API.
//!
//! The storefront serves no HTML, so the policy denies every resource type
//! and framing outright.

use axum::{
    extract::Request,
    http::{
        HeaderName, HeaderValue,
        header::{
            CACHE_CONTROL, CONTENT_SECURITY_POLICY, REFERRER_POLICY, X_CONTENT_TYPE_OPTIONS,
            X_FRAME_OPTIONS,
        },
    },
    middleware::Next,
    response::Response,
};

/// Add security headers to all responses.
///
/// Headers applied:
/// - `X-Frame-Options: DENY`
/// - `X-Content-Type-Options: nosniff`
/// - `Referrer-Policy: no-referrer`
/// - `Content-Security-Policy: default-src 'none'; frame-ancestors 'none'`
/// - `Cache-Control: no-store` unless the handler set its own
/// - `Cross-Origin-Opener-Policy` and `Cross-Origin-Resource-Policy`
pub async fn security_headers_middleware(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert(X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    headers.insert(REFERRER_POLICY, HeaderValue::from_static("no-referrer"));
    headers.insert(
        CONTENT_SECURITY_POLICY,
        HeaderValue::from_static("default-src 'none'; frame-ancestors 'none'"),
    );

    // Carts and account data are per-session; catalog handlers opt in to caching.
    if !headers.contains_key(CACHE_CONTROL) {
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-store"));
    }

    headers.insert(
        HeaderName::from_static("cross-origin-opener-policy"),
        HeaderValue::from_static("same-origin"),
    );
    headers.insert(
        HeaderName::from_static("cross-origin-resource-policy"),
        HeaderValue::from_static("same-site"),
    );

    response
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::{
        Router, body::Body, http::Request as HttpRequest, middleware, response::IntoResponse,
        routing::get,
    };
    use tower::ServiceExt;

    use super::*;

    #[tokio::test]
    async fn test_headers_applied_and_cache_control_respected() {
        let app = Router::new()
            .route("/private", get(|| async { "cart" }))
            .route(
                "/public",
                get(|| async {
                    ([(CACHE_CONTROL, "public, max-age=60")], "catalog").into_response()
                }),
            )
            .layer(middleware::from_fn(security_headers_middleware));

        let private = app
            .clone()
            .oneshot(HttpRequest::get("/private").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(private.headers()[X_FRAME_OPTIONS], "DENY");
        assert_eq!(private.headers()[CACHE_CONTROL], "no-store");

        let public = app
            .oneshot(HttpRequest::get("/public").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(public.headers()[CACHE_CONTROL], "public, max-age=60");
    }
}
