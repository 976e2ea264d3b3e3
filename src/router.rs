//! HTTP router construction.

use axum::{
    routing::{get, post},
    Router,
};

use crate::{
    handlers::{api_info, emotions::load_emotions, health_check, users::register_user},
    middleware::apply_middleware,
    state::SharedState,
};

/// Create the Axum router with all endpoints and middleware
pub fn build_router(state: SharedState) -> anyhow::Result<Router> {
    let config = state.config.clone();

    let router = Router::new()
        .route("/", get(api_info))
        .route("/health", get(health_check))
        .route("/api/users", post(register_user))
        .route("/api/load-emotions", get(load_emotions))
        .with_state(state);

    apply_middleware(router, &config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::Config, db::unreachable_database, state::AppState};
    use axum::{
        body::{to_bytes, Body},
        http::{header, Method, Request, StatusCode},
        response::Response,
    };
    use serde_json::Value;
    use std::sync::Arc;
    use tower::ServiceExt;

    const ALLOWED_ORIGIN: &str = "http://localhost:3000";

    fn test_router() -> Router {
        let config = Config::from_lookup(|key| (key == "DB_PASSWORD").then(|| "postgres".to_string()))
            .expect("test config");
        let state = Arc::new(AppState {
            config,
            db: unreachable_database(),
        });

        build_router(state).expect("router")
    }

    async fn send(request: Request<Body>) -> Response {
        test_router().oneshot(request).await.expect("infallible")
    }

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");
        serde_json::from_slice(&bytes).expect("body is JSON")
    }

    fn post_users(body: impl Into<Body>) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri("/api/users")
            .header(header::CONTENT_TYPE, "application/json")
            .body(body.into())
            .unwrap()
    }

    fn preflight(origin: &str) -> Request<Body> {
        Request::builder()
            .method(Method::OPTIONS)
            .uri("/api/users")
            .header(header::ORIGIN, origin)
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn test_info_endpoint_works_without_database() {
        let response = send(Request::get("/").body(Body::empty()).unwrap()).await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body, serde_json::json!({ "message": "This is the Emo Pop API." }));
    }

    #[tokio::test]
    async fn test_load_emotions_returns_json_500_when_database_down() {
        let response = send(Request::get("/api/load-emotions").body(Body::empty()).unwrap()).await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = json_body(response).await;
        assert_eq!(body["error"]["code"], "DATABASE_ERROR");
    }

    #[tokio::test]
    async fn test_register_user_returns_json_500_when_database_down() {
        let response = send(post_users(r#"{"name":"alice"}"#)).await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = json_body(response).await;
        assert_eq!(body["error"]["code"], "DATABASE_ERROR");
        assert!(!body.to_string().contains("127.0.0.1"));
    }

    #[tokio::test]
    async fn test_health_returns_json_500_when_database_down() {
        let response = send(Request::get("/health").body(Body::empty()).unwrap()).await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = json_body(response).await;
        assert_eq!(body["error"]["code"], "DATABASE_ERROR");
    }

    #[tokio::test]
    async fn test_register_user_rejects_malformed_payloads() {
        for payload in [r#"{not json"#, r#"{}"#, r#"{"name":7}"#, r#"{"name":"   "}"#] {
            let response = send(post_users(payload)).await;

            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "payload {payload}");
            let body = json_body(response).await;
            assert_eq!(body["error"]["code"], "VALIDATION_ERROR", "payload {payload}");
        }
    }

    #[tokio::test]
    async fn test_register_user_requires_json_content_type() {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/users")
            .body(Body::from(r#"{"name":"alice"}"#))
            .unwrap();

        let response = send(request).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_oversized_body_is_payload_too_large() {
        let payload = format!(r#"{{"name":"{}"}}"#, "a".repeat(3 * 1024 * 1024));

        let response = send(post_users(payload)).await;

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        let body = json_body(response).await;
        assert_eq!(body["error"]["code"], "PAYLOAD_TOO_LARGE");
    }

    #[tokio::test]
    async fn test_missing_credentials_only_fail_data_endpoints() {
        let config = Config::from_lookup(|key| match key {
            "DB_PASSWORD_FILE" => Some("/nonexistent/emopop/pg_password".to_string()),
            _ => None,
        })
        .expect("config loads without credentials");
        let state = AppState::from_config(config).expect("state").into_shared();
        let app = build_router(state).expect("router");

        let info = app
            .clone()
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .expect("infallible");
        assert_eq!(info.status(), StatusCode::OK);

        let emotions = app
            .oneshot(Request::get("/api/load-emotions").body(Body::empty()).unwrap())
            .await
            .expect("infallible");
        assert_eq!(emotions.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = json_body(emotions).await;
        assert_eq!(body["error"]["code"], "DATABASE_ERROR");
    }

    #[tokio::test]
    async fn test_users_route_only_accepts_post() {
        let response = send(Request::get("/api/users").body(Body::empty()).unwrap()).await;
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_preflight_allowed_for_configured_origins() {
        for origin in crate::config::DEFAULT_ALLOWED_ORIGINS {
            let response = send(preflight(origin)).await;

            assert!(response.status().is_success());
            assert_eq!(
                response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
                origin
            );
            let methods = response
                .headers()
                .get(header::ACCESS_CONTROL_ALLOW_METHODS)
                .unwrap()
                .to_str()
                .unwrap()
                .to_string();
            assert!(methods.contains("POST"));
            assert!(!methods.contains("DELETE"));
        }
    }

    #[tokio::test]
    async fn test_preflight_denied_for_other_origins() {
        let response = send(preflight("http://evil.example")).await;

        assert!(response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
    }

    #[tokio::test]
    async fn test_simple_request_carries_cors_header() {
        let request = Request::get("/")
            .header(header::ORIGIN, ALLOWED_ORIGIN)
            .body(Body::empty())
            .unwrap();

        let response = send(request).await;
        assert_eq!(
            response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            ALLOWED_ORIGIN
        );
    }
}
