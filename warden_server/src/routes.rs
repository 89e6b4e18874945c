use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use tower_http::trace::TraceLayer;
use tracing::info;
use warden_core::{Enforcer, PolicyBundle};

/// Shared state for the policy distribution routes.
#[derive(Clone)]
pub struct AppState {
    pub enforcer: Arc<Enforcer>,
}

/// Build the policy distribution router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/policies", get(get_policies).post(post_policies))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Returns the currently distributed bundle, or 404 when none is available.
async fn get_policies(State(state): State<AppState>) -> Response {
    match state.enforcer.fetch().await {
        Some(bundle) => Json(bundle).into_response(),
        None => (StatusCode::NOT_FOUND, "no policy bundle available").into_response(),
    }
}

/// Accepts a new bundle and applies it through the enforcer, so persistence
/// and handler notification follow the same path as any other apply.
async fn post_policies(
    State(state): State<AppState>,
    Json(bundle): Json<PolicyBundle>,
) -> Response {
    info!("Received policy bundle version {}", bundle.version);
    if state.enforcer.apply(&bundle).await {
        StatusCode::NO_CONTENT.into_response()
    } else {
        (StatusCode::BAD_GATEWAY, "could not persist policy bundle").into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use http_body_util::BodyExt;
    use tower::ServiceExt;
    use warden_core::{Credential, Effect, Location, MemoryRepository, Policy, Rule, RuleSet};

    fn test_state(repository: Arc<MemoryRepository>) -> AppState {
        AppState {
            enforcer: Arc::new(Enforcer::new(
                repository,
                Location::new("hq"),
                Credential::new("warden", "warden"),
            )),
        }
    }

    fn bundle() -> PolicyBundle {
        PolicyBundle::new(5, "https").with_policy(
            Policy::new("allow https", RuleSet::leaf(Rule::new("dest_port", "443")))
                .with_effect(Effect::Allow),
        )
    }

    #[tokio::test]
    async fn test_get_policies_without_bundle_is_not_found() {
        let app = router(test_state(Arc::new(MemoryRepository::new())));

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/policies")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_get_policies_returns_stored_bundle() {
        let stored = bundle();
        let app = router(test_state(Arc::new(MemoryRepository::seeded(stored.clone()))));

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/policies")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let served: PolicyBundle = serde_json::from_slice(&body).unwrap();
        assert_eq!(served, stored);
    }

    #[tokio::test]
    async fn test_post_policies_persists_through_enforcer() {
        let repository = Arc::new(MemoryRepository::new());
        let state = test_state(repository);
        let app = router(state.clone());
        let posted = bundle();

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/policies")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(serde_json::to_vec(&posted).unwrap()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(state.enforcer.fetch().await, Some(posted));
    }

    #[tokio::test]
    async fn test_post_policies_rejects_malformed_document() {
        let app = router(test_state(Arc::new(MemoryRepository::new())));

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/policies")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from("{\"version\": \"not a number\"}"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
