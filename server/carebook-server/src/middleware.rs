use async_trait::async_trait;
use auth_identity::{Role, User};
use axum::{
    body::Body,
    extract::{FromRequestParts, Request, State},
    http::{header, header::AUTHORIZATION, request::Parts, HeaderValue, Method},
    middleware::Next,
    response::Response,
};
use serde_json::Value;
use std::time::{Duration, Instant};
use tower_http::cors::{Any, CorsLayer};
use tracing::warn;
use uuid::Uuid;

use crate::error::{ApiError, InternalDetails};
use crate::server::CarebookServer;

/// The authenticated caller, resolved from the bearer token on every
/// protected route
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user: User,
}

impl AuthContext {
    pub fn user_id(&self) -> Uuid {
        self.user.id
    }

    pub fn role(&self) -> Role {
        self.user.role
    }

    /// Patients and appointments
    pub fn require_clinical(&self) -> Result<(), ApiError> {
        if self.role().is_clinical() {
            return Ok(());
        }
        Err(self.denied())
    }

    /// Listing, approving and rejecting other people's leave
    pub fn require_leave_reviewer(&self) -> Result<(), ApiError> {
        if self.role().can_review_leave() {
            return Ok(());
        }
        Err(self.denied())
    }

    fn denied(&self) -> ApiError {
        warn!(user_id = %self.user.id, role = %self.user.role, "Role not permitted for route");
        ApiError::authorization("Access denied")
    }
}

fn extract_token(parts: &Parts) -> Result<&str, ApiError> {
    let auth_header = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| ApiError::authentication("No token, authorization denied"))?;

    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| {
            ApiError::authentication("Invalid Authorization header format. Expected: Bearer <token>")
        })
}

#[async_trait]
impl FromRequestParts<CarebookServer> for AuthContext {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &CarebookServer,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_token(parts)?;
        let user = state
            .identity
            .resolve_token(token)
            .await
            .map_err(|err| ApiError::authentication(err.to_string()))?;
        Ok(AuthContext { user })
    }
}

/// Request timing middleware
pub async fn request_timing_middleware(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let uri = request.uri().clone();

    let response = next.run(request).await;

    let elapsed = start.elapsed();

    tracing::info!(
        method = %method,
        uri = %uri,
        duration_ms = elapsed.as_millis(),
        status = response.status().as_u16(),
        "Request processed"
    );

    response
}

/// Write the [`InternalDetails`] of a 5xx response into its JSON body when
/// the server exposes them
pub async fn error_details_middleware(
    State(server): State<CarebookServer>,
    request: Request,
    next: Next,
) -> Response {
    let response = next.run(request).await;
    if !server.expose_error_details {
        return response;
    }
    let Some(InternalDetails(details)) = response.extensions().get::<InternalDetails>().cloned()
    else {
        return response;
    };

    let (mut parts, body) = response.into_parts();
    let bytes = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(err) => {
            warn!(error = %err, "Failed to buffer error body");
            return Response::from_parts(parts, Body::empty());
        }
    };
    let body = match serde_json::from_slice::<Value>(&bytes) {
        Ok(Value::Object(mut object)) => {
            object.insert("details".to_string(), Value::String(details));
            serde_json::to_vec(&object).map_or_else(|_| Body::from(bytes), Body::from)
        }
        _ => Body::from(bytes),
    };
    parts.headers.remove(header::CONTENT_LENGTH);
    Response::from_parts(parts, body)
}

/// CORS for the configured origins; an empty list allows any origin
pub fn create_cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::PATCH,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .max_age(Duration::from_secs(3600));

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring unparsable CORS origin");
                None
            }
        })
        .collect();

    if allowed.is_empty() {
        layer.allow_origin(Any)
    } else {
        layer.allow_origin(allowed)
    }
}
