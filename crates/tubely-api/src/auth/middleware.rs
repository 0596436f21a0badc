use crate::auth::jwt::{extract_bearer_token, JwtValidator};
use crate::auth::models::AuthenticatedUser;
use crate::error::HttpAppError;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

#[derive(Clone)]
pub struct AuthState {
    pub validator: JwtValidator,
}

impl AuthState {
    pub fn new(jwt_secret: &str) -> Self {
        Self {
            validator: JwtValidator::new(jwt_secret),
        }
    }
}

/// Resolve the bearer credential to a user and store it in request extensions.
pub async fn auth_middleware(
    State(auth_state): State<Arc<AuthState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let resolved = extract_bearer_token(request.headers())
        .and_then(|token| auth_state.validator.validate(token));

    let user_id = match resolved {
        Ok(user_id) => user_id,
        Err(err) => {
            tracing::debug!(
                path = %request.uri().path(),
                error = %err,
                "Authentication failed"
            );
            return HttpAppError(err).into_response();
        }
    };

    request
        .extensions_mut()
        .insert(AuthenticatedUser { user_id });

    next.run(request).await
}
