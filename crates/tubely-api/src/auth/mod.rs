pub mod jwt;
pub mod middleware;
pub mod models;

pub use jwt::{extract_bearer_token, issue_token, JwtValidator};
pub use middleware::{auth_middleware, AuthState};
pub use models::{AuthenticatedUser, JwtClaims};
