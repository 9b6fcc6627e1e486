pub mod admin;
pub mod auth;
pub mod error;
pub mod models;
pub mod router;
pub mod state;

pub use auth::{AdminUser, AuthUser, CurrentUser};
pub use error::ApiError;
pub use state::AppState;
