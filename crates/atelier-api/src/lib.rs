pub mod auth;
pub mod dashboard;
pub mod error;
pub mod middleware;
pub mod records;
pub mod routes;
pub mod session;
pub mod users;

pub use auth::{AppState, AppStateInner};
pub use routes::router;
