pub mod errors;
pub mod handlers;
pub mod routes;
pub mod sse;

pub use errors::ApiError;
pub use handlers::AppState;
pub use routes::configure_routes;
