//! API routes.

pub mod health;
pub mod session;

pub use health::{HealthResponse, health_routes};
pub use session::{
    CountResponse, SessionIdResponse, SessionResponse, count_handler, create_session_handler,
    delete_session_handler, delete_value_handler, get_session_handler, get_value_handler,
    put_value_handler, refresh_session_handler,
};
