pub mod auth;
pub mod metrics;
pub mod request_id;

pub use auth::require_auth;
pub use metrics::track_requests;
pub use request_id::{request_id_middleware, REQUEST_ID_HEADER};
