pub mod action;
pub mod dispatch;
pub mod envelope;
pub mod params;
pub mod reply;
pub mod routes;

pub use dispatch::Dispatcher;
pub use envelope::{ApiRequest, ApiResponse};
