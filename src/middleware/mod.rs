pub mod auth;
pub mod extract;
pub mod response;

pub use auth::session_gate;
pub use extract::{CurrentUser, Payload};
pub use response::{no_content, ApiResponse, ApiResult};
