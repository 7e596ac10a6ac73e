pub mod gate;
pub mod response;

pub use gate::access_gate;
pub use response::{ApiResponse, ApiResult};
