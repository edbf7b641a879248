pub mod request_id;
pub mod response;

pub use request_id::{request_id_middleware, REQUEST_ID_HEADER};
pub use response::{ApiResponse, ApiResult};
