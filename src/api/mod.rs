// API envelope types shared by every route handler and by the gating
// pipeline's own rejections.

pub mod response;

pub use response::{ApiResponse, ErrorCode, ErrorDetail, Pagination};
