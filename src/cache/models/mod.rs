pub mod response;

pub use response::CachedResponse;
