pub mod auth;
pub mod curation;
pub mod favorite;
pub mod history;
pub mod sermon;
pub mod speaker;
pub mod stats;
pub mod submission;
pub mod topic;
pub mod upload;
pub mod user;
