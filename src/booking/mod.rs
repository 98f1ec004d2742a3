pub mod api_types;
pub mod client;
pub mod schedule;
pub mod types;
