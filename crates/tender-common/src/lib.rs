pub mod api;
pub mod redis;
