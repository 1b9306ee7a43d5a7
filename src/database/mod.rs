// Start of file: /src/database/mod.rs

pub mod redis_manager;

pub use redis_manager::RedisService;

// End of file: /src/database/mod.rs
