pub mod analytics;
pub mod core;
pub mod export;
pub mod records;
