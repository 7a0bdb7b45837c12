pub mod error;
pub mod logger;
pub mod mqtt;
pub mod setting;
