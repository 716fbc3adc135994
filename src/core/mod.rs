pub mod config;
pub mod connection;
pub mod error;
pub mod types;
