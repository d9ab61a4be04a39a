pub mod config;
pub mod db;
pub mod detector;
pub mod error;
pub mod logging;
pub mod model;
pub mod notify;
pub mod pipeline;
pub mod scheduler;
pub mod steam;
