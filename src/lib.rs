pub mod api_connection;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod error;
pub mod gateway;
pub mod logging;
pub mod media;
pub mod planner;
pub mod progress;
pub mod session;
pub mod store;
pub mod taxonomy;
pub mod view;
