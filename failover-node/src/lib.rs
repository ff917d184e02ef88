pub mod actions;
pub mod config;
pub mod config_resolution;
pub mod logging;
pub mod slack;
