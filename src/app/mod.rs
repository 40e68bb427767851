pub mod actions;
pub mod adb;
pub mod config;
pub mod error;
pub mod logging;
pub mod menu;
pub mod models;
pub mod reconcile;
pub mod server;
