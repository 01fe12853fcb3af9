pub mod config;
pub mod cors;
pub mod error;
pub mod handlers;
pub mod models;
pub mod service;
pub mod store;
