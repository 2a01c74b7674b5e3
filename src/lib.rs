pub mod app;
pub mod auth;
pub mod catalog;
pub mod config;
pub mod domain;
pub mod error;
pub mod output;
pub mod resolve;
pub mod store;
