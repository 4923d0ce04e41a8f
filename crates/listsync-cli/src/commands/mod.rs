pub mod auth;
pub mod config;
pub mod contacts;
pub mod context;
pub mod exports;
pub mod lists;
pub mod update;
