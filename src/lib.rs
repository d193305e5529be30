//! # School Administration API Library
//!
//! Core of the school administration service: configuration, persistence,
//! role-based access control, the HTTP handlers and the grade sheet and
//! media pipelines behind them.

pub mod auth;
pub mod config;
pub mod cursor;
pub mod db;
pub mod eligibility;
pub mod error;
pub mod grading;
pub mod handlers;
pub mod media;
pub mod models;
pub mod password;
pub mod permissions;
pub mod repositories;
pub mod seeds;
pub mod server;
pub mod telemetry;
pub mod validators;
pub use migration;
