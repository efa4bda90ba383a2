//! Subscription Service - subscription records and period cost aggregation.

pub mod config;
pub mod cost;
pub mod dtos;
pub mod handlers;
pub mod models;
pub mod services;
pub mod startup;

pub use startup::AppState;
