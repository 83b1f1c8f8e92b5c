// src/error/mod.rs
//
// Error module - application-level error taxonomy

pub mod types;

pub use types::{AppError, AppResult};
