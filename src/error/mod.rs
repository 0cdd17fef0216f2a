// src/error/mod.rs
//
// Application error types

pub mod types;

pub use types::{AppError, AppResult, ErrorKind};
