// src/application/commands/mod.rs
//
// Command Handlers
//
// ARCHITECTURE:
// - Commands are thin adapters between the CLI and services
// - Commands accept DTOs, return DTOs
// - Commands convert errors into ErrorResponse
// - Commands NEVER contain business logic

pub mod movie_commands;

pub use movie_commands::*;
