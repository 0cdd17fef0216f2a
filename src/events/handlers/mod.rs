// src/events/handlers/mod.rs
//
// Event Handlers - INTERNAL MODULE
//
// Handlers use closure-based subscription via EventBus::subscribe.

pub mod cache_invalidation_handler;

// Only export the registration function, not handler functions
pub use cache_invalidation_handler::register_cache_invalidation_handlers;
