// src/services/mod.rs
//
// Services Module - Orchestration Layer

pub mod movie_service;


pub use movie_service::{CreateMovieRequest, MovieService, UpdateMovieRequest};
