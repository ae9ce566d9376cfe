pub mod api;
pub mod engine;
pub mod entities;
pub mod error;
pub mod store;

pub mod simulation;
