pub mod config;
pub mod db;
pub mod engine;
pub mod error;
pub mod feed;
pub mod models;
pub mod youtube;

pub use engine::Engine;
pub use error::{AppError, Result};
