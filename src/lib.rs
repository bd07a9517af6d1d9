pub mod config;
pub mod error;
pub mod filters;
pub mod grouping;
pub mod models;
pub mod services;
pub mod utils;
pub mod wind;
