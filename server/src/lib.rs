pub mod config;
pub mod extractors;
pub mod handlers;
pub mod models;
pub mod registry;
pub mod routes;
pub mod services;
pub mod state;
pub mod storage;
pub mod utils;
pub mod validation;
