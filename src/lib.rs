pub mod app;
pub mod constants;
pub mod errors;
pub mod managers;
pub mod mcp;
pub mod models;
pub mod services;
pub mod utils;
