pub mod graph_client;
pub mod image_gen;
pub mod image_host;
pub mod logger;
pub mod settings;
pub mod tool_executor;
pub mod validation;
