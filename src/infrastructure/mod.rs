// Infrastructure layer - External dependencies and adapters
pub mod chat_api_client;
pub mod config;
pub mod http_response;
pub mod memory_registry;
