// Application layer - Use cases and the ports they depend on
pub mod chart_columns;
pub mod chat_backend;
pub mod chat_service;
pub mod dashboard_planner;
pub mod dashboard_registry;
pub mod dashboard_service;
pub mod profile_summary;
pub mod query_router;
pub mod reply_formatter;
pub mod response_parser;
