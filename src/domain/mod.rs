// Domain layer - Core models, free of I/O
pub mod chart;
pub mod dashboard;
pub mod intent;
pub mod profile;
pub mod response;
pub mod session;
