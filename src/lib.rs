pub mod agent;
pub mod config;
pub mod error;
pub mod format;
pub mod logging;
pub mod matcher;
pub mod model;
pub mod notify;
pub mod parser;
pub mod pipeline;
pub mod prompt;
