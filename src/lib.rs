pub mod client;
pub mod commands;
pub mod package;
pub mod runtime;
