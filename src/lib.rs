pub mod cli;
pub mod compose;
pub mod config;
pub mod deploy;
pub mod errors;
pub mod exec;
pub mod generate;
pub mod log;
pub mod prompt;
pub mod provider;
pub mod safety;
pub mod server;
pub mod shell;
pub mod ux;
pub mod wire;
