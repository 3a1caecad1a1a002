pub mod admin;
pub mod cli;
pub mod commands;
pub mod output;
pub mod shell;
