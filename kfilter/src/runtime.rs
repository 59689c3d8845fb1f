pub mod cli;
pub mod commands;
pub mod conf;
pub mod reload;
