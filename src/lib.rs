pub mod api;
pub mod catalog;
pub mod collation;
pub mod config;
pub mod error;
pub mod generator;
pub mod metadata;
pub mod storage;
pub mod validation;
pub mod views;

mod commands;

pub use commands::{
    AssetCommand, Cli, Command, GalleryCommand, GeneratorCommand, KindArg, OutputFormat,
    RankingCommand, UserCommand,
};
pub use error::{AdminError, AdminResult, ApiFailure};

use clap::Parser;
use std::path::PathBuf;

/// Entry point: parses arguments, loads configuration and runs one command.
pub fn run() -> std::process::ExitCode {
    env_logger::init();

    let cli = Cli::parse();
    let working_dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let config = match config::load_config(cli.config.as_deref(), &working_dir) {
        Ok(config) => config,
        Err(error) => {
            eprintln!("{}", error);
            return std::process::ExitCode::FAILURE;
        }
    };

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(error) => {
            eprintln!("Failed to start async runtime: {}", error);
            return std::process::ExitCode::FAILURE;
        }
    };

    match runtime.block_on(commands::execute(cli.command, &config)) {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("{}", message);
            std::process::ExitCode::FAILURE
        }
    }
}
