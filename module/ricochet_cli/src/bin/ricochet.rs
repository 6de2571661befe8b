//! Entry point for the `ricochet` binary.

use clap::Parser;
use ricochet_cli::cli::{Cli, LogFormatArg, LogLevelArg};
use ricochet_telemetry::{LogFormat, LogLevel};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let level = match cli.log_level {
        LogLevelArg::Debug => LogLevel::Debug,
        LogLevelArg::Info => LogLevel::Info,
        LogLevelArg::Warn => LogLevel::Warn,
        LogLevelArg::Error => LogLevel::Error,
    };
    let format = match cli.log_format {
        LogFormatArg::Text => LogFormat::Text,
        LogFormatArg::Json => LogFormat::Json,
    };
    if let Err(e) = ricochet_telemetry::init_logging(level, format) {
        eprintln!("warning: failed to initialize logging: {e}");
    }

    if let Err(e) = ricochet_cli::run(cli).await {
        eprintln!("error: {e}");
        std::process::exit(e.exit_code());
    }
}
