//! Command dispatch for the `ricochet` binary.

pub mod cli;
pub mod commands;
pub mod error;
pub mod output;

pub use cli::Cli;
pub use error::Result;

use cli::Command;
use ricochet_config::{ConfigOverrides, RicochetConfig};
use ricochet_types::RicochetError;

/// Resolves configuration from `cli`'s global flags, then runs the selected
/// subcommand, printing its result to stdout.
///
/// # Errors
///
/// Returns whatever error the dispatched subcommand produced, or a
/// [`RicochetError::Usage`] if the configuration layer is malformed.
pub async fn run(cli: Cli) -> Result<()> {
    let overrides = ConfigOverrides {
        db_path: cli.db.clone(),
        ..ConfigOverrides::default()
    };
    let config = RicochetConfig::load(&overrides)
        .map_err(|e| RicochetError::Usage(format!("loading configuration: {e}")))?;

    match cli.command {
        Command::Listen(args) => commands::listen::run(args, &config).await,
        Command::Inject(args) => {
            let outcomes = commands::inject::run(args, &config).await?;
            for outcome in outcomes {
                println!(
                    "{} {} -> {}",
                    outcome.token,
                    outcome.point.label(),
                    outcome
                        .status
                        .map_or_else(|| "dry-run".to_string(), |s| s.to_string())
                );
            }
            Ok(())
        }
        Command::Passive(args) => {
            let findings = commands::passive::run(args, &config).await?;
            for finding in &findings {
                println!("{}", output::to_json_line(finding));
            }
            Ok(())
        }
        Command::Active(args) => {
            let outcomes = commands::active::run(args, &config).await?;
            for outcome in outcomes {
                println!(
                    "{} {} -> {}",
                    outcome.token,
                    outcome.point.label(),
                    outcome
                        .status
                        .map_or_else(|| "dry-run".to_string(), |s| s.to_string())
                );
            }
            Ok(())
        }
        Command::Suggest(args) => {
            let suggestions = commands::suggest::run(args, &config).await?;
            if suggestions.is_empty() {
                println!("no suggestions");
            }
            for suggestion in suggestions {
                println!("{}: {}", suggestion.subject, suggestion.hint);
            }
            Ok(())
        }
        Command::Findings(args) => {
            let lines = commands::findings::run(args, &config).await?;
            for line in lines {
                println!("{line}");
            }
            Ok(())
        }
        Command::Report(args) => {
            let reports = commands::report::run(args, &config).await?;
            for report in reports {
                match &report.path {
                    Some(path) => println!("wrote {}", path.display()),
                    None => println!("{}", report.markdown),
                }
            }
            Ok(())
        }
        Command::Interactsh(args) => {
            let output = commands::interactsh::run(args).await?;
            println!("{} {}", output.status, output.body);
            Ok(())
        }
    }
}
