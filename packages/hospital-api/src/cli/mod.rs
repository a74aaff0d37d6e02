mod verify;

use crate::{
    api::{self, AppState},
    config::{HospitalConfig, LogConfig, LogFormat, LogLevel},
    error::Error,
    log::SEED,
    seed,
};
use clap::{Parser, Subcommand};
use tracing::{debug, info};

pub use verify::Verify;

const DEFAULT_CONFIG_FILE: &str = "hospital-api.toml";

#[derive(Clone, Debug, Parser)]
#[command(version, about, verbatim_doc_comment)]
///
/// Hospital API
///
/// REST API for patients, appointments, accounts, notifications and emergency alerts.
///
pub struct Args {
    /// Optional path to a configuration file.
    ///
    /// Default is "hospital-api.toml".
    /// Configuration is loaded from this file, if present.
    /// Environment variables are used instead of the file or to override any values defined in the file.
    #[arg(short = 'p', long, default_value = DEFAULT_CONFIG_FILE, verbatim_doc_comment, global = true)]
    pub config_file_path: String,

    ///
    /// Optional log level.
    ///
    #[arg(short, long, value_enum, default_value_t = LogConfig::default_log_level(), env = "HOSPITAL_LOG__LEVEL", global = true)]
    pub log_level: LogLevel,

    ///
    /// Optional log format. Default level is "pretty" if running in a terminal session, otherwise "structured".
    ///
    #[arg(short='f', long, value_enum, default_value_t = LogConfig::default_log_format(), env = "HOSPITAL_LOG__FORMAT", global = true)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    /// Insert the demo accounts and the default hospital data
    Seed(Seed),

    Verify(Verify),
}

#[derive(clap::Args, Clone, Debug)]
pub struct Seed {
    /// Only insert the demo accounts
    #[arg(short, long, default_value_t = false)]
    users_only: bool,
}

///
/// Runs command specified in command line
/// Returns Ok(true) if the caller should exit
///
pub async fn run(args: Args, state: AppState, config: &HospitalConfig) -> Result<bool, Error> {
    match args.command {
        Some(Commands::Seed(options)) => {
            debug!(target: SEED, ?options, database = %config.database);

            let created = seed::demo_users(&state).await?;
            if !options.users_only {
                api::load_or_seed(&state).await?;
            }

            info!(msg = "Seed complete", accounts_created = created);
            Ok(true)
        }
        Some(Commands::Verify(verify)) => {
            verify.run(&state).await?;
            Ok(true)
        }
        None => Ok(false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn args_are_well_formed() {
        Args::command().debug_assert();
    }

    #[test]
    fn parse_subcommands() {
        let args = Args::try_parse_from(["hospital-api"]).unwrap();
        assert!(args.command.is_none());
        assert_eq!(args.config_file_path, DEFAULT_CONFIG_FILE);

        let args = Args::try_parse_from(["hospital-api", "seed", "--users-only"]).unwrap();
        assert!(matches!(
            args.command,
            Some(Commands::Seed(Seed { users_only: true }))
        ));

        let args =
            Args::try_parse_from(["hospital-api", "verify", "-p", "other.toml"]).unwrap();
        assert!(matches!(args.command, Some(Commands::Verify(_))));
        assert_eq!(args.config_file_path, "other.toml");
    }
}
