mod classify;
mod deploy;
pub mod fixture;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "jaxscope",
    version,
    about = "Resolves the REST endpoint metadata of a web deployment",
    long_about = "Jaxscope scans the indexed classes of every unit in a deployment for REST \
                  applications, resources and providers, merges what each unit inherits from its \
                  dependencies, and registers the dispatcher servlets each web descriptor needs."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the full pipeline over a deployment fixture
    #[command(
        long_about = "Scans, merges and synthesizes every unit of the deployment described by the \
                      fixture file and prints a summary. Use --json or --output for the full report, \
                      including the updated web descriptors."
    )]
    Deploy {
        /// Path to the deployment fixture (JSON)
        #[arg(value_name = "FIXTURE")]
        path: PathBuf,
        /// Pipeline configuration file. Defaults to ~/.jaxscope/config.json when present.
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Write the JSON report to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Print the JSON report instead of the summary table
        #[arg(long)]
        json: bool,
        /// Process units one at a time
        #[arg(long)]
        sequential: bool,
    },
    /// List how each class of the deployment was classified
    Classify {
        /// Path to the deployment fixture (JSON)
        #[arg(value_name = "FIXTURE")]
        path: PathBuf,
        /// Pipeline configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Only show this unit
        #[arg(long)]
        unit: Option<String>,
    },
    /// Print the JSON schema of deployment fixtures
    Schema,
}

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let component = match &cli.command {
        Commands::Deploy { .. } => "deploy",
        Commands::Classify { .. } => "classify",
        Commands::Schema => "cli",
    };
    let _guard = jaxscope_core::logging::init_logging(component, true);

    match cli.command {
        Commands::Deploy {
            path,
            config,
            output,
            json,
            sequential,
        } => deploy::run(path, config, output, json, sequential),
        Commands::Classify { path, config, unit } => classify::run(path, config, unit),
        Commands::Schema => {
            let schema = schemars::schema_for!(fixture::DeploymentFixture);
            println!("{}", serde_json::to_string_pretty(&schema)?);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn deploy_flags_parse() {
        let cli = Cli::try_parse_from([
            "jaxscope", "deploy", "shop.json", "--json", "--sequential", "-o", "out.json",
        ])
        .unwrap();
        match cli.command {
            Commands::Deploy {
                path,
                output,
                json,
                sequential,
                config,
            } => {
                assert_eq!(path, PathBuf::from("shop.json"));
                assert_eq!(output, Some(PathBuf::from("out.json")));
                assert!(json && sequential);
                assert!(config.is_none());
            }
            _ => panic!("expected deploy"),
        }
    }
}
