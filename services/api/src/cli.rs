use crate::report::{run_evaluate, run_items, run_lookup, EvaluateArgs, LookupArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use paps::error::AppError;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "PAPS Assessment Evaluator",
    about = "Look up PAPS fitness grades and serve the evaluator over HTTP",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Look up a single factor, item, and record against the criteria
    Lookup(LookupArgs),
    /// Evaluate up to five factors and print totals with a radar summary
    Evaluate(EvaluateArgs),
    /// List fitness factors and their assessment items
    Items,
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Override the configured criteria dataset (.csv or .json)
    #[arg(long)]
    pub(crate) dataset: Option<PathBuf>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Lookup(args) => run_lookup(args).await,
        Command::Evaluate(args) => run_evaluate(args).await,
        Command::Items => {
            run_items();
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use paps::assessment::FitnessFactor;

    #[test]
    fn no_subcommand_defaults_to_serve() {
        let cli = Cli::try_parse_from(["paps-api"]).expect("parses");
        assert!(cli.command.is_none());
    }

    #[test]
    fn evaluate_collects_repeated_entries() {
        let cli = Cli::try_parse_from([
            "paps-api",
            "evaluate",
            "--stage",
            "초등학교",
            "--grade",
            "5",
            "--sex",
            "남",
            "--entry",
            "cardio=왕복오래달리기:80",
            "--entry",
            "비만=bmi:19.5",
        ])
        .expect("parses");

        match cli.command {
            Some(Command::Evaluate(args)) => {
                assert_eq!(args.entries.len(), 2);
                assert_eq!(args.entries[1].factor, FitnessFactor::Obesity);
                assert_eq!(args.entries[1].record, "19.5");
            }
            other => panic!("expected evaluate command, got {other:?}"),
        }
    }

    #[test]
    fn malformed_entries_are_rejected() {
        let result = Cli::try_parse_from(["paps-api", "evaluate", "--entry", "cardio"]);
        assert!(result.is_err());
    }
}
