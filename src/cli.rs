use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::Config;

#[derive(Parser, Debug)]
#[command(
    name = "vqa-curate",
    version,
    about = "Find and remove unusable questions from a VQA evaluation corpus"
)]
pub struct Cli {
    /// TOML config file (defaults to ./vqa-curate.toml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Summary format: text or json
    #[arg(long, global = true, default_value = "text")]
    pub output: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Classify training and validation questions and write the discard lists
    Collect(CollectArgs),
    /// Remove reviewed discards from the evaluation file
    Clean(CleanArgs),
}

#[derive(Args, Debug, Default)]
pub struct CollectArgs {
    /// Pause after each model call
    #[arg(long)]
    pub delay: Option<humantime::Duration>,

    #[arg(long)]
    pub max_train_samples: Option<usize>,

    #[arg(long)]
    pub max_validation_samples: Option<usize>,

    /// Directory receiving train_to_discard.json and validation_to_discard.json
    #[arg(long)]
    pub results_dir: Option<PathBuf>,
}

#[derive(Args, Debug, Default)]
pub struct CleanArgs {
    /// Evaluation JSONL to clean
    #[arg(long)]
    pub input: Option<PathBuf>,

    /// Directory holding the reviewed discard lists
    #[arg(long)]
    pub results_dir: Option<PathBuf>,

    /// Directory for the timestamped cleaned file
    #[arg(long)]
    pub output_dir: Option<PathBuf>,
}

impl Cli {
    pub fn validate(&self) -> Result<(), String> {
        if !matches!(self.output.as_str(), "text" | "json") {
            return Err(format!("unknown output format: {}", self.output));
        }
        if let Command::Collect(args) = &self.command {
            if args.max_train_samples == Some(0) || args.max_validation_samples == Some(0) {
                return Err("sample limits must be > 0".to_string());
            }
        }
        Ok(())
    }

    /// Layers command-line values over the loaded config.
    pub fn apply_overrides(&self, config: &mut Config) {
        match &self.command {
            Command::Collect(args) => {
                if let Some(delay) = &args.delay {
                    config.scan.delay = humantime::format_duration(*delay.as_ref()).to_string();
                }
                if args.max_train_samples.is_some() {
                    config.scan.max_train_samples = args.max_train_samples;
                }
                if args.max_validation_samples.is_some() {
                    config.scan.max_validation_samples = args.max_validation_samples;
                }
                if let Some(dir) = &args.results_dir {
                    config.paths.results_dir = dir.clone();
                }
            }
            Command::Clean(args) => {
                if let Some(input) = &args.input {
                    config.paths.evaluation_input = input.clone();
                }
                if let Some(dir) = &args.results_dir {
                    config.paths.results_dir = dir.clone();
                }
                if let Some(dir) = &args.output_dir {
                    config.paths.cleaned_output_dir = dir.clone();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{Cli, Command};
    use crate::config::Config;
    use clap::Parser;

    #[test]
    fn parses_collect_defaults() {
        let cli = Cli::try_parse_from(["vqa-curate", "collect"]).expect("parse");
        assert_eq!(cli.output, "text");
        assert!(cli.config.is_none());
        assert!(matches!(cli.command, Command::Collect(_)));
        assert!(cli.validate().is_ok());
    }

    #[test]
    fn modes_are_mutually_exclusive() {
        assert!(Cli::try_parse_from(["vqa-curate"]).is_err());
        assert!(Cli::try_parse_from(["vqa-curate", "collect", "clean"]).is_err());
    }

    #[test]
    fn collect_flags_override_config() {
        let cli = Cli::try_parse_from([
            "vqa-curate",
            "collect",
            "--delay",
            "250ms",
            "--max-train-samples",
            "5",
            "--results-dir",
            "out",
        ])
        .expect("parse");
        let mut config = Config::default();
        cli.apply_overrides(&mut config);
        assert_eq!(config.scan.delay().unwrap(), Duration::from_millis(250));
        assert_eq!(config.scan.max_train_samples, Some(5));
        assert!(config.scan.max_validation_samples.is_none());
        assert_eq!(config.paths.results_dir, std::path::PathBuf::from("out"));
    }

    #[test]
    fn clean_flags_and_global_output() {
        let cli = Cli::try_parse_from([
            "vqa-curate",
            "clean",
            "--input",
            "eval.jsonl",
            "--output",
            "json",
        ])
        .expect("parse");
        assert_eq!(cli.output, "json");
        let mut config = Config::default();
        cli.apply_overrides(&mut config);
        assert_eq!(config.paths.evaluation_input, std::path::PathBuf::from("eval.jsonl"));
    }

    #[test]
    fn rejects_unknown_output_and_zero_limits() {
        let cli = Cli::try_parse_from(["vqa-curate", "--output", "yaml", "clean"]).expect("parse");
        assert!(cli.validate().is_err());

        let cli =
            Cli::try_parse_from(["vqa-curate", "collect", "--max-validation-samples", "0"]).expect("parse");
        assert!(cli.validate().is_err());
    }
}
