use chrono::Local;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use vqa_curate::cli::{Cli, Command};
use vqa_curate::{ChatClient, Config, CurateError, JsonVectorStore, output, run_clean, run_collect};

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    init_tracing();
    if let Err(err) = real_main() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn real_main() -> Result<(), CurateError> {
    let cli = Cli::parse();
    cli.validate().map_err(CurateError::InvalidArg)?;

    let mut config = Config::load(cli.config.as_deref())?;
    cli.apply_overrides(&mut config);

    match &cli.command {
        Command::Collect(_) => {
            // .env is optional; credentials may come from the environment directly
            let _ = dotenvy::dotenv();
            let client = ChatClient::from_config(&config.model)?;
            tracing::info!(model = client.model(), "model client ready");
            let mut store = JsonVectorStore::open(&config.paths.vector_store)?;
            let result = run_collect(&config, &client, &mut store)?;
            output::print_collect(&cli.output, &result)
        }
        Command::Clean(_) => {
            let result = run_clean(&config, Local::now())?;
            output::print_clean(&cli.output, &result)
        }
    }
}
