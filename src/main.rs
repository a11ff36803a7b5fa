//! Cinelog - browse TMDB and keep a log of what you watch
//!
//! # Usage
//!
//! ```bash
//! cinelog search "blade runner"
//! cinelog top-rated -y 1982 -n 25 --json
//! cinelog watched add 78 -t movie --rating 10
//! cinelog saved list
//! ```

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cinelog::cli::{Cli, Command, ExitCode, Output};
use cinelog::commands::{self, Context};
use cinelog::config::Config;
use cinelog::store::{CollectionStore, FileStore, KeyValueStore};

#[tokio::main]
async fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let output = Output::new(&cli);

    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config.with_env_overrides(),
        Err(e) => return output.error(e.to_string(), ExitCode::Error).into(),
    };
    let data_dir = match config.data_dir() {
        Ok(dir) => dir,
        Err(e) => return output.error(e.to_string(), ExitCode::Error).into(),
    };
    tracing::debug!(data_dir = %data_dir.display(), "using data directory");

    let store = CollectionStore::new(FileStore::new(data_dir));
    let mut ctx = Context::new(config, store);
    ctx.config_path = cli.config.clone();

    run_cli(cli.command, &ctx, &output).await.into()
}

/// Logs go to stderr; `-v` wins over RUST_LOG, which wins over "warn"
fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("cinelog=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Run CLI command and return exit code
async fn run_cli<S: KeyValueStore>(command: Command, ctx: &Context<S>, output: &Output) -> ExitCode {
    match command {
        Command::Search(cmd) => commands::search_cmd(cmd, ctx, output).await,

        Command::Popular(cmd) => commands::popular_cmd(cmd, ctx, output).await,

        Command::Info(cmd) => commands::info_cmd(cmd, ctx, output).await,

        Command::TopRated(cmd) => commands::top_rated_cmd(cmd, ctx, output).await,

        Command::Countries => commands::countries_cmd(ctx, output).await,

        Command::Genres(cmd) => commands::genres_cmd(cmd, ctx, output).await,

        Command::Watched(cmd) => commands::watched_cmd(cmd.action, ctx, output).await,

        Command::Saved(cmd) => commands::saved_cmd(cmd.action, ctx, output).await,

        Command::Config(cmd) => commands::config_cmd(cmd.action, ctx, output).await,
    }
}
