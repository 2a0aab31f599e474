// src/main.rs

use clap::Parser;
use contrib_replay::cli::Args;
use contrib_replay::error::Error;
use contrib_replay::pipeline::{self, Credential, RunConfig};
use std::process::ExitCode;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let config = match run_config(args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    let start_time = Instant::now();
    match pipeline::run(&config) {
        Ok(summary) => {
            println!(
                "Replayed {} contributions into {} in {:.2?}.",
                summary.commits_written,
                config.repo_path.display(),
                start_time.elapsed()
            );
            match serde_json::to_string_pretty(&summary.counts) {
                Ok(counts) => println!("{counts}"),
                Err(e) => eprintln!("Error rendering counts: {e}"),
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error processing contributions: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run_config(args: Args) -> Result<RunConfig, Error> {
    if args.instances.len() != args.tokens.len() {
        return Err(Error::Config(format!(
            "{} instances but {} tokens",
            args.instances.len(),
            args.tokens.len()
        )));
    }
    let credentials = args
        .instances
        .into_iter()
        .zip(args.tokens)
        .map(|(instance, token)| Credential {
            instance,
            token,
            kind: args.token_kind,
        })
        .collect();
    Ok(RunConfig {
        credentials,
        cache_dir: args.cache_dir,
        repo_path: args.repo,
        author_name: args.author_name,
        author_email: args.author_email,
    })
}
