use crate::config::{parse_ttl, Config};
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "contribstat")]
#[command(about = "Collect a GitHub user's contributions and compute language, type and collaboration stats")]
#[command(version)]
pub struct Cli {
    #[clap(flatten)]
    pub common: CommonArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Clone)]
pub struct CommonArgs {
    #[arg(long, help = "Root directory for datasets, query cache and mirrors", default_value = "data")]
    pub data_dir: PathBuf,

    #[arg(
        long,
        env = "CACHE_TIME",
        value_parser = parse_ttl,
        default_value = "1h",
        help = "How long cached queries and mirrors stay fresh (e.g. 30m, 2h)"
    )]
    pub cache_ttl: Duration,

    #[arg(short, long, global = true, help = "Enable debug logging")]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Collect profile, repositories, issues and commits for a user
    Fetch {
        #[arg(help = "GitHub username")]
        username: String,

        #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true, help = "GitHub API token")]
        token: Option<String>,

        #[arg(long, default_value_t = 8, help = "Concurrent issue queries")]
        issue_jobs: usize,

        #[arg(long, default_value_t = 8, help = "Concurrent clones/fetches")]
        clone_jobs: usize,

        #[arg(long, help = "Concurrent log miners (defaults to CPU count)")]
        mine_jobs: Option<usize>,
    },
    /// Aggregate a previously collected dataset
    Stats {
        #[arg(help = "GitHub username")]
        username: String,

        #[arg(long, help = "Limit language and type stats to one repository (owner/name)")]
        repo: Option<String>,

        #[arg(long, help = "Output as JSON")]
        json: bool,

        #[arg(long, help = "Output as NDJSON")]
        ndjson: bool,
    },
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    fn config(&self) -> Config {
        Config {
            data_dir: self.common.data_dir.clone(),
            cache_ttl: self.common.cache_ttl,
            ..Config::default()
        }
    }

    pub fn execute(self) -> Result<()> {
        init_tracing(self.common.verbose);
        let mut config = self.config();

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .context("Failed to start async runtime")?;

        match self.command {
            Commands::Fetch {
                username,
                token,
                issue_jobs,
                clone_jobs,
                mine_jobs,
            } => {
                let username = username.to_lowercase();
                if token.is_none() {
                    anyhow::bail!("A GitHub token is required: pass --token or set GITHUB_TOKEN");
                }
                config.token = token;
                config.issue_jobs = issue_jobs;
                config.clone_jobs = clone_jobs;
                if let Some(jobs) = mine_jobs {
                    config.mine_jobs = jobs;
                }
                let dir = runtime.block_on(crate::pipeline::run(&config, &username))?;
                println!("{}", dir.display());
                Ok(())
            }
            Commands::Stats {
                username,
                repo,
                json,
                ndjson,
            } => runtime.block_on(crate::stats::exec(
                &config,
                &username.to_lowercase(),
                repo,
                json,
                ndjson,
            )),
        }
    }
}

/// `RUST_LOG` when set, otherwise `debug` with `--verbose` and `warn` without.
pub fn env_filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "warn" }))
}

fn init_tracing(verbose: bool) {
    let filter = env_filter(verbose);
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init();
}
