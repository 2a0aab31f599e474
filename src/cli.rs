// src/cli.rs

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// GitLab instance base URLs, comma separated (e.g. https://gitlab.com)
    #[arg(long, env = "GITLAB_INSTANCE", value_delimiter = ',', required = true)]
    pub instances: Vec<String>,

    /// One token per instance, comma separated, in the same order
    #[arg(long, env = "GITLAB_TOKEN", value_delimiter = ',', required = true, hide_env_values = true)]
    pub tokens: Vec<String>,

    /// How the tokens authenticate against the instances
    #[arg(long, value_enum, default_value_t = TokenKind::Private)]
    pub token_kind: TokenKind,

    /// Directory holding the per-kind export snapshots
    #[arg(long, default_value = "db")]
    pub cache_dir: PathBuf,

    /// Path of the repository to regenerate (destroyed on every run)
    #[arg(long, default_value = "new_repo")]
    pub repo: PathBuf,

    /// Author name on the synthetic commits
    #[arg(long, default_value = "contrib-replay")]
    pub author_name: String,

    /// Author email on the synthetic commits
    #[arg(long, default_value = "contrib-replay@localhost")]
    pub author_email: String,
}

#[derive(clap::ValueEnum, Clone, Debug, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Personal access token, sent as the PRIVATE-TOKEN header
    Private,
    /// OAuth access token, sent as a bearer Authorization header
    Oauth,
}
