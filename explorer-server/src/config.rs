//! CLI configuration, in the teacher's `clap(derive, env)` style: every
//! flag doubles as an environment variable so the binary can be configured
//! without a wrapper script.

use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "explorer-server", about = "Local time-series data-explorer backend")]
pub struct Config {
    /// Port the HTTP surface listens on.
    #[arg(long, env = "EXPLORER_PORT", default_value_t = 8642)]
    pub port: u16,

    /// Directory holding `Cache/` and `Settings/`. Defaults to the
    /// platform's per-user data directory.
    #[arg(long, env = "EXPLORER_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Base URL of the upstream time-series source.
    #[arg(long, env = "EXPLORER_UPSTREAM_URL", default_value = "http://127.0.0.1:5000")]
    pub upstream_url: String,

    /// Directory of static UI assets to serve at `/`. Serving is the only
    /// in-scope part of the static-file-serving collaborator; its contents
    /// are out of scope.
    #[arg(long, env = "EXPLORER_STATIC_DIR")]
    pub static_dir: Option<PathBuf>,
}

impl Config {
    pub fn resolved_data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(|| {
            directories::ProjectDirs::from("", "", "explorer")
                .map(|dirs| dirs.data_dir().to_path_buf())
                .unwrap_or_else(|| PathBuf::from("."))
        })
    }
}
