use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(60 * 60);
pub const WINDOW_DAYS: i64 = 6 * 30;
pub const MAX_REPOSITORIES: u32 = 100;
pub const ISSUE_PAGE_SIZE: u32 = 100;
pub const PARTICIPANT_SAMPLE: u32 = 10;
pub const GRAPHQL_ENDPOINT: &str = "https://api.github.com/graphql";
pub const CLONE_BASE_URL: &str = "https://github.com";

#[derive(Debug, Clone)]
pub struct Config {
    pub data_dir: PathBuf,
    pub cache_ttl: Duration,
    pub token: Option<String>,
    pub issue_jobs: usize,
    pub clone_jobs: usize,
    pub mine_jobs: usize,
    pub endpoint: String,
    pub clone_base: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            cache_ttl: DEFAULT_CACHE_TTL,
            token: None,
            issue_jobs: 8,
            clone_jobs: 8,
            mine_jobs: num_cpus::get().max(1),
            endpoint: GRAPHQL_ENDPOINT.to_string(),
            clone_base: CLONE_BASE_URL.to_string(),
        }
    }
}

impl Config {
    pub fn dataset_dir(&self, username: &str) -> PathBuf {
        self.data_dir.join(username)
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.data_dir.join("_github")
    }

    pub fn mirror_root(&self) -> PathBuf {
        self.data_dir.join("_repos")
    }

    pub fn with_data_dir<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.data_dir = dir.as_ref().to_path_buf();
        self
    }
}

pub fn parse_ttl(input: &str) -> Result<Duration, String> {
    humantime::parse_duration(input.trim()).map_err(|e| format!("invalid duration '{input}': {e}"))
}
