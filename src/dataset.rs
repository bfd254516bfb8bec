//! Persisted dataset layout and the in-memory view the aggregators read from.

use crate::aggregate::sort_by_date;
use crate::classify::Classifier;
use crate::error::{ContribError, Result};
use crate::model::{CommitMap, CommitView, Dataset, IssueMap, Repository, User};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

pub const USER_FILE: &str = "user.json";
pub const REPOS_FILE: &str = "repos.json";
pub const ISSUES_FILE: &str = "issues.json";
pub const COMMITS_FILE: &str = "commits.json";

pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, serde_json::to_string_pretty(value)?)?;
    Ok(())
}

pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

pub fn write_profile(dir: &Path, user: &User, repos: &[Repository], issues: &IssueMap) -> Result<()> {
    write_json(&dir.join(USER_FILE), user)?;
    write_json(&dir.join(REPOS_FILE), repos)?;
    write_json(&dir.join(ISSUES_FILE), issues)?;
    Ok(())
}

pub fn write_commits(dir: &Path, commits: &CommitMap) -> Result<()> {
    write_json(&dir.join(COMMITS_FILE), commits)
}

fn staging_dir(dir: &Path) -> PathBuf {
    let name = dir
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "dataset".to_string());
    dir.with_file_name(format!("{name}.partial"))
}

/// Writes all four documents into a sibling staging directory, then swaps it
/// in for `dir`. A reader sees either the previous run or this one, never both.
pub fn write_dataset(dir: &Path, dataset: &Dataset) -> Result<()> {
    let staging = staging_dir(dir);
    if staging.exists() {
        std::fs::remove_dir_all(&staging)?;
    }
    write_profile(&staging, &dataset.user, &dataset.repos, &dataset.issues)?;
    write_commits(&staging, &dataset.commits)?;

    if dir.exists() {
        std::fs::remove_dir_all(dir)?;
    }
    std::fs::rename(&staging, dir)?;
    Ok(())
}

pub fn load(dir: &Path) -> Result<Dataset> {
    Ok(Dataset {
        user: read_json(&dir.join(USER_FILE))?,
        repos: read_json(&dir.join(REPOS_FILE))?,
        issues: read_json(&dir.join(ISSUES_FILE))?,
        commits: read_json(&dir.join(COMMITS_FILE))?,
    })
}

/// Loads a dataset directory once and derives classified commit views on
/// first use. [`DatasetCache::reload`] drops both.
pub struct DatasetCache {
    dir: PathBuf,
    classifier: Classifier,
    dataset: RwLock<Option<Arc<Dataset>>>,
    views: RwLock<Option<Arc<Vec<CommitView>>>>,
}

fn poisoned<E>(_: E) -> ContribError {
    ContribError::Cache("dataset cache lock poisoned".to_string())
}

impl DatasetCache {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            classifier: Classifier::new(),
            dataset: RwLock::new(None),
            views: RwLock::new(None),
        }
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    pub fn dataset(&self) -> Result<Arc<Dataset>> {
        if let Some(dataset) = self.dataset.read().map_err(poisoned)?.as_ref() {
            return Ok(dataset.clone());
        }
        let mut slot = self.dataset.write().map_err(poisoned)?;
        if let Some(dataset) = slot.as_ref() {
            return Ok(dataset.clone());
        }
        let dataset = Arc::new(load(&self.dir)?);
        tracing::debug!(dir = %self.dir.display(), repos = dataset.repos.len(), "loaded dataset");
        *slot = Some(dataset.clone());
        Ok(dataset)
    }

    /// Every commit of every repository, classified, oldest first.
    pub fn commit_views(&self) -> Result<Arc<Vec<CommitView>>> {
        if let Some(views) = self.views.read().map_err(poisoned)?.as_ref() {
            return Ok(views.clone());
        }
        let dataset = self.dataset()?;
        let mut slot = self.views.write().map_err(poisoned)?;
        if let Some(views) = slot.as_ref() {
            return Ok(views.clone());
        }

        let mut views: Vec<CommitView> = dataset
            .commits
            .iter()
            .flat_map(|(repo, commits)| commits.iter().map(move |c| (repo, c)))
            .map(|(repo, commit)| self.classifier.view(repo, commit))
            .collect();
        sort_by_date(&mut views);

        let views = Arc::new(views);
        *slot = Some(views.clone());
        Ok(views)
    }

    pub fn repo_views(&self, repo: &str) -> Result<Vec<CommitView>> {
        Ok(self
            .commit_views()?
            .iter()
            .filter(|v| v.repo == repo)
            .cloned()
            .collect())
    }

    pub fn reload(&self) -> Result<()> {
        *self.dataset.write().map_err(poisoned)? = None;
        *self.views.write().map_err(poisoned)? = None;
        self.classifier.clear();
        Ok(())
    }
}
