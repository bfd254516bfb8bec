use super::mirror::{RepositoryMirror, GIT_NO_QUOTE};
use crate::error::{ContribError, Result};
use crate::model::{Commit, CommitMap, RepoName};
use crate::pool::{settle, Pool, TaskProgress};
use crate::util::dedup_trimmed;
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use tokio::process::Command;

/// Every record starts with three newlines, then hash, date and subject on
/// their own lines, then the changed paths.
pub const LOG_FORMAT: &str = "--format=%n%n%n%H%n%ad%n%s";
pub const RECORD_SEPARATOR: &str = "\n\n\n";

pub fn parse_git_date(input: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_str(input.trim(), "%Y-%m-%d %H:%M:%S %z")
        .or_else(|_| DateTime::parse_from_rfc3339(input.trim()))
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| ContribError::InvalidDate(format!("'{input}': {e}")))
}

fn parse_record(block: &str) -> Option<Commit> {
    let mut lines = block.lines();
    let sha = lines.next()?.trim();
    let date = parse_git_date(lines.next()?).ok()?;
    // empty-message commits with no files end right after the date
    let message = lines.next().unwrap_or("").trim();
    if sha.is_empty() || !sha.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }

    Some(Commit {
        sha: sha.to_string(),
        date,
        message: message.to_string(),
        files: dedup_trimmed(lines),
    })
}

/// Splits `git log` output into commits. A block that does not parse is an
/// error carrying the block itself.
pub fn parse_log(repo: &str, output: &str) -> Result<Vec<Commit>> {
    let mut commits = Vec::new();
    for block in output.split(RECORD_SEPARATOR) {
        let trimmed = block.trim();
        if trimmed.is_empty() {
            continue;
        }
        let commit = parse_record(trimmed).ok_or_else(|| ContribError::MalformedLog {
            repo: repo.to_string(),
            block: trimmed.to_string(),
        })?;
        commits.push(commit);
    }
    Ok(commits)
}

/// Keeps commits strictly newer than `created`.
pub fn filter_after(commits: Vec<Commit>, created: DateTime<Utc>) -> Vec<Commit> {
    commits.into_iter().filter(|c| c.date > created).collect()
}

#[derive(Debug, Clone)]
pub struct CommitMiner {
    mirror: RepositoryMirror,
}

impl CommitMiner {
    pub fn new(mirror: RepositoryMirror) -> Self {
        Self { mirror }
    }

    /// The mirror's git dir, after checking it is an openable repository.
    pub fn open(&self, name: &str) -> Result<PathBuf> {
        let git_dir = self.mirror.git_dir(name)?;
        if !git_dir.exists() {
            return Err(ContribError::MirrorMissing(git_dir));
        }
        gix::open(&git_dir)?;
        Ok(git_dir)
    }

    pub async fn mine(&self, name: &str, author: &str) -> Result<Vec<Commit>> {
        let git_dir = self.open(name)?;
        let author_arg = format!("--author={author}");
        let args = [
            "log",
            "--name-only",
            "--date=iso",
            LOG_FORMAT,
            "-i",
            author_arg.as_str(),
        ];

        let output = Command::new("git")
            .args(GIT_NO_QUOTE)
            .args(args)
            .current_dir(&git_dir)
            .output()
            .await?;

        if !output.status.success() {
            return Err(ContribError::Subprocess {
                command: format!("git {}", args.join(" ")),
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        parse_log(name, &String::from_utf8_lossy(&output.stdout))
    }

    /// Mines every repository in parallel and drops commits at or before `created`.
    pub async fn mine_all(
        &self,
        names: &[RepoName],
        author: &str,
        created: DateTime<Utc>,
        pool: &Pool,
    ) -> Result<CommitMap> {
        let tasks: Vec<_> = names
            .iter()
            .map(|name| {
                let miner = self.clone();
                let author = author.to_string();
                let task = move |progress: TaskProgress| async move {
                    let name = progress.label().to_string();
                    let commits = filter_after(miner.mine(&name, &author).await?, created);
                    progress.succeed(format!("Checked out commits for {name}"));
                    tracing::info!(repo = %name, commits = commits.len(), "mined commits");
                    Ok::<_, ContribError>(commits)
                };
                (name.clone(), task)
            })
            .collect();

        let results = pool.run("Checking out commits for", tasks).await;
        Ok(settle("commit mining", results)?.into_iter().collect())
    }
}
