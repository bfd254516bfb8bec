use crate::error::{ContribError, Result};
use crate::model::RepoName;
use crate::pool::{settle, Pool, TaskProgress};
use crate::util::{modified_age, split_repo_name};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;

/// Keeps `git` from octal-escaping non-ASCII paths.
pub const GIT_NO_QUOTE: [&str; 2] = ["-c", "core.quotePath=false"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MirrorAction {
    Clone,
    Update,
    Skip,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MirrorOutcome {
    Cloned,
    Updated,
    Skipped,
}

/// | mirror exists | FETCH_HEAD age | action |
/// |---------------|----------------|--------|
/// | no            | any            | clone  |
/// | yes           | > ttl or none  | update |
/// | yes           | <= ttl         | skip   |
pub fn plan(exists: bool, fetch_head_age: Option<Duration>, ttl: Duration) -> MirrorAction {
    if !exists {
        return MirrorAction::Clone;
    }
    match fetch_head_age {
        Some(age) if age <= ttl => MirrorAction::Skip,
        _ => MirrorAction::Update,
    }
}

/// Bare, blob-filtered mirrors under `<root>/<owner>/<name>/.git`.
#[derive(Debug, Clone)]
pub struct RepositoryMirror {
    root: PathBuf,
    clone_base: String,
    ttl: Duration,
}

impl RepositoryMirror {
    pub fn new<P: AsRef<Path>>(root: P, clone_base: impl Into<String>, ttl: Duration) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            clone_base: clone_base.into(),
            ttl,
        }
    }

    pub fn git_dir(&self, name: &str) -> Result<PathBuf> {
        let (owner, repo) = split_repo_name(name)
            .ok_or_else(|| ContribError::Other(format!("invalid repository name '{name}'")))?;
        Ok(self.root.join(owner).join(repo).join(".git"))
    }

    pub fn action(&self, name: &str) -> Result<MirrorAction> {
        let git_dir = self.git_dir(name)?;
        let exists = git_dir.exists();
        let age = modified_age(&git_dir.join("FETCH_HEAD"));
        Ok(plan(exists, age, self.ttl))
    }

    pub async fn ensure(&self, name: &str, progress: &TaskProgress) -> Result<MirrorOutcome> {
        let git_dir = self.git_dir(name)?;
        match self.action(name)? {
            MirrorAction::Clone => {
                progress.update("cloning");
                std::fs::create_dir_all(&self.root)?;
                let url = format!("{}/{}.git", self.clone_base.trim_end_matches('/'), name);
                let target = git_dir.to_string_lossy().to_string();
                run_git(
                    &["clone", "--bare", "--filter=blob:none", url.as_str(), target.as_str()],
                    &self.root,
                    progress,
                )
                .await?;
                Ok(MirrorOutcome::Cloned)
            }
            MirrorAction::Update => {
                progress.update("updating");
                run_git(&["fetch", "--all", "--prune"], &git_dir, progress).await?;
                run_git(&["update-ref", "HEAD", "FETCH_HEAD"], &git_dir, progress).await?;
                Ok(MirrorOutcome::Updated)
            }
            MirrorAction::Skip => Ok(MirrorOutcome::Skipped),
        }
    }

    pub async fn sync_all(
        &self,
        names: &[RepoName],
        pool: &Pool,
    ) -> Result<BTreeMap<RepoName, MirrorOutcome>> {
        let tasks: Vec<_> = names
            .iter()
            .map(|name| {
                let mirror = self.clone();
                let task = move |progress: TaskProgress| async move {
                    let name = progress.label().to_string();
                    let outcome = mirror.ensure(&name, &progress).await?;
                    let verb = match outcome {
                        MirrorOutcome::Cloned => "Cloned",
                        MirrorOutcome::Updated => "Updated",
                        MirrorOutcome::Skipped => "Skipped",
                    };
                    progress.succeed(format!("{verb} {name}"));
                    tracing::info!(repo = %name, ?outcome, "mirror synced");
                    Ok::<_, ContribError>(outcome)
                };
                (name.clone(), task)
            })
            .collect();

        let results = pool.run("Cloning", tasks).await;
        Ok(settle("mirror sync", results)?.into_iter().collect())
    }
}

/// Runs `git <args>` in `cwd`, streaming its output into the task's progress
/// line. A non-zero exit becomes [`ContribError::Subprocess`].
async fn run_git(args: &[&str], cwd: &Path, progress: &TaskProgress) -> Result<()> {
    let mut child = Command::new("git")
        .args(GIT_NO_QUOTE)
        .args(args)
        .current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()?;

    let stdout = child.stdout.take();
    let stderr = child.stderr.take();
    let (_, err_tail) = tokio::join!(stream(stdout, progress), stream(stderr, progress));
    let status = child.wait().await?;

    if status.success() {
        Ok(())
    } else {
        Err(ContribError::Subprocess {
            command: format!("git {}", args.join(" ")),
            code: status.code(),
            stderr: err_tail.join("\n"),
        })
    }
}

/// Forwards every `\r`/`\n` separated segment to `progress`, returns the last few.
async fn stream<R: AsyncRead + Unpin>(reader: Option<R>, progress: &TaskProgress) -> Vec<String> {
    const TAIL: usize = 20;
    let mut tail = Vec::new();
    let Some(reader) = reader else {
        return tail;
    };

    let mut segments = BufReader::new(reader).split(b'\r');
    while let Ok(Some(segment)) = segments.next_segment().await {
        for line in String::from_utf8_lossy(&segment).lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            progress.update(line);
            if tail.len() == TAIL {
                tail.remove(0);
            }
            tail.push(line.to_string());
        }
    }
    tail
}
