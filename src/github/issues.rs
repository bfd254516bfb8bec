use super::client::GitHubApi;
use crate::error::{ContribError, Result};
use crate::model::{Issue, IssueMap, RepoName};
use crate::pool::{settle, Pool, TaskProgress};
use crate::util::split_repo_name;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Pages backward through `username`'s issues in one repository until the
/// API reports nothing older.
pub async fn fetch_repo_issues<C: GitHubApi + ?Sized>(
    api: &C,
    name: &str,
    username: &str,
    progress: &TaskProgress,
) -> Result<Vec<Issue>> {
    let (owner, repo) = split_repo_name(name)
        .ok_or_else(|| ContribError::Other(format!("invalid repository name '{name}'")))?;

    let mut issues = Vec::new();
    let mut cursor: Option<String> = None;
    loop {
        let page = api.issues(owner, repo, username, cursor.as_deref()).await?;
        issues.extend(page.issues);
        progress.update(format!("({}/{})", issues.len(), page.total));

        if !page.has_more {
            break;
        }
        match page.cursor {
            Some(next) => cursor = Some(next),
            None => {
                tracing::warn!(repo = name, "issue page reported more results without a cursor");
                break;
            }
        }
    }
    Ok(issues)
}

pub struct IssueCollector<C: GitHubApi + 'static> {
    api: Arc<C>,
    pool: Pool,
}

impl<C: GitHubApi + 'static> IssueCollector<C> {
    pub fn new(api: Arc<C>, pool: Pool) -> Self {
        Self { api, pool }
    }

    /// Fetches every listed repository's issues in parallel. The stage fails
    /// once all tasks have settled if any repository failed.
    pub async fn collect(&self, username: &str, repos: &BTreeSet<RepoName>) -> Result<IssueMap> {
        let tasks: Vec<_> = repos
            .iter()
            .map(|name| {
                let api = self.api.clone();
                let username = username.to_string();
                let label = name.clone();
                let task = move |progress: TaskProgress| async move {
                    let name = progress.label().to_string();
                    let issues = fetch_repo_issues(api.as_ref(), &name, &username, &progress).await?;
                    progress.succeed(format!("Fetched issues for {name} ({} Issues)", issues.len()));
                    tracing::info!(repo = %name, issues = issues.len(), "fetched issues");
                    Ok::<_, ContribError>(issues)
                };
                (label, task)
            })
            .collect();

        let results = self.pool.run("Fetching issues for", tasks).await;
        Ok(settle("issue collection", results)?.into_iter().collect())
    }
}
