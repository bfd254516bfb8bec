use super::client::GitHubApi;
use crate::config::{MAX_REPOSITORIES, WINDOW_DAYS};
use crate::error::{ContribError, Result};
use crate::model::{RepoEntry, RepoMap, RepoName, Repository, User};
use crate::pool::Progress;
use chrono::{DateTime, Duration, Utc};
use std::collections::BTreeSet;

/// Everything the windowed walk discovered for one user.
#[derive(Debug, Clone)]
pub struct Collection {
    pub user: User,
    pub repos: RepoMap,
    /// Repositories with issue activity; only these go through the issue stage.
    pub issue_repos: BTreeSet<RepoName>,
}

/// Inserts `repo` or refreshes the existing record of the same name.
pub fn merge_repo(repos: &mut RepoMap, repo: Repository) {
    match repos.get_mut(&repo.name) {
        Some(entry) => entry.merge(repo),
        None => {
            repos.insert(repo.name.clone(), RepoEntry::new(repo));
        }
    }
}

pub struct ContributionCollector<'a, C: GitHubApi + ?Sized> {
    api: &'a C,
    window: Duration,
    max_repositories: u32,
}

impl<'a, C: GitHubApi + ?Sized> ContributionCollector<'a, C> {
    pub fn new(api: &'a C) -> Self {
        Self {
            api,
            window: Duration::days(WINDOW_DAYS),
            max_repositories: MAX_REPOSITORIES,
        }
    }

    /// Walks backward from `now` one window at a time until the window start
    /// passes the account creation date. Any failed window aborts the walk.
    pub async fn collect(
        &self,
        username: &str,
        now: DateTime<Utc>,
        progress: &Progress,
    ) -> Result<Collection> {
        let mut anchor = now;
        let mut created = DateTime::<Utc>::MIN_UTC;
        let mut user: Option<User> = None;
        let mut repos = RepoMap::new();
        let mut issue_repos = BTreeSet::new();

        while anchor > created {
            let to = anchor;
            let from = anchor - self.window;
            progress.set_message(format!(
                "Fetching data from {} to {}",
                from.format("%Y-%m-%d"),
                to.format("%Y-%m-%d")
            ));

            let window = self
                .api
                .contributions(username, from, to, self.max_repositories)
                .await?;

            let cap = self.max_repositories as usize;
            if window.commit_repos.len() >= cap || window.issue_repos.len() >= cap {
                tracing::debug!(%from, %to, cap, "contribution window hit the repository cap");
            }
            tracing::debug!(
                %from,
                %to,
                commit_repos = window.commit_repos.len(),
                issue_repos = window.issue_repos.len(),
                "fetched contribution window"
            );

            for repo in window.commit_repos {
                merge_repo(&mut repos, repo);
            }
            for repo in window.issue_repos {
                issue_repos.insert(repo.name.clone());
                merge_repo(&mut repos, repo);
            }

            created = window.user.created;
            user = Some(window.user);
            anchor = from - Duration::milliseconds(1);
        }

        let user = user.ok_or_else(|| {
            ContribError::Other(format!("no contribution window fetched for '{username}'"))
        })?;

        Ok(Collection {
            user,
            repos,
            issue_repos,
        })
    }
}
