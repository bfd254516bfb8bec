use crate::cache::Cache;
use crate::config::Config;
use crate::dataset::write_dataset;
use crate::error::Result;
use crate::git::{CommitMiner, MirrorOutcome, RepositoryMirror};
use crate::github::{ContributionCollector, GitHubApi, GraphQlClient, IssueCollector};
use crate::model::{Dataset, Profile, RepoName};
use crate::pool::{Pool, Progress};
use anyhow::Context;
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::sync::Arc;

pub fn profile_key(username: &str) -> String {
    format!("profile:{username}")
}

/// User profile plus every contributed repository with its issues. Served
/// from `cache` while fresh; otherwise fetched and cached only on success.
pub async fn fetch_profile<C: GitHubApi + 'static>(
    api: Arc<C>,
    cache: &mut Cache,
    config: &Config,
    username: &str,
    now: DateTime<Utc>,
    progress: &Progress,
) -> Result<Profile> {
    let key = profile_key(username);
    if let Some(profile) = cache.get::<Profile>(&key, now)? {
        progress.info("Using cached GitHub data");
        tracing::info!(username, "using cached profile");
        return Ok(profile);
    }

    progress.set_message("Fetching data from GitHub");
    let collection = ContributionCollector::new(api.as_ref())
        .collect(username, now, progress)
        .await?;

    let issue_pool = Pool::new(config.issue_jobs, progress.clone());
    let issues = IssueCollector::new(api.clone(), issue_pool)
        .collect(username, &collection.issue_repos)
        .await?;

    let mut repos = collection.repos;
    for (name, list) in issues {
        if let Some(entry) = repos.get_mut(&name) {
            entry.issues = list;
        }
    }

    let profile = Profile {
        user: collection.user,
        repos: repos.into_values().collect(),
    };
    progress.succeed(format!(
        "Fetched data from GitHub for {username} ({} Repo, {} - {})",
        profile.repos.len(),
        profile.user.created.format("%a %b %d %Y"),
        now.format("%a %b %d %Y"),
    ));

    cache.put(&key, &profile, now)?;
    Ok(profile)
}

/// Runs the whole collection for `username` and writes the four dataset
/// documents together once every stage has succeeded. Returns the dataset
/// directory.
pub async fn run(config: &Config, username: &str) -> anyhow::Result<PathBuf> {
    let progress = Progress::spinner();
    let client = Arc::new(
        GraphQlClient::new(config.endpoint.clone(), config.token.clone())
            .context("Failed to build GitHub client")?,
    );
    let mut cache =
        Cache::new(config.cache_dir(), config.cache_ttl).context("Failed to initialize cache")?;

    let profile = fetch_profile(client, &mut cache, config, username, Utc::now(), &progress)
        .await
        .context("Failed to fetch GitHub data")?;

    let names: Vec<RepoName> = profile.repos.iter().map(|r| r.name.clone()).collect();
    let mirror = RepositoryMirror::new(config.mirror_root(), config.clone_base.clone(), config.cache_ttl);
    let outcomes = mirror
        .sync_all(&names, &Pool::new(config.clone_jobs, progress.clone()))
        .await
        .context("Failed to mirror repositories")?;
    let skipped = outcomes
        .values()
        .filter(|o| **o == MirrorOutcome::Skipped)
        .count();
    progress.succeed(format!(
        "Cloned {} repositories ({skipped} up to date)",
        names.len()
    ));

    let commits = CommitMiner::new(mirror)
        .mine_all(
            &names,
            username,
            profile.user.created,
            &Pool::new(config.mine_jobs, progress.clone()),
        )
        .await
        .context("Failed to mine commits")?;
    progress.succeed(format!(
        "Checked out commits for {} repositories",
        names.len()
    ));

    let dir = config.dataset_dir(username);
    let dataset = Dataset {
        repos: profile.repositories(),
        issues: profile.issues(),
        user: profile.user,
        commits,
    };
    write_dataset(&dir, &dataset).context("Failed to write dataset")?;
    progress.finish();
    tracing::info!(dir = %dir.display(), "dataset written");
    Ok(dir)
}
