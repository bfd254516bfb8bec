use chrono::{DateTime, Datelike, Utc};
use std::collections::HashSet;
use std::path::Path;
use std::time::{Duration, SystemTime};

pub fn month_key(timestamp: &DateTime<Utc>) -> String {
    format!("{}-{:02}", timestamp.year(), timestamp.month())
}

/// Trims every entry, drops blanks and repeats, keeps first-seen order.
pub fn dedup_trimmed<'a, I>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen = HashSet::new();
    items
        .into_iter()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter(|s| seen.insert(*s))
        .map(str::to_string)
        .collect()
}

/// Time since `path` was last modified, `None` if it does not exist.
pub fn modified_age(path: &Path) -> Option<Duration> {
    let modified = std::fs::metadata(path).and_then(|m| m.modified()).ok()?;
    Some(
        SystemTime::now()
            .duration_since(modified)
            .unwrap_or(Duration::ZERO),
    )
}

pub fn split_repo_name(name: &str) -> Option<(&str, &str)> {
    let (owner, repo) = name.split_once('/')?;
    if owner.is_empty() || repo.is_empty() || repo.contains('/') {
        return None;
    }
    Some((owner, repo))
}
