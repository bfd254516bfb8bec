pub mod client;
pub mod contributions;
pub mod issues;
pub mod query;

pub use client::{GitHubApi, GraphQlClient};
pub use contributions::{merge_repo, Collection, ContributionCollector};
pub use issues::{fetch_repo_issues, IssueCollector};
pub use query::{ContributionWindow, IssuePage};
