//! GraphQL documents and their response shapes.

use crate::config::{ISSUE_PAGE_SIZE, PARTICIPANT_SAMPLE};
use crate::model::{Issue, Repository, User};
use chrono::{DateTime, Utc};
use serde::Deserialize;

pub fn contributions_query() -> &'static str {
    r#"
    query ($username: String!, $from: DateTime!, $to: DateTime!, $max: Int!) {
        user(login: $username) {
            login
            name
            company
            avatar: avatarUrl
            created: createdAt
            url
            contribs: contributionsCollection(from: $from, to: $to) {
                commit: commitContributionsByRepository(maxRepositories: $max) {
                    repository {
                        name: nameWithOwner
                        description
                    }
                }
                issue: issueContributionsByRepository(maxRepositories: $max) {
                    repository {
                        name: nameWithOwner
                        description
                    }
                }
            }
        }
    }"#
}

pub fn issues_query() -> String {
    format!(
        r#"
    query ($owner: String!, $repo: String!, $to: String, $username: String!) {{
        repository(owner: $owner, name: $repo) {{
            issues(filterBy: {{ createdBy: $username }}, last: {ISSUE_PAGE_SIZE}, before: $to) {{
                total: totalCount
                page: pageInfo {{
                    next: hasPreviousPage
                    cursor: startCursor
                }}
                nodes {{
                    title
                    created: createdAt
                    number
                    participants(first: {PARTICIPANT_SAMPLE}) {{
                        nodes {{
                            login
                        }}
                    }}
                }}
            }}
        }}
    }}"#
    )
}

#[derive(Debug, Deserialize)]
pub struct GraphQlResponse<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
pub struct GraphQlError {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct ContributionsData {
    pub user: Option<UserNode>,
}

#[derive(Debug, Deserialize)]
pub struct UserNode {
    pub name: Option<String>,
    pub company: Option<String>,
    pub avatar: String,
    pub created: DateTime<Utc>,
    pub url: String,
    pub contribs: ContribsNode,
}

#[derive(Debug, Deserialize)]
pub struct ContribsNode {
    #[serde(default)]
    pub commit: Vec<RepoContribution>,
    #[serde(default)]
    pub issue: Vec<RepoContribution>,
}

#[derive(Debug, Deserialize)]
pub struct RepoContribution {
    pub repository: Repository,
}

#[derive(Debug, Deserialize)]
pub struct IssuesData {
    pub repository: Option<RepositoryNode>,
}

#[derive(Debug, Deserialize)]
pub struct RepositoryNode {
    pub issues: IssueConnection,
}

#[derive(Debug, Deserialize)]
pub struct IssueConnection {
    pub total: u64,
    pub page: PageInfo,
    #[serde(default)]
    pub nodes: Vec<IssueNode>,
}

#[derive(Debug, Deserialize)]
pub struct PageInfo {
    pub next: bool,
    pub cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct IssueNode {
    pub title: String,
    pub created: DateTime<Utc>,
    pub number: u64,
    pub participants: LoginConnection,
}

#[derive(Debug, Deserialize)]
pub struct LoginConnection {
    #[serde(default)]
    pub nodes: Vec<LoginNode>,
}

#[derive(Debug, Deserialize)]
pub struct LoginNode {
    pub login: String,
}

/// One contribution window, already mapped to domain types.
#[derive(Debug, Clone, PartialEq)]
pub struct ContributionWindow {
    pub user: User,
    pub commit_repos: Vec<Repository>,
    pub issue_repos: Vec<Repository>,
}

impl From<UserNode> for ContributionWindow {
    fn from(node: UserNode) -> Self {
        Self {
            user: User {
                name: node.name,
                company: node.company,
                avatar: node.avatar,
                created: node.created,
                url: node.url,
            },
            commit_repos: node
                .contribs
                .commit
                .into_iter()
                .map(|c| c.repository)
                .collect(),
            issue_repos: node
                .contribs
                .issue
                .into_iter()
                .map(|c| c.repository)
                .collect(),
        }
    }
}

/// One backward page of a user's issues in a repository.
#[derive(Debug, Clone, PartialEq)]
pub struct IssuePage {
    pub total: u64,
    /// More (older) issues exist before `cursor`.
    pub has_more: bool,
    pub cursor: Option<String>,
    pub issues: Vec<Issue>,
}

impl From<IssueConnection> for IssuePage {
    fn from(conn: IssueConnection) -> Self {
        Self {
            total: conn.total,
            has_more: conn.page.next,
            cursor: conn.page.cursor,
            issues: conn
                .nodes
                .into_iter()
                .map(|node| Issue {
                    title: node.title,
                    created: node.created,
                    number: node.number,
                    participants: node
                        .participants
                        .nodes
                        .into_iter()
                        .map(|p| p.login)
                        .collect(),
                })
                .collect(),
        }
    }
}
