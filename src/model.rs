use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const SCHEMA_VERSION: u32 = 1;

/// Fully-qualified `owner/name`.
pub type RepoName = String;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub name: Option<String>,
    pub company: Option<String>,
    pub avatar: String,
    pub created: DateTime<Utc>,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Repository {
    pub name: RepoName,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub title: String,
    pub created: DateTime<Utc>,
    pub number: u64,
    pub participants: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Commit {
    pub sha: String,
    pub date: DateTime<Utc>,
    pub message: String,
    pub files: Vec<String>,
}

/// A repository while collection is still running. `issues` stays empty until
/// the issue stage fills it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepoEntry {
    pub name: RepoName,
    pub description: Option<String>,
    #[serde(default)]
    pub issues: Vec<Issue>,
}

impl RepoEntry {
    pub fn new(repo: Repository) -> Self {
        Self {
            name: repo.name,
            description: repo.description,
            issues: Vec::new(),
        }
    }

    /// Later fields win, collected issues are kept.
    pub fn merge(&mut self, repo: Repository) {
        self.name = repo.name;
        self.description = repo.description;
    }

    pub fn repository(&self) -> Repository {
        Repository {
            name: self.name.clone(),
            description: self.description.clone(),
        }
    }
}

pub type RepoMap = BTreeMap<RepoName, RepoEntry>;
pub type IssueMap = BTreeMap<RepoName, Vec<Issue>>;
pub type CommitMap = BTreeMap<RepoName, Vec<Commit>>;

/// What the remote query stage produces and what the query cache stores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub user: User,
    pub repos: Vec<RepoEntry>,
}

impl Profile {
    pub fn repositories(&self) -> Vec<Repository> {
        self.repos.iter().map(RepoEntry::repository).collect()
    }

    pub fn issues(&self) -> IssueMap {
        self.repos
            .iter()
            .map(|r| (r.name.clone(), r.issues.clone()))
            .collect()
    }
}

/// The four persisted documents of a finished run.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub user: User,
    pub repos: Vec<Repository>,
    pub issues: IssueMap,
    pub commits: CommitMap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommitType {
    Test,
    Docs,
    Ci,
    Code,
    Unknown,
}

impl CommitType {
    pub const ALL: [CommitType; 5] = [
        CommitType::Test,
        CommitType::Docs,
        CommitType::Ci,
        CommitType::Code,
        CommitType::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CommitType::Test => "test",
            CommitType::Docs => "docs",
            CommitType::Ci => "ci",
            CommitType::Code => "code",
            CommitType::Unknown => "unknown",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            CommitType::Test => "red",
            CommitType::Docs => "orange",
            CommitType::Ci => "blue",
            CommitType::Code => "green",
            CommitType::Unknown => "gray",
        }
    }
}

/// A mined commit together with its classified file histograms.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommitView {
    pub repo: RepoName,
    pub sha: String,
    pub date: DateTime<Utc>,
    pub message: String,
    pub langs: BTreeMap<String, u32>,
    pub types: BTreeMap<CommitType, u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LangSeries {
    /// `YYYY-MM` columns in first-seen order.
    pub months: Vec<String>,
    pub languages: BTreeMap<String, Vec<u32>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeTotal {
    pub type_name: CommitType,
    pub count: u64,
    pub color: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    User,
    Repo,
    Participant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: String,
    pub kind: NodeKind,
    pub weight: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub source: String,
    pub target: String,
    pub weight: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollabGraph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
    pub max_weight: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsOutput {
    pub version: u32,
    pub generated_at: DateTime<Utc>,
    pub dataset_path: String,
    pub commits: usize,
    pub langs: LangSeries,
    pub types: Vec<TypeTotal>,
    pub graph: CollabGraph,
    pub uncovered: Vec<String>,
}
