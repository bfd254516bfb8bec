use crate::model::{CollabGraph, GraphEdge, GraphNode, IssueMap, NodeKind};
use std::collections::{BTreeMap, BTreeSet};

/// Issue collaboration graph rooted at `username`.
///
/// Repositories without issues are left out. A participant's weight is the
/// number of issues they took part in; the subject user never appears as a
/// participant.
pub fn collab_graph(username: &str, issues: &IssueMap) -> CollabGraph {
    let root = username.to_string();
    let is_root = |login: &str| login.eq_ignore_ascii_case(username);

    let mut repo_nodes = Vec::new();
    let mut edges = Vec::new();
    let mut participant_weights: BTreeMap<String, u64> = BTreeMap::new();
    let mut participant_edges = Vec::new();

    for (repo, repo_issues) in issues {
        if repo_issues.is_empty() {
            continue;
        }
        let issue_count = repo_issues.len() as u64;
        repo_nodes.push(GraphNode {
            id: repo.clone(),
            kind: NodeKind::Repo,
            weight: issue_count,
        });
        edges.push(GraphEdge {
            source: root.clone(),
            target: repo.clone(),
            weight: issue_count,
        });

        let mut per_repo: BTreeMap<&str, u64> = BTreeMap::new();
        for issue in repo_issues {
            let distinct: BTreeSet<&str> = issue
                .participants
                .iter()
                .map(String::as_str)
                .filter(|login| !is_root(*login))
                .collect();
            for login in distinct {
                *per_repo.entry(login).or_insert(0) += 1;
                *participant_weights.entry(login.to_string()).or_insert(0) += 1;
            }
        }
        for (login, weight) in per_repo {
            participant_edges.push(GraphEdge {
                source: repo.clone(),
                target: login.to_string(),
                weight,
            });
        }
    }

    let total_issues: u64 = repo_nodes.iter().map(|n| n.weight).sum();
    let max_weight = repo_nodes
        .iter()
        .map(|n| n.weight)
        .chain(participant_weights.values().copied())
        .max()
        .unwrap_or(0);

    let mut nodes = Vec::with_capacity(1 + repo_nodes.len() + participant_weights.len());
    nodes.push(GraphNode {
        id: root,
        kind: NodeKind::User,
        weight: total_issues,
    });
    nodes.extend(repo_nodes);
    nodes.extend(participant_weights.into_iter().map(|(id, weight)| GraphNode {
        id,
        kind: NodeKind::Participant,
        weight,
    }));
    edges.extend(participant_edges);

    CollabGraph {
        nodes,
        edges,
        max_weight,
    }
}
