use chrono::{TimeZone, Utc};
use contribstat::aggregate::{collab_graph, lang_series, sort_by_date, type_totals};
use contribstat::model::{CommitType, CommitView, GraphEdge, Issue, IssueMap, NodeKind};
use pretty_assertions::assert_eq;
use std::collections::BTreeMap;

fn view(
    year: i32,
    month: u32,
    day: u32,
    langs: &[(&str, u32)],
    types: &[(CommitType, u32)],
) -> CommitView {
    CommitView {
        repo: "alice/app".to_string(),
        sha: format!("{year}{month:02}{day:02}"),
        date: Utc.with_ymd_and_hms(year, month, day, 8, 0, 0).unwrap(),
        message: "change".to_string(),
        langs: langs.iter().map(|(l, c)| (l.to_string(), *c)).collect(),
        types: types.iter().copied().collect(),
    }
}

fn issue(number: u64, participants: &[&str]) -> Issue {
    Issue {
        title: format!("issue {number}"),
        created: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        number,
        participants: participants.iter().map(|p| p.to_string()).collect(),
    }
}

#[test]
fn lang_series_builds_month_columns_in_order() {
    let commits = vec![
        view(2024, 1, 10, &[("go", 2)], &[]),
        view(2024, 2, 3, &[("go", 1), ("python", 3)], &[]),
    ];

    let series = lang_series(&commits);
    assert_eq!(series.months, vec!["2024-01".to_string(), "2024-02".to_string()]);
    assert_eq!(series.languages.get("go"), Some(&vec![2, 1]));
    assert_eq!(series.languages.get("python"), Some(&vec![0, 3]));
}

#[test]
fn lang_series_drops_unknown_rows_but_keeps_their_months() {
    let commits = vec![
        view(2024, 1, 10, &[("rust", 1)], &[]),
        view(2024, 1, 20, &[("rust", 2), ("unknown", 5)], &[]),
        view(2024, 3, 1, &[("unknown", 4)], &[]),
    ];

    let series = lang_series(&commits);
    assert_eq!(series.months, vec!["2024-01".to_string(), "2024-03".to_string()]);
    assert_eq!(series.languages.len(), 1);
    assert_eq!(series.languages.get("rust"), Some(&vec![3, 0]));
    assert!(!series.languages.contains_key("unknown"));
}

#[test]
fn sort_by_date_establishes_ascending_input() {
    let mut commits = vec![
        view(2024, 5, 1, &[("go", 1)], &[]),
        view(2023, 12, 1, &[("go", 4)], &[]),
        view(2024, 2, 1, &[("go", 2)], &[]),
    ];
    sort_by_date(&mut commits);

    let series = lang_series(&commits);
    assert_eq!(
        series.months,
        vec!["2023-12".to_string(), "2024-02".to_string(), "2024-05".to_string()]
    );
    assert_eq!(series.languages.get("go"), Some(&vec![4, 2, 1]));
}

#[test]
fn lang_series_of_nothing_is_empty() {
    let series = lang_series(&[]);
    assert!(series.months.is_empty());
    assert!(series.languages.is_empty());
}

#[test]
fn type_totals_sort_descending_with_unknown_last() {
    let commits = vec![
        view(2024, 1, 1, &[], &[(CommitType::Test, 2), (CommitType::Code, 4)]),
        view(2024, 1, 2, &[], &[(CommitType::Test, 3), (CommitType::Code, 6)]),
    ];

    let totals = type_totals(&commits);
    let order: Vec<(CommitType, u64)> = totals.iter().map(|t| (t.type_name, t.count)).collect();
    assert_eq!(
        order,
        vec![
            (CommitType::Code, 10),
            (CommitType::Test, 5),
            (CommitType::Docs, 0),
            (CommitType::Ci, 0),
            (CommitType::Unknown, 0),
        ]
    );
    assert_eq!(totals[0].color, "green");
    assert_eq!(totals[4].color, "gray");
}

#[test]
fn unknown_stays_last_even_when_largest() {
    let commits = vec![view(
        2024,
        1,
        1,
        &[],
        &[(CommitType::Unknown, 50), (CommitType::Docs, 1)],
    )];

    let totals = type_totals(&commits);
    assert_eq!(totals[0].type_name, CommitType::Docs);
    assert_eq!(totals.last().map(|t| (t.type_name, t.count)), Some((CommitType::Unknown, 50)));
}

#[test]
fn collab_graph_links_user_repos_and_participants() {
    let mut issues: IssueMap = BTreeMap::new();
    issues.insert(
        "o/r1".to_string(),
        vec![issue(1, &["alice", "bob", "carol"]), issue(2, &["alice", "bob", "bob"])],
    );
    issues.insert("o/r2".to_string(), vec![issue(3, &["bob", "Alice"])]);
    issues.insert("o/quiet".to_string(), vec![]);

    let graph = collab_graph("alice", &issues);

    let nodes: Vec<(&str, NodeKind, u64)> = graph
        .nodes
        .iter()
        .map(|n| (n.id.as_str(), n.kind, n.weight))
        .collect();
    assert_eq!(
        nodes,
        vec![
            ("alice", NodeKind::User, 3),
            ("o/r1", NodeKind::Repo, 2),
            ("o/r2", NodeKind::Repo, 1),
            ("bob", NodeKind::Participant, 3),
            ("carol", NodeKind::Participant, 1),
        ]
    );

    let edge = |s: &str, t: &str, w: u64| GraphEdge {
        source: s.to_string(),
        target: t.to_string(),
        weight: w,
    };
    assert_eq!(
        graph.edges,
        vec![
            edge("alice", "o/r1", 2),
            edge("alice", "o/r2", 1),
            edge("o/r1", "bob", 2),
            edge("o/r1", "carol", 1),
            edge("o/r2", "bob", 1),
        ]
    );
    assert_eq!(graph.max_weight, 3);
}

#[test]
fn collab_graph_without_issues_is_just_the_user() {
    let graph = collab_graph("alice", &IssueMap::new());
    assert_eq!(graph.nodes.len(), 1);
    assert!(graph.edges.is_empty());
    assert_eq!(graph.max_weight, 0);
}
