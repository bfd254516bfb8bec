use crate::config::Config;
use crate::dataset::DatasetCache;
use crate::model::{CollabGraph, LangSeries, NodeKind, StatsOutput, TypeTotal, SCHEMA_VERSION};
use crate::service::AggregationService;
use anyhow::Context;
use chrono::Utc;
use console::style;
use serde_json::json;
use std::sync::Arc;

pub async fn exec(
    config: &Config,
    username: &str,
    repo: Option<String>,
    json: bool,
    ndjson: bool,
) -> anyhow::Result<()> {
    let dir = config.dataset_dir(username);
    let cache = Arc::new(DatasetCache::new(&dir));
    cache
        .dataset()
        .with_context(|| format!("Failed to load dataset from {}", dir.display()))?;

    let service = AggregationService::spawn(cache.clone(), username);
    let (langs, types, graph) = tokio::try_join!(
        service.langs(repo.clone()),
        service.types(repo.clone()),
        service.graph(),
    )
    .context("Failed to aggregate dataset")?;
    let uncovered = service
        .uncovered()
        .await
        .context("Failed to collect uncovered paths")?;

    let commits = match &repo {
        Some(name) => cache.repo_views(name)?.len(),
        None => cache.commit_views()?.len(),
    };

    let output = StatsOutput {
        version: SCHEMA_VERSION,
        generated_at: Utc::now(),
        dataset_path: dir.to_string_lossy().to_string(),
        commits,
        langs,
        types,
        graph,
        uncovered,
    };

    if json {
        output_json(&output)?;
    } else if ndjson {
        output_ndjson(&output)?;
    } else {
        output_summary(&output, username);
    }
    Ok(())
}

fn output_json(output: &StatsOutput) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(output)?);
    Ok(())
}

fn output_ndjson(output: &StatsOutput) -> anyhow::Result<()> {
    for (i, month) in output.langs.months.iter().enumerate() {
        let counts: serde_json::Map<String, serde_json::Value> = output
            .langs
            .languages
            .iter()
            .map(|(lang, series)| (lang.clone(), json!(series[i])))
            .collect();
        println!("{}", json!({ "kind": "month", "month": month, "langs": counts }));
    }
    for total in &output.types {
        println!("{}", json!({ "kind": "type", "type": total }));
    }
    for node in &output.graph.nodes {
        println!("{}", json!({ "kind": "node", "node": node }));
    }
    for edge in &output.graph.edges {
        println!("{}", json!({ "kind": "edge", "edge": edge }));
    }
    for path in &output.uncovered {
        println!("{}", json!({ "kind": "uncovered", "path": path }));
    }
    Ok(())
}

fn output_summary(output: &StatsOutput, username: &str) {
    println!("{}", style(format!("Contributions of {username}")).bold());
    println!("{}", "─".repeat(50));
    println!("Commits: {}", style(output.commits).cyan());

    print_langs(&output.langs);
    print_types(&output.types);
    print_graph(&output.graph);

    if !output.uncovered.is_empty() {
        println!(
            "\n{} {} paths matched no type rule (use --json to list them)",
            style("Note:").yellow(),
            output.uncovered.len()
        );
    }
}

fn print_langs(langs: &LangSeries) {
    println!("\n{}", style("Languages").bold());
    if langs.months.is_empty() {
        println!("  No commits");
        return;
    }
    let first = langs.months.first().map(String::as_str).unwrap_or("");
    let last = langs.months.last().map(String::as_str).unwrap_or("");
    println!("  {} months ({first} .. {last})", langs.months.len());

    let mut totals: Vec<(&String, u64)> = langs
        .languages
        .iter()
        .map(|(lang, series)| (lang, series.iter().map(|c| *c as u64).sum()))
        .collect();
    totals.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    for (lang, total) in totals.iter().take(10) {
        println!("  {:<14} {:>8}", lang, style(total).green());
    }
}

fn print_types(types: &[TypeTotal]) {
    println!("\n{}", style("Change types").bold());
    let max = types.iter().map(|t| t.count).max().unwrap_or(0).max(1);
    for total in types {
        let width = ((total.count as f64 / max as f64) * 30.0).round() as usize;
        println!(
            "  {:<8} {:>8} {}",
            total.type_name.as_str(),
            total.count,
            style("█".repeat(width)).dim()
        );
    }
}

fn print_graph(graph: &CollabGraph) {
    println!("\n{}", style("Issue collaboration").bold());
    let repos = graph.nodes.iter().filter(|n| n.kind == NodeKind::Repo).count();
    let mut people: Vec<_> = graph
        .nodes
        .iter()
        .filter(|n| n.kind == NodeKind::Participant)
        .collect();
    println!("  {} repositories, {} participants", repos, people.len());
    people.sort_by(|a, b| b.weight.cmp(&a.weight).then_with(|| a.id.cmp(&b.id)));
    for node in people.iter().take(5) {
        println!("  {:<24} {:>5}", node.id, style(node.weight).yellow());
    }
}
