use crate::classify::UNKNOWN_LANGUAGE;
use crate::model::{CommitView, LangSeries};
use crate::util::month_key;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Orders commits oldest first; [`lang_series`] expects this.
pub fn sort_by_date(commits: &mut [CommitView]) {
    commits.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.sha.cmp(&b.sha)));
}

/// Monthly per-language file counts.
///
/// Month columns are opened in the order they are first seen, so `commits`
/// must already be ascending by date. `unknown` gets no row, but a month made
/// only of unknown files still gets a column.
pub fn lang_series(commits: &[CommitView]) -> LangSeries {
    let all_langs: BTreeSet<&str> = commits
        .iter()
        .flat_map(|c| c.langs.keys().map(String::as_str))
        .filter(|lang| *lang != UNKNOWN_LANGUAGE)
        .collect();

    let mut languages: BTreeMap<String, Vec<u32>> = all_langs
        .iter()
        .map(|lang| (lang.to_string(), Vec::new()))
        .collect();
    let mut months: Vec<String> = Vec::new();
    let mut columns: HashMap<String, usize> = HashMap::new();

    for commit in commits {
        let month = month_key(&commit.date);
        let column = match columns.get(&month) {
            Some(&column) => column,
            None => {
                let column = months.len();
                columns.insert(month.clone(), column);
                months.push(month);
                for series in languages.values_mut() {
                    series.push(0);
                }
                column
            }
        };

        for (lang, count) in &commit.langs {
            if let Some(series) = languages.get_mut(lang) {
                series[column] += count;
            }
        }
    }

    LangSeries { months, languages }
}
