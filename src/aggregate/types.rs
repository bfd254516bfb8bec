use crate::model::{CommitType, CommitView, TypeTotal};

/// Sums file types over `commits` into the five fixed buckets, largest first.
/// `unknown` always sorts last.
pub fn type_totals(commits: &[CommitView]) -> Vec<TypeTotal> {
    let mut totals: Vec<TypeTotal> = CommitType::ALL
        .iter()
        .map(|t| TypeTotal {
            type_name: *t,
            count: 0,
            color: t.color().to_string(),
        })
        .collect();

    for commit in commits {
        for total in totals.iter_mut() {
            total.count += commit.types.get(&total.type_name).copied().unwrap_or(0) as u64;
        }
    }

    sort_totals(&mut totals);
    totals
}

pub fn sort_totals(totals: &mut [TypeTotal]) {
    totals.sort_by(|a, b| {
        let a_unknown = a.type_name == CommitType::Unknown;
        let b_unknown = b.type_name == CommitType::Unknown;
        a_unknown
            .cmp(&b_unknown)
            .then_with(|| b.count.cmp(&a.count))
    });
}
