//! File path classification.
//!
//! ORDER MATTERS: type rules are checked top to bottom and the first match
//! wins, so `src/a.test.md` is `test`, not `docs`. The final "skip" rule yields
//! no type at all, which is different from `unknown`.

use crate::model::{Commit, CommitType, CommitView, RepoName};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;

pub const UNKNOWN_LANGUAGE: &str = "unknown";

static LANGUAGES: &[(&str, &str)] = &[
    ("go", "go"),
    ("kt", "kotlin"),
    ("java", "java"),
    ("js", "javascript"),
    ("mjs", "javascript"),
    ("cjs", "javascript"),
    ("jsx", "javascript"),
    ("ts", "typescript"),
    ("tsx", "typescript"),
    ("c", "c"),
    ("cc", "c++"),
    ("cxx", "c++"),
    ("cpp", "c++"),
    ("c++", "c++"),
    ("h", "c"),
    ("hh", "c++"),
    ("hxx", "c++"),
    ("hpp", "c++"),
    ("cs", "csharp"),
    ("dart", "dart"),
    ("erl", "erlang"),
    ("hrl", "erlang"),
    ("ex", "elixir"),
    ("hs", "haskell"),
    ("html", "html"),
    ("htm", "html"),
    ("css", "css"),
    ("less", "less"),
    ("scss", "scss"),
    ("sass", "sass"),
    ("lua", "lua"),
    ("ml", "ocaml"),
    ("php", "php"),
    ("py", "python"),
    ("ipynb", "python"),
    ("rb", "ruby"),
    ("rs", "rust"),
    ("sh", "shell"),
    ("ps1", "powershell"),
    ("swift", "swift"),
    ("md", "markdown"),
    ("mdx", "markdown"),
    ("markdown", "markdown"),
    ("svelte", "svelte"),
    ("vue", "vue"),
    ("dockerfile", "docker"),
    ("vbs", "vbscript"),
    ("frm", "visualbasic"),
    ("frx", "visualbasic"),
    ("bas", "visualbasic"),
    ("cls", "visualbasic"),
    ("vb", "visualbasic"),
    ("vba", "visualbasic"),
    ("vbp", "visualbasic"),
    ("vbw", "visualbasic"),
    ("prisma", "prisma"),
];

pub struct TypeRule {
    /// `None` marks files that are deliberately left out of type counts.
    pub tag: Option<CommitType>,
    pub patterns: Vec<Regex>,
}

fn rule(tag: Option<CommitType>, patterns: &[&str]) -> TypeRule {
    TypeRule {
        tag,
        patterns: patterns
            .iter()
            .map(|p| Regex::new(&format!("(?i){p}")).expect("valid regex"))
            .collect(),
    }
}

pub static TYPE_RULES: Lazy<Vec<TypeRule>> = Lazy::new(|| {
    vec![
        rule(Some(CommitType::Test), &[r".*\.test\..*$"]),
        rule(Some(CommitType::Docs), &[r".*\.(md|mdx|markdown)"]),
        rule(
            Some(CommitType::Ci),
            &[
                r"^\.github/workflows/.*\.yml$",
                r"^\.circleci/config\.yml$",
                r"^\.gitlab-ci\.yml$",
            ],
        ),
        rule(
            Some(CommitType::Code),
            &[r".*\.(go|kt|java|js|mjs|cjs|jsx|ts|tsx|c|cc|cxx|cpp|c\+\+|h|hh|hxx|hpp|cs|dart|erl|hrl|ex|hs|html|htm|css|less|scss|sass|lua|ml|vbs|php|py|ipynb|rb|rs|sh|ps1|bat|cmd|prisma|swift|md|mdx|svelte|vue|dockerfile|frm|frx|bas|cls|vb|vba|vbp|vbw)$"],
        ),
        rule(
            None,
            &[
                r"\.git.*$",
                r"\..*?ignore$",
                r"\..*?rc$",
                r"\.mca$",
                r"\.(lock|json|toml|yaml|yml|map)$",
                r"\.(png|jpg|jpeg|gif|svg|ico|webp)$",
                r"\.(eot|ttf|woff|woff2|otf)$",
                r"\.(mp3|m4a|mp4|webm|ogg|wav|midi|m3u8|mov)$",
                r"\.(exe|bin|o|a|out|so|dll|lib|obj|jar|dat)$",
                r"\.(zip|tar|rar|gz|7z|bz2|iso|dmg|npy|下載)$",
                r"\.(txt|srt|vtt|log|csv|tsv|xml|pdf|doc|docx|xls|xlsx|ppt|pptx)#?$",
                r"\.env.example$",
                r"\.(DS_Store|clang-format|nojekyll|cargo-ok|replit)$",
            ],
        ),
    ]
});

/// Language tag from the lowercased last extension of the file name. A name
/// without a dot is its own extension (`Dockerfile` -> `docker`).
pub fn language(path: &str) -> &'static str {
    let file = path.rsplit('/').next().unwrap_or(path);
    let ext = file.rsplit('.').next().unwrap_or(file).to_lowercase();
    LANGUAGES
        .iter()
        .find(|(e, _)| *e == ext)
        .map(|(_, lang)| *lang)
        .unwrap_or(UNKNOWN_LANGUAGE)
}

/// Classifies paths and remembers the ones no rule covers.
#[derive(Default)]
pub struct Classifier {
    uncovered: Mutex<BTreeSet<String>>,
}

impl Classifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filetype(&self, path: &str) -> Option<CommitType> {
        for rule in TYPE_RULES.iter() {
            if rule.patterns.iter().any(|re| re.is_match(path)) {
                return rule.tag;
            }
        }

        self.uncovered
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(path.to_string());
        Some(CommitType::Unknown)
    }

    pub fn uncovered(&self) -> Vec<String> {
        self.uncovered
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .cloned()
            .collect()
    }

    pub fn clear(&self) {
        self.uncovered
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }

    pub fn view(&self, repo: &RepoName, commit: &Commit) -> CommitView {
        let mut langs: BTreeMap<String, u32> = BTreeMap::new();
        let mut types: BTreeMap<CommitType, u32> = BTreeMap::new();
        for file in &commit.files {
            *langs.entry(language(file).to_string()).or_insert(0) += 1;
            if let Some(tag) = self.filetype(file) {
                *types.entry(tag).or_insert(0) += 1;
            }
        }

        CommitView {
            repo: repo.clone(),
            sha: commit.sha.clone(),
            date: commit.date,
            message: commit.message.clone(),
            langs,
            types,
        }
    }
}
