pub mod log;
pub mod mirror;

pub use log::{filter_after, parse_log, CommitMiner};
pub use mirror::{plan, MirrorAction, MirrorOutcome, RepositoryMirror};
