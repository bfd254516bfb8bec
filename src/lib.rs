pub mod aggregate;
pub mod cache;
pub mod classify;
pub mod cli;
pub mod config;
pub mod dataset;
pub mod error;
pub mod git;
pub mod github;
pub mod model;
pub mod pipeline;
pub mod pool;
pub mod service;
pub mod stats;
pub mod util;
