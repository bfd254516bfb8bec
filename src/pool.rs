//! Bounded-parallelism task runner with a live "currently running" progress line.

use crate::error::{ContribError, Result};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Shared spinner plus the set of task labels currently in flight.
#[derive(Clone)]
pub struct Progress {
    bar: ProgressBar,
    verb: Arc<Mutex<String>>,
    active: Arc<Mutex<Vec<String>>>,
}

impl Progress {
    pub fn spinner() -> Self {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.enable_steady_tick(Duration::from_millis(100));
        Self::with_bar(bar)
    }

    pub fn hidden() -> Self {
        Self::with_bar(ProgressBar::hidden())
    }

    fn with_bar(bar: ProgressBar) -> Self {
        Self {
            bar,
            verb: Arc::new(Mutex::new(String::new())),
            active: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn active_guard(&self) -> MutexGuard<'_, Vec<String>> {
        self.active.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Labels of the tasks that have started and not yet finished.
    pub fn active(&self) -> Vec<String> {
        self.active_guard().clone()
    }

    pub fn set_verb(&self, verb: &str) {
        *self.verb.lock().unwrap_or_else(|e| e.into_inner()) = verb.to_string();
    }

    fn verb(&self) -> String {
        self.verb.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn set_message(&self, msg: impl Into<String>) {
        self.bar.set_message(msg.into());
    }

    pub fn succeed(&self, msg: impl AsRef<str>) {
        self.bar
            .println(format!("{} {}", style("✔").green(), msg.as_ref()));
    }

    pub fn fail(&self, msg: impl AsRef<str>) {
        self.bar.println(format!("{} {}", style("✖").red(), msg.as_ref()));
    }

    pub fn info(&self, msg: impl AsRef<str>) {
        self.bar.println(format!("{} {}", style("ℹ").blue(), msg.as_ref()));
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }

    fn refresh(&self, active: &[String]) {
        if !active.is_empty() {
            self.bar
                .set_message(format!("{} {}", self.verb(), active.join(", ")));
        }
    }

    fn started(&self, label: &str) {
        let mut active = self.active_guard();
        active.push(label.to_string());
        self.refresh(&active);
    }

    fn settled<T>(&self, label: &str, outcome: &Result<T>) {
        let mut active = self.active_guard();
        if let Some(pos) = active.iter().position(|l| l == label) {
            active.remove(pos);
        }
        if let Err(err) = outcome {
            self.fail(format!("{label}: {err}"));
        }
        self.refresh(&active);
    }

    pub fn task(&self, label: &str) -> TaskProgress {
        TaskProgress {
            progress: self.clone(),
            label: label.to_string(),
        }
    }
}

/// Progress handle given to one pooled task.
#[derive(Clone)]
pub struct TaskProgress {
    progress: Progress,
    label: String,
}

impl TaskProgress {
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn update(&self, detail: impl AsRef<str>) {
        self.progress
            .set_message(format!("{} {}", self.label, detail.as_ref().trim_end()));
    }

    pub fn succeed(&self, msg: impl AsRef<str>) {
        self.progress.succeed(msg);
    }
}

#[derive(Debug)]
pub struct TaskResult<T> {
    pub label: String,
    pub outcome: Result<T>,
}

/// Runs labelled async tasks, at most `limit` at a time.
///
/// Each task's error or panic is captured in its own [`TaskResult`]; one
/// failure does not cancel the others. Results arrive in completion order.
pub struct Pool {
    limit: usize,
    progress: Progress,
}

impl Pool {
    pub fn new(limit: usize, progress: Progress) -> Self {
        Self {
            limit: limit.max(1),
            progress,
        }
    }

    pub async fn run<T, F, Fut>(&self, verb: &str, tasks: Vec<(String, F)>) -> Vec<TaskResult<T>>
    where
        T: Send + 'static,
        F: FnOnce(TaskProgress) -> Fut + Send + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        self.progress.set_verb(verb);
        let semaphore = Arc::new(Semaphore::new(self.limit));
        let mut set = JoinSet::new();

        for (label, task) in tasks {
            let semaphore = semaphore.clone();
            let progress = self.progress.clone();
            set.spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => {
                        return TaskResult {
                            label,
                            outcome: Err(ContribError::Other("task pool closed".to_string())),
                        }
                    }
                };
                progress.started(&label);
                // a panic surfaces as a JoinError here, still under this label
                let outcome = match tokio::spawn(task(progress.task(&label))).await {
                    Ok(outcome) => outcome,
                    Err(err) => Err(err.into()),
                };
                progress.settled(&label, &outcome);
                TaskResult { label, outcome }
            });
        }

        let mut results = Vec::with_capacity(set.len());
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok(result) => results.push(result),
                Err(err) => results.push(TaskResult {
                    label: "<aborted>".to_string(),
                    outcome: Err(err.into()),
                }),
            }
        }
        results
    }
}

/// Unwraps a settled pool run, failing with every error if any task failed.
pub fn settle<T>(stage: &str, results: Vec<TaskResult<T>>) -> Result<Vec<(String, T)>> {
    let mut ok = Vec::with_capacity(results.len());
    let mut failures = Vec::new();
    for TaskResult { label, outcome } in results {
        match outcome {
            Ok(value) => ok.push((label, value)),
            Err(err) => failures.push(format!("{label}: {err}")),
        }
    }
    if failures.is_empty() {
        Ok(ok)
    } else {
        failures.sort();
        Err(ContribError::Tasks {
            stage: stage.to_string(),
            failures,
        })
    }
}
