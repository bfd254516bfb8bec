use contribstat::error::ContribError;
use contribstat::pool::{settle, Pool, Progress, TaskProgress};
use pretty_assertions::assert_eq;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn pool_never_exceeds_its_limit() {
    let running = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));

    let tasks: Vec<_> = (0..12)
        .map(|i| {
            let running = running.clone();
            let peak = peak.clone();
            let task = move |_progress: TaskProgress| async move {
                let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(20)).await;
                running.fetch_sub(1, Ordering::SeqCst);
                Ok::<_, ContribError>(i)
            };
            (format!("task-{i}"), task)
        })
        .collect();

    let pool = Pool::new(3, Progress::hidden());
    let results = pool.run("Running", tasks).await;

    assert_eq!(results.len(), 12);
    assert!(peak.load(Ordering::SeqCst) <= 3);
    assert!(peak.load(Ordering::SeqCst) >= 1);

    let mut values: Vec<i32> = settle("test", results)
        .unwrap()
        .into_iter()
        .map(|(_, v)| v)
        .collect();
    values.sort();
    assert_eq!(values, (0..12).collect::<Vec<_>>());
}

#[tokio::test]
async fn one_failure_does_not_stop_the_others() {
    let finished = Arc::new(AtomicUsize::new(0));
    let tasks: Vec<_> = ["a/ok", "b/bad", "c/ok"]
        .iter()
        .map(|name| {
            let finished = finished.clone();
            let task = move |progress: TaskProgress| async move {
                finished.fetch_add(1, Ordering::SeqCst);
                if progress.label() == "b/bad" {
                    return Err(ContribError::Api("rate limited".to_string()));
                }
                Ok(progress.label().len())
            };
            (name.to_string(), task)
        })
        .collect();

    let results = Pool::new(1, Progress::hidden()).run("Running", tasks).await;
    assert_eq!(finished.load(Ordering::SeqCst), 3);
    assert_eq!(results.iter().filter(|r| r.outcome.is_ok()).count(), 2);

    match settle("issue collection", results).unwrap_err() {
        ContribError::Tasks { stage, failures } => {
            assert_eq!(stage, "issue collection");
            assert_eq!(failures, vec!["b/bad: GitHub API error: rate limited".to_string()]);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn panicking_task_is_reported_under_its_label() {
    let tasks: Vec<_> = ["a/ok", "x/panics"]
        .iter()
        .map(|name| {
            let task = move |progress: TaskProgress| async move {
                if progress.label() == "x/panics" {
                    panic!("boom");
                }
                Ok::<_, ContribError>(())
            };
            (name.to_string(), task)
        })
        .collect();

    let progress = Progress::hidden();
    let results = Pool::new(2, progress.clone()).run("Running", tasks).await;
    assert_eq!(results.len(), 2);
    assert!(progress.active().is_empty());

    match settle("mirror sync", results).unwrap_err() {
        ContribError::Tasks { failures, .. } => {
            assert_eq!(failures.len(), 1);
            assert!(failures[0].starts_with("x/panics: task aborted"));
            assert!(failures[0].contains("panicked"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn progress_tracks_active_tasks() {
    let progress = Progress::hidden();
    let observed = Arc::new(std::sync::Mutex::new(Vec::new()));

    let tasks: Vec<_> = ["x/one", "y/two"]
        .iter()
        .map(|name| {
            let probe = progress.clone();
            let observed = observed.clone();
            let task = move |task_progress: TaskProgress| async move {
                let active = probe.active();
                assert!(active.contains(&task_progress.label().to_string()));
                observed.lock().unwrap().push(active.len());
                Ok::<_, ContribError>(())
            };
            (name.to_string(), task)
        })
        .collect();

    Pool::new(1, progress.clone()).run("Fetching", tasks).await;
    assert!(progress.active().is_empty());
    assert_eq!(*observed.lock().unwrap(), vec![1, 1]);
}
