use chrono::{Duration as ChronoDuration, TimeZone, Utc};
use contribstat::cache::{is_fresh, Cache};
use contribstat::model::{Profile, RepoEntry, User};
use pretty_assertions::assert_eq;
use std::time::Duration;
use tempfile::tempdir;

const HOUR: Duration = Duration::from_secs(60 * 60);

fn profile() -> Profile {
    Profile {
        user: User {
            name: Some("Alice".to_string()),
            company: None,
            avatar: "https://avatars.example/alice".to_string(),
            created: Utc.with_ymd_and_hms(2015, 6, 1, 0, 0, 0).unwrap(),
            url: "https://github.com/alice".to_string(),
        },
        repos: vec![RepoEntry {
            name: "alice/app".to_string(),
            description: Some("an app".to_string()),
            issues: vec![],
        }],
    }
}

#[test]
fn entry_is_fresh_until_ttl_elapses() {
    let t = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    assert!(is_fresh(t, t + ChronoDuration::minutes(59), HOUR));
    assert!(is_fresh(t, t + ChronoDuration::minutes(60), HOUR));
    assert!(!is_fresh(t, t + ChronoDuration::minutes(61), HOUR));
}

#[test]
fn get_honours_ttl() {
    let t = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let mut cache = Cache::in_memory(HOUR).unwrap();
    cache.put("profile:alice", &profile(), t).unwrap();

    let fresh: Option<Profile> = cache.get("profile:alice", t + ChronoDuration::minutes(59)).unwrap();
    assert_eq!(fresh, Some(profile()));

    let stale: Option<Profile> = cache.get("profile:alice", t + ChronoDuration::minutes(61)).unwrap();
    assert_eq!(stale, None);

    let entry = cache.entry("profile:alice").unwrap().unwrap();
    assert_eq!(entry.written_at, t);
}

#[test]
fn missing_keys_and_invalidation() {
    let t = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let mut cache = Cache::in_memory(HOUR).unwrap();
    let missing: Option<Profile> = cache.get("profile:nobody", t).unwrap();
    assert!(missing.is_none());

    cache.put("profile:alice", &profile(), t).unwrap();
    assert!(cache.invalidate("profile:alice").unwrap());
    assert!(!cache.invalidate("profile:alice").unwrap());
    assert!(cache.entry("profile:alice").unwrap().is_none());
}

#[test]
fn cache_persists_across_reopen() {
    let dir = tempdir().unwrap();
    let t = Utc::now();
    {
        let mut cache = Cache::new(dir.path(), HOUR).unwrap();
        cache.put("profile:alice", &profile(), t).unwrap();
    }
    assert!(dir.path().join("cache.db").exists());

    let cache = Cache::new(dir.path(), HOUR).unwrap();
    let reopened: Option<Profile> = cache.get("profile:alice", t).unwrap();
    assert_eq!(reopened, Some(profile()));
}
