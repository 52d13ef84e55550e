//! Watcher unit tests

use std::sync::Arc;
use std::time::Duration;

use deploy_watch::errors::WatchError;
use deploy_watch::fakes::{build, deploy, ManualClock, Scripted, ScriptedSource};
use deploy_watch::models::{BuildRecord, CorrelationKey, DeployRecord, DeployState, PollOutcome};
use deploy_watch::watch::{DeploymentWatcher, Options, ProviderErrorPolicy};
use tokio_test::{assert_err, assert_ok};

const INTERVAL: Duration = Duration::from_secs(5);

fn key(number: u64) -> Option<CorrelationKey> {
    Some(CorrelationKey::new(number).unwrap())
}

fn unrelated_builds(n: usize) -> Vec<BuildRecord> {
    (0..n)
        .map(|i| build(&format!("other-{i}"), &format!("pull/{}/head", 100 + i), &format!("od-{i}")))
        .collect()
}

fn watcher(
    source: Arc<ScriptedSource>,
    clock: Arc<ManualClock>,
    options: Options,
) -> DeploymentWatcher<Arc<ScriptedSource>, Arc<ManualClock>> {
    DeploymentWatcher::new(source, clock, options)
}

fn ready(id: &str, url: &str) -> Scripted<DeployRecord> {
    Scripted::Ok(deploy(id, DeployState::Ready, Some(url)))
}

fn building(id: &str) -> Scripted<DeployRecord> {
    Scripted::Ok(deploy(id, DeployState::Building, None))
}

#[tokio::test]
async fn test_ready_after_build_appears() {
    let source = Arc::new(
        ScriptedSource::new()
            .then_builds(vec![])
            .then_builds(vec![])
            .then_builds(vec![])
            .then_builds(vec![build("b1", "pull/42/head", "d1")])
            .then_deploy("d1", ready("d1", "https://preview.example/42")),
    );
    let clock = Arc::new(ManualClock::new());

    let outcome = assert_ok!(
        watcher(source.clone(), clock.clone(), Options::default())
            .watch(key(42), None)
            .await
    );

    assert_eq!(
        outcome,
        PollOutcome::Ready {
            permalink: "https://preview.example/42".to_string()
        }
    );
    assert_eq!(source.list_calls(), 4);
    assert_eq!(source.deploy_calls(), 1);
    assert_eq!(clock.sleeps(), vec![INTERVAL; 3]);
}

#[tokio::test]
async fn test_ready_returns_on_first_observation() {
    let source = Arc::new(
        ScriptedSource::new()
            .then_builds(vec![build("b1", "pull/3/head", "d1")])
            .then_deploy("d1", ready("d1", "https://preview.example/3")),
    );
    let clock = Arc::new(ManualClock::new());

    let outcome = assert_ok!(
        watcher(source.clone(), clock.clone(), Options::default())
            .watch(key(3), None)
            .await
    );

    assert_eq!(outcome.permalink(), Some("https://preview.example/3"));
    assert_eq!(source.list_calls(), 1);
    assert_eq!(source.deploy_calls(), 1);
    assert!(clock.sleeps().is_empty());
}

#[tokio::test]
async fn test_deploy_error_fails_without_further_polls() {
    let mut failed = deploy("d7", DeployState::Error, None);
    failed.error_message = Some("Build script returned non-zero exit code: 2".to_string());
    let source = Arc::new(
        ScriptedSource::new()
            .then_builds(vec![build("b7", "pull/7/head", "d7")])
            .then_deploy("d7", Scripted::Ok(failed)),
    );
    let clock = Arc::new(ManualClock::new());

    let outcome = assert_ok!(
        watcher(source.clone(), clock.clone(), Options::default())
            .watch(key(7), None)
            .await
    );

    assert_eq!(
        outcome,
        PollOutcome::Failed {
            reason: "Build script returned non-zero exit code: 2".to_string()
        }
    );
    assert_eq!(source.list_calls(), 1);
    assert_eq!(source.deploy_calls(), 1);
    assert!(clock.sleeps().is_empty());
}

#[tokio::test]
async fn test_deploy_error_without_message() {
    let source = Arc::new(
        ScriptedSource::new()
            .then_builds(vec![build("b7", "pull/7/head", "d7")])
            .then_deploy("d7", Scripted::Ok(deploy("d7", DeployState::Error, None))),
    );
    let clock = Arc::new(ManualClock::new());

    let outcome = assert_ok!(
        watcher(source, clock, Options::default())
            .watch(key(7), None)
            .await
    );

    assert!(matches!(outcome, PollOutcome::Failed { ref reason } if reason.contains("d7")));
}

#[tokio::test]
async fn test_build_error_fails_before_reading_deploy() {
    let mut failed = build("b5", "pull/5/head", "d5");
    failed.done = true;
    failed.error_message = Some("Failed during stage 'building site'".to_string());
    let source = Arc::new(ScriptedSource::new().then_builds(vec![failed]));
    let clock = Arc::new(ManualClock::new());

    let outcome = assert_ok!(
        watcher(source.clone(), clock, Options::default())
            .watch(key(5), None)
            .await
    );

    assert_eq!(
        outcome,
        PollOutcome::Failed {
            reason: "Failed during stage 'building site'".to_string()
        }
    );
    assert_eq!(source.deploy_calls(), 0);
}

#[tokio::test]
async fn test_no_build_times_out() {
    let source = Arc::new(ScriptedSource::new());
    let clock = Arc::new(ManualClock::new());

    let outcome = assert_ok!(
        watcher(source.clone(), clock.clone(), Options::default())
            .watch(key(9), Some(Duration::from_secs(10)))
            .await
    );

    match outcome {
        PollOutcome::TimedOut { build_seen, waited } => {
            assert!(!build_seen);
            assert!(waited >= Duration::from_secs(10));
            assert!(waited < Duration::from_secs(15));
        }
        other => panic!("expected a timeout, got {other:?}"),
    }
    assert_eq!(source.deploy_calls(), 0);
    assert_eq!(source.list_calls(), 3);
}

#[tokio::test]
async fn test_unmatched_builds_never_resolve() {
    let mut lookalikes = unrelated_builds(3);
    lookalikes.push(build("x1", "pull/420/head", "xd1"));
    lookalikes.push(build("x2", "refs/pull/42/head", "xd2"));
    lookalikes.push(build("x3", "pull/42/merge", "xd3"));
    let source = Arc::new(
        ScriptedSource::new()
            .then_builds(lookalikes)
            .then_deploy("xd1", ready("xd1", "https://wrong.example"))
            .then_deploy("xd2", ready("xd2", "https://wrong.example"))
            .then_deploy("xd3", ready("xd3", "https://wrong.example")),
    );
    let clock = Arc::new(ManualClock::new());

    let outcome = assert_ok!(
        watcher(source.clone(), clock, Options::default())
            .watch(key(42), Some(Duration::from_secs(20)))
            .await
    );

    assert!(matches!(outcome, PollOutcome::TimedOut { build_seen: false, .. }));
    assert_eq!(source.deploy_calls(), 0);
}

#[tokio::test]
async fn test_timeout_boundary_with_slow_provider() {
    let clock = Arc::new(ManualClock::new());
    let source = Arc::new(
        ScriptedSource::new()
            .then_builds(vec![build("b1", "pull/11/head", "d1")])
            .then_deploy("d1", building("d1"))
            .with_latency(clock.clone(), Duration::from_millis(700)),
    );

    let timeout = Duration::from_secs(12);
    let outcome = assert_ok!(
        watcher(source, clock.clone(), Options::default())
            .watch(key(11), Some(timeout))
            .await
    );

    match outcome {
        PollOutcome::TimedOut { build_seen, waited } => {
            assert!(build_seen);
            assert!(waited >= timeout);
            assert!(waited < timeout + INTERVAL);
        }
        other => panic!("expected a timeout, got {other:?}"),
    }
    assert!(clock.sleeps().iter().all(|d| *d <= INTERVAL));
}

#[tokio::test]
async fn test_default_timeout_applies() {
    let source = Arc::new(ScriptedSource::new());
    let clock = Arc::new(ManualClock::new());

    let outcome = assert_ok!(
        watcher(source, clock.clone(), Options::default())
            .watch(key(1), None)
            .await
    );

    assert!(matches!(outcome, PollOutcome::TimedOut { .. }));
    assert_eq!(clock.elapsed(), Duration::from_secs(60));
}

#[tokio::test]
async fn test_matching_ignores_unrelated_builds_and_order() {
    let target = build("b42", "pull/42/head", "d42");
    let mut outcomes = Vec::new();

    for n in [0, 1, 5, 20] {
        let mut forward = unrelated_builds(n);
        forward.push(target.clone());
        let mut backward = forward.clone();
        backward.reverse();

        for builds in [forward, backward] {
            let mut source = ScriptedSource::new()
                .then_builds(builds)
                .then_deploy("d42", ready("d42", "https://preview.example/42"));
            for i in 0..n {
                source = source.then_deploy(&format!("od-{i}"), ready("x", "https://wrong.example"));
            }
            let source = Arc::new(source);
            let clock = Arc::new(ManualClock::new());

            let outcome = assert_ok!(
                watcher(source, clock, Options::default())
                    .watch(key(42), None)
                    .await
            );
            outcomes.push(outcome);
        }
    }

    assert!(outcomes.iter().all(|o| o == &outcomes[0]));
    assert_eq!(outcomes[0].permalink(), Some("https://preview.example/42"));
}

#[tokio::test]
async fn test_missing_key_fails_fast() {
    let source = Arc::new(ScriptedSource::new());
    let clock = Arc::new(ManualClock::new());

    let err = assert_err!(
        watcher(source.clone(), clock, Options::default())
            .watch(None, None)
            .await
    );

    assert!(matches!(err, WatchError::InvalidCorrelationKey(_)));
    assert_eq!(source.list_calls(), 0);
}

#[tokio::test]
async fn test_zero_timeout_is_rejected() {
    let source = Arc::new(ScriptedSource::new());
    let clock = Arc::new(ManualClock::new());

    let err = assert_err!(
        watcher(source.clone(), clock, Options::default())
            .watch(key(1), Some(Duration::ZERO))
            .await
    );

    assert!(matches!(err, WatchError::InvalidTimeout(_)));
    assert_eq!(source.list_calls(), 0);
}

#[tokio::test]
async fn test_provider_errors_are_retried() {
    let source = Arc::new(
        ScriptedSource::new()
            .then_list_error("502 Bad Gateway")
            .then_builds(vec![build("b1", "pull/8/head", "d1")])
            .then_deploy("d1", Scripted::Unavailable("connection reset".to_string()))
            .then_deploy("d1", ready("d1", "https://preview.example/8")),
    );
    let clock = Arc::new(ManualClock::new());

    let outcome = assert_ok!(
        watcher(source.clone(), clock.clone(), Options::default())
            .watch(key(8), None)
            .await
    );

    assert_eq!(outcome.permalink(), Some("https://preview.example/8"));
    assert_eq!(source.list_calls(), 3);
    assert_eq!(source.deploy_calls(), 2);
}

#[tokio::test]
async fn test_provider_errors_fail_fast() {
    let source = Arc::new(ScriptedSource::new().then_list_error("401 Unauthorized"));
    let clock = Arc::new(ManualClock::new());
    let options = Options {
        provider_errors: ProviderErrorPolicy::FailFast,
        ..Default::default()
    };

    let err = assert_err!(
        watcher(source.clone(), clock, options)
            .watch(key(8), None)
            .await
    );

    assert!(matches!(err, WatchError::ProviderUnavailable(ref m) if m == "401 Unauthorized"));
    assert_eq!(source.list_calls(), 1);
}

#[tokio::test]
async fn test_discovery_timeout() {
    let source = Arc::new(ScriptedSource::new());
    let clock = Arc::new(ManualClock::new());
    let options = Options {
        discovery_timeout: Some(Duration::from_secs(30)),
        ..Default::default()
    };

    let outcome = assert_ok!(
        watcher(source, clock.clone(), options)
            .watch(key(2), Some(Duration::from_secs(60)))
            .await
    );

    assert!(matches!(outcome, PollOutcome::TimedOut { build_seen: false, .. }));
    assert_eq!(clock.elapsed(), Duration::from_secs(30));
}

#[tokio::test]
async fn test_discovery_timeout_lifts_once_build_found() {
    let source = Arc::new(
        ScriptedSource::new()
            .then_builds(vec![build("b1", "pull/2/head", "d1")])
            .then_deploy("d1", building("d1")),
    );
    let clock = Arc::new(ManualClock::new());
    let options = Options {
        discovery_timeout: Some(Duration::from_secs(30)),
        ..Default::default()
    };

    let outcome = assert_ok!(
        watcher(source, clock.clone(), options)
            .watch(key(2), Some(Duration::from_secs(60)))
            .await
    );

    assert!(matches!(outcome, PollOutcome::TimedOut { build_seen: true, .. }));
    assert_eq!(clock.elapsed(), Duration::from_secs(60));
}

#[tokio::test]
async fn test_ready_without_url_fails() {
    let source = Arc::new(
        ScriptedSource::new()
            .then_builds(vec![build("b1", "pull/6/head", "d1")])
            .then_deploy("d1", Scripted::Ok(deploy("d1", DeployState::Ready, None))),
    );
    let clock = Arc::new(ManualClock::new());

    let outcome = assert_ok!(
        watcher(source, clock, Options::default())
            .watch(key(6), None)
            .await
    );

    assert!(matches!(outcome, PollOutcome::Failed { .. }));
}

#[tokio::test]
async fn test_unknown_and_pending_states_keep_polling() {
    let source = Arc::new(
        ScriptedSource::new()
            .then_builds(vec![build("b1", "pull/1/head", "d1")])
            .then_deploy(
                "d1",
                Scripted::Ok(deploy("d1", DeployState::Other("skipped".to_string()), None)),
            )
            .then_deploy("d1", Scripted::Ok(deploy("d1", DeployState::Pending, None)))
            .then_deploy("d1", ready("d1", "https://preview.example/1")),
    );
    let clock = Arc::new(ManualClock::new());

    let outcome = assert_ok!(
        watcher(source.clone(), clock.clone(), Options::default())
            .watch(key(1), None)
            .await
    );

    assert_eq!(outcome.permalink(), Some("https://preview.example/1"));
    assert_eq!(source.list_calls(), 3);
    assert_eq!(source.deploy_calls(), 3);
    assert_eq!(clock.sleeps(), vec![INTERVAL; 2]);
}

#[tokio::test]
async fn test_shutdown_interrupts_sleep() {
    let source = Arc::new(
        ScriptedSource::new()
            .then_builds(vec![build("b1", "pull/4/head", "d1")])
            .then_deploy("d1", building("d1")),
    );
    let clock = Arc::new(ManualClock::new());

    let err = assert_err!(
        watcher(source.clone(), clock.clone(), Options::default())
            .watch_until(key(4), None, Box::pin(async {}))
            .await
    );

    assert!(matches!(err, WatchError::Cancelled(_)));
    assert_eq!(source.list_calls(), 1);
    assert!(clock.sleeps().is_empty());
}
