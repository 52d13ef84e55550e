//! In-memory fakes for the watch seams (testing only)
//!
//! Provides `ScriptedSource`, a `BuildSource` that replays scripted responses,
//! and `ManualClock`, a `Clock` whose time only moves when something sleeps or
//! advances it. Together they let a full watch run without waiting.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;

use crate::errors::WatchError;
use crate::models::{BuildRecord, DeployRecord, DeployState};
use crate::watch::{BuildSource, Clock};

// ---------------------------------------------------------------------------
// ManualClock
// ---------------------------------------------------------------------------

/// Virtual clock. `sleep` returns immediately after advancing time.
#[derive(Debug)]
pub struct ManualClock {
    origin: Instant,
    elapsed: Mutex<Duration>,
    sleeps: Mutex<Vec<Duration>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            elapsed: Mutex::new(Duration::ZERO),
            sleeps: Mutex::new(Vec::new()),
        }
    }

    /// Move time forward without recording a sleep
    pub fn advance(&self, duration: Duration) {
        *self.elapsed.lock().unwrap() += duration;
    }

    /// Virtual time since the clock was created
    pub fn elapsed(&self) -> Duration {
        *self.elapsed.lock().unwrap()
    }

    /// Every sleep requested so far
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().unwrap().clone()
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + self.elapsed()
    }

    async fn sleep(&self, duration: Duration) {
        self.sleeps.lock().unwrap().push(duration);
        self.advance(duration);
    }
}

// ---------------------------------------------------------------------------
// ScriptedSource
// ---------------------------------------------------------------------------

/// A scripted provider response. Errors are stored as text because
/// `WatchError` is not `Clone`.
#[derive(Debug, Clone)]
pub enum Scripted<T> {
    Ok(T),
    Unavailable(String),
    NotFound(String),
}

impl<T: Clone> Scripted<T> {
    fn to_result(&self) -> Result<T, WatchError> {
        match self {
            Scripted::Ok(value) => Ok(value.clone()),
            Scripted::Unavailable(msg) => Err(WatchError::ProviderUnavailable(msg.clone())),
            Scripted::NotFound(msg) => Err(WatchError::NotFound(msg.clone())),
        }
    }
}

/// Replays one scripted response per call. The last response of a script
/// repeats once the script runs out; an empty build script yields no builds.
#[derive(Debug, Default)]
pub struct ScriptedSource {
    builds: Mutex<VecDeque<Scripted<Vec<BuildRecord>>>>,
    deploys: Mutex<HashMap<String, VecDeque<Scripted<DeployRecord>>>>,
    latency: Option<(Arc<ManualClock>, Duration)>,
    list_calls: AtomicUsize,
    deploy_calls: AtomicUsize,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the response of the next `list_builds` call
    pub fn then_builds(self, builds: Vec<BuildRecord>) -> Self {
        self.builds.lock().unwrap().push_back(Scripted::Ok(builds));
        self
    }

    /// Queue a failing `list_builds` call
    pub fn then_list_error(self, message: &str) -> Self {
        self.builds
            .lock()
            .unwrap()
            .push_back(Scripted::Unavailable(message.to_string()));
        self
    }

    /// Queue the response of the next `get_deploy` call for `deploy_id`
    pub fn then_deploy(self, deploy_id: &str, response: Scripted<DeployRecord>) -> Self {
        self.deploys
            .lock()
            .unwrap()
            .entry(deploy_id.to_string())
            .or_default()
            .push_back(response);
        self
    }

    /// Advance `clock` by `latency` on every provider call
    pub fn with_latency(mut self, clock: Arc<ManualClock>, latency: Duration) -> Self {
        self.latency = Some((clock, latency));
        self
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn deploy_calls(&self) -> usize {
        self.deploy_calls.load(Ordering::SeqCst)
    }

    fn tick(&self) {
        if let Some((clock, latency)) = &self.latency {
            clock.advance(*latency);
        }
    }

    fn next<T: Clone>(queue: &mut VecDeque<Scripted<T>>) -> Option<Scripted<T>> {
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }
}

#[async_trait]
impl BuildSource for ScriptedSource {
    async fn list_builds(&self) -> Result<Vec<BuildRecord>, WatchError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.tick();
        let mut builds = self.builds.lock().unwrap();
        match Self::next(&mut builds) {
            Some(response) => response.to_result(),
            None => Ok(Vec::new()),
        }
    }

    async fn get_deploy(&self, deploy_id: &str) -> Result<DeployRecord, WatchError> {
        self.deploy_calls.fetch_add(1, Ordering::SeqCst);
        self.tick();
        let mut deploys = self.deploys.lock().unwrap();
        match deploys.get_mut(deploy_id).and_then(Self::next) {
            Some(response) => response.to_result(),
            None => Err(WatchError::NotFound(format!("deploy {}", deploy_id))),
        }
    }
}

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

/// A build in progress for `source_ref`
pub fn build(id: &str, source_ref: &str, deploy_id: &str) -> BuildRecord {
    BuildRecord {
        id: id.to_string(),
        source_ref: source_ref.to_string(),
        deploy_id: deploy_id.to_string(),
        done: false,
        error_message: None,
        created_at: None,
    }
}

/// A deploy in `state`, with a permalink only when ready
pub fn deploy(id: &str, state: DeployState, permalink: Option<&str>) -> DeployRecord {
    DeployRecord {
        id: id.to_string(),
        state,
        permalink: permalink.map(str::to_string),
        error_message: None,
    }
}
