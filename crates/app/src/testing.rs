//! In-memory fakes of every port, shared by the unit tests of this crate.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use chrono::NaiveDateTime;

use chime_domain::error::ChimeError;
use chime_domain::event::DeviceEvent;
use chime_domain::history::{ExecutionLog, UsageStats};
use chime_domain::id::WakePointId;
use chime_domain::rule::StoredRuleSet;

use crate::event_bus::InProcessEventBus;
use crate::ports::{
    Clock, DeviceMonitor, EffectError, Effects, EventPublisher, EventSource, EventSubscription,
    HistoryRepository, Notification, RuleRepository, SchedulerError, WakeLock, WakeTimer,
};

pub fn dt(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
}

#[derive(Debug)]
struct Unreadable;

impl std::fmt::Display for Unreadable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("disk on fire")
    }
}

impl std::error::Error for Unreadable {}

// ── Rule repository ─────────────────────────────────────────────

#[derive(Default)]
pub struct InMemoryRuleRepo {
    document: Mutex<Option<StoredRuleSet>>,
    saves: AtomicUsize,
    failing: bool,
}

impl InMemoryRuleRepo {
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn with_document(document: serde_json::Value) -> Self {
        Self {
            document: Mutex::new(Some(serde_json::from_value(document).unwrap())),
            ..Self::default()
        }
    }

    pub fn saves(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

impl RuleRepository for InMemoryRuleRepo {
    fn load(&self) -> impl Future<Output = Result<Option<StoredRuleSet>, ChimeError>> + Send {
        let result = if self.failing {
            Err(ChimeError::Storage(Box::new(Unreadable)))
        } else {
            Ok(self.document.lock().unwrap().clone())
        };
        async move { result }
    }

    fn save(&self, rules: &StoredRuleSet) -> impl Future<Output = Result<(), ChimeError>> + Send {
        let result = if self.failing {
            Err(ChimeError::Storage(Box::new(Unreadable)))
        } else {
            *self.document.lock().unwrap() = Some(rules.clone());
            self.saves.fetch_add(1, Ordering::SeqCst);
            Ok(())
        };
        async move { result }
    }
}

// ── History repository ──────────────────────────────────────────

#[derive(Default)]
pub struct InMemoryHistoryRepo {
    pub log: Mutex<ExecutionLog>,
    pub stats: Mutex<UsageStats>,
}

impl HistoryRepository for InMemoryHistoryRepo {
    fn load_log(&self) -> impl Future<Output = Result<ExecutionLog, ChimeError>> + Send {
        let log = self.log.lock().unwrap().clone();
        async move { Ok(log) }
    }

    fn replace_log(
        &self,
        log: &ExecutionLog,
    ) -> impl Future<Output = Result<(), ChimeError>> + Send {
        *self.log.lock().unwrap() = log.clone();
        async { Ok(()) }
    }

    fn load_stats(&self) -> impl Future<Output = Result<UsageStats, ChimeError>> + Send {
        let stats = self.stats.lock().unwrap().clone();
        async move { Ok(stats) }
    }

    fn replace_stats(
        &self,
        stats: &UsageStats,
    ) -> impl Future<Output = Result<(), ChimeError>> + Send {
        *self.stats.lock().unwrap() = stats.clone();
        async { Ok(()) }
    }
}

// ── Effects ─────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Speak(String),
    Notify(Notification),
    Launch(String),
}

#[derive(Default)]
pub struct RecordingEffects {
    pub effects: Mutex<Vec<Effect>>,
    pub speech_unavailable: bool,
    /// Targets `launch` can resolve; anything else is not found.
    pub installed: Vec<String>,
    /// Artificial latency of every effect.
    pub latency: Option<Duration>,
}

impl RecordingEffects {
    pub fn effects(&self) -> Vec<Effect> {
        self.effects.lock().unwrap().clone()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.effects()
            .into_iter()
            .filter_map(|effect| match effect {
                Effect::Notify(n) => Some(n),
                _ => None,
            })
            .collect()
    }

    fn perform(
        &self,
        effect: Effect,
        result: Result<(), EffectError>,
    ) -> impl Future<Output = Result<(), EffectError>> + Send + use<> {
        if result.is_ok() {
            self.effects.lock().unwrap().push(effect);
        }
        let latency = self.latency;
        async move {
            if let Some(latency) = latency {
                tokio::time::sleep(latency).await;
            }
            result
        }
    }
}

impl Effects for RecordingEffects {
    fn speak(&self, text: &str) -> impl Future<Output = Result<(), EffectError>> + Send {
        let result = if self.speech_unavailable {
            Err(EffectError::Unavailable {
                collaborator: "speech engine",
            })
        } else {
            Ok(())
        };
        self.perform(Effect::Speak(text.to_string()), result)
    }

    fn notify(
        &self,
        notification: &Notification,
    ) -> impl Future<Output = Result<(), EffectError>> + Send {
        self.perform(Effect::Notify(notification.clone()), Ok(()))
    }

    fn launch(&self, target: &str) -> impl Future<Output = Result<(), EffectError>> + Send {
        let result = if self.installed.iter().any(|t| t == target) {
            Ok(())
        } else {
            Err(EffectError::TargetNotFound {
                target: target.to_string(),
            })
        };
        self.perform(Effect::Launch(target.to_string()), result)
    }
}

// ── Clock ───────────────────────────────────────────────────────

pub struct ManualClock(Mutex<NaiveDateTime>);

impl ManualClock {
    pub fn at(s: &str) -> Self {
        Self(Mutex::new(dt(s)))
    }

    pub fn set(&self, s: &str) {
        *self.0.lock().unwrap() = dt(s);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> NaiveDateTime {
        *self.0.lock().unwrap()
    }
}

// ── Wake timer ──────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingTimer {
    armed: Mutex<BTreeMap<WakePointId, NaiveDateTime>>,
    cancelled: Mutex<Vec<WakePointId>>,
    pub rejecting: AtomicBool,
}

impl RecordingTimer {
    pub fn armed(&self) -> BTreeMap<WakePointId, NaiveDateTime> {
        self.armed.lock().unwrap().clone()
    }

    pub fn cancelled(&self) -> Vec<WakePointId> {
        self.cancelled.lock().unwrap().clone()
    }
}

impl WakeTimer for RecordingTimer {
    fn arm(&self, id: &WakePointId, at: NaiveDateTime) -> Result<(), SchedulerError> {
        if self.rejecting.load(Ordering::SeqCst) {
            return Err(SchedulerError::Rejected {
                reason: "alarm quota exceeded".to_string(),
            });
        }
        self.armed.lock().unwrap().insert(id.clone(), at);
        Ok(())
    }

    fn cancel(&self, id: &WakePointId) {
        self.armed.lock().unwrap().remove(id);
        self.cancelled.lock().unwrap().push(id.clone());
    }
}

// ── Wake lock ───────────────────────────────────────────────────

/// Counts acquisitions and flags any acquire made while already held.
#[derive(Default)]
pub struct RecordingWakeLock {
    held: AtomicBool,
    pub acquisitions: AtomicUsize,
    pub double_acquisitions: AtomicUsize,
    pub releases: AtomicUsize,
}

impl WakeLock for RecordingWakeLock {
    fn acquire(&self, _timeout: Duration) {
        if self.held.swap(true, Ordering::SeqCst) {
            self.double_acquisitions.fetch_add(1, Ordering::SeqCst);
        }
        self.acquisitions.fetch_add(1, Ordering::SeqCst);
    }

    fn release(&self) {
        self.held.store(false, Ordering::SeqCst);
        self.releases.fetch_add(1, Ordering::SeqCst);
    }
}

// ── Device ──────────────────────────────────────────────────────

#[derive(Default)]
pub struct FakeDevice {
    bus: InProcessEventBus,
    level: Mutex<Option<u8>>,
    charging: AtomicBool,
}

impl FakeDevice {
    pub fn with_level(level: u8) -> Self {
        Self {
            level: Mutex::new(Some(level)),
            ..Self::default()
        }
    }

    pub async fn emit(&self, event: DeviceEvent) {
        if let DeviceEvent::Battery { level, charging } = &event {
            *self.level.lock().unwrap() = Some(*level);
            self.charging.store(*charging, Ordering::SeqCst);
        }
        self.bus.publish(event).await.unwrap();
    }

    pub fn subscribers(&self) -> usize {
        self.bus.subscriber_count()
    }
}

impl EventSource for FakeDevice {
    fn subscribe(&self) -> EventSubscription {
        self.bus.subscribe()
    }
}

impl DeviceMonitor for FakeDevice {
    fn battery_level(&self) -> Option<u8> {
        *self.level.lock().unwrap()
    }

    fn is_charging(&self) -> bool {
        self.charging.load(Ordering::SeqCst)
    }
}

/// Poll `check` until it holds, yielding to the runtime in between.
pub async fn eventually(mut check: impl FnMut() -> bool) {
    for _ in 0..200 {
        if check() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert!(check(), "condition not reached in time");
}
