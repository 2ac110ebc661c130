//! Automation engine: reacts to device events by evaluating and executing rules.
//!
//! Lifecycle is `Stopped → Running → Stopped`. While running, a background
//! listener receives battery samples, power transitions and wake points and,
//! for each event, evaluates every loaded rule against the triggers of that
//! event's kind. Evaluation and execution of all events go through one
//! critical section, so two firings never interleave and the busy guard is
//! never taken twice.
//!
//! `stop()` never aborts an action in flight; it bumps the engine generation
//! so no further rule is evaluated, cancels the wake points and lets the
//! listener wind down on its own.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError};

use chrono::Datelike;
use tokio::sync::{Mutex, watch};

use chime_domain::error::ChimeError;
use chime_domain::event::DeviceEvent;
use chime_domain::history::{LogEntry, StatsReport};
use chime_domain::id::RuleId;
use chime_domain::rule::{Rule, RuleSet, TriggerKind};
use chime_domain::time::{ClockTime, weekday_number};

use crate::busy_guard::BusyGuard;
use crate::ports::{
    AutomationControl, Clock, DeviceMonitor, Effects, EngineStatus, EventSubscription,
    HistoryRepository, RuleRepository, WakeLock, WakeTimer,
};
use crate::services::action_executor::{ActionExecutor, ActionOutcome};
use crate::services::execution_log::ExecutionLogService;
use crate::services::rule_store::RuleStore;
use crate::services::wake_scheduler::WakeScheduler;

enum Lifecycle {
    Stopped,
    Running {
        rules: Arc<[Rule]>,
        shutdown: watch::Sender<bool>,
    },
}

#[derive(Debug, Default, Clone, Copy)]
struct Readings {
    battery: Option<(u8, bool)>,
    plugged: Option<bool>,
}

struct Inner<R, H, F, T, L, D, C> {
    store: RuleStore<R>,
    log: ExecutionLogService<H, C>,
    executor: ActionExecutor<F>,
    scheduler: WakeScheduler<T, C>,
    guard: BusyGuard<L>,
    device: D,
    lifecycle: Mutex<Lifecycle>,
    critical: Mutex<()>,
    generation: AtomicU64,
    readings: std::sync::Mutex<Readings>,
}

/// Reactive rule engine. Cheap to clone; clones share the same state.
pub struct AutomationEngine<R, H, F, T, L, D, C> {
    inner: Arc<Inner<R, H, F, T, L, D, C>>,
}

impl<R, H, F, T, L, D, C> Clone for AutomationEngine<R, H, F, T, L, D, C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R, H, F, T, L, D, C> AutomationEngine<R, H, F, T, L, D, C>
where
    R: RuleRepository + 'static,
    H: HistoryRepository + 'static,
    F: Effects + 'static,
    T: WakeTimer + 'static,
    L: WakeLock + 'static,
    D: DeviceMonitor + 'static,
    C: Clock + 'static,
{
    /// Create a stopped engine from its collaborators.
    pub fn new(
        store: RuleStore<R>,
        log: ExecutionLogService<H, C>,
        executor: ActionExecutor<F>,
        scheduler: WakeScheduler<T, C>,
        guard: BusyGuard<L>,
        device: D,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                store,
                log,
                executor,
                scheduler,
                guard,
                device,
                lifecycle: Mutex::new(Lifecycle::Stopped),
                critical: Mutex::new(()),
                generation: AtomicU64::new(0),
                readings: std::sync::Mutex::new(Readings::default()),
            }),
        }
    }

    /// Load rules, arm wake points, subscribe to events and start listening.
    ///
    /// No-op with a warning when already running. When the rule document's
    /// master switch is off the engine stays stopped.
    #[tracing::instrument(skip(self))]
    pub async fn start(&self) {
        let mut lifecycle = self.inner.lifecycle.lock().await;
        if matches!(*lifecycle, Lifecycle::Running { .. }) {
            tracing::warn!("automation engine already running");
            return;
        }

        let set = self.inner.store.load().await;
        if !set.enabled {
            tracing::info!("automation disabled, engine stays stopped");
            return;
        }
        let rules: Arc<[Rule]> = set.rules.into_iter().filter(|rule| rule.enabled).collect();
        let generation = self.inner.generation.fetch_add(1, Ordering::AcqRel) + 1;
        let armed = self.inner.scheduler.arm_rules(&rules, generation);

        let events = self.inner.device.subscribe();
        let initial = self
            .inner
            .device
            .battery_level()
            .map(|level| DeviceEvent::battery(level, self.inner.device.is_charging()));
        let (shutdown, shutdown_rx) = watch::channel(false);
        tokio::spawn(listen(
            Arc::clone(&self.inner),
            Arc::clone(&rules),
            generation,
            events,
            shutdown_rx,
            initial,
        ));

        tracing::info!(
            rules = rules.len(),
            wake_points = armed,
            generation,
            "automation engine started"
        );
        *lifecycle = Lifecycle::Running { rules, shutdown };
    }

    /// Stop evaluating, cancel every wake point and unsubscribe.
    ///
    /// No-op when already stopped. An action in flight finishes, but no
    /// further rule is evaluated.
    #[tracing::instrument(skip(self))]
    pub async fn stop(&self) {
        let mut lifecycle = self.inner.lifecycle.lock().await;
        let Lifecycle::Running { shutdown, .. } =
            std::mem::replace(&mut *lifecycle, Lifecycle::Stopped)
        else {
            tracing::debug!("automation engine already stopped");
            return;
        };
        self.inner.generation.fetch_add(1, Ordering::AcqRel);
        // the listener may already be gone when its event stream closed
        let _ = shutdown.send(true);
        self.inner.scheduler.cancel_all();
        tracing::info!("automation engine stopped");
    }

    /// Stop, then start again with the current rule document.
    pub async fn reload(&self) {
        self.stop().await;
        self.start().await;
    }

    pub async fn is_running(&self) -> bool {
        matches!(
            *self.inner.lifecycle.lock().await,
            Lifecycle::Running { .. }
        )
    }

    pub async fn status(&self) -> EngineStatus {
        let (running, active_rules) = match &*self.inner.lifecycle.lock().await {
            Lifecycle::Running { rules, .. } => (true, rules.len()),
            Lifecycle::Stopped => (false, 0),
        };
        let readings = *self
            .inner
            .readings
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let (battery_level, charging) = match readings.battery {
            Some((level, charging)) => (Some(level), Some(charging)),
            None => (
                self.inner.device.battery_level(),
                Some(self.inner.device.is_charging()),
            ),
        };
        EngineStatus {
            running,
            active_rules,
            wake_points: self.inner.scheduler.armed(),
            battery_level,
            charging,
            plugged: readings.plugged,
            busy: self.inner.guard.is_held(),
        }
    }
}

impl<R, H, F, T, L, D, C> Inner<R, H, F, T, L, D, C>
where
    R: RuleRepository,
    H: HistoryRepository,
    F: Effects,
    T: WakeTimer,
    L: WakeLock,
    D: DeviceMonitor,
    C: Clock,
{
    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::Acquire) == generation
    }

    fn remember(&self, update: impl FnOnce(&mut Readings)) {
        update(&mut self.readings.lock().unwrap_or_else(PoisonError::into_inner));
    }

    /// Evaluate one event against the loaded rules and run every match.
    async fn dispatch(&self, rules: &[Rule], generation: u64, event: DeviceEvent) {
        let _critical = self.critical.lock().await;
        if !self.is_current(generation) {
            return;
        }
        tracing::debug!(%event, "evaluating event");
        let (kind, matched): (TriggerKind, Vec<&Rule>) = match event {
            DeviceEvent::Battery { level, charging } => {
                self.remember(|r| r.battery = Some((level, charging)));
                let matched = rules
                    .iter()
                    .filter(|rule| rule.matches_battery(level, charging))
                    .collect();
                (TriggerKind::Battery, matched)
            }
            DeviceEvent::Power { plugged } => {
                self.remember(|r| r.plugged = Some(plugged));
                let matched = rules
                    .iter()
                    .filter(|rule| rule.matches_power(plugged))
                    .collect();
                (TriggerKind::Power, matched)
            }
            DeviceEvent::WakePoint { id, at } => {
                let Some(fired) = self.scheduler.on_fired(&id, at, generation) else {
                    tracing::trace!(wake_point = %id, "not an armed rule wake point");
                    return;
                };
                let time = ClockTime::from_naive(at.time());
                let weekday = weekday_number(at.weekday());
                let matched = rules
                    .iter()
                    .filter(|rule| rule.id == fired.rule_id && rule.matches_time(time, weekday))
                    .collect();
                (TriggerKind::Time, matched)
            }
        };

        for rule in matched {
            if !self.is_current(generation) {
                tracing::debug!("engine stopped, skipping remaining rules");
                break;
            }
            self.execute_rule(rule, kind).await;
        }
    }

    /// Run a rule's actions in order under the busy guard, then log the firing.
    ///
    /// A failing action is logged and does not prevent the next one.
    async fn execute_rule(&self, rule: &Rule, kind: TriggerKind) {
        let _busy = self.guard.hold();
        tracing::info!(rule_id = %rule.id, rule = %rule.name, trigger = %kind, "rule fired");
        for action in &rule.actions {
            match self.executor.execute(action).await {
                Ok(ActionOutcome::Performed) => {}
                Ok(ActionOutcome::Skipped(reason)) => {
                    tracing::debug!(rule_id = %rule.id, action = %action.kind(), reason, "action skipped");
                }
                Err(err) => {
                    tracing::warn!(%err, rule_id = %rule.id, action = %action.kind(), "action failed");
                    if let Err(err) = self
                        .log
                        .record_action(&rule.id, action.kind(), err.to_string())
                        .await
                    {
                        tracing::warn!(%err, "unable to record action failure");
                    }
                }
            }
        }
        if let Err(err) = self.log.record_trigger(rule, kind).await {
            tracing::warn!(%err, rule_id = %rule.id, "unable to record rule firing");
        }
    }
}

async fn listen<R, H, F, T, L, D, C>(
    inner: Arc<Inner<R, H, F, T, L, D, C>>,
    rules: Arc<[Rule]>,
    generation: u64,
    mut events: EventSubscription,
    mut shutdown: watch::Receiver<bool>,
    initial: Option<DeviceEvent>,
) where
    R: RuleRepository,
    H: HistoryRepository,
    F: Effects,
    T: WakeTimer,
    L: WakeLock,
    D: DeviceMonitor,
    C: Clock,
{
    if let Some(event) = initial {
        inner.dispatch(&rules, generation, event).await;
    }
    loop {
        tokio::select! {
            biased;
            _ = shutdown.changed() => break,
            event = events.recv() => match event {
                Some(event) => inner.dispatch(&rules, generation, event).await,
                None => break,
            },
        }
    }
    tracing::debug!(generation, "event listener exited");
}

impl<R, H, F, T, L, D, C> AutomationControl for AutomationEngine<R, H, F, T, L, D, C>
where
    R: RuleRepository + 'static,
    H: HistoryRepository + 'static,
    F: Effects + 'static,
    T: WakeTimer + 'static,
    L: WakeLock + 'static,
    D: DeviceMonitor + 'static,
    C: Clock + 'static,
{
    async fn status(&self) -> EngineStatus {
        AutomationEngine::status(self).await
    }

    async fn reload(&self) {
        AutomationEngine::reload(self).await;
    }

    async fn rules(&self) -> RuleSet {
        self.inner.store.load().await
    }

    async fn replace_rules(&self, rules: RuleSet) -> Result<(), ChimeError> {
        self.inner.store.save(&rules).await?;
        AutomationEngine::reload(self).await;
        Ok(())
    }

    async fn upsert_rule(&self, rule: Rule) -> Result<(), ChimeError> {
        self.inner.store.upsert_rule(&rule).await?;
        AutomationEngine::reload(self).await;
        Ok(())
    }

    async fn delete_rule(&self, id: RuleId) -> Result<(), ChimeError> {
        self.inner.store.delete_rule(&id).await?;
        AutomationEngine::reload(self).await;
        Ok(())
    }

    async fn set_rule_enabled(&self, id: RuleId, enabled: bool) -> Result<(), ChimeError> {
        self.inner.store.set_rule_enabled(&id, enabled).await?;
        AutomationEngine::reload(self).await;
        Ok(())
    }

    async fn set_automation_enabled(&self, enabled: bool) -> Result<(), ChimeError> {
        self.inner.store.set_automation_enabled(enabled).await?;
        AutomationEngine::reload(self).await;
        Ok(())
    }

    async fn logs(&self) -> Result<Vec<LogEntry>, ChimeError> {
        self.inner.log.logs().await
    }

    async fn clear_logs(&self) -> Result<(), ChimeError> {
        self.inner.log.clear_logs().await
    }

    async fn stats(&self) -> Result<StatsReport, ChimeError> {
        self.inner.log.stats().await
    }

    async fn clear_stats(&self) -> Result<(), ChimeError> {
        self.inner.log.clear_stats().await
    }
}
