//! Wake scheduler: keeps one daily wake point armed per time trigger.
//!
//! Wake points are keyed `rule:<rule id>:<trigger index>` so cancelling is
//! exact and two time triggers on one rule never overwrite each other. Each
//! arm belongs to an engine generation; deliveries for an older generation
//! are recognised as stale.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use chrono::NaiveDateTime;
use serde::Serialize;

use chime_domain::id::{RuleId, WakePointId};
use chime_domain::rule::Rule;
use chime_domain::schedule::next_occurrence;
use chime_domain::time::ClockTime;

use crate::ports::{Clock, WakeTimer};

/// A wake point currently armed for a rule's time trigger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArmedWakePoint {
    pub id: WakePointId,
    pub rule_id: RuleId,
    pub trigger_index: usize,
    pub time: ClockTime,
    /// Local time the wake point is due.
    pub due: NaiveDateTime,
    #[serde(skip)]
    generation: u64,
}

pub struct WakeScheduler<T, C> {
    timer: T,
    clock: C,
    armed: Mutex<HashMap<WakePointId, ArmedWakePoint>>,
}

impl<T: WakeTimer, C: Clock> WakeScheduler<T, C> {
    pub fn new(timer: T, clock: C) -> Self {
        Self {
            timer,
            clock,
            armed: Mutex::new(HashMap::new()),
        }
    }

    /// Arm the next occurrence of every time trigger of every enabled rule.
    ///
    /// A wake point that cannot be armed is logged and skipped; that trigger
    /// stays silent until the next reload. Returns how many were armed.
    #[tracing::instrument(skip(self, rules), fields(rules = rules.len()))]
    pub fn arm_rules(&self, rules: &[Rule], generation: u64) -> usize {
        let now = self.clock.now();
        let mut armed = self.armed.lock().unwrap_or_else(PoisonError::into_inner);
        let mut count = 0;
        for rule in rules.iter().filter(|rule| rule.enabled) {
            for (trigger_index, time) in rule.time_triggers() {
                let id = WakePointId::for_rule_trigger(&rule.id, trigger_index);
                let due = next_occurrence(now, time);
                match self.timer.arm(&id, due) {
                    Ok(()) => {
                        tracing::debug!(wake_point = %id, %due, "armed");
                        armed.insert(
                            id.clone(),
                            ArmedWakePoint {
                                id,
                                rule_id: rule.id.clone(),
                                trigger_index,
                                time,
                                due,
                                generation,
                            },
                        );
                        count += 1;
                    }
                    Err(err) => {
                        tracing::warn!(%err, wake_point = %id, rule_id = %rule.id, "unable to arm wake point");
                    }
                }
            }
        }
        count
    }

    /// Handle a delivered wake point and re-arm it for the next day.
    ///
    /// Returns the entry as it was when it fired, or `None` when the delivery
    /// is stale: unknown id, another generation, or a different due time.
    pub fn on_fired(
        &self,
        id: &WakePointId,
        at: NaiveDateTime,
        generation: u64,
    ) -> Option<ArmedWakePoint> {
        let mut armed = self.armed.lock().unwrap_or_else(PoisonError::into_inner);
        let entry = armed.get_mut(id)?;
        if entry.generation != generation || entry.due != at {
            return None;
        }
        let fired = entry.clone();
        let due = next_occurrence(self.clock.now().max(at), entry.time);
        match self.timer.arm(id, due) {
            Ok(()) => {
                tracing::debug!(wake_point = %id, %due, "re-armed");
                entry.due = due;
            }
            Err(err) => {
                tracing::warn!(%err, wake_point = %id, "unable to re-arm wake point");
                armed.remove(id);
            }
        }
        Some(fired)
    }

    /// Cancel every wake point this scheduler armed.
    pub fn cancel_all(&self) {
        let drained: Vec<_> = self
            .armed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain()
            .collect();
        for (id, _) in drained {
            self.timer.cancel(&id);
        }
    }

    /// Armed wake points, soonest first.
    #[must_use]
    pub fn armed(&self) -> Vec<ArmedWakePoint> {
        let mut armed: Vec<_> = self
            .armed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();
        armed.sort_by(|a, b| a.due.cmp(&b.due).then_with(|| a.id.cmp(&b.id)));
        armed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ManualClock, RecordingTimer, dt};
    use chime_domain::rule::{Action, Trigger};
    use std::sync::Arc;
    use std::sync::atomic::Ordering;

    fn rule(id: &str, times: &[&str]) -> Rule {
        let mut builder = Rule::builder().id(id).name(id).action(Action::Speak {
            text: Some("hi".to_string()),
            template: None,
        });
        for time in times {
            builder = builder.trigger(Trigger::Time {
                time: time.parse().unwrap(),
                days: None,
            });
        }
        builder
            .trigger(Trigger::Battery { level_below: 5 })
            .build()
            .unwrap()
    }

    fn scheduler() -> (
        Arc<RecordingTimer>,
        Arc<ManualClock>,
        WakeScheduler<Arc<RecordingTimer>, Arc<ManualClock>>,
    ) {
        let timer = Arc::new(RecordingTimer::default());
        let clock = Arc::new(ManualClock::at("2026-03-04 08:00:00"));
        let scheduler = WakeScheduler::new(Arc::clone(&timer), Arc::clone(&clock));
        (timer, clock, scheduler)
    }

    fn wp(s: &str) -> WakePointId {
        WakePointId::new(s)
    }

    #[test]
    fn should_arm_passed_time_for_tomorrow_and_future_time_for_today() {
        let (timer, _, scheduler) = scheduler();

        let count = scheduler.arm_rules(&[rule("morning", &["07:00"]), rule("night", &["23:00"])], 1);

        assert_eq!(count, 2);
        let armed = timer.armed();
        assert_eq!(armed[&wp("rule:morning:0")], dt("2026-03-05 07:00:00"));
        assert_eq!(armed[&wp("rule:night:0")], dt("2026-03-04 23:00:00"));
    }

    #[test]
    fn should_arm_each_time_trigger_separately() {
        let (timer, _, scheduler) = scheduler();

        scheduler.arm_rules(&[rule("twice", &["09:00", "21:00"])], 1);

        let ids: Vec<_> = timer.armed().into_keys().collect();
        assert_eq!(ids, vec![wp("rule:twice:0"), wp("rule:twice:1")]);
    }

    #[test]
    fn should_skip_disabled_rules() {
        let (timer, _, scheduler) = scheduler();
        let mut disabled = rule("off", &["09:00"]);
        disabled.enabled = false;

        assert_eq!(scheduler.arm_rules(&[disabled], 1), 0);
        assert!(timer.armed().is_empty());
    }

    #[test]
    fn should_log_and_skip_when_timer_rejects() {
        let (timer, _, scheduler) = scheduler();
        timer.rejecting.store(true, Ordering::SeqCst);

        assert_eq!(scheduler.arm_rules(&[rule("r", &["09:00"])], 1), 0);
        assert!(scheduler.armed().is_empty());
    }

    #[test]
    fn should_rearm_for_next_day_after_firing() {
        let (timer, clock, scheduler) = scheduler();
        scheduler.arm_rules(&[rule("night", &["23:00"])], 7);
        clock.set("2026-03-04 23:00:01");

        let fired = scheduler
            .on_fired(&wp("rule:night:0"), dt("2026-03-04 23:00:00"), 7)
            .unwrap();

        assert_eq!(fired.rule_id.as_str(), "night");
        assert_eq!(fired.due, dt("2026-03-04 23:00:00"));
        assert_eq!(timer.armed()[&wp("rule:night:0")], dt("2026-03-05 23:00:00"));
    }

    #[test]
    fn should_rearm_from_scheduled_time_when_delivered_early() {
        let (timer, clock, scheduler) = scheduler();
        scheduler.arm_rules(&[rule("night", &["23:00"])], 1);
        clock.set("2026-03-04 22:59:59");

        scheduler.on_fired(&wp("rule:night:0"), dt("2026-03-04 23:00:00"), 1);

        assert_eq!(timer.armed()[&wp("rule:night:0")], dt("2026-03-05 23:00:00"));
    }

    #[test]
    fn should_ignore_stale_deliveries() {
        let (_, _, scheduler) = scheduler();
        scheduler.arm_rules(&[rule("night", &["23:00"])], 2);

        assert!(scheduler.on_fired(&wp("rule:gone:0"), dt("2026-03-04 23:00:00"), 2).is_none());
        assert!(scheduler.on_fired(&wp("rule:night:0"), dt("2026-03-04 23:00:00"), 1).is_none());
        assert!(scheduler.on_fired(&wp("rule:night:0"), dt("2026-03-03 23:00:00"), 2).is_none());
    }

    #[test]
    fn should_cancel_everything_it_armed() {
        let (timer, _, scheduler) = scheduler();
        scheduler.arm_rules(&[rule("a", &["07:00"]), rule("b", &["08:30"])], 1);

        scheduler.cancel_all();

        assert!(timer.armed().is_empty());
        assert_eq!(timer.cancelled().len(), 2);
        assert!(scheduler.armed().is_empty());
    }

    #[test]
    fn should_list_armed_soonest_first() {
        let (_, _, scheduler) = scheduler();
        scheduler.arm_rules(&[rule("a", &["07:00"]), rule("b", &["08:30"])], 1);

        let order: Vec<_> = scheduler
            .armed()
            .into_iter()
            .map(|a| a.rule_id.to_string())
            .collect();

        assert_eq!(order, vec!["b", "a"]);
    }
}
