//! Trigger evaluation against `state_changed` events
//!
//! Value triggers are stateless. The temperature trigger keeps whether the
//! previous reading was inside the zone, and a pending firing while a `for`
//! hold runs.

use chrono::{DateTime, Utc};
use ha_climate::attributes::{
    ATTR_ACTIVE, ATTR_CURRENT_STATE, ATTR_CURRENT_TEMPERATURE, ATTR_TARGET_STATE,
};
use ha_climate::ClimateEnum;
use ha_core::events::{StateChangedData, STATE_CHANGED};
use ha_core::{Event, State};
use ha_event_bus::EventBus;
use serde_json::{json, Value};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use crate::error::{AutomationError, AutomationResult};
use crate::trigger::{DeviceTrigger, TriggerData, ValueTrigger};

/// Crossing waiting out its `for` hold
#[derive(Debug, Clone)]
struct Pending {
    due: DateTime<Utc>,
    value: f64,
    data: StateChangedData,
}

#[derive(Debug, Default)]
struct ZoneTracker {
    /// `None` until the first reading
    in_zone: Option<bool>,
    pending: Option<Pending>,
}

/// Evaluates one trigger over a stream of state changes
#[derive(Debug)]
pub struct TriggerEvaluator {
    trigger: DeviceTrigger,
    zone: ZoneTracker,
}

impl TriggerEvaluator {
    pub fn new(trigger: DeviceTrigger) -> Self {
        Self {
            trigger,
            zone: ZoneTracker::default(),
        }
    }

    pub fn trigger(&self) -> &DeviceTrigger {
        &self.trigger
    }

    /// When a pending temperature crossing becomes due
    pub fn next_deadline(&self) -> Option<DateTime<Utc>> {
        self.zone.pending.as_ref().map(|p| p.due)
    }

    /// Evaluate an event
    ///
    /// Returns Some(TriggerData) if the trigger fired.
    pub fn evaluate(&mut self, event: &Event<Value>) -> AutomationResult<Option<TriggerData>> {
        if event.event_type.as_str() != STATE_CHANGED {
            return Ok(None);
        }

        let data: StateChangedData = serde_json::from_value(event.data.clone())
            .map_err(|e| AutomationError::InvalidEvent(e.to_string()))?;
        if &data.entity_id != self.trigger.entity_id() {
            return Ok(None);
        }

        if matches!(self.trigger, DeviceTrigger::CurrentTemperatureChanged(_)) {
            return Ok(self.eval_temperature(data, event.time_fired));
        }

        let fired = match &self.trigger {
            DeviceTrigger::ActiveChanged(t) => eval_value(t, &data, ATTR_ACTIVE, false),
            DeviceTrigger::CurrentStateChanged(t) => {
                eval_value(t, &data, ATTR_CURRENT_STATE, true)
            }
            DeviceTrigger::TargetStateChanged(t) => {
                eval_value(t, &data, ATTR_TARGET_STATE, false)
            }
            DeviceTrigger::CurrentTemperatureChanged(_) => false,
        };

        Ok(fired.then(|| self.trigger_data(&data, event.time_fired)))
    }

    /// Fire a pending crossing whose hold has run out by `now`
    pub fn poll(&mut self, now: DateTime<Utc>) -> Option<TriggerData> {
        let due = self.zone.pending.as_ref().is_some_and(|p| now >= p.due);
        if !due || self.zone.in_zone != Some(true) {
            return None;
        }
        let pending = self.zone.pending.take()?;
        debug!(entity_id = %pending.data.entity_id, value = pending.value, "Temperature hold elapsed");
        Some(self.temperature_data(&pending.data, pending.value, now))
    }

    fn eval_temperature(&mut self, data: StateChangedData, at: DateTime<Utc>) -> Option<TriggerData> {
        let DeviceTrigger::CurrentTemperatureChanged(trigger) = &self.trigger else {
            return None;
        };
        let Some(value) = reading(data.new_state.as_ref()) else {
            trace!(entity_id = %data.entity_id, "No numeric temperature");
            return None;
        };

        let in_zone = trigger.in_zone(value);
        let hold = trigger.hold();
        let Some(was_in_zone) = self.zone.in_zone.replace(in_zone) else {
            trace!(value, in_zone, "First temperature reading");
            return None;
        };

        if !in_zone {
            if self.zone.pending.take().is_some() {
                debug!(entity_id = %data.entity_id, value, "Left zone before hold elapsed");
            }
            return None;
        }

        if !was_in_zone {
            if hold.is_zero() {
                debug!(entity_id = %data.entity_id, value, "Temperature trigger matched");
                return Some(self.temperature_data(&data, value, at));
            }
            let due = chrono::Duration::from_std(hold)
                .ok()
                .and_then(|hold| at.checked_add_signed(hold))
                .unwrap_or(DateTime::<Utc>::MAX_UTC);
            debug!(entity_id = %data.entity_id, value, %due, "Temperature crossed, holding");
            self.zone.pending = Some(Pending { due, value, data });
            return None;
        }

        if let Some(pending) = self.zone.pending.as_mut() {
            pending.value = value;
            pending.data = data;
        }
        self.poll(at)
    }

    fn trigger_data(&self, data: &StateChangedData, at: DateTime<Utc>) -> TriggerData {
        TriggerData::new(at)
            .with_id(self.trigger.id())
            .with_var("type", json!(self.trigger.kind()))
            .with_var("entity_id", json!(data.entity_id.to_string()))
            .with_var(
                "from_state",
                serde_json::to_value(&data.old_state).unwrap_or_default(),
            )
            .with_var(
                "to_state",
                serde_json::to_value(&data.new_state).unwrap_or_default(),
            )
    }

    fn temperature_data(&self, data: &StateChangedData, value: f64, at: DateTime<Utc>) -> TriggerData {
        let mut trigger_data = self.trigger_data(data, at).with_var("value", json!(value));
        if let DeviceTrigger::CurrentTemperatureChanged(t) = &self.trigger {
            trigger_data = trigger_data
                .with_var("above", json!(t.above))
                .with_var("below", json!(t.below));
        }
        trigger_data
    }
}

/// Watched value of a state, `None` when unknown or unavailable
pub(crate) fn watched<E: ClimateEnum>(
    state: Option<&State>,
    attribute: &str,
    state_fallback: bool,
) -> Option<E> {
    let state = state.filter(|s| !s.is_unavailable() && !s.is_unknown())?;
    match state.attributes.get(attribute) {
        Some(raw) => E::coerce(raw).ok(),
        None if state_fallback => E::parse(&state.state).ok(),
        None => None,
    }
}

fn reading(state: Option<&State>) -> Option<f64> {
    state
        .filter(|s| !s.is_unavailable() && !s.is_unknown())?
        .attribute::<f64>(ATTR_CURRENT_TEMPERATURE)
}

/// New value equals `to` and the old one is a different known value
fn eval_value<E: ClimateEnum + PartialEq>(
    trigger: &ValueTrigger<E>,
    data: &StateChangedData,
    attribute: &str,
    state_fallback: bool,
) -> bool {
    let new = watched::<E>(data.new_state.as_ref(), attribute, state_fallback);
    let old = watched::<E>(data.old_state.as_ref(), attribute, state_fallback);
    trace!(?attribute, new = ?new.map(|v| v.as_str()), old = ?old.map(|v| v.as_str()), "Evaluating value trigger");
    new == Some(trigger.to) && old.is_some_and(|old| old != trigger.to)
}

/// Run `trigger` against the bus until the bus closes
///
/// A pending `for` hold is fired from a timer when no further reading arrives.
pub fn attach<F>(trigger: DeviceTrigger, event_bus: &EventBus, action: F) -> JoinHandle<()>
where
    F: Fn(TriggerData) + Send + 'static,
{
    let mut rx = event_bus.subscribe(STATE_CHANGED);
    let mut evaluator = TriggerEvaluator::new(trigger);

    tokio::spawn(async move {
        loop {
            let wait = evaluator
                .next_deadline()
                .map(|due| (due - Utc::now()).to_std().unwrap_or_default());

            let event = match wait {
                Some(wait) => tokio::select! {
                    event = rx.recv() => event,
                    _ = tokio::time::sleep(wait) => {
                        if let Some(data) = evaluator.poll(Utc::now()) {
                            action(data);
                        }
                        continue;
                    }
                },
                None => rx.recv().await,
            };

            match event {
                Ok(event) => match evaluator.evaluate(&event) {
                    Ok(Some(data)) => action(data),
                    Ok(None) => {}
                    Err(e) => warn!(error = %e, "Skipping event"),
                },
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Trigger fell behind the event bus");
                }
                Err(RecvError::Closed) => break,
            }
        }
        debug!(kind = evaluator.trigger().kind(), "Trigger detached");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trigger::TRIGGER_CURRENT_TEMPERATURE_CHANGED;
    use chrono::TimeZone;
    use ha_core::{AttributeMap, Context, EntityId};

    fn den() -> EntityId {
        EntityId::new("heater_cooler", "den").unwrap()
    }

    fn state(state: &str, attrs: Value) -> State {
        let attrs: AttributeMap = serde_json::from_value(attrs).unwrap();
        State::new(den(), state, attrs, Context::new())
    }

    fn change(old: Option<State>, new: Option<State>, secs: i64) -> Event<Value> {
        let data = StateChangedData {
            entity_id: den(),
            old_state: old,
            new_state: new,
        };
        let mut event = Event::new(STATE_CHANGED, serde_json::to_value(data).unwrap(), Context::new());
        event.time_fired = Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap();
        event
    }

    fn temperature(value: f64) -> State {
        state("idle", json!({ ATTR_CURRENT_TEMPERATURE: value }))
    }

    fn temperature_trigger(config: Value) -> TriggerEvaluator {
        let mut config = config;
        config["type"] = json!(TRIGGER_CURRENT_TEMPERATURE_CHANGED);
        config["entity_id"] = json!("heater_cooler.den");
        TriggerEvaluator::new(DeviceTrigger::from_value(config).unwrap())
    }

    /// Feed readings one second apart; returns the indexes that fired
    fn feed(evaluator: &mut TriggerEvaluator, readings: &[f64]) -> Vec<usize> {
        let mut previous: Option<State> = None;
        let mut fired = Vec::new();
        for (i, value) in readings.iter().enumerate() {
            let new = temperature(*value);
            let event = change(previous.replace(new.clone()), Some(new), i as i64);
            if evaluator.evaluate(&event).unwrap().is_some() {
                fired.push(i);
            }
        }
        fired
    }

    #[test]
    fn test_below_fires_once_on_crossing() {
        let mut evaluator = temperature_trigger(json!({"below": 20}));
        assert_eq!(feed(&mut evaluator, &[18.0, 21.0, 19.0]), vec![2]);
    }

    #[test]
    fn test_first_reading_never_fires() {
        let mut evaluator = temperature_trigger(json!({"below": 20}));
        assert!(feed(&mut evaluator, &[15.0, 14.0, 13.0]).is_empty());
    }

    #[test]
    fn test_between_thresholds() {
        let mut evaluator = temperature_trigger(json!({"above": 18, "below": 22}));
        assert_eq!(feed(&mut evaluator, &[17.0, 20.0, 21.0, 23.0, 19.0]), vec![1, 4]);
    }

    #[test]
    fn test_hold_fires_on_later_reading() {
        let mut evaluator = temperature_trigger(json!({"below": 20, "for": 2}));
        // crosses at t=1, due at t=3
        assert_eq!(feed(&mut evaluator, &[21.0, 19.0, 19.5, 18.0, 17.0]), vec![3]);
    }

    #[test]
    fn test_hold_cancelled_by_leaving_zone() {
        let mut evaluator = temperature_trigger(json!({"below": 20, "for": 5}));
        assert!(feed(&mut evaluator, &[21.0, 19.0, 22.0]).is_empty());
        assert_eq!(evaluator.next_deadline(), None);
        assert!(evaluator.poll(Utc.timestamp_opt(1_800_000_000, 0).unwrap()).is_none());
    }

    #[test]
    fn test_hold_fires_on_poll() {
        let mut evaluator = temperature_trigger(json!({"below": 20, "for": 10}));
        assert!(feed(&mut evaluator, &[21.0, 19.0]).is_empty());

        let due = evaluator.next_deadline().unwrap();
        assert_eq!(due, Utc.timestamp_opt(1_700_000_011, 0).unwrap());
        assert!(evaluator.poll(due - chrono::Duration::seconds(1)).is_none());

        let data = evaluator.poll(due).unwrap();
        assert_eq!(data.var("value"), Some(&json!(19.0)));
        assert!(evaluator.poll(due).is_none());
    }

    #[test]
    fn test_unavailable_reading_ignored() {
        let mut evaluator = temperature_trigger(json!({"below": 20}));
        let warm = temperature(21.0);
        let gone = state("unavailable", json!({}));
        let cold = temperature(19.0);

        assert!(evaluator.evaluate(&change(None, Some(warm.clone()), 0)).unwrap().is_none());
        assert!(evaluator.evaluate(&change(Some(warm), Some(gone.clone()), 1)).unwrap().is_none());
        assert!(evaluator.evaluate(&change(Some(gone), Some(cold), 2)).unwrap().is_some());
    }

    #[test]
    fn test_value_trigger_needs_other_known_old_value() {
        let trigger = DeviceTrigger::from_value(json!({
            "type": "current_state_changed",
            "entity_id": "heater_cooler.den",
            "to": "cooling",
            "id": "cool"
        }))
        .unwrap();
        let mut evaluator = TriggerEvaluator::new(trigger);

        let idle = state("idle", json!({ ATTR_CURRENT_STATE: "idle" }));
        let cooling = state("cooling", json!({ ATTR_CURRENT_STATE: "cooling" }));

        let data = evaluator
            .evaluate(&change(Some(idle), Some(cooling.clone()), 0))
            .unwrap()
            .unwrap();
        assert_eq!(data.id.as_deref(), Some("cool"));
        assert_eq!(data.var("type"), Some(&json!("current_state_changed")));

        assert!(evaluator
            .evaluate(&change(Some(cooling.clone()), Some(cooling.clone()), 1))
            .unwrap()
            .is_none());
        assert!(evaluator
            .evaluate(&change(None, Some(cooling.clone()), 2))
            .unwrap()
            .is_none());
        let unavailable = state("unavailable", json!({}));
        assert!(evaluator
            .evaluate(&change(Some(unavailable), Some(cooling), 3))
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_active_trigger_accepts_codes() {
        let trigger = DeviceTrigger::from_value(json!({
            "type": "active_changed",
            "entity_id": "heater_cooler.den",
            "to": "active"
        }))
        .unwrap();
        let mut evaluator = TriggerEvaluator::new(trigger);

        let off = state("inactive", json!({ ATTR_ACTIVE: 1 }));
        let on = state("idle", json!({ ATTR_ACTIVE: "active" }));
        assert!(evaluator.evaluate(&change(Some(off), Some(on), 0)).unwrap().is_some());
    }

    #[test]
    fn test_other_entity_ignored() {
        let mut evaluator = temperature_trigger(json!({"below": 20}));
        let mut event = change(None, Some(temperature(10.0)), 0);
        event.data["entity_id"] = json!("heater_cooler.office");
        assert!(evaluator.evaluate(&event).unwrap().is_none());
        // Still no baseline for den
        assert!(feed(&mut evaluator, &[19.0]).is_empty());
    }

    #[tokio::test]
    async fn test_attach_fires_from_bus() {
        let bus = EventBus::new();
        let trigger = DeviceTrigger::from_value(json!({
            "type": "current_temperature_changed",
            "entity_id": "heater_cooler.den",
            "above": 25
        }))
        .unwrap();
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let handle = attach(trigger, &bus, move |data| {
            let _ = tx.send(data);
        });

        let cool = temperature(22.0);
        let hot = temperature(26.0);
        bus.fire(change(None, Some(cool.clone()), 0));
        bus.fire(change(Some(cool), Some(hot), 1));

        let data = rx.recv().await.unwrap();
        assert_eq!(data.var("value"), Some(&json!(26.0)));
        handle.abort();
    }
}
