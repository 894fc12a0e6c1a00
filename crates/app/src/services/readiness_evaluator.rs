//! Readiness evaluator: per-room readiness state and cooldown timers.
//!
//! Every evaluation rediscovers the room's sensors, reads their current
//! values and runs [`assess`] from scratch. The only state carried between
//! evaluations is the last-occupied mark, the last reason and the pending
//! cooldown timer.
//!
//! A cooldown timer does not evaluate anything itself: it sends a
//! [`CooldownElapsed`] to the engine loop, which re-runs the full evaluation.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, PoisonError};

use serde::Serialize;
use serde_json::json;
use tokio::sync::mpsc;

use tidyhub_domain::entity::{AttributeValue, EntitySnapshot, EntityState};
use tidyhub_domain::id::{EntityId, LocationId};
use tidyhub_domain::readiness::{
    Assessment, BARRIER_CLASS, BarrierReading, OCCUPANCY_CLASS, ReadinessInputs, Reason,
    TimerDirective, assess,
};
use tidyhub_domain::room::RoomKey;
use tidyhub_domain::time::Timestamp;

use crate::clock::Clock;
use crate::ports::{DeviceDirectory, LocationDirectory, StateStore};
use crate::services::entity_cache::{EntityCache, RoomRecord};
use crate::services::lookup;
use crate::task::TaskHandle;

/// Attribute carrying the reason label on the readiness signal.
pub const STATUS_REASON: &str = "status_reason";

/// A room's cooldown window closed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CooldownElapsed {
    pub room: RoomKey,
    pub generation: u64,
}

/// Sensors found for a room on its last evaluation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DiscoveredSensors {
    pub occupancy: Vec<EntityId>,
    /// Barrier sensor and the location it was found in.
    pub barriers: Vec<(EntityId, LocationId)>,
}

impl DiscoveredSensors {
    #[must_use]
    pub fn contains(&self, entity_id: &EntityId) -> bool {
        self.occupancy.contains(entity_id) || self.barriers.iter().any(|(id, _)| id == entity_id)
    }
}

#[derive(Debug)]
struct PendingTimer {
    generation: u64,
    handle: TaskHandle,
}

#[derive(Debug, Default)]
struct RoomRuntime {
    last_occupied: Option<Timestamp>,
    reason: Reason,
    timer: Option<PendingTimer>,
    generation: u64,
    sensors: DiscoveredSensors,
}

pub struct ReadinessEvaluator<S, L, D> {
    store: S,
    locations: L,
    devices: D,
    clock: Clock,
    default_cooldown: u64,
    rooms: HashMap<RoomKey, Mutex<RoomRuntime>>,
    timers: mpsc::UnboundedSender<CooldownElapsed>,
}

impl<S, L, D> ReadinessEvaluator<S, L, D>
where
    S: StateStore,
    L: LocationDirectory,
    D: DeviceDirectory,
{
    /// One runtime record per cached room, all starting in
    /// [`Reason::Initializing`].
    pub fn new(
        (store, locations, devices): (S, L, D),
        clock: Clock,
        default_cooldown: u64,
        cache: &EntityCache,
        timers: mpsc::UnboundedSender<CooldownElapsed>,
    ) -> Self {
        let rooms = cache
            .records()
            .iter()
            .map(|r| (r.key.clone(), Mutex::new(RoomRuntime::default())))
            .collect();
        Self {
            store,
            locations,
            devices,
            clock,
            default_cooldown,
            rooms,
            timers,
        }
    }

    /// Re-run the readiness rule for one room and publish its signal.
    #[tracing::instrument(skip_all, fields(room = %record.identity.slug))]
    pub fn evaluate(&self, record: &RoomRecord, cache: &EntityCache) -> Reason {
        let Some(cell) = self.rooms.get(&record.key) else {
            return Reason::Initializing;
        };

        let sensors = self.discover(record, cache);
        let device_location = lookup::entity_location(&self.devices, &record.config.device);
        let occupancy: Vec<EntityState> =
            sensors.occupancy.iter().map(|id| self.state_of(id)).collect();
        let barriers: Vec<BarrierReading> = sensors
            .barriers
            .iter()
            .map(|(id, location)| BarrierReading {
                sensor: id.clone(),
                location: Some(location.clone()),
                state: self.state_of(id),
            })
            .collect();
        let now = self.clock.now();

        let mut runtime = cell.lock().unwrap_or_else(PoisonError::into_inner);
        let assessment = assess(&ReadinessInputs {
            target: &record.config.location,
            device_location: device_location.as_ref(),
            occupancy: &occupancy,
            barriers: &barriers,
            last_occupied: runtime.last_occupied,
            cooldown_secs: record.config.effective_cooldown(self.default_cooldown),
            now,
        });

        if runtime.reason != assessment.reason {
            tracing::debug!(from = %runtime.reason, to = %assessment.reason, "readiness changed");
        }
        runtime.last_occupied = assessment.last_occupied;
        runtime.reason = assessment.reason;
        runtime.sensors = sensors;
        self.apply_timer(&record.key, &mut runtime, assessment.timer());
        let snapshot = self.signal(record, cache, &runtime.sensors, &assessment, now);
        drop(runtime);

        if let Some(snapshot) = snapshot {
            self.store.publish(snapshot);
        }
        assessment.reason
    }

    /// Handle a fired timer. Returns `true` when it is still the room's
    /// current timer and the room must be re-evaluated.
    pub fn on_timer(&self, fired: &CooldownElapsed) -> bool {
        let Some(cell) = self.rooms.get(&fired.room) else {
            return false;
        };
        let mut runtime = cell.lock().unwrap_or_else(PoisonError::into_inner);
        match &runtime.timer {
            Some(pending) if pending.generation == fired.generation => {
                runtime.timer = None;
                true
            }
            _ => {
                tracing::debug!(room = %fired.room, "ignoring stale cooldown timer");
                false
            }
        }
    }

    /// Rooms whose last evaluation read `entity_id`.
    #[must_use]
    pub fn rooms_watching(&self, entity_id: &EntityId) -> Vec<RoomKey> {
        self.rooms
            .iter()
            .filter(|(_, cell)| {
                cell.lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .sensors
                    .contains(entity_id)
            })
            .map(|(key, _)| key.clone())
            .collect()
    }

    #[must_use]
    pub fn reason(&self, key: &RoomKey) -> Reason {
        self.rooms.get(key).map_or(Reason::Initializing, |cell| {
            cell.lock().unwrap_or_else(PoisonError::into_inner).reason
        })
    }

    #[must_use]
    pub fn sensors(&self, key: &RoomKey) -> DiscoveredSensors {
        self.rooms.get(key).map_or_else(DiscoveredSensors::default, |cell| {
            cell.lock()
                .unwrap_or_else(PoisonError::into_inner)
                .sensors
                .clone()
        })
    }

    #[must_use]
    pub fn has_timer(&self, key: &RoomKey) -> bool {
        self.rooms.get(key).is_some_and(|cell| {
            cell.lock()
                .unwrap_or_else(PoisonError::into_inner)
                .timer
                .is_some()
        })
    }

    /// Cancel every pending cooldown timer.
    pub fn cancel_all(&self) {
        for cell in self.rooms.values() {
            let mut runtime = cell.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(pending) = runtime.timer.take() {
                pending.handle.cancel();
            }
        }
    }

    fn apply_timer(&self, key: &RoomKey, runtime: &mut RoomRuntime, directive: TimerDirective) {
        match directive {
            TimerDirective::Cancel => {
                if let Some(pending) = runtime.timer.take() {
                    tracing::debug!("cancelling cooldown timer");
                    pending.handle.cancel();
                }
            }
            TimerDirective::Ensure(delay) => {
                if runtime.timer.is_some() {
                    return;
                }
                runtime.generation += 1;
                let fired = CooldownElapsed {
                    room: key.clone(),
                    generation: runtime.generation,
                };
                let timers = self.timers.clone();
                tracing::debug!(?delay, "scheduling cooldown re-evaluation");
                let handle = TaskHandle::after(delay, async move {
                    let _ = timers.send(fired);
                });
                runtime.timer = Some(PendingTimer {
                    generation: runtime.generation,
                    handle,
                });
            }
        }
    }

    fn discover(&self, record: &RoomRecord, cache: &EntityCache) -> DiscoveredSensors {
        let occupancy = lookup::sensors_in(
            &self.store,
            &self.locations,
            &self.devices,
            &record.config.location,
            OCCUPANCY_CLASS,
        );

        let mut seen = HashSet::new();
        let mut barriers = Vec::new();
        for location in cache.served_locations(&record.config.device) {
            let found = lookup::sensors_in(
                &self.store,
                &self.locations,
                &self.devices,
                location,
                BARRIER_CLASS,
            );
            for sensor in found {
                if seen.insert(sensor.clone()) {
                    barriers.push((sensor, location.clone()));
                }
            }
        }

        DiscoveredSensors {
            occupancy,
            barriers,
        }
    }

    fn state_of(&self, entity_id: &EntityId) -> EntityState {
        self.store
            .get(entity_id)
            .map(|s| s.state)
            .unwrap_or_default()
    }

    fn signal(
        &self,
        record: &RoomRecord,
        cache: &EntityCache,
        sensors: &DiscoveredSensors,
        assessment: &Assessment,
        now: Timestamp,
    ) -> Option<EntitySnapshot> {
        let controls = cache.controls(&record.key);
        let Some(readiness_id) = controls.readiness.clone() else {
            tracing::debug!("readiness signal not registered yet, nothing to publish");
            return None;
        };
        let doors: Vec<&EntityId> = sensors.barriers.iter().map(|(id, _)| id).collect();

        let mut snapshot = EntitySnapshot::new(readiness_id, EntityState::from(assessment.is_ready()))
            .with_attribute("friendly_name", record.identity.name.clone())
            .with_attribute(STATUS_REASON, assessment.reason.label())
            .with_attribute("segments", AttributeValue::Json(json!(record.config.segments)))
            .with_attribute("device", record.config.device.as_str())
            .with_attribute("location", record.config.location.as_str())
            .with_attribute("door_sensors", AttributeValue::Json(json!(doors)))
            .with_attribute(
                "occupancy_sensors",
                AttributeValue::Json(json!(sensors.occupancy)),
            );
        if let Some(enable) = &controls.enable {
            snapshot = snapshot.with_attribute("enable_control", enable.as_str());
        }
        if let Some(override_toggle) = &controls.override_toggle {
            snapshot = snapshot.with_attribute("override_control", override_toggle.as_str());
        }
        snapshot.last_changed = now;
        Some(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeHome;
    use std::sync::Arc;
    use std::time::Duration;
    use tidyhub_domain::entity::EntityRecord;
    use tidyhub_domain::room::{ControlKind, RoomConfig, RoomIdentity};

    type Evaluator = ReadinessEvaluator<Arc<FakeHome>, Arc<FakeHome>, Arc<FakeHome>>;

    struct Fixture {
        home: Arc<FakeHome>,
        cache: EntityCache,
        evaluator: Evaluator,
        timers: mpsc::UnboundedReceiver<CooldownElapsed>,
    }

    impl Fixture {
        fn new(rooms: Vec<RoomConfig>, cooldown: u64) -> Self {
            let home = Arc::new(FakeHome::default());
            let cache = EntityCache::new(rooms.into_iter().map(|room| {
                let slug = room.location.to_string();
                let identity = RoomIdentity {
                    name: slug.clone(),
                    slug,
                };
                (room, identity)
            }));
            for record in cache.records() {
                cache.register_control(
                    &record.identity.slug,
                    ControlKind::Readiness,
                    ControlKind::Readiness.default_entity(&record.identity.slug),
                );
            }
            let (tx, timers) = mpsc::unbounded_channel();
            let evaluator = ReadinessEvaluator::new(
                (Arc::clone(&home), Arc::clone(&home), Arc::clone(&home)),
                Clock::new(),
                cooldown,
                &cache,
                tx,
            );
            Self {
                home,
                cache,
                evaluator,
                timers,
            }
        }

        fn kitchen(cooldown: u64) -> Self {
            let fixture = Self::new(
                vec![
                    RoomConfig::new("kitchen", "vacuum.robot").with_segments([1]),
                    RoomConfig::new("hall", "vacuum.robot").with_segments([2]),
                ],
                cooldown,
            );
            fixture.home.add_entity(
                EntityRecord::new("vacuum.robot").location("hall"),
                Some("hall"),
            );
            fixture
        }

        fn record(&self, slug: &str) -> &RoomRecord {
            self.cache.by_slug(slug).unwrap()
        }

        fn evaluate(&self, slug: &str) -> Reason {
            self.evaluator.evaluate(self.record(slug), &self.cache)
        }

        fn signal(&self, slug: &str) -> EntitySnapshot {
            self.home
                .get(&ControlKind::Readiness.default_entity(slug))
                .unwrap()
        }
    }

    #[tokio::test]
    async fn should_be_ready_when_room_has_no_sensors() {
        let fixture = Fixture::kitchen(0);

        assert_eq!(fixture.evaluate("kitchen"), Reason::Ready);

        let signal = fixture.signal("kitchen");
        assert_eq!(signal.state, EntityState::On);
        assert_eq!(
            signal.get_attribute(STATUS_REASON),
            Some(&AttributeValue::from("Ready"))
        );
    }

    #[tokio::test]
    async fn should_be_ready_immediately_when_occupancy_ends_without_cooldown() {
        let fixture = Fixture::kitchen(0);
        fixture
            .home
            .add_sensor("binary_sensor.kitchen_motion", "kitchen", "occupancy", EntityState::On);

        assert_eq!(fixture.evaluate("kitchen"), Reason::Occupied);
        assert_eq!(fixture.signal("kitchen").state, EntityState::Off);

        fixture.home.set("binary_sensor.kitchen_motion", EntityState::Off);
        assert_eq!(fixture.evaluate("kitchen"), Reason::Ready);
        assert!(!fixture.evaluator.has_timer(&fixture.record("kitchen").key));
    }

    #[tokio::test(start_paused = true)]
    async fn should_hold_cooldown_then_fire_timer_when_window_closes() {
        let mut fixture = Fixture::kitchen(300);
        fixture
            .home
            .add_sensor("binary_sensor.kitchen_motion", "kitchen", "occupancy", EntityState::On);
        assert_eq!(fixture.evaluate("kitchen"), Reason::Occupied);

        fixture.home.set("binary_sensor.kitchen_motion", EntityState::Off);
        assert_eq!(fixture.evaluate("kitchen"), Reason::CooldownHold);
        let key = fixture.record("kitchen").key.clone();
        assert!(fixture.evaluator.has_timer(&key));

        tokio::time::advance(Duration::from_secs(200)).await;
        assert!(fixture.timers.try_recv().is_err());

        let fired = fixture.timers.recv().await.unwrap();
        assert_eq!(fired.room, key);
        assert!(fixture.evaluator.on_timer(&fired));
        assert_eq!(fixture.evaluate("kitchen"), Reason::Ready);
        assert!(!fixture.evaluator.has_timer(&key));
    }

    #[tokio::test(start_paused = true)]
    async fn should_keep_single_timer_while_holding() {
        let mut fixture = Fixture::kitchen(300);
        fixture
            .home
            .add_sensor("binary_sensor.kitchen_motion", "kitchen", "occupancy", EntityState::On);
        fixture.evaluate("kitchen");
        fixture.home.set("binary_sensor.kitchen_motion", EntityState::Off);

        fixture.evaluate("kitchen");
        tokio::time::advance(Duration::from_secs(10)).await;
        assert_eq!(fixture.evaluate("kitchen"), Reason::CooldownHold);

        let fired = fixture.timers.recv().await.unwrap();
        assert_eq!(fired.generation, 1);
        assert!(fixture.evaluator.on_timer(&fired));
    }

    #[tokio::test(start_paused = true)]
    async fn should_cancel_timer_when_room_occupied_again() {
        let mut fixture = Fixture::kitchen(300);
        fixture
            .home
            .add_sensor("binary_sensor.kitchen_motion", "kitchen", "occupancy", EntityState::On);
        fixture.evaluate("kitchen");
        fixture.home.set("binary_sensor.kitchen_motion", EntityState::Off);
        fixture.evaluate("kitchen");
        let key = fixture.record("kitchen").key.clone();

        fixture.home.set("binary_sensor.kitchen_motion", EntityState::On);
        assert_eq!(fixture.evaluate("kitchen"), Reason::Occupied);
        assert!(!fixture.evaluator.has_timer(&key));

        tokio::time::advance(Duration::from_secs(400)).await;
        assert!(fixture.timers.try_recv().is_err());
    }

    #[tokio::test]
    async fn should_ignore_stale_timer_generation() {
        let fixture = Fixture::kitchen(300);
        let key = fixture.record("kitchen").key.clone();
        let stale = CooldownElapsed {
            room: key,
            generation: 7,
        };
        assert!(!fixture.evaluator.on_timer(&stale));
    }

    #[tokio::test]
    async fn should_report_door_closed_when_device_outside_room() {
        let fixture = Fixture::kitchen(0);
        fixture
            .home
            .add_sensor("binary_sensor.kitchen_door", "kitchen", "door", EntityState::Off);

        assert_eq!(fixture.evaluate("kitchen"), Reason::DoorClosed);
        let signal = fixture.signal("kitchen");
        assert_eq!(
            signal.get_attribute("door_sensors"),
            Some(&AttributeValue::Json(json!(["binary_sensor.kitchen_door"])))
        );
    }

    #[tokio::test]
    async fn should_report_trapped_when_device_shut_in_served_location() {
        let fixture = Fixture::kitchen(0);
        fixture
            .home
            .add_sensor("binary_sensor.hall_door", "hall", "door", EntityState::Off);

        assert_eq!(fixture.evaluate("kitchen"), Reason::Trapped);
        assert_eq!(fixture.evaluate("hall"), Reason::Ready);
    }

    #[tokio::test]
    async fn should_ignore_barriers_outside_served_locations() {
        let fixture = Fixture::kitchen(0);
        fixture
            .home
            .add_sensor("binary_sensor.garage_door", "garage", "door", EntityState::Off);

        assert_eq!(fixture.evaluate("kitchen"), Reason::Ready);
        assert!(
            fixture
                .evaluator
                .rooms_watching(&EntityId::new("binary_sensor.garage_door"))
                .is_empty()
        );
    }

    #[tokio::test]
    async fn should_track_discovered_sensors_for_routing() {
        let fixture = Fixture::kitchen(0);
        fixture
            .home
            .add_sensor("binary_sensor.kitchen_motion", "kitchen", "occupancy", EntityState::Off);
        fixture.evaluate("kitchen");

        let watching = fixture
            .evaluator
            .rooms_watching(&EntityId::new("binary_sensor.kitchen_motion"));
        assert_eq!(watching, vec![fixture.record("kitchen").key.clone()]);
    }

    #[tokio::test]
    async fn should_publish_diagnostic_attributes() {
        let fixture = Fixture::kitchen(0);
        fixture.cache.register_control(
            "kitchen",
            ControlKind::Enable,
            EntityId::new("switch.tidyhub_clean_kitchen"),
        );
        fixture.evaluate("kitchen");

        let signal = fixture.signal("kitchen");
        assert_eq!(
            signal.get_attribute("segments"),
            Some(&AttributeValue::Json(json!([1])))
        );
        assert_eq!(
            signal.get_attribute("device"),
            Some(&AttributeValue::from("vacuum.robot"))
        );
        assert_eq!(
            signal.get_attribute("enable_control"),
            Some(&AttributeValue::from("switch.tidyhub_clean_kitchen"))
        );
        assert!(signal.get_attribute("override_control").is_none());
    }
}
