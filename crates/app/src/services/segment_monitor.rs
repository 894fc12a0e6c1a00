//! Segment monitor: per-device segment tracking and in-flight reset tasks.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use tidyhub_domain::entity::EntitySnapshot;
use tidyhub_domain::id::{EntityId, SegmentId};
use tidyhub_domain::tracking::{SegmentCompletion, SegmentTracker, is_active};

use crate::clock::Clock;
use crate::task::TaskHandle;

#[derive(Debug, Default)]
struct DeviceMonitor {
    tracker: SegmentTracker,
    in_flight: Vec<TaskHandle>,
}

#[derive(Debug)]
pub struct SegmentMonitor {
    devices: HashMap<EntityId, Mutex<DeviceMonitor>>,
    clock: Clock,
}

impl SegmentMonitor {
    pub fn new<'a>(devices: impl IntoIterator<Item = &'a EntityId>, clock: Clock) -> Self {
        Self {
            devices: devices
                .into_iter()
                .map(|id| (id.clone(), Mutex::new(DeviceMonitor::default())))
                .collect(),
            clock,
        }
    }

    #[must_use]
    pub fn tracks(&self, device: &EntityId) -> bool {
        self.devices.contains_key(device)
    }

    #[must_use]
    pub fn current_segment(&self, device: &EntityId) -> Option<SegmentId> {
        self.devices.get(device).and_then(|cell| {
            cell.lock()
                .unwrap_or_else(PoisonError::into_inner)
                .tracker
                .current()
        })
    }

    /// Feed a device snapshot, reading the segment from `attribute`.
    ///
    /// When a pass completes, `on_completion` may start a task for it. Moving
    /// on to another segment cancels the device's in-flight tasks first;
    /// going idle leaves them running.
    pub fn observe<F>(
        &self,
        snapshot: &EntitySnapshot,
        attribute: &str,
        on_completion: F,
    ) -> Option<SegmentCompletion>
    where
        F: FnOnce(&SegmentCompletion) -> Option<TaskHandle>,
    {
        let cell = self.devices.get(&snapshot.entity_id)?;
        let reported = snapshot
            .get_attribute(attribute)
            .and_then(SegmentId::from_attribute);

        let mut monitor = cell.lock().unwrap_or_else(PoisonError::into_inner);
        let completion = monitor.tracker.observe(
            &snapshot.entity_id,
            &snapshot.state,
            reported,
            self.clock.now(),
        )?;

        tracing::info!(
            device = %completion.device,
            segment = %completion.segment,
            duration_secs = completion.duration_secs(),
            "segment pass finished"
        );
        monitor.in_flight.retain(|task| !task.is_finished());
        if is_active(&snapshot.state) {
            for previous in monitor.in_flight.drain(..) {
                previous.cancel();
            }
        }
        monitor.in_flight.extend(on_completion(&completion));
        Some(completion)
    }

    /// Cancel every in-flight completion task.
    pub fn cancel_all(&self) {
        for cell in self.devices.values() {
            let mut monitor = cell.lock().unwrap_or_else(PoisonError::into_inner);
            for task in monitor.in_flight.drain(..) {
                task.cancel();
            }
        }
    }
}
