//! Schedule and time slots
//!
//! Slot lookups are tagged with a generation number. Changing the date, vendor
//! or service duration starts a new generation, and responses from earlier
//! generations are discarded when they arrive.

use jiff::civil::{Date, Time};
use serde::Serialize;
use tracing::debug;

use crate::{
    amounts::Minutes,
    api::{ApiError, SlotQuery, TimeSlot},
    catalog::VendorId,
};

/// When the service should happen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderType {
    /// As soon as possible; no date or time needed
    Now,

    /// At a chosen date and time
    #[default]
    Scheduled,
}

/// State of the slot list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SlotStatus {
    /// Nothing requested yet, or inputs incomplete
    #[default]
    Idle,

    /// A lookup is in flight
    Loading,

    /// Slots are loaded
    Ready,

    /// The lookup failed; carries the message to show
    Failed(String),
}

/// A slot lookup to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotRequest {
    /// Generation the response must be completed with
    pub generation: u64,

    /// Query to send
    pub query: SlotQuery,
}

/// Date, time and available slots.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScheduleState {
    order_type: OrderType,
    date: Option<Date>,
    time: Option<Time>,
    slots: Vec<TimeSlot>,
    status: SlotStatus,
    generation: u64,
}

impl ScheduleState {
    /// Selected order type.
    pub fn order_type(&self) -> OrderType {
        self.order_type
    }

    /// Selected date.
    pub fn date(&self) -> Option<Date> {
        self.date
    }

    /// Selected start time.
    pub fn time(&self) -> Option<Time> {
        self.time
    }

    /// Loaded slots. Empty unless [`SlotStatus::Ready`].
    pub fn slots(&self) -> &[TimeSlot] {
        &self.slots
    }

    /// Slot list status.
    pub fn status(&self) -> &SlotStatus {
        &self.status
    }

    /// Current generation.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether a time may be picked right now.
    pub fn time_selectable(&self) -> bool {
        self.status == SlotStatus::Ready
    }

    /// True when `time` is a loaded slot with a free technician.
    pub fn is_available(&self, time: Time) -> bool {
        self.slots
            .iter()
            .any(|slot| slot.start() == Some(time) && slot.is_available())
    }

    pub(crate) fn set_order_type(&mut self, order_type: OrderType) {
        if self.order_type != order_type {
            self.order_type = order_type;
            self.invalidate();
        }
    }

    pub(crate) fn set_date(&mut self, date: Date) {
        if self.date != Some(date) {
            self.date = Some(date);
            self.invalidate();
        }
    }

    pub(crate) fn set_time(&mut self, time: Time) {
        self.time = Some(time);
    }

    /// Forget loaded slots and the chosen time, and supersede any lookup in
    /// flight.
    pub(crate) fn invalidate(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        self.slots.clear();
        self.time = None;
        self.status = SlotStatus::Idle;
    }

    /// Start a lookup if every input is present.
    pub(crate) fn begin(
        &mut self,
        vendor: Option<VendorId>,
        duration: Minutes,
    ) -> Option<SlotRequest> {
        self.invalidate();

        if self.order_type == OrderType::Now || duration.get() == 0 {
            return None;
        }

        let (Some(vendor), Some(date)) = (vendor, self.date) else {
            return None;
        };

        self.status = SlotStatus::Loading;

        Some(SlotRequest {
            generation: self.generation,
            query: SlotQuery {
                vendor,
                date,
                service_duration: duration,
            },
        })
    }

    /// Apply a lookup result. Returns `false` when the result was stale and
    /// ignored.
    pub(crate) fn complete(
        &mut self,
        generation: u64,
        result: Result<Vec<TimeSlot>, &ApiError>,
    ) -> bool {
        if generation != self.generation {
            debug!(
                generation,
                current = self.generation,
                "discarding stale slot response"
            );
            return false;
        }

        match result {
            Ok(slots) => {
                self.slots = slots;
                self.status = SlotStatus::Ready;
            }
            Err(error) => {
                self.slots.clear();
                self.status = SlotStatus::Failed(error.user_message());
            }
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use jiff::civil::{date, time};

    use crate::api::SlotTechnician;

    use super::*;

    fn slot(label: &str, available: u32) -> TimeSlot {
        TimeSlot {
            time: label.to_string(),
            available_count: available,
            available_technicians: (0..available)
                .map(|id| SlotTechnician {
                    id: u64::from(id),
                    name: format!("Tech {id}"),
                })
                .collect(),
        }
    }

    fn ready_schedule() -> ScheduleState {
        let mut schedule = ScheduleState::default();
        schedule.set_date(date(2026, 10, 20));
        schedule
    }

    #[test]
    fn lookup_needs_vendor_date_and_duration() {
        let mut schedule = ScheduleState::default();

        assert_eq!(schedule.begin(Some(VendorId(1)), Minutes::new(60)), None);

        schedule.set_date(date(2026, 10, 20));

        assert_eq!(schedule.begin(None, Minutes::new(60)), None);
        assert_eq!(schedule.begin(Some(VendorId(1)), Minutes::new(0)), None);

        let request = schedule.begin(Some(VendorId(1)), Minutes::new(60));
        assert_eq!(
            request.map(|r| r.query),
            Some(SlotQuery {
                vendor: VendorId(1),
                date: date(2026, 10, 20),
                service_duration: Minutes::new(60),
            })
        );
        assert_eq!(schedule.status(), &SlotStatus::Loading);
        assert!(!schedule.time_selectable());
    }

    #[test]
    fn no_lookup_for_immediate_orders() {
        let mut schedule = ready_schedule();
        schedule.set_order_type(OrderType::Now);

        assert_eq!(schedule.begin(Some(VendorId(1)), Minutes::new(60)), None);
    }

    #[test]
    fn stale_responses_are_discarded() {
        let mut schedule = ready_schedule();

        let first = schedule.begin(Some(VendorId(1)), Minutes::new(60));
        let second = schedule.begin(Some(VendorId(1)), Minutes::new(90));

        let (Some(first), Some(second)) = (first, second) else {
            panic!("both lookups should start");
        };

        assert!(schedule.complete(second.generation, Ok(vec![slot("10:00", 1)])));
        assert!(!schedule.complete(first.generation, Ok(vec![slot("09:00", 2)])));

        assert_eq!(schedule.slots(), [slot("10:00", 1)]);
    }

    #[test]
    fn failed_lookup_leaves_no_slots() {
        let mut schedule = ready_schedule();
        let request = schedule.begin(Some(VendorId(1)), Minutes::new(60));
        let generation = request.map_or(0, |r| r.generation);

        schedule.complete(generation, Err(&ApiError::MissingData));

        assert!(schedule.slots().is_empty());
        assert!(matches!(schedule.status(), SlotStatus::Failed(_)));
        assert!(!schedule.is_available(time(9, 0, 0, 0)));
    }

    #[test]
    fn availability_requires_a_free_technician() {
        let mut schedule = ready_schedule();
        let generation = schedule
            .begin(Some(VendorId(1)), Minutes::new(60))
            .map_or(0, |r| r.generation);

        schedule.complete(generation, Ok(vec![slot("09:00", 0), slot("09:30", 2)]));

        assert!(!schedule.is_available(time(9, 0, 0, 0)));
        assert!(schedule.is_available(time(9, 30, 0, 0)));
    }

    #[test]
    fn changing_date_clears_time() {
        let mut schedule = ready_schedule();
        schedule.set_time(time(9, 30, 0, 0));

        schedule.set_date(date(2026, 10, 21));

        assert_eq!(schedule.time(), None);
    }
}
