use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;

use crate::errors::EngineError;
use crate::models::{
    AppointmentPatch, AppointmentStatus, NewAppointment, SessionState, BOOKED_BY_ASSISTANT,
};
use crate::services::clock;
use crate::store::SlotStore;

/// Result of an availability check. When `available` is true a provisional
/// hold has already been created and `hold_id` references it; the slot is
/// blocked for everyone else until the hold is confirmed or dropped.
#[derive(Debug, Clone, Serialize)]
pub struct AvailabilityOutcome {
    pub available: bool,
    pub hold_id: Option<String>,
    pub message: Option<String>,
}

impl AvailabilityOutcome {
    fn unavailable(message: Option<String>) -> Self {
        Self {
            available: false,
            hold_id: None,
            message,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AppointmentSummary {
    pub id: String,
    pub service: String,
    pub day: NaiveDate,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub status: AppointmentStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct LookupOutcome {
    pub found: bool,
    pub appointments: Vec<AppointmentSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModifyOutcome {
    pub success: bool,
    pub message: Option<String>,
}

impl ModifyOutcome {
    fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CancelOutcome {
    pub success: bool,
}

/// State machine per appointment: none → Hold → Confirmed → (modified*) →
/// cancelled. A hold decays back to none when it is never confirmed.
///
/// The store's query-then-create sequence is not atomic, so the engine
/// serializes all interval writes for one business-local day through an
/// async lock. That is what upholds the overlap invariant under concurrent
/// availability checks.
pub struct BookingEngine {
    slots: Arc<dyn SlotStore>,
    duration_minutes: i64,
    day_locks: Mutex<HashMap<NaiveDate, Arc<tokio::sync::Mutex<()>>>>,
}

impl BookingEngine {
    pub fn new(slots: Arc<dyn SlotStore>, duration_minutes: i64) -> Self {
        Self {
            slots,
            duration_minutes,
            day_locks: Mutex::new(HashMap::new()),
        }
    }

    fn day_lock(&self, day: NaiveDate) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.day_locks.lock().unwrap();
        Arc::clone(locks.entry(day).or_default())
    }

    fn resolve_slot(
        &self,
        date: &str,
        time: &str,
        timezone: &str,
    ) -> Result<(NaiveDate, DateTime<Utc>, DateTime<Utc>), EngineError> {
        let tz = clock::resolve_timezone(timezone)?;
        let day = clock::parse_day(date)?;
        let start_at = clock::to_instant(day, clock::parse_time(time)?, tz)?;
        let end_at = clock::add_minutes(start_at, self.duration_minutes);
        Ok((day, start_at, end_at))
    }

    /// Checks whether a slot is free and, if so, immediately reserves it
    /// with a provisional hold. Create-on-check: the hold blocks the slot
    /// for concurrent checks, at the cost of orphaned holds when the
    /// customer never follows up (see `purge_stale_holds`).
    pub async fn check_availability(
        &self,
        state: &SessionState,
        service: &str,
        date: &str,
        time: &str,
    ) -> Result<AvailabilityOutcome, EngineError> {
        let (day, start_at, end_at) =
            match self.resolve_slot(date, time, &state.business.timezone) {
                Ok(slot) => slot,
                Err(EngineError::InvalidInput(msg)) => {
                    return Ok(AvailabilityOutcome::unavailable(Some(msg)));
                }
                Err(e) => return Err(e),
            };

        let lock = self.day_lock(day);
        let _guard = lock.lock().await;

        let overlapping = self.slots.find_overlapping(day, start_at, end_at).await?;
        if !overlapping.is_empty() {
            tracing::info!(customer = %state.customer_id, %day, %start_at, "slot taken");
            return Ok(AvailabilityOutcome::unavailable(None));
        }

        let hold_id = self
            .slots
            .create(NewAppointment {
                service: service.to_string(),
                customer_id: state.customer_id.clone(),
                customer_name: state.display_name.clone(),
                day,
                start_at,
                end_at,
                status: AppointmentStatus::Hold,
                booked_by: BOOKED_BY_ASSISTANT.to_string(),
            })
            .await?;

        tracing::info!(customer = %state.customer_id, %day, %start_at, hold = %hold_id, "slot held");

        Ok(AvailabilityOutcome {
            available: true,
            hold_id: Some(hold_id),
            message: None,
        })
    }

    /// Finalizes a hold. Returns `false` without side effects when the
    /// customer declined or the hold id is unknown. No overlap re-check:
    /// the hold already owns the interval.
    pub async fn confirm(&self, hold_id: &str, confirmed: bool) -> Result<bool, EngineError> {
        if !confirmed {
            return Ok(false);
        }

        let patch = AppointmentPatch {
            status: Some(AppointmentStatus::Confirmed),
            ..AppointmentPatch::default()
        };
        let updated = self.slots.update(hold_id, patch).await?;

        if updated {
            tracing::info!(hold = %hold_id, "appointment confirmed");
        } else {
            tracing::warn!(hold = %hold_id, "confirm on unknown hold");
        }
        Ok(updated)
    }

    /// All appointments (held and confirmed) of a customer. Ordering is
    /// the caller's presentation concern.
    pub async fn lookup(&self, customer_id: &str) -> Result<LookupOutcome, EngineError> {
        let appointments = self.slots.list_by_customer(customer_id).await?;

        let summaries: Vec<AppointmentSummary> = appointments
            .into_iter()
            .map(|a| AppointmentSummary {
                id: a.id,
                service: a.service,
                day: a.day,
                start_at: a.start_at,
                end_at: a.end_at,
                status: a.status,
            })
            .collect();

        Ok(LookupOutcome {
            found: !summaries.is_empty(),
            appointments: summaries,
        })
    }

    /// Moves an appointment to a new date and/or time. An omitted field is
    /// carried over from the existing booking, interpreted in the given
    /// timezone. The new interval is re-validated against every other
    /// appointment before the update is applied.
    pub async fn modify(
        &self,
        id: &str,
        new_date: Option<&str>,
        new_time: Option<&str>,
        timezone: &str,
    ) -> Result<ModifyOutcome, EngineError> {
        let tz = match clock::resolve_timezone(timezone) {
            Ok(tz) => tz,
            Err(e) => return Ok(ModifyOutcome::failed(e.to_string())),
        };

        let Some(existing) = self.slots.get(id).await? else {
            return Ok(ModifyOutcome::failed("no appointment with that id"));
        };

        let day = match new_date {
            Some(d) => match clock::parse_day(d) {
                Ok(day) => day,
                Err(e) => return Ok(ModifyOutcome::failed(e.to_string())),
            },
            None => existing.day,
        };
        let time = match new_time {
            Some(t) => match clock::parse_time(t) {
                Ok(time) => time,
                Err(e) => return Ok(ModifyOutcome::failed(e.to_string())),
            },
            None => existing.start_at.with_timezone(&tz).time(),
        };

        let start_at = match clock::to_instant(day, time, tz) {
            Ok(t) => t,
            Err(e) => return Ok(ModifyOutcome::failed(e.to_string())),
        };
        let end_at = clock::add_minutes(start_at, self.duration_minutes);

        let lock = self.day_lock(day);
        let _guard = lock.lock().await;

        let conflict = self
            .slots
            .find_overlapping(day, start_at, end_at)
            .await?
            .into_iter()
            .any(|a| a.id != existing.id);
        if conflict {
            tracing::info!(appointment = %id, %day, %start_at, "modify rejected: slot conflict");
            return Ok(ModifyOutcome::failed(EngineError::SlotConflict.to_string()));
        }

        let patch = AppointmentPatch {
            day: Some(day),
            start_at: Some(start_at),
            end_at: Some(end_at),
            ..AppointmentPatch::default()
        };
        if !self.slots.update(id, patch).await? {
            // Deleted between the read and the write.
            return Ok(ModifyOutcome::failed("no appointment with that id"));
        }

        tracing::info!(appointment = %id, %day, %start_at, "appointment moved");
        Ok(ModifyOutcome {
            success: true,
            message: None,
        })
    }

    /// Deletes an appointment. Any caller holding the id may cancel it;
    /// there is no ownership check.
    pub async fn cancel(&self, id: &str) -> Result<CancelOutcome, EngineError> {
        let success = self.slots.delete(id).await?;
        if success {
            tracing::info!(appointment = %id, "appointment cancelled");
        }
        Ok(CancelOutcome { success })
    }

    /// Drops holds older than `max_age` that were never confirmed.
    pub async fn purge_stale_holds(&self, max_age: Duration) -> Result<usize, EngineError> {
        let cutoff = Utc::now() - max_age;
        let purged = self.slots.delete_stale_holds(cutoff).await?;
        if purged > 0 {
            tracing::info!(purged, "purged stale holds");
        }
        Ok(purged)
    }
}
