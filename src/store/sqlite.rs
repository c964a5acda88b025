use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::Connection;

use crate::db::queries;
use crate::errors::StoreError;
use crate::models::{Appointment, AppointmentPatch, Customer, NewAppointment, Session};
use crate::store::{CustomerStore, SessionStore, SlotStore};

/// SQLite-backed slot store. The connection is shared behind a mutex; all
/// statements are short and run while holding the lock.
#[derive(Clone)]
pub struct SqliteSlotStore {
    db: Arc<Mutex<Connection>>,
}

impl SqliteSlotStore {
    pub fn new(db: Arc<Mutex<Connection>>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SlotStore for SqliteSlotStore {
    async fn find_overlapping(
        &self,
        day: NaiveDate,
        start_at: DateTime<Utc>,
        end_at: DateTime<Utc>,
    ) -> Result<Vec<Appointment>, StoreError> {
        let db = self.db.lock().unwrap();
        queries::find_overlapping(&db, &day, &start_at, &end_at)
    }

    async fn create(&self, appt: NewAppointment) -> Result<String, StoreError> {
        let now = Utc::now();
        let record = Appointment {
            id: uuid::Uuid::new_v4().to_string(),
            service: appt.service,
            customer_id: appt.customer_id,
            customer_name: appt.customer_name,
            day: appt.day,
            start_at: appt.start_at,
            end_at: appt.end_at,
            status: appt.status,
            booked_by: appt.booked_by,
            created_at: now,
            updated_at: now,
        };

        let db = self.db.lock().unwrap();
        queries::create_appointment(&db, &record)?;
        Ok(record.id)
    }

    async fn get(&self, id: &str) -> Result<Option<Appointment>, StoreError> {
        let db = self.db.lock().unwrap();
        queries::get_appointment(&db, id)
    }

    async fn update(&self, id: &str, patch: AppointmentPatch) -> Result<bool, StoreError> {
        let db = self.db.lock().unwrap();
        queries::update_appointment(&db, id, &patch)
    }

    async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let db = self.db.lock().unwrap();
        queries::delete_appointment(&db, id)
    }

    async fn list_by_customer(&self, customer_id: &str) -> Result<Vec<Appointment>, StoreError> {
        let db = self.db.lock().unwrap();
        queries::list_appointments_for_customer(&db, customer_id)
    }

    async fn delete_stale_holds(&self, cutoff: DateTime<Utc>) -> Result<usize, StoreError> {
        let db = self.db.lock().unwrap();
        queries::delete_stale_holds(&db, &cutoff)
    }
}

#[derive(Clone)]
pub struct SqliteCustomerStore {
    db: Arc<Mutex<Connection>>,
}

impl SqliteCustomerStore {
    pub fn new(db: Arc<Mutex<Connection>>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CustomerStore for SqliteCustomerStore {
    async fn get(&self, id: &str) -> Result<Option<Customer>, StoreError> {
        let db = self.db.lock().unwrap();
        queries::get_customer(&db, id)
    }

    async fn save(&self, customer: &Customer) -> Result<(), StoreError> {
        let db = self.db.lock().unwrap();
        queries::save_customer(&db, customer)
    }
}

#[derive(Clone)]
pub struct SqliteSessionStore {
    db: Arc<Mutex<Connection>>,
}

impl SqliteSessionStore {
    pub fn new(db: Arc<Mutex<Connection>>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SessionStore for SqliteSessionStore {
    async fn get(&self, id: &str) -> Result<Option<Session>, StoreError> {
        let db = self.db.lock().unwrap();
        queries::get_session(&db, id)
    }

    async fn save(&self, session: &Session) -> Result<(), StoreError> {
        let db = self.db.lock().unwrap();
        queries::save_session(&db, session)
    }

    async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let db = self.db.lock().unwrap();
        queries::delete_session(&db, id)
    }
}
