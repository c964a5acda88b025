use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rusqlite::{params, Connection};

use crate::errors::StoreError;
use crate::models::{Appointment, AppointmentPatch, AppointmentStatus, Customer, Session};

fn fmt_instant(t: &DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn parse_instant(s: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|_| StoreError::Corrupt(format!("bad instant: {s}")))
}

fn fmt_day(d: &NaiveDate) -> String {
    d.format("%Y-%m-%d").to_string()
}

fn parse_day(s: &str) -> Result<NaiveDate, StoreError> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| StoreError::Corrupt(format!("bad day: {s}")))
}

// ── Appointments ──

const APPOINTMENT_COLS: &str =
    "id, service, customer_id, customer_name, day, start_at, end_at, status, booked_by, created_at, updated_at";

fn parse_appointment_row(row: &rusqlite::Row) -> Result<Appointment, StoreError> {
    let day_str: String = row.get(4)?;
    let start_str: String = row.get(5)?;
    let end_str: String = row.get(6)?;
    let status_str: String = row.get(7)?;
    let created_str: String = row.get(9)?;
    let updated_str: String = row.get(10)?;

    Ok(Appointment {
        id: row.get(0)?,
        service: row.get(1)?,
        customer_id: row.get(2)?,
        customer_name: row.get(3)?,
        day: parse_day(&day_str)?,
        start_at: parse_instant(&start_str)?,
        end_at: parse_instant(&end_str)?,
        status: AppointmentStatus::parse(&status_str),
        booked_by: row.get(8)?,
        created_at: parse_instant(&created_str)?,
        updated_at: parse_instant(&updated_str)?,
    })
}

pub fn create_appointment(conn: &Connection, appt: &Appointment) -> Result<(), StoreError> {
    conn.execute(
        "INSERT INTO appointments (id, service, customer_id, customer_name, day, start_at, end_at, status, booked_by, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            appt.id,
            appt.service,
            appt.customer_id,
            appt.customer_name,
            fmt_day(&appt.day),
            fmt_instant(&appt.start_at),
            fmt_instant(&appt.end_at),
            appt.status.as_str(),
            appt.booked_by,
            fmt_instant(&appt.created_at),
            fmt_instant(&appt.updated_at),
        ],
    )?;
    Ok(())
}

pub fn get_appointment(conn: &Connection, id: &str) -> Result<Option<Appointment>, StoreError> {
    let result = conn.query_row(
        &format!("SELECT {APPOINTMENT_COLS} FROM appointments WHERE id = ?1"),
        params![id],
        |row| Ok(parse_appointment_row(row)),
    );

    match result {
        Ok(appt) => Ok(Some(appt?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// All appointments (any status) on `day` whose half-open interval
/// intersects `[start_at, end_at)`.
pub fn find_overlapping(
    conn: &Connection,
    day: &NaiveDate,
    start_at: &DateTime<Utc>,
    end_at: &DateTime<Utc>,
) -> Result<Vec<Appointment>, StoreError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {APPOINTMENT_COLS} FROM appointments
         WHERE day = ?1 AND start_at < ?2 AND end_at > ?3"
    ))?;

    let rows = stmt.query_map(
        params![fmt_day(day), fmt_instant(end_at), fmt_instant(start_at)],
        |row| Ok(parse_appointment_row(row)),
    )?;

    let mut appointments = vec![];
    for row in rows {
        appointments.push(row??);
    }
    Ok(appointments)
}

pub fn update_appointment(
    conn: &Connection,
    id: &str,
    patch: &AppointmentPatch,
) -> Result<bool, StoreError> {
    let count = conn.execute(
        "UPDATE appointments SET
            day = COALESCE(?1, day),
            start_at = COALESCE(?2, start_at),
            end_at = COALESCE(?3, end_at),
            status = COALESCE(?4, status),
            updated_at = ?5
         WHERE id = ?6",
        params![
            patch.day.as_ref().map(fmt_day),
            patch.start_at.as_ref().map(fmt_instant),
            patch.end_at.as_ref().map(fmt_instant),
            patch.status.as_ref().map(|s| s.as_str()),
            fmt_instant(&Utc::now()),
            id,
        ],
    )?;
    Ok(count > 0)
}

pub fn delete_appointment(conn: &Connection, id: &str) -> Result<bool, StoreError> {
    let count = conn.execute("DELETE FROM appointments WHERE id = ?1", params![id])?;
    Ok(count > 0)
}

pub fn list_appointments_for_customer(
    conn: &Connection,
    customer_id: &str,
) -> Result<Vec<Appointment>, StoreError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {APPOINTMENT_COLS} FROM appointments
         WHERE customer_id = ?1 ORDER BY start_at ASC"
    ))?;

    let rows = stmt.query_map(params![customer_id], |row| Ok(parse_appointment_row(row)))?;

    let mut appointments = vec![];
    for row in rows {
        appointments.push(row??);
    }
    Ok(appointments)
}

/// Deletes unconfirmed holds created before `cutoff`. Confirmed
/// appointments are never touched.
pub fn delete_stale_holds(conn: &Connection, cutoff: &DateTime<Utc>) -> Result<usize, StoreError> {
    let count = conn.execute(
        "DELETE FROM appointments WHERE status = 'hold' AND created_at < ?1",
        params![fmt_instant(cutoff)],
    )?;
    Ok(count)
}

// ── Customers ──

pub fn get_customer(conn: &Connection, id: &str) -> Result<Option<Customer>, StoreError> {
    let result = conn.query_row(
        "SELECT id, phone_number, display_name, session_id, last_session_id, created_at, updated_at
         FROM customers WHERE id = ?1",
        params![id],
        |row| {
            let created_str: String = row.get(5)?;
            let updated_str: String = row.get(6)?;
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Option<String>>(2)?,
                row.get::<_, Option<String>>(3)?,
                row.get::<_, Option<String>>(4)?,
                created_str,
                updated_str,
            ))
        },
    );

    match result {
        Ok((id, phone_number, display_name, session_id, last_session_id, created, updated)) => {
            Ok(Some(Customer {
                id,
                phone_number,
                display_name,
                session_id,
                last_session_id,
                created_at: parse_instant(&created)?,
                updated_at: parse_instant(&updated)?,
            }))
        }
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn save_customer(conn: &Connection, customer: &Customer) -> Result<(), StoreError> {
    conn.execute(
        "INSERT INTO customers (id, phone_number, display_name, session_id, last_session_id, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
         ON CONFLICT(id) DO UPDATE SET
           phone_number = excluded.phone_number,
           display_name = excluded.display_name,
           session_id = excluded.session_id,
           last_session_id = excluded.last_session_id,
           updated_at = excluded.updated_at",
        params![
            customer.id,
            customer.phone_number,
            customer.display_name,
            customer.session_id,
            customer.last_session_id,
            fmt_instant(&customer.created_at),
            fmt_instant(&Utc::now()),
        ],
    )?;
    Ok(())
}

// ── Sessions ──

pub fn get_session(conn: &Connection, id: &str) -> Result<Option<Session>, StoreError> {
    let result = conn.query_row(
        "SELECT id, state, history, created_at, updated_at FROM sessions WHERE id = ?1",
        params![id],
        |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
            ))
        },
    );

    match result {
        Ok((id, state_json, history_json, created, updated)) => Ok(Some(Session {
            id,
            state: serde_json::from_str(&state_json)?,
            history: serde_json::from_str(&history_json)?,
            created_at: parse_instant(&created)?,
            updated_at: parse_instant(&updated)?,
        })),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn save_session(conn: &Connection, session: &Session) -> Result<(), StoreError> {
    let state_json = serde_json::to_string(&session.state)?;
    let history_json = serde_json::to_string(&session.history)?;

    conn.execute(
        "INSERT INTO sessions (id, state, history, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT(id) DO UPDATE SET
           state = excluded.state,
           history = excluded.history,
           updated_at = excluded.updated_at",
        params![
            session.id,
            state_json,
            history_json,
            fmt_instant(&session.created_at),
            fmt_instant(&Utc::now()),
        ],
    )?;
    Ok(())
}

pub fn delete_session(conn: &Connection, id: &str) -> Result<bool, StoreError> {
    let count = conn.execute("DELETE FROM sessions WHERE id = ?1", params![id])?;
    Ok(count > 0)
}
