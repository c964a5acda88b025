use std::env;

use crate::models::BusinessContext;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database_url: String,
    pub business_name: String,
    pub business_phone: String,
    pub business_timezone: String,
    pub slot_duration_minutes: i64,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "frontdesk.db".to_string()),
            business_name: env::var("BUSINESS_NAME").unwrap_or_else(|_| "Front Desk".to_string()),
            business_phone: env::var("BUSINESS_PHONE").unwrap_or_default(),
            business_timezone: env::var("BUSINESS_TIMEZONE").unwrap_or_else(|_| "UTC".to_string()),
            slot_duration_minutes: env::var("SLOT_DURATION_MINUTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(60),
        }
    }

    /// Read-only business reference data handed to every new session.
    pub fn business_context(&self) -> BusinessContext {
        BusinessContext {
            name: self.business_name.clone(),
            phone_number: self.business_phone.clone(),
            timezone: self.business_timezone.clone(),
        }
    }
}
