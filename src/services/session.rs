use std::sync::Arc;

use chrono::Utc;

use crate::errors::EngineError;
use crate::models::{BusinessContext, Customer, Session, SessionState, StatePatch, Turn};
use crate::store::{CustomerStore, SessionStore};

/// Outcome of `resolve`: the session to continue the conversation in, and
/// whether it was created by this call.
#[derive(Debug, Clone)]
pub struct ResolvedSession {
    pub session: Session,
    pub is_new: bool,
}

/// Resolves inbound customer identifiers to durable sessions.
///
/// Resolution is a read-then-write on the customer record with no
/// compare-and-swap: two near-simultaneous first contacts from the same
/// customer can race to create two sessions, last write wins on
/// `session_id`. Known gap, kept as-is.
pub struct SessionManager {
    sessions: Arc<dyn SessionStore>,
    customers: Arc<dyn CustomerStore>,
    business: BusinessContext,
}

impl SessionManager {
    pub fn new(
        sessions: Arc<dyn SessionStore>,
        customers: Arc<dyn CustomerStore>,
        business: BusinessContext,
    ) -> Self {
        Self {
            sessions,
            customers,
            business,
        }
    }

    /// Loads the customer's active session, creating customer and session
    /// as needed. A customer pointing at a session the store no longer has
    /// is treated as having none: a warning is logged and a fresh session
    /// replaces the dangling pointer.
    pub async fn resolve(
        &self,
        customer_id: &str,
        phone_number: &str,
    ) -> Result<ResolvedSession, EngineError> {
        let mut customer = match self.customers.get(customer_id).await? {
            Some(c) => c,
            None => {
                tracing::info!(customer = %customer_id, "first contact, creating customer");
                Customer::new(customer_id, phone_number)
            }
        };

        if let Some(session_id) = customer.session_id.clone() {
            match self.sessions.get(&session_id).await? {
                Some(session) => {
                    return Ok(ResolvedSession {
                        session,
                        is_new: false,
                    });
                }
                None => {
                    let corrupt = EngineError::SessionCorrupt(format!(
                        "customer {customer_id} points at missing session {session_id}"
                    ));
                    tracing::warn!(error = %corrupt, "recovering with a fresh session");
                }
            }
        }

        let now = Utc::now();
        let session = Session {
            id: uuid::Uuid::new_v4().to_string(),
            state: SessionState {
                customer_id: customer.id.clone(),
                phone_number: customer.phone_number.clone(),
                display_name: customer.display_name.clone(),
                business: self.business.clone(),
            },
            history: vec![],
            created_at: now,
            updated_at: now,
        };

        self.sessions.save(&session).await?;

        customer.session_id = Some(session.id.clone());
        self.customers.save(&customer).await?;

        tracing::info!(customer = %customer_id, session = %session.id, "session created");

        Ok(ResolvedSession {
            session,
            is_new: true,
        })
    }

    /// Ends a session: the session record is deleted and the owning
    /// customer's `session_id` moves to `last_session_id`, forcing a clean
    /// restart on the next contact.
    pub async fn end(&self, session_id: &str) -> Result<(), EngineError> {
        let Some(session) = self.sessions.get(session_id).await? else {
            return Err(EngineError::NotFound(format!("session {session_id}")));
        };

        self.sessions.delete(session_id).await?;

        if let Some(mut customer) = self.customers.get(&session.state.customer_id).await? {
            if customer.session_id.as_deref() == Some(session_id) {
                customer.session_id = None;
            }
            customer.last_session_id = Some(session_id.to_string());
            self.customers.save(&customer).await?;
        }

        tracing::info!(session = %session_id, "session ended");
        Ok(())
    }

    /// Merges learned fields into the session state. A learned display
    /// name is also written through to the customer record so future
    /// sessions start with it.
    pub async fn update_state(
        &self,
        session_id: &str,
        patch: StatePatch,
    ) -> Result<(), EngineError> {
        let Some(mut session) = self.sessions.get(session_id).await? else {
            return Err(EngineError::NotFound(format!("session {session_id}")));
        };

        if let Some(name) = patch.display_name {
            session.state.display_name = Some(name.clone());

            if let Some(mut customer) = self.customers.get(&session.state.customer_id).await? {
                customer.display_name = Some(name);
                self.customers.save(&customer).await?;
            }
        }

        self.sessions.save(&session).await?;
        Ok(())
    }

    /// Appends conversational turns to the session history. The history is
    /// an opaque append-only log owned by the conversational layer.
    pub async fn append_turns(
        &self,
        session_id: &str,
        turns: Vec<Turn>,
    ) -> Result<(), EngineError> {
        let Some(mut session) = self.sessions.get(session_id).await? else {
            return Err(EngineError::NotFound(format!("session {session_id}")));
        };

        session.history.extend(turns);
        self.sessions.save(&session).await?;
        Ok(())
    }
}
