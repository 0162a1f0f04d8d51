//! Per-browser authentication state.
//!
//! A [`SessionStore`] is built for each request from the browser's session
//! record. It is the only writer of the token and profile keys: handlers call
//! [`SessionStore::login`] and [`SessionStore::logout`], everything else
//! reads.
//!
//! ```text
//!  Checking --rehydrate--> Authenticated | Unauthenticated
//!  *        --login------> Authenticated
//!  *        --logout-----> Unauthenticated
//! ```

mod slot;

use idwm_core::Role;
use serde_json::Value;
use thiserror::Error;

use crate::models::{Identity, Profile, session_keys};
use crate::token::{decode_payload, role_of};

pub use slot::{MemorySlot, TokenSlot};

/// Errors reading or writing the durable slot.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session store error: {0}")]
    Session(#[from] tower_sessions::session::Error),
    #[error("session value could not be serialized: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Where the store is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// The slot has not been read yet.
    Checking,
    Authenticated,
    Unauthenticated,
}

/// Holds the current [`Identity`] and keeps it in sync with a [`TokenSlot`].
#[derive(Debug)]
pub struct SessionStore<S> {
    slot: S,
    status: SessionStatus,
    identity: Option<Identity>,
}

impl<S: TokenSlot> SessionStore<S> {
    /// Wrap a slot without reading it. Status starts at `Checking`.
    pub const fn new(slot: S) -> Self {
        Self {
            slot,
            status: SessionStatus::Checking,
            identity: None,
        }
    }

    /// Wrap a slot and immediately [`rehydrate`](Self::rehydrate).
    ///
    /// # Errors
    ///
    /// Returns `SessionError` if the slot cannot be read.
    pub async fn open(slot: S) -> Result<Self, SessionError> {
        let mut store = Self::new(slot);
        store.rehydrate().await?;
        Ok(store)
    }

    /// Read the token from the slot and rebuild the identity.
    ///
    /// The identity comes from the stored profile when there is one, and from
    /// the token's claims otherwise. A token that cannot be decoded still
    /// counts as authenticated here; guards decide what to do with it.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` if the slot cannot be read.
    pub async fn rehydrate(&mut self) -> Result<SessionStatus, SessionError> {
        let token = match self.slot.load(session_keys::TOKEN).await? {
            Some(Value::String(token)) if !token.trim().is_empty() => token,
            _ => {
                self.identity = None;
                self.status = SessionStatus::Unauthenticated;
                return Ok(self.status);
            }
        };

        let profile = match self.slot.load(session_keys::PROFILE).await? {
            Some(value) => serde_json::from_value::<Profile>(value)
                .inspect_err(|e| tracing::warn!(error = %e, "Discarding unreadable profile"))
                .ok(),
            None => None,
        };

        let identity = match (profile, decode_payload(&token)) {
            (Some(profile), _) => Identity::new(profile, token),
            (None, Ok(payload)) => Identity::from_claims(&token, &payload),
            (None, Err(_)) => Identity::new(Profile::default(), token),
        };

        self.identity = Some(identity);
        self.status = SessionStatus::Authenticated;
        Ok(self.status)
    }

    /// Replace the identity and persist it.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` if the slot cannot be written. The in-memory
    /// state is only updated once both writes succeed.
    pub async fn login(&mut self, identity: Identity) -> Result<(), SessionError> {
        let profile = serde_json::to_value(identity.profile())?;
        self.slot
            .store(session_keys::TOKEN, Value::String(identity.token().to_string()))
            .await?;
        self.slot.store(session_keys::PROFILE, profile).await?;

        tracing::debug!(role = ?identity.role, "Session authenticated");
        self.identity = Some(identity);
        self.status = SessionStatus::Authenticated;
        Ok(())
    }

    /// Forget the identity and clear the slot.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` if the slot cannot be written.
    pub async fn logout(&mut self) -> Result<(), SessionError> {
        self.identity = None;
        self.status = SessionStatus::Unauthenticated;
        self.slot.remove(session_keys::TOKEN).await?;
        self.slot.remove(session_keys::PROFILE).await?;
        tracing::debug!("Session cleared");
        Ok(())
    }

    #[must_use]
    pub const fn status(&self) -> SessionStatus {
        self.status
    }

    #[must_use]
    pub const fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.identity.as_ref().map(Identity::token)
    }

    /// Role decoded from the current token. Recomputed on every call.
    #[must_use]
    pub fn role(&self) -> Option<Role> {
        self.token().and_then(role_of)
    }
}
