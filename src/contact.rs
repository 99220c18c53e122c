//! Static emergency-contact directory and the per-screen call session.
//!
//! The directory is a fixed in-memory list with no lifecycle beyond process
//! start. The session state - which contacts have been called, and the
//! transient "call in progress" banner - belongs to the contacts screen:
//! created when the screen is entered, dropped when it is left, never
//! persisted. Time is passed in as an [`Instant`] so the banner can be
//! driven by a simulated clock in tests.

use std::time::{Duration, Instant};

use serde::Serialize;

/// How long the transient banner stays visible after a call is initiated.
pub const BANNER_DURATION: Duration = Duration::from_secs(3);

/// One entry of the fixed emergency-contact list.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct ContactRecord {
    pub id: String,
    pub name: String,
    pub phone: String,
    pub role: String,
}

/// The fixed contact directory.
pub fn directory() -> Vec<ContactRecord> {
    let contact = |id: &str, name: &str, phone: &str, role: &str| ContactRecord {
        id: id.to_string(),
        name: name.to_string(),
        phone: phone.to_string(),
        role: role.to_string(),
    };

    vec![
        contact("1", "John Doe", "06 12 34 56 78", "Directeur RH"),
        contact("2", "Charlize Gevrey", "06 23 45 67 89", "Chef de route"),
    ]
}

/// Serializable view of a session, handed to the UI after each update.
#[derive(Debug, Serialize, PartialEq)]
pub struct SessionSnapshot {
    pub visited: Vec<String>,
    pub banner_visible: bool,
}

/// Per-screen call state for the contacts list.
#[derive(Debug, Default)]
pub struct ContactSession {
    visited: Vec<String>,
    banner_until: Option<Instant>,
}

impl ContactSession {
    pub fn new() -> Self {
        ContactSession::default()
    }

    /// Marks a contact as called. The visited flag is sticky for the rest
    /// of the session; the banner is (re)armed for [`BANNER_DURATION`]
    /// from `now`.
    pub fn mark_called(&mut self, contact_id: &str, now: Instant) {
        if !self.is_visited(contact_id) {
            self.visited.push(contact_id.to_string());
        }
        self.banner_until = Some(now + BANNER_DURATION);
    }

    pub fn is_visited(&self, contact_id: &str) -> bool {
        self.visited.iter().any(|id| id == contact_id)
    }

    /// Whether the transient banner is still showing at `now`.
    pub fn banner_visible(&self, now: Instant) -> bool {
        match self.banner_until {
            Some(until) => now < until,
            None => false,
        }
    }

    pub fn snapshot(&self, now: Instant) -> SessionSnapshot {
        SessionSnapshot {
            visited: self.visited.clone(),
            banner_visible: self.banner_visible(now),
        }
    }
}
