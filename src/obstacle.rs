//! Data model for persisted obstacle records.
//!
//! An [`ObstacleRecord`] is one user-reported route hazard: a title, free-text
//! routing instructions, GPS coordinates kept as sanitized strings, an
//! optional reference to a locally cached compressed photo, and the
//! department resolved from the coordinates. Records are created once by the
//! editor and never mutated afterwards; the only other lifecycle event is an
//! explicit delete from the list screen.
//!
//! The JSON field names match the data the mobile app historically stored
//! under its single storage key, so a store written by an earlier app version
//! deserializes unchanged.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Reserved id of the example record seeded into every fresh store.
pub const SEED_OBSTACLE_ID: &str = "1";

/// A user-reported route hazard.
///
/// # Examples
///
/// ```rust
/// use obstacles_core::obstacle::ObstacleRecord;
///
/// let record = ObstacleRecord {
///     id: ObstacleRecord::generate_id(),
///     title: "Inondation".to_string(),
///     instructions: "Route coupée, passer par la D910.".to_string(),
///     latitude: "48.856613".to_string(),
///     longitude: "2.352222".to_string(),
///     image: None,
///     department: "Paris".to_string(),
///     department_code: "75000".to_string(),
/// };
///
/// let json = serde_json::to_string(&record)?;
/// let back: ObstacleRecord = serde_json::from_str(&json)?;
/// assert_eq!(record, back);
/// # Ok::<(), serde_json::Error>(())
/// ```
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ObstacleRecord {
    /// Unique identifier, used as the stable list key. Fresh records get a
    /// random UUID; the seed record keeps the reserved literal `"1"`.
    pub id: String,

    /// Short label shown in the list. Required, non-empty after trimming.
    pub title: String,

    /// Free-text rerouting instructions. Required, non-empty after trimming.
    pub instructions: String,

    /// Decimal latitude as entered or captured, digits and `.` only.
    /// `"00.00"` when the user saved without a coordinate.
    pub latitude: String,

    /// Same shape and default as [`latitude`](Self::latitude).
    pub longitude: String,

    /// Reference to the locally cached *compressed* copy of the photo, or
    /// `None` when the user attached nothing. The uncompressed original is
    /// never stored.
    #[serde(default)]
    pub image: Option<String>,

    /// Human-readable region name, `"Inconnu"` when geocoding did not
    /// resolve.
    pub department: String,

    /// Postal/area code, `"Inconnu"` when geocoding did not resolve.
    #[serde(rename = "departmentCode")]
    pub department_code: String,
}

impl ObstacleRecord {
    /// Generates a collision-resistant id for a new record.
    ///
    /// The app originally derived ids from the wall clock, which collides
    /// when two records land on the same tick; a random UUID keeps the
    /// uniqueness invariant without relying on clock resolution.
    pub fn generate_id() -> String {
        Uuid::new_v4().to_string()
    }

    /// The fixed example record guaranteed present exactly once in the
    /// stored list (see the seeding rule in the store).
    pub fn seed() -> Self {
        ObstacleRecord {
            id: SEED_OBSTACLE_ID.to_string(),
            title: "Incendie".to_string(),
            instructions: "Un incendie bloque la route, il faut donc passer par les petites \
                           routes de campagnes depuis Metz."
                .to_string(),
            latitude: "49.106841".to_string(),
            longitude: "6.176418".to_string(),
            image: Some("assets/images/fire-forest.jpeg".to_string()),
            department: "Moselle".to_string(),
            department_code: "57000".to_string(),
        }
    }
}
