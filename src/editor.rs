//! The obstacle editor: form state, input sanitization, validation, and the
//! submit lifecycle.
//!
//! The form moves through `Editing -> Submitting -> {Saved, Invalid,
//! StoreFailed}`. `Invalid` and `StoreFailed` land back in `Editing` with
//! every field intact and nothing stored; `Saved` resets the form so the
//! screen can navigate back to the list. The editor only ever creates
//! records - there is no edit feature, so nothing here mutates an existing
//! record.

use log::warn;
use serde::{Deserialize, Serialize};

use crate::app_response::AppResponse;
use crate::geocode::DepartmentInfo;
use crate::obstacle::ObstacleRecord;
use crate::store_state::ObstacleStore;

/// Coordinate stored when the user saves without one.
pub const DEFAULT_COORDINATE: &str = "00.00";

/// Quality factor the platform compressor must apply before an image
/// reference is handed to [`EditorForm::attach_image`].
pub const IMAGE_COMPRESSION_QUALITY: f64 = 0.5;

/// Output encoding of the compressed attachment.
pub const IMAGE_FORMAT: &str = "jpeg";

/// Strips everything but ASCII digits and `.` from a coordinate input,
/// preserving the relative order of what remains. Applied on every
/// keystroke of the latitude/longitude fields.
pub fn sanitize_coordinate(input: &str) -> String {
    input
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect()
}

/// Formats a one-shot GPS fix as the six-decimal coordinate strings shown
/// in the form.
pub fn format_position(latitude: f64, longitude: f64) -> (String, String) {
    (format!("{latitude:.6}"), format!("{longitude:.6}"))
}

/// Outcome of a submit attempt.
#[derive(Debug)]
pub enum SubmitOutcome {
    /// The record was appended and persisted; the form has been reset.
    Saved(ObstacleRecord),
    /// A required field is empty; the form is untouched, nothing stored.
    Invalid(String),
    /// Persistence failed; the form is untouched, nothing stored.
    StoreFailed(AppResponse),
}

/// Working state of the creation screen.
///
/// Deserializable so the embedding UI can hand its current field values
/// across the FFI boundary in one JSON object.
#[derive(Debug, Default, Deserialize, Serialize, Clone, PartialEq)]
pub struct EditorForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub instructions: String,
    #[serde(default)]
    pub latitude: String,
    #[serde(default)]
    pub longitude: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(flatten)]
    pub department: DepartmentInfo,
}

impl EditorForm {
    pub fn new() -> Self {
        EditorForm::default()
    }

    /// Replaces the latitude field with the sanitized input.
    pub fn set_latitude(&mut self, input: &str) {
        self.latitude = sanitize_coordinate(input);
    }

    /// Replaces the longitude field with the sanitized input.
    pub fn set_longitude(&mut self, input: &str) {
        self.longitude = sanitize_coordinate(input);
    }

    /// Fills both coordinate fields from a captured GPS fix. Called once
    /// when the screen obtains its position; a denied permission simply
    /// never calls this and the form stays editable with blank fields.
    pub fn apply_position_fix(&mut self, latitude: f64, longitude: f64) {
        let (lat, lon) = format_position(latitude, longitude);
        self.latitude = lat;
        self.longitude = lon;
    }

    /// Records the resolved department for the captured position.
    pub fn set_department(&mut self, department: DepartmentInfo) {
        self.department = department;
    }

    /// Holds the reference to the compressed copy produced by the platform
    /// image service. The original asset must not be passed here.
    pub fn attach_image(&mut self, reference: impl Into<String>) {
        self.image = Some(reference.into());
    }

    /// Clears every field back to a pristine form (the cancel/back action).
    pub fn reset(&mut self) {
        *self = EditorForm::default();
    }

    /// Checks the required fields. Whitespace-only input does not count.
    pub fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() || self.instructions.trim().is_empty() {
            return Err("Title and instructions are required".to_string());
        }
        Ok(())
    }

    /// Builds the record that a submit would store: coordinates are
    /// sanitized to digits and `.` (a form can arrive as raw JSON over the
    /// FFI without ever passing through the keystroke setters), anything
    /// left blank becomes [`DEFAULT_COORDINATE`], and a fresh unique id is
    /// drawn.
    fn build_record(&self) -> ObstacleRecord {
        let coordinate = |value: &str| {
            let sanitized = sanitize_coordinate(value);
            if sanitized.is_empty() {
                DEFAULT_COORDINATE.to_string()
            } else {
                sanitized
            }
        };

        ObstacleRecord {
            id: ObstacleRecord::generate_id(),
            title: self.title.clone(),
            instructions: self.instructions.clone(),
            latitude: coordinate(&self.latitude),
            longitude: coordinate(&self.longitude),
            image: self.image.clone(),
            department: self.department.department.clone(),
            department_code: self.department.department_code.clone(),
        }
    }

    /// Runs the whole submit path: validate, build the record, append it
    /// to the store. On success the form is reset; on any failure it is
    /// left exactly as it was and the store is unchanged.
    pub fn submit(&mut self, store: &impl ObstacleStore) -> SubmitOutcome {
        if let Err(msg) = self.validate() {
            return SubmitOutcome::Invalid(msg);
        }

        let record = self.build_record();

        match store.append(record.clone()) {
            Ok(_) => {
                self.reset();
                SubmitOutcome::Saved(record)
            }
            Err(e) => {
                warn!("Failed to persist new obstacle: {e}");
                SubmitOutcome::StoreFailed(e)
            }
        }
    }
}
