//! Reverse geocoding of a GPS fix to a French department name and code.
//!
//! One GET against the public Nominatim endpoint per captured position.
//! Geocoding is best-effort display data: every failure mode - network
//! error, non-JSON body, unexpected response shape - collapses to the
//! [`DepartmentInfo::unknown`] placeholder pair and is only logged. Record
//! creation never waits on or fails because of this call.

use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Public Nominatim reverse-geocoding endpoint.
pub const NOMINATIM_REVERSE_URL: &str = "https://nominatim.openstreetmap.org/reverse";

/// Placeholder used whenever the department cannot be resolved.
pub const UNKNOWN_DEPARTMENT: &str = "Inconnu";

/// Resolved administrative region for a coordinate pair.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct DepartmentInfo {
    #[serde(default = "unknown_value")]
    pub department: String,
    #[serde(rename = "departmentCode", default = "unknown_value")]
    pub department_code: String,
}

fn unknown_value() -> String {
    UNKNOWN_DEPARTMENT.to_string()
}

impl DepartmentInfo {
    /// The `"Inconnu"`/`"Inconnu"` fallback pair.
    pub fn unknown() -> Self {
        DepartmentInfo {
            department: UNKNOWN_DEPARTMENT.to_string(),
            department_code: UNKNOWN_DEPARTMENT.to_string(),
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.department == UNKNOWN_DEPARTMENT && self.department_code == UNKNOWN_DEPARTMENT
    }
}

impl Default for DepartmentInfo {
    fn default() -> Self {
        DepartmentInfo::unknown()
    }
}

/// Extracts `address.county` and `address.postcode` from a Nominatim
/// response body. Any missing piece yields the unknown pair; a response
/// without both fields is treated the same as a failed request.
pub fn parse_department(body: &JsonValue) -> DepartmentInfo {
    let address = match body.get("address") {
        Some(JsonValue::Object(map)) => map,
        _ => return DepartmentInfo::unknown(),
    };

    let field = |name: &str| {
        address
            .get(name)
            .and_then(JsonValue::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| UNKNOWN_DEPARTMENT.to_string())
    };

    DepartmentInfo {
        department: field("county"),
        department_code: field("postcode"),
    }
}

/// Blocking client for the reverse-geocoding call.
///
/// Callers run it off the UI thread; the embedding app's async bridge
/// provides the suspend/resume. No explicit timeout is set - an
/// unresponsive service only stalls the department display, nothing else.
pub struct GeocodeClient {
    base_url: String,
    http: reqwest::blocking::Client,
}

impl GeocodeClient {
    pub fn new() -> Self {
        Self::with_base_url(NOMINATIM_REVERSE_URL)
    }

    /// Points the client at a different endpoint. Used by tests.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        // Nominatim's usage policy requires an identifying user agent.
        let http = reqwest::blocking::Client::builder()
            .user_agent(concat!("obstacles_core/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|_| reqwest::blocking::Client::new());

        GeocodeClient {
            base_url: base_url.into(),
            http,
        }
    }

    /// Resolves a coordinate pair to its department, falling back to the
    /// unknown pair on any failure. Never returns an error.
    pub fn resolve(&self, latitude: f64, longitude: f64) -> DepartmentInfo {
        let response = self
            .http
            .get(&self.base_url)
            .query(&[
                ("lat", latitude.to_string()),
                ("lon", longitude.to_string()),
                ("format", "json".to_string()),
                ("addressdetails", "1".to_string()),
            ])
            .send();

        let body: JsonValue = match response.and_then(|r| r.json()) {
            Ok(body) => body,
            Err(e) => {
                warn!("Reverse geocoding failed, keeping placeholder department: {e}");
                return DepartmentInfo::unknown();
            }
        };

        parse_department(&body)
    }
}

impl Default for GeocodeClient {
    fn default() -> Self {
        GeocodeClient::new()
    }
}
