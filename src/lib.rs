//! # Obstacles Core
//!
//! The native core of a route-obstacle reporting mobile app, designed for
//! FFI (Foreign Function Interface) integration with React Native and other
//! cross-platform shells. Built on redb for stable, transactional local
//! storage with hot reload support.
//!
//! The app has two tabbed screens - a static emergency-contacts list and a
//! user-editable list of obstacles (incidents blocking routes) - plus a
//! creation screen. Everything those screens do besides drawing lives here:
//!
//! - **Record store**: the ordered obstacle list, persisted as a JSON array
//!   under the single `"obstacles"` key
//! - **Seed reconciliation**: a fixed example record guaranteed present
//!   exactly once, inserted on first read
//! - **Editor lifecycle**: keystroke sanitization, validation, coordinate
//!   defaults, append-then-reset submit
//! - **Reverse geocoding**: one Nominatim lookup per GPS fix, with a
//!   silent `"Inconnu"` fallback
//! - **Contacts session**: the visited flags and the 3-second transient
//!   banner of the contacts screen
//!
//! ## Quick Start
//!
//! ```no_run
//! use obstacles_core::{create_store, load_obstacles, submit_obstacle};
//! use std::ffi::CString;
//!
//! // Open the store
//! let path = CString::new("obstacles.redb").unwrap();
//! let store = create_store(path.as_ptr());
//!
//! // First load seeds the example record
//! let list = load_obstacles(store);
//!
//! // Submit the creation form
//! let form = CString::new(
//!     r#"{"title":"Incendie","instructions":"bloqué","latitude":"","longitude":""}"#,
//! )
//! .unwrap();
//! let result = submit_obstacle(store, form.as_ptr());
//! ```
//!
//! ## FFI Functions
//!
//! Every function takes C strings in and returns a JSON-encoded
//! [`AppResponse`](app_response::AppResponse) C string (except the handle
//! constructors). All calls are synchronous; the embedding app runs them
//! off the UI thread and bridges them to its async model. A screen that
//! goes away before a call returns simply discards the result - the core
//! holds no per-call state.
//!
//! - [`create_store`] / [`close_store`] - store handle lifecycle
//! - [`load_obstacles`] - load the list, reconciling the seed record
//! - [`submit_obstacle`] - validate and append a new record
//! - [`delete_obstacle`] - remove one record by id
//! - [`sanitize_coordinate_input`] - keystroke filter for coordinate fields
//! - [`format_position_fix`] - six-decimal formatting of a GPS fix
//! - [`resolve_department`] - reverse geocoding with `"Inconnu"` fallback
//! - [`contact_directory`] - the fixed emergency-contact list
//! - [`create_contact_session`] / [`contact_mark_called`] /
//!   [`contact_session_state`] / [`close_contact_session`] - per-screen
//!   contacts state

pub mod app_response;
pub mod contact;
pub mod editor;
pub mod geocode;
pub mod obstacle;
pub mod store_state;

use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_double};
use std::sync::OnceLock;
use std::time::Instant;

use log::{info, warn};

use crate::app_response::AppResponse;
use crate::contact::ContactSession;
use crate::editor::EditorForm;
use crate::geocode::GeocodeClient;
use crate::store_state::AppStoreState;

/// Opens (or creates) the obstacle store at the given path.
///
/// # Parameters
///
/// * `path` - A null-terminated C string with the store file path
///
/// # Returns
///
/// Returns a pointer to the [`AppStoreState`] instance on success, or a
/// null pointer on failure. The caller owns the pointer and releases it
/// with [`close_store`].
///
/// # Safety
///
/// This function is unsafe because it:
/// - Dereferences a raw pointer without validation
/// - Returns a raw pointer that must be properly managed
/// - Requires the input string to be valid UTF-8
///
/// # Examples
///
/// ```no_run
/// use std::ffi::CString;
/// use obstacles_core::create_store;
///
/// let path = CString::new("obstacles.redb").unwrap();
/// let store = create_store(path.as_ptr());
///
/// if !store.is_null() {
///     // Store opened successfully
/// }
/// ```
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn create_store(path: *const c_char) -> *mut AppStoreState {
    if path.is_null() {
        warn!("Null path pointer passed to create_store");
        return std::ptr::null_mut();
    }

    let path_str = match unsafe { CStr::from_ptr(path).to_str() } {
        Ok(s) => s,
        Err(e) => {
            warn!("Invalid UTF-8 in path parameter: {e}");
            return std::ptr::null_mut();
        }
    };

    info!("Opening obstacle store at: {path_str}");

    match AppStoreState::init(path_str) {
        Ok(state) => Box::into_raw(Box::new(state)),
        Err(e) => {
            warn!("Failed to open obstacle store at {path_str}: {e}");
            std::ptr::null_mut()
        }
    }
}

/// Releases a store handle created by [`create_store`].
///
/// Pending redb transactions are finished by the drop; the pointer must
/// not be used afterwards. Useful for hot reload, where the shell tears
/// down and reopens its native handles.
///
/// # Safety
///
/// The pointer must come from [`create_store`] and must not be released
/// twice.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn close_store(state: *mut AppStoreState) -> *const c_char {
    if state.is_null() {
        let error = AppResponse::BadRequest("Null state pointer passed to close_store".to_string());
        return response_to_c_string(&error);
    }

    drop(unsafe { Box::from_raw(state) });

    let success = AppResponse::success("Store closed successfully");
    response_to_c_string(&success)
}

/// Loads the obstacle list, reconciling the seed record.
///
/// On the first read of a fresh (or wiped) store the fixed example record
/// is prepended and persisted once; afterwards the stored list comes back
/// unchanged. Malformed stored data degrades to an empty list rather than
/// an error.
///
/// # Returns
///
/// `AppResponse::Ok` holding the JSON array of records, in list order.
///
/// # Safety
///
/// The state parameter must be a valid pointer to an [`AppStoreState`].
///
/// # Examples
///
/// ```no_run
/// use std::ffi::CString;
/// use obstacles_core::{create_store, load_obstacles};
///
/// let path = CString::new("obstacles.redb").unwrap();
/// let store = create_store(path.as_ptr());
///
/// let list = load_obstacles(store);
/// ```
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn load_obstacles(state: *mut AppStoreState) -> *const c_char {
    let state = match unsafe { state.as_ref() } {
        Some(s) => s,
        None => {
            let error =
                AppResponse::BadRequest("Null state pointer passed to load_obstacles".to_string());
            return response_to_c_string(&error);
        }
    };

    let result = state.load().and_then(|records| state.ensure_seed(records));

    match result {
        Ok(records) => match serde_json::to_string(&records) {
            Ok(json) => response_to_c_string(&AppResponse::Ok(json)),
            Err(e) => {
                let error =
                    AppResponse::SerializationError(format!("Error serializing records: {e}"));
                response_to_c_string(&error)
            }
        },
        Err(e) => response_to_c_string(&e),
    }
}

/// Validates the creation form and appends a new record to the store.
///
/// The form JSON carries the screen's current field values (`title`,
/// `instructions`, `latitude`, `longitude`, optional `image`, and the
/// resolved `department`/`departmentCode`). Blank coordinates are stored
/// as `"00.00"`; the record id is a fresh UUID.
///
/// # Returns
///
/// * `AppResponse::Ok` with the stored record on success
/// * `AppResponse::ValidationError` when a required field is empty after
///   trimming - nothing is stored
/// * `AppResponse::DatabaseError` when persistence fails - nothing is
///   stored and the form remains valid for a retry
///
/// # Safety
///
/// Both parameters must be valid pointers.
///
/// # Examples
///
/// ```no_run
/// use std::ffi::CString;
/// use obstacles_core::{create_store, submit_obstacle};
///
/// let path = CString::new("obstacles.redb").unwrap();
/// let store = create_store(path.as_ptr());
///
/// let form = CString::new(
///     r#"{"title":"Accident","instructions":"Prendre la déviation","latitude":"48.8","longitude":"2.3"}"#,
/// )
/// .unwrap();
/// let result = submit_obstacle(store, form.as_ptr());
/// ```
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn submit_obstacle(
    state: *mut AppStoreState,
    form_json: *const c_char,
) -> *const c_char {
    let state = match unsafe { state.as_ref() } {
        Some(s) => s,
        None => {
            let error =
                AppResponse::BadRequest("Null state pointer passed to submit_obstacle".to_string());
            return response_to_c_string(&error);
        }
    };

    let json_str = match c_ptr_to_string(form_json, "form JSON") {
        Ok(s) => s,
        Err(err) => return err,
    };

    let mut form: EditorForm = match serde_json::from_str(&json_str) {
        Ok(f) => f,
        Err(e) => {
            let error = AppResponse::SerializationError(format!("Invalid form JSON: {e}"));
            return response_to_c_string(&error);
        }
    };

    match form.submit(state) {
        editor::SubmitOutcome::Saved(record) => match serde_json::to_string(&record) {
            Ok(json) => response_to_c_string(&AppResponse::Ok(json)),
            Err(e) => {
                let error =
                    AppResponse::SerializationError(format!("Failed to serialize record: {e}"));
                response_to_c_string(&error)
            }
        },
        editor::SubmitOutcome::Invalid(msg) => {
            response_to_c_string(&AppResponse::ValidationError(msg))
        }
        editor::SubmitOutcome::StoreFailed(e) => response_to_c_string(&e),
    }
}

/// Deletes one record by id, preserving the order of the rest.
///
/// # Returns
///
/// `AppResponse::Ok` with the remaining list on success,
/// `AppResponse::NotFound` when no record carries the id (no write is
/// performed).
///
/// # Safety
///
/// Both parameters must be valid pointers.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn delete_obstacle(state: *mut AppStoreState, id: *const c_char) -> *const c_char {
    let state = match unsafe { state.as_ref() } {
        Some(s) => s,
        None => {
            let error =
                AppResponse::BadRequest("Null state pointer passed to delete_obstacle".to_string());
            return response_to_c_string(&error);
        }
    };

    let id_str = match c_ptr_to_string(id, "id") {
        Ok(s) => s,
        Err(err) => return err,
    };

    match state.delete_by_id(&id_str) {
        Ok(Some(remaining)) => match serde_json::to_string(&remaining) {
            Ok(json) => response_to_c_string(&AppResponse::Ok(json)),
            Err(e) => {
                let error =
                    AppResponse::SerializationError(format!("Error serializing records: {e}"));
                response_to_c_string(&error)
            }
        },
        Ok(None) => {
            let not_found = AppResponse::NotFound(format!("No obstacle found with id: {id_str}"));
            response_to_c_string(&not_found)
        }
        Err(e) => response_to_c_string(&e),
    }
}

/// Filters a coordinate field's text on every keystroke, keeping only
/// ASCII digits and `.` in their original order.
///
/// # Safety
///
/// The text parameter must be a valid C string pointer.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn sanitize_coordinate_input(text: *const c_char) -> *const c_char {
    let text_str = match c_ptr_to_string(text, "text") {
        Ok(s) => s,
        Err(err) => return err,
    };

    let success = AppResponse::Ok(editor::sanitize_coordinate(&text_str));
    response_to_c_string(&success)
}

/// Formats a captured GPS fix as the six-decimal coordinate strings the
/// form fields expect.
///
/// # Returns
///
/// `AppResponse::Ok` with `{"latitude": "...", "longitude": "..."}`.
#[no_mangle]
pub extern "C" fn format_position_fix(latitude: c_double, longitude: c_double) -> *const c_char {
    let (lat, lon) = editor::format_position(latitude, longitude);
    let payload = serde_json::json!({ "latitude": lat, "longitude": lon });

    let success = AppResponse::Ok(payload.to_string());
    response_to_c_string(&success)
}

/// Resolves a coordinate pair to its department name and code via reverse
/// geocoding.
///
/// This call blocks on one HTTP request and must run off the UI thread.
/// It never fails: any network or response-shape problem yields the
/// `"Inconnu"` placeholder pair, so record creation is never blocked by an
/// unreachable geocoding service.
///
/// # Returns
///
/// `AppResponse::Ok` with `{"department": "...", "departmentCode": "..."}`.
#[no_mangle]
pub extern "C" fn resolve_department(latitude: c_double, longitude: c_double) -> *const c_char {
    let info = geocode_client().resolve(latitude, longitude);

    match serde_json::to_string(&info) {
        Ok(json) => response_to_c_string(&AppResponse::Ok(json)),
        Err(e) => {
            let error = AppResponse::SerializationError(format!("Error serializing result: {e}"));
            response_to_c_string(&error)
        }
    }
}

/// Returns the fixed emergency-contact list as a JSON array.
///
/// The directory is static and in-memory; it has no lifecycle beyond
/// process start and is never persisted.
#[no_mangle]
pub extern "C" fn contact_directory() -> *const c_char {
    match serde_json::to_string(&contact::directory()) {
        Ok(json) => response_to_c_string(&AppResponse::Ok(json)),
        Err(e) => {
            let error = AppResponse::SerializationError(format!("Error serializing contacts: {e}"));
            response_to_c_string(&error)
        }
    }
}

/// Creates the per-screen call state for the contacts list.
///
/// The shell creates one session when the contacts screen is entered and
/// releases it with [`close_contact_session`] when the screen is left;
/// nothing in it is persisted.
#[no_mangle]
pub extern "C" fn create_contact_session() -> *mut ContactSession {
    Box::into_raw(Box::new(ContactSession::new()))
}

/// Marks a contact as called: sets its sticky visited flag and arms the
/// transient banner for three seconds.
///
/// # Returns
///
/// `AppResponse::Ok` with the session snapshot
/// (`{"visited": [...], "banner_visible": true}`).
///
/// # Safety
///
/// Both parameters must be valid pointers.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn contact_mark_called(
    session: *mut ContactSession,
    contact_id: *const c_char,
) -> *const c_char {
    let session = match unsafe { session.as_mut() } {
        Some(s) => s,
        None => {
            let error = AppResponse::BadRequest(
                "Null session pointer passed to contact_mark_called".to_string(),
            );
            return response_to_c_string(&error);
        }
    };

    let id_str = match c_ptr_to_string(contact_id, "contact id") {
        Ok(s) => s,
        Err(err) => return err,
    };

    let now = Instant::now();
    session.mark_called(&id_str, now);

    snapshot_to_c_string(session, now)
}

/// Returns the current session snapshot; the banner flag reflects whether
/// three seconds have elapsed since the last call was initiated.
///
/// # Safety
///
/// The session parameter must be a valid pointer.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn contact_session_state(session: *mut ContactSession) -> *const c_char {
    let session = match unsafe { session.as_ref() } {
        Some(s) => s,
        None => {
            let error = AppResponse::BadRequest(
                "Null session pointer passed to contact_session_state".to_string(),
            );
            return response_to_c_string(&error);
        }
    };

    snapshot_to_c_string(session, Instant::now())
}

/// Releases a session created by [`create_contact_session`].
///
/// # Safety
///
/// The pointer must come from [`create_contact_session`] and must not be
/// released twice.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn close_contact_session(session: *mut ContactSession) -> *const c_char {
    if session.is_null() {
        let error = AppResponse::BadRequest(
            "Null session pointer passed to close_contact_session".to_string(),
        );
        return response_to_c_string(&error);
    }

    drop(unsafe { Box::from_raw(session) });

    let success = AppResponse::success("Contact session closed");
    response_to_c_string(&success)
}

/// Shared geocoding client, built once on first use so repeated lookups
/// reuse the same connection pool and TLS setup.
fn geocode_client() -> &'static GeocodeClient {
    static CLIENT: OnceLock<GeocodeClient> = OnceLock::new();
    CLIENT.get_or_init(GeocodeClient::new)
}

fn snapshot_to_c_string(session: &ContactSession, now: Instant) -> *const c_char {
    match serde_json::to_string(&session.snapshot(now)) {
        Ok(json) => response_to_c_string(&AppResponse::Ok(json)),
        Err(e) => {
            let error = AppResponse::SerializationError(format!("Error serializing session: {e}"));
            response_to_c_string(&error)
        }
    }
}

/// Converts an [`AppResponse`] to a C-compatible string.
///
/// Serializes the response to JSON and hands ownership of the resulting
/// null-terminated string to the FFI caller, who is responsible for
/// freeing it. Returns a null pointer if serialization or C string
/// creation fails.
fn response_to_c_string(response: &AppResponse) -> *const c_char {
    let json = match serde_json::to_string(response) {
        Ok(j) => j,
        Err(e) => {
            warn!("Error serializing response: {e}");
            return std::ptr::null();
        }
    };

    match CString::new(json) {
        Ok(c_str) => c_str.into_raw(),
        Err(e) => {
            warn!("Error creating CString: {e}");
            std::ptr::null()
        }
    }
}

/// Converts a C string pointer to a Rust `String`, mapping null pointers
/// and invalid UTF-8 to a ready-to-return error response.
fn c_ptr_to_string(ptr: *const c_char, field_name: &str) -> Result<String, *const c_char> {
    if ptr.is_null() {
        let error = AppResponse::BadRequest(format!("Null {field_name} pointer"));
        return Err(response_to_c_string(&error));
    }

    match unsafe { CStr::from_ptr(ptr).to_str() } {
        Ok(s) => Ok(s.to_string()),
        Err(e) => {
            let error = AppResponse::BadRequest(format!("Invalid UTF-8 in {field_name}: {e}"));
            Err(response_to_c_string(&error))
        }
    }
}
