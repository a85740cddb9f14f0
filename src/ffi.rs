//! FFI bindings for Formation Insights
//!
//! This module provides C-compatible functions for calling the engine from a
//! mobile host. All functions use C strings (null-terminated) and return
//! allocated memory that must be freed by the caller using `formation_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use crate::error::Result;
use crate::locale::Locale;
use crate::pipeline::InsightEngine;
use crate::store::parse_entries;
use crate::window::parse_reference_instant;

// Thread-local storage for the last error message
thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

fn clear_last_error() {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = None;
    });
}

/// Helper to convert C string to Rust string
unsafe fn cstr_to_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok().map(|s| s.to_string())
}

/// Helper to convert Rust string to C string (caller must free)
fn string_to_cstr(s: &str) -> *mut c_char {
    match CString::new(s) {
        Ok(cstr) => cstr.into_raw(),
        Err(_) => ptr::null_mut(),
    }
}

/// Which computation an entry point runs
#[derive(Clone, Copy)]
enum Computation {
    Weekly,
    Monthly,
}

/// Entries JSON + locale code + RFC 3339 `now` → result JSON.
///
/// Strings come from the catalog; hosts that need their own translations
/// link the Rust API instead.
fn compute_json(
    computation: Computation,
    entries_json: &str,
    locale: &str,
    now: &str,
) -> Result<String> {
    let entries = parse_entries(entries_json)?;
    let now = parse_reference_instant(now)?;
    let locale = Locale::parse(locale);

    let engine = InsightEngine::new();
    let translate = engine.catalog().translator(locale);

    let json = match computation {
        Computation::Weekly => {
            serde_json::to_string(&engine.weekly_insight_at(&entries, now, locale, &translate))?
        }
        Computation::Monthly => {
            serde_json::to_string(&engine.month_comparison_at(&entries, now, locale, &translate))?
        }
    };
    Ok(json)
}

unsafe fn run(
    computation: Computation,
    entries_json: *const c_char,
    locale: *const c_char,
    now: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let entries_str = match cstr_to_string(entries_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid entries string pointer");
            return ptr::null_mut();
        }
    };

    let locale_str = match cstr_to_string(locale) {
        Some(s) => s,
        None => {
            set_last_error("Invalid locale string pointer");
            return ptr::null_mut();
        }
    };

    let now_str = match cstr_to_string(now) {
        Some(s) => s,
        None => {
            set_last_error("Invalid now string pointer");
            return ptr::null_mut();
        }
    };

    match compute_json(computation, &entries_str, &locale_str, &now_str) {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Insight API
// ============================================================================

/// Compute the weekly insight for a journal and return it as JSON.
///
/// # Safety
/// - `entries_json` must be a null-terminated JSON array of persisted entries.
/// - `locale` must be a null-terminated locale code (e.g. "en", "es-MX").
/// - `now` must be a null-terminated RFC 3339 timestamp.
/// - Returns a newly allocated string that must be freed with `formation_free_string`.
/// - Returns NULL on error; call `formation_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn formation_weekly_insight(
    entries_json: *const c_char,
    locale: *const c_char,
    now: *const c_char,
) -> *mut c_char {
    run(Computation::Weekly, entries_json, locale, now)
}

/// Compute the month-over-month comparison for a journal and return it as JSON.
///
/// # Safety
/// Same contract as [`formation_weekly_insight`].
#[no_mangle]
pub unsafe extern "C" fn formation_month_comparison(
    entries_json: *const c_char,
    locale: *const c_char,
    now: *const c_char,
) -> *mut c_char {
    run(Computation::Monthly, entries_json, locale, now)
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by a `formation_*` function.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by this library, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn formation_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(CString::from_raw(ptr));
    }
}

// ============================================================================
// Error Handling
// ============================================================================

/// Get the last error message.
///
/// # Safety
/// - Returns a pointer to a thread-local error string.
/// - The returned pointer is valid until the next `formation_*` call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn formation_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

/// Get the library version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn formation_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CString;

    fn sample_entries_json() -> CString {
        CString::new(
            r#"[
            {"id": "e1", "createdAt": "2024-03-14T09:00:00Z", "body": "Quiet morning", "mood": "peaceful"},
            {"id": "e2", "createdAt": "2024-03-12T09:00:00Z", "body": "Long day", "mood": "Tired",
             "linkedSermonTitle": "Rest"},
            {"id": "e3", "body": "no timestamp"}
        ]"#,
        )
        .unwrap()
    }

    unsafe fn take_string(ptr: *mut c_char) -> String {
        assert!(!ptr.is_null());
        let s = CStr::from_ptr(ptr).to_str().unwrap().to_string();
        formation_free_string(ptr);
        s
    }

    #[test]
    fn test_ffi_weekly_insight() {
        let entries = sample_entries_json();
        let locale = CString::new("es-MX").unwrap();
        let now = CString::new("2024-03-14T20:00:00Z").unwrap();

        unsafe {
            let result = formation_weekly_insight(entries.as_ptr(), locale.as_ptr(), now.as_ptr());
            let json: serde_json::Value = serde_json::from_str(&take_string(result)).unwrap();

            // tired then peaceful is a recovery
            assert_eq!(json["branch"], "recovery");
            assert_eq!(json["metrics"]["entries_this_week"], 2);
            assert_eq!(
                json["metrics_text"],
                "Registros: 2 · Días activos: 2 · Semana pasada: 0"
            );
        }
    }

    #[test]
    fn test_ffi_month_comparison() {
        let entries = sample_entries_json();
        let locale = CString::new("en").unwrap();
        let now = CString::new("2024-03-14T20:00:00Z").unwrap();

        unsafe {
            let result =
                formation_month_comparison(entries.as_ptr(), locale.as_ptr(), now.as_ptr());
            let json: serde_json::Value = serde_json::from_str(&take_string(result)).unwrap();

            assert_eq!(json["branch"], "gradual_practice");
            assert_eq!(json["anchor_trend"], "more");
            assert_eq!(json["metrics"]["sunday_links"], 1);
        }
    }

    #[test]
    fn test_ffi_error_handling() {
        let invalid_json = CString::new("not json").unwrap();
        let locale = CString::new("en").unwrap();
        let now = CString::new("2024-03-14T20:00:00Z").unwrap();

        unsafe {
            let result =
                formation_weekly_insight(invalid_json.as_ptr(), locale.as_ptr(), now.as_ptr());
            assert!(result.is_null());

            let error = formation_last_error();
            assert!(!error.is_null());
            let error_str = CStr::from_ptr(error).to_str().unwrap();
            assert!(error_str.starts_with("Invalid JSON"));
        }
    }

    #[test]
    fn test_ffi_rejects_bad_reference_instant() {
        let entries = sample_entries_json();
        let locale = CString::new("en").unwrap();
        let now = CString::new("yesterday").unwrap();

        unsafe {
            let result = formation_weekly_insight(entries.as_ptr(), locale.as_ptr(), now.as_ptr());
            assert!(result.is_null());

            let error_str = CStr::from_ptr(formation_last_error()).to_str().unwrap();
            assert!(error_str.starts_with("Invalid timestamp"));
        }
    }

    #[test]
    fn test_ffi_null_pointer() {
        let locale = CString::new("en").unwrap();
        let now = CString::new("2024-03-14T20:00:00Z").unwrap();

        unsafe {
            let result = formation_weekly_insight(ptr::null(), locale.as_ptr(), now.as_ptr());
            assert!(result.is_null());
            assert!(!formation_last_error().is_null());
        }
    }

    #[test]
    fn test_ffi_version() {
        unsafe {
            let version = formation_version();
            assert!(!version.is_null());

            let version_str = CStr::from_ptr(version).to_str().unwrap();
            assert_eq!(version_str, crate::ENGINE_VERSION);
        }
    }
}
