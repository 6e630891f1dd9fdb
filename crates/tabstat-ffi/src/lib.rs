//! C FFI boundary for tabstat
//!
//! The table crosses the boundary as the loader's JSON shape
//! (`{columns, dtype, rows}`) and the result comes back as a JSON
//! `ResultSet`. Strings returned by this library must be released with
//! [`tabstat_free_string`].

mod types;

pub use types::*;

use libc::c_char;
use std::ffi::CStr;
use tabstat_core::{execute_with_options, EngineOptions, QueryResult, Table};

/// Helper to allocate and copy a string
unsafe fn alloc_string(s: &str) -> *mut c_char {
    let len = s.len() + 1;
    let ptr = libc::malloc(len) as *mut c_char;
    if !ptr.is_null() {
        std::ptr::copy_nonoverlapping(s.as_ptr(), ptr as *mut u8, s.len());
        *ptr.add(s.len()) = 0;
    }
    ptr
}

/// Borrow a NUL-terminated UTF-8 argument
unsafe fn read_str<'a>(ptr: *const c_char, name: &str) -> Result<&'a str, String> {
    if ptr.is_null() {
        return Err(format!("{} is NULL", name));
    }
    CStr::from_ptr(ptr)
        .to_str()
        .map_err(|_| format!("{} is not valid UTF-8", name))
}

fn run(table_json: &str, expression: &str, options: &EngineOptions) -> QueryResult<String> {
    let table = Table::from_json(table_json)?;
    execute_with_options(&table, expression, options)?.to_json()
}

/// Evaluate an expression with default engine options
///
/// # Safety
/// See [`tabstat_execute_with_options`].
#[no_mangle]
pub unsafe extern "C" fn tabstat_execute(
    table_json: *const c_char,
    expression: *const c_char,
    out_json: *mut *mut c_char,
    out_error: *mut TabstatError,
) -> bool {
    tabstat_execute_with_options(
        table_json,
        expression,
        EngineOptionsFFI::default(),
        out_json,
        out_error,
    )
}

/// Evaluate an expression against a JSON table
///
/// # Safety
/// - `table_json` and `expression` must be valid NUL-terminated strings
/// - `out_json` must be a valid pointer; on success it receives a string
///   owned by the caller, to be released with `tabstat_free_string`
/// - `out_error` can be NULL if error details are not needed
///
/// # Returns
/// `true` on success, `false` on error (check `out_error` for details)
#[no_mangle]
pub unsafe extern "C" fn tabstat_execute_with_options(
    table_json: *const c_char,
    expression: *const c_char,
    options: EngineOptionsFFI,
    out_json: *mut *mut c_char,
    out_error: *mut TabstatError,
) -> bool {
    if !out_error.is_null() {
        *out_error = TabstatError::success();
    }

    if out_json.is_null() {
        if !out_error.is_null() {
            (*out_error).set(ErrorCode::InvalidInput, "out_json is NULL");
        }
        return false;
    }
    *out_json = std::ptr::null_mut();

    let inputs = read_str(table_json, "table_json")
        .and_then(|t| read_str(expression, "expression").map(|e| (t, e)));
    let (table_json, expression) = match inputs {
        Ok(v) => v,
        Err(msg) => {
            if !out_error.is_null() {
                (*out_error).set(ErrorCode::InvalidInput, &msg);
            }
            return false;
        }
    };

    let opts = EngineOptions::from(options);
    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        run(table_json, expression, &opts)
    }));

    let result = match result {
        Ok(r) => r,
        Err(_) => {
            log::error!("panic while executing '{}'", expression);
            if !out_error.is_null() {
                (*out_error).set(ErrorCode::InternalError, "Internal panic in execute");
            }
            return false;
        }
    };

    match result {
        Ok(json) => {
            let ptr = alloc_string(&json);
            if ptr.is_null() {
                if !out_error.is_null() {
                    (*out_error).set(ErrorCode::InternalError, "Failed to allocate result");
                }
                return false;
            }
            *out_json = ptr;
            true
        }
        Err(e) => {
            log::debug!("'{}' failed: {}", expression, e);
            if !out_error.is_null() {
                (*out_error).set(ErrorCode::from(&e), &e.to_string());
            }
            false
        }
    }
}

/// Free a string returned by this library
///
/// # Safety
/// `s` must have been returned by this library and not freed before.
#[no_mangle]
pub unsafe extern "C" fn tabstat_free_string(s: *mut c_char) {
    if !s.is_null() {
        libc::free(s as *mut libc::c_void);
    }
}

/// Get library version string
#[no_mangle]
pub extern "C" fn tabstat_version() -> *const c_char {
    concat!(env!("CARGO_PKG_VERSION"), "\0").as_ptr() as *const c_char
}
