//! C-ABI wrapper around `pocketbase-core`.
//!
//! # Overview
//! Lets device firmware written in C or C++ build PocketBase record requests
//! and interpret the responses while keeping its own HTTP stack and link
//! management. The firmware runs `pb_build_*`, executes the request, then
//! hands the status and body to the matching `pb_parse_*`.
//!
//! # Design
//! - Every `extern "C"` function wraps its body in `catch_unwind` so panics
//!   never cross the FFI boundary.
//! - Per-operation `build_*` / `parse_*` mirrors the core API 1:1.
//! - String arguments are C strings. Null means "absent" where a parameter is
//!   optional; bytes that are not UTF-8 are always an `InvalidUtf8` error,
//!   never silently dropped.
//! - `pb_build_*` return null on failure and, when the caller passes a
//!   non-null `err`, store an `FfiPbResult` describing why. On success `*err`
//!   is set to null.
//! - A response status `<= 0` is the firmware client's transport error code
//!   and becomes `FfiErrorCode::Transport`.
//! - The C caller owns all returned pointers and must call the matching
//!   `pb_free_*` function to release them.

pub mod types;

use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::panic::{catch_unwind, AssertUnwindSafe};

use pocketbase_core::{ApiError, CreateParams, HttpRequest, HttpResponse, ListParams, RecordParams};

use types::*;

/// Borrow a required C string argument.
fn req_arg<'a>(p: *const c_char, name: &'static str) -> Result<&'a str, CallError> {
    match opt_arg(p, name)? {
        Some(s) => Ok(s),
        None => Err(CallError::NullArg(name)),
    }
}

/// Borrow an optional C string argument; null is `None`.
fn opt_arg<'a>(p: *const c_char, name: &'static str) -> Result<Option<&'a str>, CallError> {
    if p.is_null() {
        return Ok(None);
    }
    unsafe { CStr::from_ptr(p) }
        .to_str()
        .map(Some)
        .map_err(|_| CallError::InvalidUtf8(name))
}

fn opt_string(p: *const c_char, name: &'static str) -> Result<Option<String>, CallError> {
    Ok(opt_arg(p, name)?.map(str::to_string))
}

fn client_ref<'a>(client: *const FfiPbClient) -> Result<&'a FfiPbClient, CallError> {
    if client.is_null() {
        return Err(CallError::NullArg("client"));
    }
    Ok(unsafe { &*client })
}

// ---------------------------------------------------------------------------
// Client lifecycle
// ---------------------------------------------------------------------------

/// Create a new client bound to `base_url`.
///
/// Returns null if `base_url` is null or not UTF-8, or if an internal panic
/// occurs. The caller must free the returned pointer with `pb_client_free`.
#[unsafe(no_mangle)]
pub extern "C" fn pb_client_new(base_url: *const c_char) -> *mut FfiPbClient {
    catch_unwind(|| {
        let Ok(url) = req_arg(base_url, "base_url") else {
            return std::ptr::null_mut();
        };
        let client = pocketbase_core::PocketbaseClient::new(url);
        Box::into_raw(Box::new(FfiPbClient { inner: client }))
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Free a client created by `pb_client_new`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn pb_client_free(client: *mut FfiPbClient) {
    if !client.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { Box::from_raw(client) });
        });
    }
}

// ---------------------------------------------------------------------------
// Build request functions
// ---------------------------------------------------------------------------

/// Shared body of the `pb_build_*` functions: run `build`, convert the
/// request for C, and report the outcome through `err`.
fn build_with(
    err: *mut *mut FfiPbResult,
    func: &'static str,
    build: impl FnOnce() -> Result<HttpRequest, CallError>,
) -> *mut FfiHttpRequest {
    let outcome = catch_unwind(AssertUnwindSafe(|| build().map(FfiHttpRequest::from_core)))
        .unwrap_or(Err(CallError::Panic(func)));
    let (req, failure) = match outcome {
        Ok(req) => (req, None),
        Err(e) => (std::ptr::null_mut(), Some(e)),
    };
    if !err.is_null() {
        let result = failure.map_or(std::ptr::null_mut(), |e| FfiPbResult::failure(e, 0));
        unsafe { *err = result };
    }
    req
}

/// Build a request listing one page of `collection`.
///
/// `sort`, `filter`, `expand` and `fields` may be null to leave them out.
/// Returns null if `client` or `collection` is null or any string is not
/// UTF-8; `err` (may be null) then receives the reason.
/// The caller must free the returned pointer with `pb_free_request`.
#[allow(clippy::too_many_arguments)]
#[unsafe(no_mangle)]
pub extern "C" fn pb_build_get_list(
    client: *const FfiPbClient,
    collection: *const c_char,
    page: u32,
    per_page: u32,
    sort: *const c_char,
    filter: *const c_char,
    expand: *const c_char,
    fields: *const c_char,
    skip_total: bool,
    err: *mut *mut FfiPbResult,
) -> *mut FfiHttpRequest {
    build_with(err, "pb_build_get_list", || {
        let client = client_ref(client)?;
        let name = req_arg(collection, "collection")?;
        let params = ListParams {
            page,
            per_page,
            sort: opt_string(sort, "sort")?,
            filter: opt_string(filter, "filter")?,
            expand: opt_string(expand, "expand")?,
            fields: opt_string(fields, "fields")?,
            skip_total,
        };
        Ok(client.inner.collection(name).build_get_list(&params))
    })
}

/// Build a request fetching `record_id` from `collection`.
///
/// `expand` and `fields` may be null. Returns null if `client`,
/// `collection` or `record_id` is null or any string is not UTF-8; `err`
/// (may be null) then receives the reason.
#[unsafe(no_mangle)]
pub extern "C" fn pb_build_get_one(
    client: *const FfiPbClient,
    collection: *const c_char,
    record_id: *const c_char,
    expand: *const c_char,
    fields: *const c_char,
    err: *mut *mut FfiPbResult,
) -> *mut FfiHttpRequest {
    build_with(err, "pb_build_get_one", || {
        let client = client_ref(client)?;
        let name = req_arg(collection, "collection")?;
        let id = req_arg(record_id, "record_id")?;
        let params = RecordParams {
            expand: opt_string(expand, "expand")?,
            fields: opt_string(fields, "fields")?,
        };
        Ok(client.inner.collection(name).build_get_one(id, &params))
    })
}

/// Build a request creating a record in `collection` from `json_data`.
///
/// `id`, `expand` and `fields` may be null. Returns null if a required
/// argument is null, a string is not UTF-8, or `json_data` is not a JSON
/// object (`Serialization`); `err` (may be null) then receives the reason.
#[unsafe(no_mangle)]
pub extern "C" fn pb_build_create(
    client: *const FfiPbClient,
    collection: *const c_char,
    json_data: *const c_char,
    id: *const c_char,
    expand: *const c_char,
    fields: *const c_char,
    err: *mut *mut FfiPbResult,
) -> *mut FfiHttpRequest {
    build_with(err, "pb_build_create", || {
        let client = client_ref(client)?;
        let name = req_arg(collection, "collection")?;
        let data = req_arg(json_data, "json_data")?;
        let params = CreateParams {
            id: opt_string(id, "id")?,
            expand: opt_string(expand, "expand")?,
            fields: opt_string(fields, "fields")?,
        };
        Ok(client.inner.collection(name).build_create(data, &params)?)
    })
}

// ---------------------------------------------------------------------------
// Parse response functions
// ---------------------------------------------------------------------------

/// Convert an `FfiHttpResponse` to a core `HttpResponse`.
///
/// Non-positive statuses, and statuses that do not fit an HTTP status code,
/// are transport failures. A null body is read as the empty string.
fn ffi_response_to_core(resp: &FfiHttpResponse) -> Result<HttpResponse, CallError> {
    let status = match u16::try_from(resp.status) {
        Ok(status) if status > 0 => status,
        _ => {
            return Err(CallError::Api(ApiError::Transport {
                code: resp.status,
                message: "HTTP request failed".to_string(),
            }))
        }
    };
    let body = opt_arg(resp.body, "response.body")?.unwrap_or("").to_string();
    Ok(HttpResponse::new(status, body))
}

type ParseFn = fn(&pocketbase_core::Collection<'_>, HttpResponse) -> Result<String, ApiError>;

/// Shared body of the `pb_parse_*` functions.
fn parse_with(
    client: *const FfiPbClient,
    collection: *const c_char,
    response: *const FfiHttpResponse,
    parse: ParseFn,
) -> *mut FfiPbResult {
    let mut status = 0;
    let parsed = (|| -> Result<String, CallError> {
        let client = client_ref(client)?;
        let name = req_arg(collection, "collection")?;
        if response.is_null() {
            return Err(CallError::NullArg("response"));
        }
        let resp = unsafe { &*response };
        status = resp.status;
        let core_resp = ffi_response_to_core(resp)?;
        Ok(parse(&client.inner.collection(name), core_resp)?)
    })();
    match parsed {
        Ok(body) => FfiPbResult::ok(body, status),
        Err(e) => FfiPbResult::failure(e, status),
    }
}

/// Interpret the response to a `pb_build_get_list` request.
///
/// On success `body` is the list JSON, unmodified.
#[unsafe(no_mangle)]
pub extern "C" fn pb_parse_get_list(
    client: *const FfiPbClient,
    collection: *const c_char,
    response: *const FfiHttpResponse,
) -> *mut FfiPbResult {
    catch_unwind(|| parse_with(client, collection, response, |c, r| c.parse_get_list(r)))
        .unwrap_or_else(|_| FfiPbResult::failure(CallError::Panic("pb_parse_get_list"), 0))
}

/// Interpret the response to a `pb_build_get_one` request.
///
/// PocketBase 404/403 error bodies become `NotFound` / `Forbidden`.
#[unsafe(no_mangle)]
pub extern "C" fn pb_parse_get_one(
    client: *const FfiPbClient,
    collection: *const c_char,
    response: *const FfiHttpResponse,
) -> *mut FfiPbResult {
    catch_unwind(|| parse_with(client, collection, response, |c, r| c.parse_get_one(r)))
        .unwrap_or_else(|_| FfiPbResult::failure(CallError::Panic("pb_parse_get_one"), 0))
}

/// Interpret the response to a `pb_build_create` request.
///
/// On success `body` is the created record.
#[unsafe(no_mangle)]
pub extern "C" fn pb_parse_create(
    client: *const FfiPbClient,
    collection: *const c_char,
    response: *const FfiHttpResponse,
) -> *mut FfiPbResult {
    catch_unwind(|| parse_with(client, collection, response, |c, r| c.parse_create(r)))
        .unwrap_or_else(|_| FfiPbResult::failure(CallError::Panic("pb_parse_create"), 0))
}

/// The result's body, or an empty string when the result is an error or
/// null. Free the returned string with `pb_free_string`.
#[unsafe(no_mangle)]
pub extern "C" fn pb_result_body_or_empty(result: *const FfiPbResult) -> *mut c_char {
    catch_unwind(|| {
        let body = if result.is_null() {
            None
        } else {
            let result = unsafe { &*result };
            match result.error_code {
                FfiErrorCode::Ok => opt_arg(result.body, "result.body").ok().flatten(),
                _ => None,
            }
        };
        into_c_string(body.unwrap_or("").to_string())
    })
    .unwrap_or(std::ptr::null_mut())
}

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

/// Free an `FfiHttpRequest` returned by any `pb_build_*` function.
/// Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn pb_free_request(req: *mut FfiHttpRequest) {
    if req.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let req = unsafe { Box::from_raw(req) };
        if !req.path.is_null() {
            drop(unsafe { CString::from_raw(req.path) });
        }
        if !req.body.is_null() {
            drop(unsafe { CString::from_raw(req.body) });
        }
        if !req.headers.is_null() && req.headers_len > 0 {
            let headers = unsafe {
                Box::from_raw(std::ptr::slice_from_raw_parts_mut(
                    req.headers,
                    req.headers_len as usize,
                ))
            };
            for h in headers.iter() {
                if !h.key.is_null() {
                    drop(unsafe { CString::from_raw(h.key) });
                }
                if !h.value.is_null() {
                    drop(unsafe { CString::from_raw(h.value) });
                }
            }
        }
    });
}

/// Free an `FfiPbResult` returned by any `pb_parse_*` function.
/// Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn pb_free_result(result: *mut FfiPbResult) {
    if result.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let result = unsafe { Box::from_raw(result) };
        if !result.error_message.is_null() {
            drop(unsafe { CString::from_raw(result.error_message) });
        }
        if !result.body.is_null() {
            drop(unsafe { CString::from_raw(result.body) });
        }
    });
}

/// Free a C string allocated by this library. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn pb_free_string(s: *mut c_char) {
    if !s.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { CString::from_raw(s) });
        });
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
