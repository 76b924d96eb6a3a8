//! `#[repr(C)]` types for the FFI boundary.
//!
//! # Design
//! Each type mirrors a core type but uses C-compatible representations:
//! `*mut c_char` instead of `String`, raw pointers instead of `Vec`, and
//! enums with explicit discriminants. Record bodies are always JSON text, so
//! a result carries at most one string payload.

use std::ffi::CString;
use std::os::raw::c_char;

use pocketbase_core::{ApiError, HttpMethod, HttpRequest, PocketbaseClient};

/// Opaque handle to a `PocketbaseClient`. C callers receive a pointer to
/// this and pass it back into every FFI function.
pub struct FfiPbClient {
    pub(crate) inner: PocketbaseClient,
}

/// Copy `s` into a heap C string owned by the caller. Interior NULs cannot
/// occur in JSON text or in strings that arrived as C strings; if one does,
/// the result is the empty string.
pub(crate) fn into_c_string(s: String) -> *mut c_char {
    CString::new(s).unwrap_or_default().into_raw()
}

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// HTTP method as a C enum.
#[repr(C)]
pub enum FfiHttpMethod {
    Get = 0,
    Post = 1,
}

impl From<HttpMethod> for FfiHttpMethod {
    fn from(m: HttpMethod) -> Self {
        match m {
            HttpMethod::Get => FfiHttpMethod::Get,
            HttpMethod::Post => FfiHttpMethod::Post,
        }
    }
}

/// A single header as a pair of C strings.
#[repr(C)]
pub struct FfiHeader {
    pub key: *mut c_char,
    pub value: *mut c_char,
}

/// A request for the firmware's HTTP stack to execute. `path` is the full
/// URL; `body` is null for GET.
#[repr(C)]
pub struct FfiHttpRequest {
    pub method: FfiHttpMethod,
    pub path: *mut c_char,
    pub headers: *mut FfiHeader,
    pub headers_len: u32,
    pub body: *mut c_char,
}

impl FfiHttpRequest {
    /// Convert a core `HttpRequest` into a heap-allocated `FfiHttpRequest`.
    pub(crate) fn from_core(req: HttpRequest) -> *mut Self {
        let path = into_c_string(req.path);
        let body = match req.body {
            Some(b) => into_c_string(b),
            None => std::ptr::null_mut(),
        };

        let headers_len = req.headers.len() as u32;
        let headers = if req.headers.is_empty() {
            std::ptr::null_mut()
        } else {
            // Boxed slice so capacity == len when reclaimed in pb_free_request.
            let ffi_headers: Box<[FfiHeader]> = req
                .headers
                .into_iter()
                .map(|(k, v)| FfiHeader {
                    key: into_c_string(k),
                    value: into_c_string(v),
                })
                .collect();
            Box::into_raw(ffi_headers) as *mut FfiHeader
        };

        Box::into_raw(Box::new(FfiHttpRequest {
            method: req.method.into(),
            path,
            headers,
            headers_len,
            body,
        }))
    }
}

// ---------------------------------------------------------------------------
// Response input (caller-provided, not heap-allocated by us)
// ---------------------------------------------------------------------------

/// An HTTP response as reported by the firmware's HTTP client.
///
/// `status` is the value the client returned: a positive HTTP status, or a
/// zero/negative transport error code. The FFI layer reads but does not free
/// these fields.
#[repr(C)]
pub struct FfiHttpResponse {
    pub status: i32,
    pub body: *const c_char,
}

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Error codes returned in `FfiPbResult`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiErrorCode {
    Ok = 0,
    Transport = 1,
    NotFound = 2,
    Forbidden = 3,
    CreateFailed = 4,
    Serialization = 5,
    Panic = 6,
    NullArg = 7,
    InvalidUtf8 = 8,
}

/// Why an FFI call failed before or while reaching the core client.
#[derive(Debug)]
pub(crate) enum CallError {
    NullArg(&'static str),
    InvalidUtf8(&'static str),
    Panic(&'static str),
    Api(ApiError),
}

impl From<ApiError> for CallError {
    fn from(err: ApiError) -> Self {
        CallError::Api(err)
    }
}

/// Result envelope for all parse operations, and the error out-parameter of
/// the build operations.
///
/// On success `error_code` is `Ok`, `error_message` is null and `body`
/// holds the JSON text. On failure `error_code` names the category,
/// `error_message` is a human-readable C string and `body` is null.
/// `http_status` carries the status or transport code when one is known.
#[repr(C)]
pub struct FfiPbResult {
    pub error_code: FfiErrorCode,
    pub error_message: *mut c_char,
    pub http_status: i32,
    pub body: *mut c_char,
}

impl FfiPbResult {
    pub(crate) fn ok(body: String, http_status: i32) -> *mut Self {
        Box::into_raw(Box::new(FfiPbResult {
            error_code: FfiErrorCode::Ok,
            error_message: std::ptr::null_mut(),
            http_status,
            body: into_c_string(body),
        }))
    }

    /// Build an error result. `http_status` is the status the firmware
    /// reported, or 0 when the call never got as far as a response.
    pub(crate) fn failure(err: CallError, http_status: i32) -> *mut Self {
        match err {
            CallError::NullArg(name) => Self::error(FfiErrorCode::NullArg, format!("null argument: {name}"), 0),
            CallError::InvalidUtf8(name) => Self::error(
                FfiErrorCode::InvalidUtf8,
                format!("argument is not valid UTF-8: {name}"),
                http_status,
            ),
            CallError::Panic(func) => Self::error(FfiErrorCode::Panic, format!("panic in {func}"), 0),
            CallError::Api(err) => Self::from_error(err, http_status),
        }
    }

    fn from_error(err: ApiError, http_status: i32) -> *mut Self {
        let (error_code, http_status) = match &err {
            // Link state belongs to the firmware; no pb_* call produces this.
            ApiError::Offline => (FfiErrorCode::Transport, 0),
            ApiError::Transport { code, .. } => (FfiErrorCode::Transport, *code),
            ApiError::NotFound { .. } => (FfiErrorCode::NotFound, http_status),
            ApiError::Forbidden { .. } => (FfiErrorCode::Forbidden, http_status),
            ApiError::CreateFailed { status, .. } => (FfiErrorCode::CreateFailed, i32::from(*status)),
            ApiError::SerializationError(_) => (FfiErrorCode::Serialization, 0),
        };
        Self::error(error_code, err.to_string(), http_status)
    }

    fn error(error_code: FfiErrorCode, msg: String, http_status: i32) -> *mut Self {
        Box::into_raw(Box::new(FfiPbResult {
            error_code,
            error_message: into_c_string(msg),
            http_status,
            body: std::ptr::null_mut(),
        }))
    }
}
