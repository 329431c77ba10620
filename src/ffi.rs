// Copyright 2024-2026, NVIDIA CORPORATION & AFFILIATES. All rights reserved.
//
// Redistribution and use in source and binary forms, with or without
// modification, are permitted provided that the following conditions
// are met:
//  * Redistributions of source code must retain the above copyright
//    notice, this list of conditions and the following disclaimer.
//  * Redistributions in binary form must reproduce the above copyright
//    notice, this list of conditions and the following disclaimer in the
//    documentation and/or other materials provided with the distribution.
//  * Neither the name of NVIDIA CORPORATION nor the names of its
//    contributors may be used to endorse or promote products derived
//    from this software without specific prior written permission.
//
// THIS SOFTWARE IS PROVIDED BY THE COPYRIGHT HOLDERS ``AS IS'' AND ANY
// EXPRESS OR IMPLIED WARRANTIES, INCLUDING, BUT NOT LIMITED TO, THE
// IMPLIED WARRANTIES OF MERCHANTABILITY AND FITNESS FOR A PARTICULAR
// PURPOSE ARE DISCLAIMED.  IN NO EVENT SHALL THE COPYRIGHT OWNER OR
// CONTRIBUTORS BE LIABLE FOR ANY DIRECT, INDIRECT, INCIDENTAL, SPECIAL,
// EXEMPLARY, OR CONSEQUENTIAL DAMAGES (INCLUDING, BUT NOT LIMITED TO,
// PROCUREMENT OF SUBSTITUTE GOODS OR SERVICES; LOSS OF USE, DATA, OR
// PROFITS; OR BUSINESS INTERRUPTION) HOWEVER CAUSED AND ON ANY THEORY
// OF LIABILITY, WHETHER IN CONTRACT, STRICT LIABILITY, OR TORT
// (INCLUDING NEGLIGENCE OR OTHERWISE) ARISING IN ANY WAY OUT OF THE USE
// OF THIS SOFTWARE, EVEN IF ADVISED OF THE POSSIBILITY OF SUCH DAMAGE.

//! Raw bindings to the subset of the Triton server and backend C API this
//! crate forwards to, plus the helpers that turn native errors and messages
//! into Rust values.
//!
//! Only compiled with the `native` feature; `build.rs` adds the link
//! directives for `libtritonserver`.

#![allow(non_camel_case_types)]

use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_int, c_void};

use crate::error::{Error, ErrorCode, Result};

macro_rules! opaque {
    ($($name:ident),* $(,)?) => {
        $(
            #[repr(C)]
            pub struct $name {
                _private: [u8; 0],
            }
        )*
    };
}

opaque!(
    TRITONSERVER_Error,
    TRITONSERVER_Server,
    TRITONSERVER_ServerOptions,
    TRITONSERVER_Message,
    TRITONBACKEND_Model,
);

pub type TRITONSERVER_Error_Code = u32;
pub type TRITONSERVER_LogLevel = u32;

pub const TRITONSERVER_LOG_INFO: TRITONSERVER_LogLevel = 0;
pub const TRITONSERVER_LOG_WARN: TRITONSERVER_LogLevel = 1;
pub const TRITONSERVER_LOG_ERROR: TRITONSERVER_LogLevel = 2;
pub const TRITONSERVER_LOG_VERBOSE: TRITONSERVER_LogLevel = 3;

/// Model configuration format version requested from the backend API.
pub const MODEL_CONFIG_VERSION: u32 = 1;

extern "C" {
    pub fn TRITONSERVER_ErrorNew(
        code: TRITONSERVER_Error_Code,
        msg: *const c_char,
    ) -> *mut TRITONSERVER_Error;
    pub fn TRITONSERVER_ErrorDelete(error: *mut TRITONSERVER_Error);
    pub fn TRITONSERVER_ErrorCode(error: *mut TRITONSERVER_Error) -> TRITONSERVER_Error_Code;
    pub fn TRITONSERVER_ErrorMessage(error: *mut TRITONSERVER_Error) -> *const c_char;

    pub fn TRITONSERVER_ServerOptionsNew(
        options: *mut *mut TRITONSERVER_ServerOptions,
    ) -> *mut TRITONSERVER_Error;
    pub fn TRITONSERVER_ServerOptionsDelete(
        options: *mut TRITONSERVER_ServerOptions,
    ) -> *mut TRITONSERVER_Error;
    pub fn TRITONSERVER_ServerOptionsSetModelRepositoryPath(
        options: *mut TRITONSERVER_ServerOptions,
        model_repository_path: *const c_char,
    ) -> *mut TRITONSERVER_Error;
    pub fn TRITONSERVER_ServerOptionsSetLogVerbose(
        options: *mut TRITONSERVER_ServerOptions,
        level: c_int,
    ) -> *mut TRITONSERVER_Error;
    pub fn TRITONSERVER_ServerOptionsSetBackendDirectory(
        options: *mut TRITONSERVER_ServerOptions,
        backend_dir: *const c_char,
    ) -> *mut TRITONSERVER_Error;
    pub fn TRITONSERVER_ServerOptionsSetRepoAgentDirectory(
        options: *mut TRITONSERVER_ServerOptions,
        repoagent_dir: *const c_char,
    ) -> *mut TRITONSERVER_Error;
    pub fn TRITONSERVER_ServerOptionsSetStrictModelConfig(
        options: *mut TRITONSERVER_ServerOptions,
        strict: bool,
    ) -> *mut TRITONSERVER_Error;
    pub fn TRITONSERVER_ServerOptionsSetMinSupportedComputeCapability(
        options: *mut TRITONSERVER_ServerOptions,
        cc: f64,
    ) -> *mut TRITONSERVER_Error;

    pub fn TRITONSERVER_ServerNew(
        server: *mut *mut TRITONSERVER_Server,
        options: *mut TRITONSERVER_ServerOptions,
    ) -> *mut TRITONSERVER_Error;
    pub fn TRITONSERVER_ServerDelete(server: *mut TRITONSERVER_Server) -> *mut TRITONSERVER_Error;
    pub fn TRITONSERVER_ServerIsLive(
        server: *mut TRITONSERVER_Server,
        live: *mut bool,
    ) -> *mut TRITONSERVER_Error;
    pub fn TRITONSERVER_ServerIsReady(
        server: *mut TRITONSERVER_Server,
        ready: *mut bool,
    ) -> *mut TRITONSERVER_Error;
    pub fn TRITONSERVER_ServerModelIsReady(
        server: *mut TRITONSERVER_Server,
        model_name: *const c_char,
        model_version: i64,
        ready: *mut bool,
    ) -> *mut TRITONSERVER_Error;
    pub fn TRITONSERVER_ServerModelMetadata(
        server: *mut TRITONSERVER_Server,
        model_name: *const c_char,
        model_version: i64,
        metadata: *mut *mut TRITONSERVER_Message,
    ) -> *mut TRITONSERVER_Error;

    pub fn TRITONSERVER_MessageSerializeToJson(
        message: *mut TRITONSERVER_Message,
        base: *mut *const c_char,
        byte_size: *mut usize,
    ) -> *mut TRITONSERVER_Error;
    pub fn TRITONSERVER_MessageDelete(message: *mut TRITONSERVER_Message)
        -> *mut TRITONSERVER_Error;

    pub fn TRITONSERVER_LogIsEnabled(level: TRITONSERVER_LogLevel) -> bool;
    pub fn TRITONSERVER_LogMessage(
        level: TRITONSERVER_LogLevel,
        filename: *const c_char,
        line: c_int,
        msg: *const c_char,
    ) -> *mut TRITONSERVER_Error;

    pub fn TRITONBACKEND_ModelName(
        model: *mut TRITONBACKEND_Model,
        name: *mut *const c_char,
    ) -> *mut TRITONSERVER_Error;
    pub fn TRITONBACKEND_ModelVersion(
        model: *mut TRITONBACKEND_Model,
        version: *mut u64,
    ) -> *mut TRITONSERVER_Error;
    pub fn TRITONBACKEND_ModelConfig(
        model: *mut TRITONBACKEND_Model,
        config_version: u32,
        model_config: *mut *mut TRITONSERVER_Message,
    ) -> *mut TRITONSERVER_Error;
    pub fn TRITONBACKEND_ModelSetState(
        model: *mut TRITONBACKEND_Model,
        state: *mut c_void,
    ) -> *mut TRITONSERVER_Error;
    pub fn TRITONBACKEND_ModelState(
        model: *mut TRITONBACKEND_Model,
        state: *mut *mut c_void,
    ) -> *mut TRITONSERVER_Error;
}

/// Converts a native error into a `Result`, taking ownership of (and
/// deleting) the error object.
///
/// # Safety
///
/// `err` must be null or an error returned by the Triton API that has not
/// been deleted yet.
pub unsafe fn check(err: *mut TRITONSERVER_Error) -> Result<()> {
    if err.is_null() {
        return Ok(());
    }
    let code = ErrorCode::from_raw(TRITONSERVER_ErrorCode(err));
    let msg = TRITONSERVER_ErrorMessage(err);
    let message = if msg.is_null() {
        String::new()
    } else {
        CStr::from_ptr(msg).to_string_lossy().into_owned()
    };
    TRITONSERVER_ErrorDelete(err);
    Err(Error::triton(code, message))
}

/// Allocates a native error carrying the code and message of `err`.
///
/// Ownership of the returned object passes to the caller (normally the
/// server, which deletes it).
#[must_use]
pub fn into_raw_error(err: &Error) -> *mut TRITONSERVER_Error {
    let message = cstring_lossy(&err.to_string());
    // SAFETY: message outlives the call; the server copies the string.
    unsafe { TRITONSERVER_ErrorNew(err.code().as_raw(), message.as_ptr()) }
}

/// Builds a C string, replacing interior NUL bytes.
pub(crate) fn cstring_lossy(s: &str) -> CString {
    CString::new(s.replace('\0', "\u{fffd}")).unwrap_or_default()
}

/// Builds a C string for an argument, rejecting interior NUL bytes.
pub(crate) fn cstring(s: &str) -> Result<CString> {
    CString::new(s).map_err(|_| {
        Error::triton(
            ErrorCode::InvalidArg,
            format!("argument contains a NUL byte: {s:?}"),
        )
    })
}

/// Serializes a native message to JSON and deletes it.
///
/// # Safety
///
/// `message` must be a valid message returned by the Triton API and not
/// used afterwards.
pub unsafe fn take_message_json(message: *mut TRITONSERVER_Message) -> Result<String> {
    let mut base: *const c_char = std::ptr::null();
    let mut byte_size: usize = 0;
    let serialized = check(TRITONSERVER_MessageSerializeToJson(
        message,
        &mut base,
        &mut byte_size,
    ))
    .map(|()| {
        if base.is_null() {
            String::new()
        } else {
            let bytes = std::slice::from_raw_parts(base.cast::<u8>(), byte_size);
            String::from_utf8_lossy(bytes).into_owned()
        }
    });
    let deleted = check(TRITONSERVER_MessageDelete(message));
    let json = serialized?;
    deleted?;
    Ok(json)
}
