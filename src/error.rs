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

//! Error types for the rapids-triton library.
//!
//! This module defines [`Error`] -- the unified error type returned by all
//! fallible operations -- along with the [`Result`] type alias used throughout
//! the crate and [`ErrorCode`], the mirror of the native
//! `TRITONSERVER_Error_Code` enumeration used when errors cross the C
//! boundary.

/// Convenience alias for `std::result::Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;

/// Error codes understood by the Triton server C API.
///
/// The discriminants match `TRITONSERVER_Error_Code` so values can be passed
/// to and from the native library without a lookup table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum ErrorCode {
    Unknown = 0,
    Internal = 1,
    NotFound = 2,
    InvalidArg = 3,
    Unavailable = 4,
    Unsupported = 5,
    AlreadyExists = 6,
    Cancelled = 7,
}

impl ErrorCode {
    /// Converts a raw native error code. Unrecognised values map to
    /// [`ErrorCode::Unknown`].
    #[must_use]
    pub const fn from_raw(raw: u32) -> Self {
        match raw {
            1 => Self::Internal,
            2 => Self::NotFound,
            3 => Self::InvalidArg,
            4 => Self::Unavailable,
            5 => Self::Unsupported,
            6 => Self::AlreadyExists,
            7 => Self::Cancelled,
            _ => Self::Unknown,
        }
    }

    /// Returns the raw native value of this code.
    #[must_use]
    pub const fn as_raw(self) -> u32 {
        self as u32
    }

    /// Returns the upper-case name Triton uses when printing this code.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "UNKNOWN",
            Self::Internal => "INTERNAL",
            Self::NotFound => "NOT_FOUND",
            Self::InvalidArg => "INVALID_ARG",
            Self::Unavailable => "UNAVAILABLE",
            Self::Unsupported => "UNSUPPORTED",
            Self::AlreadyExists => "ALREADY_EXISTS",
            Self::Cancelled => "CANCELLED",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that may occur when talking to a Triton Inference Server, either
/// in-process through the C API or remotely over gRPC.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Failed to establish or maintain a gRPC connection.
    #[error("connection error: {0}")]
    Connection(String),

    /// The gRPC transport layer returned an error.
    #[error("transport error: {0}")]
    Transport(#[from] tonic::transport::Error),

    /// The server returned a gRPC status error.
    #[error("gRPC error (code={code}): {message}")]
    Grpc {
        /// The gRPC status code.
        code: tonic::Code,
        /// The error message from the server.
        message: String,
    },

    /// An error reported by (or destined for) the native Triton API.
    ///
    /// Displays as the bare message so it reads the same on both sides of
    /// the C boundary.
    #[error("{message}")]
    Triton {
        /// The Triton error code.
        code: ErrorCode,
        /// Human-readable description.
        message: String,
    },

    /// An inference input or request was constructed with invalid parameters.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The server itself is not in a ready state.
    #[error("server not ready")]
    ServerNotReady,

    /// A JSON document (model metadata or configuration) could not be parsed.
    #[error("failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The server returned a response that could not be interpreted.
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),
}

impl Error {
    /// Creates a [`Error::Triton`] with the given code and message.
    pub fn triton(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Triton {
            code,
            message: message.into(),
        }
    }

    /// Returns the Triton error code that best describes this error.
    ///
    /// Used when an error has to be handed back to the server as a
    /// `TRITONSERVER_Error`.
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Triton { code, .. } => *code,
            Self::InvalidInput(_) => ErrorCode::InvalidArg,
            Self::ServerNotReady => ErrorCode::Unavailable,
            Self::Connection(_) | Self::Transport(_) => ErrorCode::Unavailable,
            Self::Grpc { code, .. } => match code {
                tonic::Code::NotFound => ErrorCode::NotFound,
                tonic::Code::InvalidArgument => ErrorCode::InvalidArg,
                tonic::Code::Unavailable => ErrorCode::Unavailable,
                tonic::Code::Unimplemented => ErrorCode::Unsupported,
                tonic::Code::AlreadyExists => ErrorCode::AlreadyExists,
                tonic::Code::Cancelled => ErrorCode::Cancelled,
                tonic::Code::Internal => ErrorCode::Internal,
                _ => ErrorCode::Unknown,
            },
            Self::Json(_) | Self::UnexpectedResponse(_) => ErrorCode::Internal,
        }
    }

    /// Returns `true` for errors raised by the server or the transport, the
    /// class of failures worth retrying.
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::Grpc { .. } | Self::Transport(_) | Self::Connection(_)
        )
    }
}

impl From<tonic::Status> for Error {
    fn from(status: tonic::Status) -> Self {
        Self::Grpc {
            code: status.code(),
            message: status.message().to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_code_raw_values_match_native_enum() {
        assert_eq!(ErrorCode::Unknown.as_raw(), 0);
        assert_eq!(ErrorCode::InvalidArg.as_raw(), 3);
        assert_eq!(ErrorCode::Cancelled.as_raw(), 7);
        assert_eq!(ErrorCode::from_raw(2), ErrorCode::NotFound);
        assert_eq!(ErrorCode::from_raw(99), ErrorCode::Unknown);
    }

    #[test]
    fn triton_error_displays_bare_message() {
        let err = Error::triton(ErrorCode::InvalidArg, "bad parameter");
        assert_eq!(err.to_string(), "bad parameter");
        assert_eq!(err.code(), ErrorCode::InvalidArg);
    }

    #[test]
    fn grpc_codes_map_to_triton_codes() {
        let err: Error = tonic::Status::not_found("missing").into();
        assert_eq!(err.code(), ErrorCode::NotFound);
        assert!(err.is_server_error());

        let err: Error = tonic::Status::data_loss("oops").into();
        assert_eq!(err.code(), ErrorCode::Unknown);
    }

    #[test]
    fn local_errors_are_not_server_errors() {
        assert!(!Error::InvalidInput("x".into()).is_server_error());
        assert!(!Error::ServerNotReady.is_server_error());
        assert_eq!(Error::ServerNotReady.code(), ErrorCode::Unavailable);
    }
}
