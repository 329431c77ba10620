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

//! Logging initialisation via `tracing-subscriber`.
//!
//! The library itself only emits `tracing` events. Applications (and the
//! demo) call [`init`] once at startup. Backends loaded into a Triton server
//! install [`TritonLogLayer`] instead so that events land in the server log.

use tracing_subscriber::EnvFilter;

use crate::error::{Error, ErrorCode, Result};

/// Installs a global fmt subscriber writing to stderr.
///
/// `RUST_LOG` takes precedence; `level` (e.g. `"info"`,
/// `"rapids_triton=debug"`) is the fallback.
///
/// # Errors
///
/// Returns an error if `level` is not a valid filter or a global subscriber
/// is already installed.
pub fn init(level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .map_err(|e| logger_error(format!("invalid log level '{level}': {e}")))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| logger_error(format!("failed to set subscriber: {e}")))
}

fn logger_error(message: String) -> Error {
    Error::triton(ErrorCode::Internal, message)
}

#[cfg(feature = "native")]
pub use native::{init_triton_log, TritonLogLayer};

#[cfg(feature = "native")]
mod native {
    use std::fmt::Write as _;

    use tracing::field::{Field, Visit};
    use tracing::{Event, Level, Subscriber};
    use tracing_subscriber::layer::{Context, SubscriberExt};
    use tracing_subscriber::util::SubscriberInitExt;
    use tracing_subscriber::Layer;

    use super::logger_error;
    use crate::error::Result;
    use crate::ffi;

    /// Forwards `tracing` events to `TRITONSERVER_LogMessage`.
    #[derive(Debug, Default, Clone, Copy)]
    pub struct TritonLogLayer;

    #[derive(Default)]
    struct MessageVisitor {
        message: String,
        fields: String,
    }

    impl Visit for MessageVisitor {
        fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
            if field.name() == "message" {
                let _ = write!(self.message, "{value:?}");
            } else {
                let _ = write!(self.fields, " {}={value:?}", field.name());
            }
        }

        fn record_str(&mut self, field: &Field, value: &str) {
            if field.name() == "message" {
                self.message.push_str(value);
            } else {
                let _ = write!(self.fields, " {}={value}", field.name());
            }
        }
    }

    fn triton_level(level: &Level) -> ffi::TRITONSERVER_LogLevel {
        match *level {
            Level::ERROR => ffi::TRITONSERVER_LOG_ERROR,
            Level::WARN => ffi::TRITONSERVER_LOG_WARN,
            Level::INFO => ffi::TRITONSERVER_LOG_INFO,
            _ => ffi::TRITONSERVER_LOG_VERBOSE,
        }
    }

    impl<S: Subscriber> Layer<S> for TritonLogLayer {
        fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
            let metadata = event.metadata();
            let level = triton_level(metadata.level());
            // SAFETY: plain query of the server's log configuration.
            if !unsafe { ffi::TRITONSERVER_LogIsEnabled(level) } {
                return;
            }

            let mut visitor = MessageVisitor::default();
            event.record(&mut visitor);
            visitor.message.push_str(&visitor.fields);

            let file = ffi::cstring_lossy(metadata.file().unwrap_or("<unknown>"));
            let line = metadata
                .line()
                .and_then(|l| i32::try_from(l).ok())
                .unwrap_or(0);
            let msg = ffi::cstring_lossy(&visitor.message);
            // SAFETY: both strings outlive the call. A logging failure has
            // nowhere to be reported, so the error is just released.
            unsafe {
                let _ = ffi::check(ffi::TRITONSERVER_LogMessage(
                    level,
                    file.as_ptr(),
                    line,
                    msg.as_ptr(),
                ));
            }
        }
    }

    /// Installs [`TritonLogLayer`] as the global subscriber.
    ///
    /// # Errors
    ///
    /// Returns an error if a global subscriber is already installed.
    pub fn init_triton_log() -> Result<()> {
        tracing_subscriber::registry()
            .with(TritonLogLayer)
            .try_init()
            .map_err(|e| logger_error(format!("failed to set subscriber: {e}")))
    }
}
