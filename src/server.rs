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

//! In-process Triton server lifecycle.
//!
//! [`ServerOptions`] collects the settings applied to a new server,
//! [`ServerHandle`] is the narrow set of queries the rest of the crate
//! needs from a running server, and [`TritonServer`] (feature `native`)
//! owns a `TRITONSERVER_Server` created through the C API.
//!
//! # Example
//!
//! ```rust,no_run
//! # #[cfg(feature = "native")]
//! # fn example() -> rapids_triton::error::Result<()> {
//! use rapids_triton::model::TritonModel;
//! use rapids_triton::server::{ServerOptions, TritonServer};
//!
//! let server = TritonServer::new(ServerOptions::new("/models").log_verbose(1))?;
//! let model = TritonModel::new(&server, "fil", 1)?;
//! println!("{} inputs", model.inputs().len());
//! # Ok(())
//! # }
//! ```

use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::readiness::{self, PollPolicy};

/// Default directory searched for backend shared libraries.
pub const DEFAULT_BACKEND_DIRECTORY: &str = "/opt/tritonserver/backends";

/// Default directory searched for repository agents.
pub const DEFAULT_REPO_AGENT_DIRECTORY: &str = "/opt/tritonserver/repoagents";

/// Default minimum CUDA compute capability for GPU builds.
pub const DEFAULT_MIN_COMPUTE_CAPABILITY: f64 = 6.0;

/// Settings applied when creating an in-process server.
///
/// ```rust
/// use rapids_triton::server::ServerOptions;
///
/// let options = ServerOptions::new("/models")
///     .log_verbose(1)
///     .strict_model_config(false);
/// assert_eq!(options.model_repository().to_str(), Some("/models"));
/// ```
#[derive(Debug, Clone)]
pub struct ServerOptions {
    model_repository: PathBuf,
    log_verbose: i32,
    backend_directory: PathBuf,
    repo_agent_directory: PathBuf,
    strict_model_config: bool,
    min_compute_capability: f64,
    readiness: PollPolicy,
}

impl ServerOptions {
    /// Creates options for the given model repository with every other
    /// setting at its default.
    #[must_use]
    pub fn new(model_repository: impl Into<PathBuf>) -> Self {
        Self {
            model_repository: model_repository.into(),
            log_verbose: 0,
            backend_directory: PathBuf::from(DEFAULT_BACKEND_DIRECTORY),
            repo_agent_directory: PathBuf::from(DEFAULT_REPO_AGENT_DIRECTORY),
            strict_model_config: true,
            min_compute_capability: DEFAULT_MIN_COMPUTE_CAPABILITY,
            readiness: PollPolicy::default(),
        }
    }

    /// Sets the server's verbose logging level (0 disables verbose logs).
    #[must_use]
    pub fn log_verbose(self, level: i32) -> Self {
        Self {
            log_verbose: level,
            ..self
        }
    }

    #[must_use]
    pub fn backend_directory(self, dir: impl Into<PathBuf>) -> Self {
        Self {
            backend_directory: dir.into(),
            ..self
        }
    }

    #[must_use]
    pub fn repo_agent_directory(self, dir: impl Into<PathBuf>) -> Self {
        Self {
            repo_agent_directory: dir.into(),
            ..self
        }
    }

    /// When `false`, the server may auto-complete missing model
    /// configuration.
    #[must_use]
    pub fn strict_model_config(self, strict: bool) -> Self {
        Self {
            strict_model_config: strict,
            ..self
        }
    }

    #[must_use]
    pub fn min_compute_capability(self, cc: f64) -> Self {
        Self {
            min_compute_capability: cc,
            ..self
        }
    }

    /// Sets how long to wait for the server to become live and ready.
    #[must_use]
    pub fn readiness(self, policy: PollPolicy) -> Self {
        Self {
            readiness: policy,
            ..self
        }
    }

    #[must_use]
    pub fn model_repository(&self) -> &Path {
        &self.model_repository
    }

    #[must_use]
    pub fn readiness_policy(&self) -> PollPolicy {
        self.readiness
    }

    /// The compute capability actually handed to the server. Builds without
    /// the `gpu` feature accept any device.
    #[must_use]
    pub fn effective_min_compute_capability(&self) -> f64 {
        if cfg!(feature = "gpu") {
            self.min_compute_capability
        } else {
            0.0
        }
    }
}

/// Queries answered by a running server.
///
/// Implemented by [`TritonServer`]; tests and alternative transports can
/// provide their own implementation.
pub trait ServerHandle {
    /// Whether the server process is live.
    fn is_live(&self) -> Result<bool>;

    /// Whether the server is ready to accept requests.
    fn is_ready(&self) -> Result<bool>;

    /// Whether the given model version is loaded and ready.
    fn is_model_ready(&self, model_name: &str, model_version: i64) -> Result<bool>;

    /// Model metadata serialized as JSON.
    fn model_metadata_json(&self, model_name: &str, model_version: i64) -> Result<String>;

    /// Policy used when polling this server for readiness.
    fn readiness_policy(&self) -> PollPolicy {
        PollPolicy::default()
    }
}

/// Polls until the server is both live and ready.
///
/// Returns `Ok(false)` and logs an error when the policy is exhausted.
///
/// # Arguments
///
/// * `server` - The server to query.
/// * `policy` - How many times to ask and how long to pause in between.
///
/// # Errors
///
/// Propagates errors from the health queries.
pub fn wait_until_ready<S>(server: &S, policy: PollPolicy) -> Result<bool>
where
    S: ServerHandle + ?Sized,
{
    let healthy = readiness::poll_until(policy, || Ok(server.is_live()? && server.is_ready()?))?;
    if !healthy {
        tracing::error!(
            attempts = policy.attempts(),
            "failed to find healthy inference server"
        );
    }
    Ok(healthy)
}

#[cfg(feature = "native")]
pub use native::TritonServer;

#[cfg(feature = "native")]
mod native {
    use std::ptr;

    use super::{wait_until_ready, ServerHandle, ServerOptions};
    use crate::error::Result;
    use crate::ffi;
    use crate::readiness::PollPolicy;

    /// An in-process Triton server.
    ///
    /// The native server is deleted when this value is dropped.
    #[derive(Debug)]
    pub struct TritonServer {
        raw: *mut ffi::TRITONSERVER_Server,
        readiness: PollPolicy,
    }

    // The server API is internally synchronized.
    unsafe impl Send for TritonServer {}
    unsafe impl Sync for TritonServer {}

    /// Owns a `TRITONSERVER_ServerOptions` until the server is created.
    struct RawOptions(*mut ffi::TRITONSERVER_ServerOptions);

    impl Drop for RawOptions {
        fn drop(&mut self) {
            // SAFETY: created by TRITONSERVER_ServerOptionsNew and deleted once.
            if let Err(e) = unsafe { ffi::check(ffi::TRITONSERVER_ServerOptionsDelete(self.0)) } {
                tracing::warn!(error = %e, "failed to delete server options");
            }
        }
    }

    impl TritonServer {
        /// Creates a server from `options` and waits for it to become live
        /// and ready.
        ///
        /// An unhealthy server is logged but still returned.
        ///
        /// # Errors
        ///
        /// Returns [`Error::Triton`](crate::error::Error::Triton) if any
        /// option is rejected or the server cannot be created.
        pub fn new(options: ServerOptions) -> Result<Self> {
            let raw_options = Self::build_options(&options)?;
            let mut raw = ptr::null_mut();
            // SAFETY: raw_options is a live options object.
            unsafe { ffi::check(ffi::TRITONSERVER_ServerNew(&mut raw, raw_options.0))? };
            drop(raw_options);

            tracing::info!(
                repository = %options.model_repository().display(),
                "created in-process inference server"
            );
            let server = Self {
                raw,
                readiness: options.readiness_policy(),
            };
            wait_until_ready(&server, server.readiness)?;
            Ok(server)
        }

        fn build_options(options: &ServerOptions) -> Result<RawOptions> {
            let mut raw = ptr::null_mut();
            // SAFETY: out-pointer is valid for writes.
            unsafe { ffi::check(ffi::TRITONSERVER_ServerOptionsNew(&mut raw))? };
            let raw = RawOptions(raw);

            let repository = ffi::cstring(&options.model_repository.to_string_lossy())?;
            let backends = ffi::cstring(&options.backend_directory.to_string_lossy())?;
            let agents = ffi::cstring(&options.repo_agent_directory.to_string_lossy())?;

            // SAFETY: raw.0 is live and the strings outlive each call.
            unsafe {
                ffi::check(ffi::TRITONSERVER_ServerOptionsSetModelRepositoryPath(
                    raw.0,
                    repository.as_ptr(),
                ))?;
                ffi::check(ffi::TRITONSERVER_ServerOptionsSetLogVerbose(
                    raw.0,
                    options.log_verbose,
                ))?;
                ffi::check(ffi::TRITONSERVER_ServerOptionsSetBackendDirectory(
                    raw.0,
                    backends.as_ptr(),
                ))?;
                ffi::check(ffi::TRITONSERVER_ServerOptionsSetRepoAgentDirectory(
                    raw.0,
                    agents.as_ptr(),
                ))?;
                ffi::check(ffi::TRITONSERVER_ServerOptionsSetStrictModelConfig(
                    raw.0,
                    options.strict_model_config,
                ))?;
                ffi::check(ffi::TRITONSERVER_ServerOptionsSetMinSupportedComputeCapability(
                    raw.0,
                    options.effective_min_compute_capability(),
                ))?;
            }
            Ok(raw)
        }

        /// Raw pointer to the native server, for calls this crate does not
        /// wrap. Valid for the lifetime of `self`.
        #[must_use]
        pub fn as_ptr(&self) -> *mut ffi::TRITONSERVER_Server {
            self.raw
        }
    }

    impl ServerHandle for TritonServer {
        fn is_live(&self) -> Result<bool> {
            let mut live = false;
            // SAFETY: self.raw is live until drop.
            unsafe { ffi::check(ffi::TRITONSERVER_ServerIsLive(self.raw, &mut live))? };
            Ok(live)
        }

        fn is_ready(&self) -> Result<bool> {
            let mut ready = false;
            // SAFETY: self.raw is live until drop.
            unsafe { ffi::check(ffi::TRITONSERVER_ServerIsReady(self.raw, &mut ready))? };
            Ok(ready)
        }

        fn is_model_ready(&self, model_name: &str, model_version: i64) -> Result<bool> {
            let name = ffi::cstring(model_name)?;
            let mut ready = false;
            // SAFETY: self.raw is live; name outlives the call.
            unsafe {
                ffi::check(ffi::TRITONSERVER_ServerModelIsReady(
                    self.raw,
                    name.as_ptr(),
                    model_version,
                    &mut ready,
                ))?;
            }
            Ok(ready)
        }

        fn model_metadata_json(&self, model_name: &str, model_version: i64) -> Result<String> {
            let name = ffi::cstring(model_name)?;
            let mut message = ptr::null_mut();
            // SAFETY: self.raw is live; the message is consumed by
            // take_message_json.
            unsafe {
                ffi::check(ffi::TRITONSERVER_ServerModelMetadata(
                    self.raw,
                    name.as_ptr(),
                    model_version,
                    &mut message,
                ))?;
                ffi::take_message_json(message)
            }
        }

        fn readiness_policy(&self) -> PollPolicy {
            self.readiness
        }
    }

    impl Drop for TritonServer {
        fn drop(&mut self) {
            // SAFETY: self.raw was created by TRITONSERVER_ServerNew.
            if let Err(e) = unsafe { ffi::check(ffi::TRITONSERVER_ServerDelete(self.raw)) } {
                tracing::error!(error = %e, "failed to delete inference server");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::time::Duration;

    use super::*;
    use crate::error::{Error, ErrorCode};

    struct FlakyServer {
        ready_after: u32,
        calls: Cell<u32>,
    }

    impl ServerHandle for FlakyServer {
        fn is_live(&self) -> Result<bool> {
            Ok(true)
        }

        fn is_ready(&self) -> Result<bool> {
            self.calls.set(self.calls.get() + 1);
            Ok(self.calls.get() >= self.ready_after)
        }

        fn is_model_ready(&self, _: &str, _: i64) -> Result<bool> {
            Err(Error::triton(ErrorCode::Unsupported, "not used"))
        }

        fn model_metadata_json(&self, _: &str, _: i64) -> Result<String> {
            Err(Error::triton(ErrorCode::Unsupported, "not used"))
        }
    }

    fn quick(attempts: u32) -> PollPolicy {
        PollPolicy::default()
            .max_attempts(attempts)
            .interval(Duration::from_millis(1))
    }

    #[test]
    fn options_defaults_match_container_layout() {
        let options = ServerOptions::new("/models");
        assert_eq!(options.backend_directory, Path::new(DEFAULT_BACKEND_DIRECTORY));
        assert_eq!(options.repo_agent_directory, Path::new(DEFAULT_REPO_AGENT_DIRECTORY));
        assert!(options.strict_model_config);
        assert_eq!(options.log_verbose, 0);
        assert_eq!(options.readiness_policy(), PollPolicy::default());
    }

    #[test]
    fn compute_capability_depends_on_gpu_feature() {
        let options = ServerOptions::new("/models").min_compute_capability(7.5);
        let expected = if cfg!(feature = "gpu") { 7.5 } else { 0.0 };
        assert_eq!(options.effective_min_compute_capability(), expected);
    }

    #[test]
    fn waits_until_live_and_ready() {
        let server = FlakyServer {
            ready_after: 3,
            calls: Cell::new(0),
        };
        assert!(wait_until_ready(&server, quick(10)).unwrap());
        assert_eq!(server.calls.get(), 3);
    }

    #[test]
    fn unhealthy_server_is_reported_not_failed() {
        let server = FlakyServer {
            ready_after: u32::MAX,
            calls: Cell::new(0),
        };
        assert!(!wait_until_ready(&server, quick(4)).unwrap());
        assert_eq!(server.calls.get(), 4);
    }
}
