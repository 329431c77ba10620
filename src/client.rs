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


//! Async gRPC client for a remote Triton Inference Server.
//!
//! [`TritonClient`] covers health and metadata queries plus the
//! convenience calls used by test harnesses and benchmarks: waiting for a
//! server to come up, predicting with retries, fanning one request out to
//! several model versions, and clearing shared-memory registrations.
//!
//! # Example
//!
//! ```rust,no_run
//! # async fn example() -> rapids_triton::error::Result<()> {
//! use std::time::Duration;
//! use rapids_triton::client::TritonClient;
//! use rapids_triton::infer::InferInput;
//!
//! let client = TritonClient::connect("http://localhost:8001").await?;
//! client.wait_for_server(Duration::from_secs(60)).await?;
//!
//! let input = InferInput::from_slice("input__0", vec![1, 4], &[0.0_f32; 4]);
//! let outputs = client.predict("fil", vec![input], &["output__0"], "1", 3).await?;
//! let scores = outputs["output__0"].to_vec::<f32>()?;
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;
use std::time::Duration;

use tonic::transport::{Channel, Endpoint};

use crate::error::{Error, ErrorCode, Result};
use crate::generated::inference::{
    self, grpc_inference_service_client::GrpcInferenceServiceClient,
};
use crate::infer::{
    InferInput, InferRequestBuilder, InferResponse, ModelMetadata, OutputTensor, ServerMetadata,
};

/// Default maximum message size for gRPC (128 MiB).
const DEFAULT_MAX_MESSAGE_SIZE: usize = 128 * 1024 * 1024;

/// Default gRPC port of a Triton server.
pub const DEFAULT_GRPC_PORT: u16 = 8001;

/// Builds a gRPC endpoint URL from a host and optional port.
///
/// ```rust
/// use rapids_triton::client::grpc_url;
/// assert_eq!(grpc_url("localhost", None), "http://localhost:8001");
/// assert_eq!(grpc_url("triton", Some(9001)), "http://triton:9001");
/// ```
#[must_use]
pub fn grpc_url(host: &str, port: Option<u16>) -> String {
    format!("http://{host}:{}", port.unwrap_or(DEFAULT_GRPC_PORT))
}

/// Options for configuring the client connection.
///
/// ```rust
/// use std::time::Duration;
/// use rapids_triton::client::ClientOptions;
///
/// let options = ClientOptions::default()
///     .connect_timeout(Duration::from_secs(10))
///     .request_timeout(Duration::from_secs(30))
///     .poll_interval(Duration::from_millis(200));
/// ```
#[derive(Debug, Clone)]
pub struct ClientOptions {
    connect_timeout: Option<Duration>,
    request_timeout: Option<Duration>,
    max_message_size: usize,
    keep_alive_interval: Option<Duration>,
    poll_interval: Duration,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Some(Duration::from_secs(5)),
            request_timeout: None,
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
            keep_alive_interval: None,
            poll_interval: Duration::from_secs(1),
        }
    }
}

impl ClientOptions {
    #[must_use]
    pub fn connect_timeout(self, timeout: Duration) -> Self {
        Self {
            connect_timeout: Some(timeout),
            ..self
        }
    }

    /// Sets the timeout applied to each individual RPC.
    #[must_use]
    pub fn request_timeout(self, timeout: Duration) -> Self {
        Self {
            request_timeout: Some(timeout),
            ..self
        }
    }

    /// Sets the maximum gRPC message size in bytes. Default: 128 MiB.
    #[must_use]
    pub fn max_message_size(self, size: usize) -> Self {
        Self {
            max_message_size: size,
            ..self
        }
    }

    /// Enables HTTP/2 keep-alive pings at the given interval.
    #[must_use]
    pub fn keep_alive_interval(self, interval: Duration) -> Self {
        Self {
            keep_alive_interval: Some(interval),
            ..self
        }
    }

    /// Sets the pause between readiness checks in
    /// [`TritonClient::wait_for_server`]. Default: 1 s.
    #[must_use]
    pub fn poll_interval(self, interval: Duration) -> Self {
        Self {
            poll_interval: interval,
            ..self
        }
    }

    fn endpoint(&self, url: &str) -> Result<Endpoint> {
        let mut endpoint = Endpoint::from_shared(url.to_owned())
            .map_err(|e| Error::Connection(format!("invalid URL: {e}")))?;
        if let Some(timeout) = self.connect_timeout {
            endpoint = endpoint.connect_timeout(timeout);
        }
        if let Some(timeout) = self.request_timeout {
            endpoint = endpoint.timeout(timeout);
        }
        if let Some(interval) = self.keep_alive_interval {
            endpoint = endpoint
                .keep_alive_while_idle(true)
                .http2_keep_alive_interval(interval);
        }
        Ok(endpoint)
    }
}

/// A client for a Triton Inference Server reachable over gRPC.
///
/// Clones share the same underlying channel and can be used concurrently
/// from multiple tasks.
#[derive(Debug, Clone)]
pub struct TritonClient {
    inner: GrpcInferenceServiceClient<Channel>,
    poll_interval: Duration,
}

impl TritonClient {
    /// Connects with default options.
    ///
    /// # Arguments
    ///
    /// * `url` -- The gRPC endpoint URL (e.g. `"http://localhost:8001"`).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] if the connection cannot be established.
    pub async fn connect(url: &str) -> Result<Self> {
        Self::connect_with_options(url, ClientOptions::default()).await
    }

    /// Connects with custom options.
    ///
    /// # Arguments
    ///
    /// * `url` -- The gRPC endpoint URL (e.g. `"http://localhost:8001"`).
    /// * `options` -- Connection, transport and polling configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Connection`] for a malformed URL and
    /// [`Error::Transport`] if the connection cannot be established.
    pub async fn connect_with_options(url: &str, options: ClientOptions) -> Result<Self> {
        let channel = options.endpoint(url)?.connect().await?;
        Ok(Self::from_channel(channel, &options))
    }

    /// Creates a client without connecting; the channel connects on first
    /// use. Useful when the server may still be starting, as with
    /// [`wait_for_server`](Self::wait_for_server).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Connection`] for a malformed URL.
    pub fn connect_lazy(url: &str, options: ClientOptions) -> Result<Self> {
        let channel = options.endpoint(url)?.connect_lazy();
        Ok(Self::from_channel(channel, &options))
    }

    fn from_channel(channel: Channel, options: &ClientOptions) -> Self {
        let inner = GrpcInferenceServiceClient::new(channel)
            .max_decoding_message_size(options.max_message_size)
            .max_encoding_message_size(options.max_message_size);
        Self {
            inner,
            poll_interval: options.poll_interval,
        }
    }

    // -----------------------------------------------------------------------
    // Health checks
    // -----------------------------------------------------------------------

    /// Checks whether the server process is live.
    ///
    /// # Errors
    ///
    /// Returns an error if the gRPC call fails.
    pub async fn is_server_live(&self) -> Result<bool> {
        let response = self
            .inner
            .clone()
            .server_live(inference::ServerLiveRequest {})
            .await?;
        Ok(response.into_inner().live)
    }

    /// Checks whether the server is ready to accept inference requests.
    ///
    /// # Errors
    ///
    /// Returns an error if the gRPC call fails.
    pub async fn is_server_ready(&self) -> Result<bool> {
        let response = self
            .inner
            .clone()
            .server_ready(inference::ServerReadyRequest {})
            .await?;
        Ok(response.into_inner().ready)
    }

    /// Checks whether a model version is ready.
    ///
    /// # Arguments
    ///
    /// * `model_name` -- The name of the model.
    /// * `model_version` -- The version to check. Pass `""` for the version
    ///   chosen by the server's policy.
    ///
    /// # Errors
    ///
    /// Returns an error if the gRPC call fails.
    pub async fn is_model_ready(&self, model_name: &str, model_version: &str) -> Result<bool> {
        let response = self
            .inner
            .clone()
            .model_ready(inference::ModelReadyRequest {
                name: model_name.to_owned(),
                version: model_version.to_owned(),
            })
            .await?;
        Ok(response.into_inner().ready)
    }

    /// Polls [`is_server_ready`](Self::is_server_ready) until it succeeds.
    ///
    /// Errors while polling are treated as "not ready yet". Each check is
    /// cut off at the remaining budget, so a server that accepts
    /// connections but never answers cannot stretch the wait.
    ///
    /// # Arguments
    ///
    /// * `timeout` -- Total time to wait before giving up.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ServerNotReady`] once `timeout` has elapsed.
    pub async fn wait_for_server(&self, timeout: Duration) -> Result<()> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            match tokio::time::timeout(remaining, self.is_server_ready()).await {
                Ok(Ok(true)) => return Ok(()),
                Ok(Ok(false)) => tracing::debug!("server not ready yet"),
                Ok(Err(e)) => tracing::debug!(error = %e, "server not reachable yet"),
                Err(_) => tracing::debug!("readiness check timed out"),
            }
            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            if remaining.is_zero() {
                tracing::error!(?timeout, "server startup timeout expired");
                return Err(Error::ServerNotReady);
            }
            tokio::time::sleep(self.poll_interval.min(remaining)).await;
        }
    }

    // -----------------------------------------------------------------------
    // Metadata
    // -----------------------------------------------------------------------

    /// Retrieves server name, version and supported extensions.
    ///
    /// # Errors
    ///
    /// Returns an error if the gRPC call fails.
    pub async fn server_metadata(&self) -> Result<ServerMetadata> {
        let md = self
            .inner
            .clone()
            .server_metadata(inference::ServerMetadataRequest {})
            .await?
            .into_inner();
        Ok(ServerMetadata {
            name: md.name,
            version: md.version,
            extensions: md.extensions,
        })
    }

    /// Retrieves metadata for a model version.
    ///
    /// # Arguments
    ///
    /// * `model_name` -- The name of the model.
    /// * `model_version` -- The version. Pass `""` for the default.
    ///
    /// # Errors
    ///
    /// Returns an error if the gRPC call fails.
    pub async fn model_metadata(
        &self,
        model_name: &str,
        model_version: &str,
    ) -> Result<ModelMetadata> {
        let response = self
            .inner
            .clone()
            .model_metadata(inference::ModelMetadataRequest {
                name: model_name.to_owned(),
                version: model_version.to_owned(),
            })
            .await?;
        Ok(response.into_inner().into())
    }

    /// Retrieves the configuration of a model version.
    ///
    /// # Arguments
    ///
    /// * `model_name` -- The name of the model.
    /// * `model_version` -- The version. Pass `""` for the default.
    ///
    /// # Errors
    ///
    /// Returns an error if the gRPC call fails or the response has no config.
    pub async fn model_config(
        &self,
        model_name: &str,
        model_version: &str,
    ) -> Result<inference::ModelConfig> {
        let response = self
            .inner
            .clone()
            .model_config(inference::ModelConfigRequest {
                name: model_name.to_owned(),
                version: model_version.to_owned(),
            })
            .await?;
        response
            .into_inner()
            .config
            .ok_or_else(|| Error::UnexpectedResponse("model config response has no config".into()))
    }

    // -----------------------------------------------------------------------
    // Inference
    // -----------------------------------------------------------------------

    /// Performs a single inference request.
    ///
    /// # Errors
    ///
    /// Returns an error if the gRPC call fails.
    pub async fn infer(&self, request: inference::ModelInferRequest) -> Result<InferResponse> {
        let response = self.inner.clone().model_infer(request).await?;
        Ok(InferResponse::new(response.into_inner()))
    }

    /// Runs inference and returns the requested outputs by name.
    ///
    /// Server and transport failures are retried until `attempts` requests
    /// have been made (at least one is always made). Any other error is
    /// returned at once.
    ///
    /// # Arguments
    ///
    /// * `model_name` -- The model to run.
    /// * `inputs` -- Input tensors with data attached.
    /// * `outputs` -- Names of the outputs to return.
    /// * `model_version` -- The version. Pass `""` for the default.
    /// * `attempts` -- Maximum number of requests to send.
    ///
    /// # Errors
    ///
    /// Returns the last error once attempts are exhausted, or an
    /// [`Error::UnexpectedResponse`] if the response cannot be split into
    /// outputs.
    pub async fn predict(
        &self,
        model_name: &str,
        inputs: Vec<InferInput>,
        outputs: &[&str],
        model_version: &str,
        attempts: u32,
    ) -> Result<HashMap<String, OutputTensor>> {
        let mut builder = InferRequestBuilder::new(model_name)
            .model_version(model_version)
            .inputs(inputs);
        for &name in outputs {
            builder = builder.output(name);
        }
        let request = builder.build();

        let attempts = attempts.max(1);
        let mut attempt = 1;
        loop {
            match self.infer(request.clone()).await {
                Ok(response) => return response.into_tensors(),
                Err(e) if e.is_server_error() && attempt < attempts => {
                    tracing::warn!(
                        model = model_name,
                        version = model_version,
                        attempt,
                        error = %e,
                        "inference failed, retrying"
                    );
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Runs the same prediction against several model versions
    /// concurrently.
    ///
    /// Results are returned in the order of `model_versions`; one failing
    /// version does not affect the others.
    pub async fn predict_versions(
        &self,
        model_name: &str,
        inputs: Vec<InferInput>,
        outputs: &[&str],
        model_versions: &[&str],
        attempts: u32,
    ) -> Vec<Result<HashMap<String, OutputTensor>>> {
        let handles: Vec<_> = model_versions
            .iter()
            .map(|&version| {
                let client = self.clone();
                let model = model_name.to_owned();
                let version = version.to_owned();
                let inputs = inputs.clone();
                let outputs: Vec<String> = outputs.iter().map(|&o| o.to_owned()).collect();
                tokio::spawn(async move {
                    let names: Vec<&str> = outputs.iter().map(String::as_str).collect();
                    client
                        .predict(&model, inputs, &names, &version, attempts)
                        .await
                })
            })
            .collect();

        let mut results = Vec::with_capacity(handles.len());
        for handle in handles {
            results.push(handle.await.unwrap_or_else(|e| {
                Err(Error::triton(
                    ErrorCode::Internal,
                    format!("prediction task failed: {e}"),
                ))
            }));
        }
        results
    }

    // -----------------------------------------------------------------------
    // Shared memory
    // -----------------------------------------------------------------------

    /// Unregisters a system shared-memory region.
    ///
    /// # Arguments
    ///
    /// * `name` -- The region name. Pass `""` to unregister all regions.
    ///
    /// # Errors
    ///
    /// Returns an error if the gRPC call fails.
    pub async fn system_shared_memory_unregister(&self, name: &str) -> Result<()> {
        self.inner
            .clone()
            .system_shared_memory_unregister(inference::SystemSharedMemoryUnregisterRequest {
                name: name.to_owned(),
            })
            .await?;
        Ok(())
    }

    /// Unregisters a CUDA shared-memory region.
    ///
    /// # Arguments
    ///
    /// * `name` -- The region name. Pass `""` to unregister all regions.
    ///
    /// # Errors
    ///
    /// Returns an error if the gRPC call fails.
    pub async fn cuda_shared_memory_unregister(&self, name: &str) -> Result<()> {
        self.inner
            .clone()
            .cuda_shared_memory_unregister(inference::CudaSharedMemoryUnregisterRequest {
                name: name.to_owned(),
            })
            .await?;
        Ok(())
    }

    /// Unregisters every CUDA and system shared-memory region.
    ///
    /// # Errors
    ///
    /// Returns the first gRPC failure.
    pub async fn clear_shared_memory(&self) -> Result<()> {
        self.cuda_shared_memory_unregister("").await?;
        self.system_shared_memory_unregister("").await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use tokio_stream::wrappers::TcpListenerStream;
    use tonic::{Request, Response, Status};

    use super::*;
    use crate::generated::inference::grpc_inference_service_server::{
        GrpcInferenceService, GrpcInferenceServiceServer,
    };
    use crate::generated::inference::model_infer_response::InferOutputTensor;

    type RpcResult<T> = std::result::Result<Response<T>, Status>;

    /// Behaviour of the in-process server.
    #[derive(Default)]
    struct MockState {
        /// Number of leading `ModelInfer` calls answered with UNAVAILABLE.
        unavailable_calls: usize,
        /// Answer `ModelInfer` with an output but no raw contents.
        malformed: bool,
        /// Never answer `ServerReady`.
        stall_ready: bool,
        infer_calls: AtomicUsize,
        shm_clears: AtomicUsize,
    }

    struct MockTriton(Arc<MockState>);

    #[tonic::async_trait]
    impl GrpcInferenceService for MockTriton {
        async fn server_live(
            &self,
            _: Request<inference::ServerLiveRequest>,
        ) -> RpcResult<inference::ServerLiveResponse> {
            Ok(Response::new(inference::ServerLiveResponse { live: true }))
        }

        async fn server_ready(
            &self,
            _: Request<inference::ServerReadyRequest>,
        ) -> RpcResult<inference::ServerReadyResponse> {
            if self.0.stall_ready {
                std::future::pending::<()>().await;
            }
            Ok(Response::new(inference::ServerReadyResponse { ready: true }))
        }

        async fn model_ready(
            &self,
            _: Request<inference::ModelReadyRequest>,
        ) -> RpcResult<inference::ModelReadyResponse> {
            Ok(Response::new(inference::ModelReadyResponse { ready: true }))
        }

        async fn server_metadata(
            &self,
            _: Request<inference::ServerMetadataRequest>,
        ) -> RpcResult<inference::ServerMetadataResponse> {
            Ok(Response::new(inference::ServerMetadataResponse {
                name: "triton".into(),
                version: "2.50.0".into(),
                extensions: vec!["classification".into()],
            }))
        }

        async fn model_metadata(
            &self,
            _: Request<inference::ModelMetadataRequest>,
        ) -> RpcResult<inference::ModelMetadataResponse> {
            Err(Status::unimplemented("model metadata"))
        }

        async fn model_infer(
            &self,
            request: Request<inference::ModelInferRequest>,
        ) -> RpcResult<inference::ModelInferResponse> {
            let call = self.0.infer_calls.fetch_add(1, Ordering::SeqCst) + 1;
            if call <= self.0.unavailable_calls {
                return Err(Status::unavailable("model is loading"));
            }

            let request = request.into_inner();
            let version: u32 = request.model_version.parse().unwrap_or(0);
            // Later versions answer first.
            let delay = u64::from(5u32.saturating_sub(version)) * 20;
            tokio::time::sleep(Duration::from_millis(delay)).await;

            let raw_output_contents = if self.0.malformed {
                Vec::new()
            } else {
                vec![crate::infer::encode(&[version as f32])]
            };
            Ok(Response::new(inference::ModelInferResponse {
                model_name: request.model_name,
                model_version: request.model_version,
                id: request.id,
                parameters: HashMap::new(),
                outputs: vec![InferOutputTensor {
                    name: "OUTPUT0".into(),
                    datatype: "FP32".into(),
                    shape: vec![1],
                    parameters: HashMap::new(),
                    contents: None,
                }],
                raw_output_contents,
            }))
        }

        async fn model_config(
            &self,
            _: Request<inference::ModelConfigRequest>,
        ) -> RpcResult<inference::ModelConfigResponse> {
            Ok(Response::new(inference::ModelConfigResponse { config: None }))
        }

        async fn system_shared_memory_unregister(
            &self,
            _: Request<inference::SystemSharedMemoryUnregisterRequest>,
        ) -> RpcResult<inference::SystemSharedMemoryUnregisterResponse> {
            self.0.shm_clears.fetch_add(1, Ordering::SeqCst);
            Ok(Response::new(
                inference::SystemSharedMemoryUnregisterResponse {},
            ))
        }

        async fn cuda_shared_memory_unregister(
            &self,
            _: Request<inference::CudaSharedMemoryUnregisterRequest>,
        ) -> RpcResult<inference::CudaSharedMemoryUnregisterResponse> {
            self.0.shm_clears.fetch_add(1, Ordering::SeqCst);
            Ok(Response::new(inference::CudaSharedMemoryUnregisterResponse {}))
        }
    }

    async fn serve(state: MockState) -> (TritonClient, Arc<MockState>) {
        let state = Arc::new(state);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        tokio::spawn(
            tonic::transport::Server::builder()
                .add_service(GrpcInferenceServiceServer::new(MockTriton(Arc::clone(
                    &state,
                ))))
                .serve_with_incoming(TcpListenerStream::new(listener)),
        );
        let options = ClientOptions::default().poll_interval(Duration::from_millis(10));
        let client = TritonClient::connect_lazy(&url, options).unwrap();
        (client, state)
    }

    fn input() -> Vec<InferInput> {
        vec![InferInput::from_slice("INPUT0", vec![1], &[1.0f32])]
    }

    fn output_value(outputs: &HashMap<String, OutputTensor>) -> f32 {
        outputs["OUTPUT0"].to_vec::<f32>().unwrap()[0]
    }

    #[test]
    fn malformed_url_is_a_connection_error() {
        let err = TritonClient::connect_lazy("not a url", ClientOptions::default()).unwrap_err();
        assert!(matches!(err, Error::Connection(_)));
    }

    #[tokio::test]
    async fn wait_for_unreachable_server_times_out() {
        // TEST-NET-1 (RFC 5737) is never routed.
        let options = ClientOptions::default()
            .connect_timeout(Duration::from_millis(100))
            .poll_interval(Duration::from_millis(10));
        let client = TritonClient::connect_lazy("http://192.0.2.1:1", options).unwrap();
        let err = client
            .wait_for_server(Duration::from_millis(50))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ServerNotReady));
    }

    #[tokio::test]
    async fn wait_for_server_returns_once_ready() {
        let (client, _) = serve(MockState::default()).await;
        client.wait_for_server(Duration::from_secs(5)).await.unwrap();
        assert!(client.is_server_live().await.unwrap());
        assert_eq!(client.server_metadata().await.unwrap().name, "triton");
    }

    #[tokio::test]
    async fn wait_for_server_cuts_off_a_stalled_check() {
        let (client, _) = serve(MockState {
            stall_ready: true,
            ..MockState::default()
        })
        .await;
        let waited = tokio::time::timeout(
            Duration::from_secs(5),
            client.wait_for_server(Duration::from_millis(200)),
        )
        .await
        .expect("wait_for_server overran its timeout");
        assert!(matches!(waited, Err(Error::ServerNotReady)));
    }

    #[tokio::test]
    async fn predict_makes_a_single_attempt_when_asked_for_one() {
        let (client, state) = serve(MockState {
            unavailable_calls: 1,
            ..MockState::default()
        })
        .await;
        let err = client
            .predict("fil", input(), &["OUTPUT0"], "1", 1)
            .await
            .unwrap_err();
        assert!(err.is_server_error());
        assert_eq!(state.infer_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn predict_zero_attempts_still_sends_one_request() {
        let (client, state) = serve(MockState::default()).await;
        let outputs = client
            .predict("fil", input(), &["OUTPUT0"], "1", 0)
            .await
            .unwrap();
        assert_eq!(output_value(&outputs), 1.0);
        assert_eq!(state.infer_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn predict_retries_server_errors_until_success() {
        let (client, state) = serve(MockState {
            unavailable_calls: 2,
            ..MockState::default()
        })
        .await;
        let outputs = client
            .predict("fil", input(), &["OUTPUT0"], "1", 3)
            .await
            .unwrap();
        assert_eq!(output_value(&outputs), 1.0);
        assert_eq!(state.infer_calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn predict_stops_after_the_last_attempt() {
        let (client, state) = serve(MockState {
            unavailable_calls: 10,
            ..MockState::default()
        })
        .await;
        let err = client
            .predict("fil", input(), &["OUTPUT0"], "1", 4)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Grpc {
                code: tonic::Code::Unavailable,
                ..
            }
        ));
        assert_eq!(state.infer_calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn predict_does_not_retry_local_errors() {
        let (client, state) = serve(MockState {
            malformed: true,
            ..MockState::default()
        })
        .await;
        let err = client
            .predict("fil", input(), &["OUTPUT0"], "1", 5)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::UnexpectedResponse(_)));
        assert_eq!(state.infer_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn predict_versions_keeps_version_order() {
        let (client, state) = serve(MockState::default()).await;
        let results = client
            .predict_versions("fil", input(), &["OUTPUT0"], &["1", "2", "3"], 1)
            .await;
        let values: Vec<f32> = results
            .iter()
            .map(|r| output_value(r.as_ref().unwrap()))
            .collect();
        assert_eq!(values, vec![1.0, 2.0, 3.0]);
        assert_eq!(state.infer_calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn missing_model_config_is_unexpected() {
        let (client, _) = serve(MockState::default()).await;
        let err = client.model_config("fil", "1").await.unwrap_err();
        assert!(matches!(err, Error::UnexpectedResponse(_)));
    }

    #[tokio::test]
    async fn clear_shared_memory_unregisters_both_kinds() {
        let (client, state) = serve(MockState::default()).await;
        client.clear_shared_memory().await.unwrap();
        assert_eq!(state.shm_clears.load(Ordering::SeqCst), 2);
    }
}
