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

//! Thin Rust layer over NVIDIA Triton Inference Server for RAPIDS backends.
//!
//! The crate has two halves:
//!
//! * **In-process** (feature `native`): [`TritonServer`] owns a server
//!   created through the Triton C API, [`TritonModel`] waits for a model and
//!   parses its metadata into typed descriptors, and [`backend`] provides
//!   the `TRITONBACKEND_ModelInitialize` trampoline and config helpers used
//!   by backend shared libraries.
//! * **Remote**: [`TritonClient`] talks to a running server over gRPC and
//!   adds the conveniences test harnesses need (waiting for startup,
//!   retrying predictions, multi-version fan-out, shared-memory cleanup).
//!
//! Both halves marshal tensors through [`TritonRequest`] and the
//! [`infer`] types. Without `native` the crate never links
//! `libtritonserver`, and every in-process type can be exercised through
//! the [`server::ServerHandle`] and [`backend::ModelHandle`] traits.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use rapids_triton::infer::DataType;
//! use rapids_triton::model::TritonModel;
//! use rapids_triton::TritonClient;
//!
//! # async fn example() -> rapids_triton::error::Result<()> {
//! let client = TritonClient::connect("http://localhost:8001").await?;
//!
//! let metadata = client.model_metadata("fil", "1").await?;
//! let model = TritonModel::from_metadata(metadata, 1)?;
//!
//! let mut request = model.create_inference_request();
//! request.set_input("input__0", vec![1, 4], &[0.1_f32, 0.2, 0.3, 0.4])?;
//! let response = client.infer(request.build()?).await?;
//!
//! let scores: Vec<f32> = request.get_output(&response, "output__0")?;
//! assert_eq!(model.output("output__0"), Some(DataType::Fp32));
//! # Ok(())
//! # }
//! ```
//!
//! # Features
//!
//! * `native`: link `libtritonserver` and enable [`TritonServer`],
//!   [`ffi`] and the backend entry points.
//! * `gpu`: honour the configured minimum CUDA compute capability. Without
//!   it the server is told to accept any device.

pub mod backend;
pub mod client;
pub mod error;
#[cfg(feature = "native")]
pub mod ffi;
pub mod generated;
pub mod infer;
pub mod logging;
pub mod model;
pub mod readiness;
pub mod request;
pub mod server;

pub use client::TritonClient;
pub use error::{Error, ErrorCode, Result};
pub use model::TritonModel;
pub use request::TritonRequest;
pub use server::ServerOptions;
#[cfg(feature = "native")]
pub use server::TritonServer;
