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

//! A model hosted by a Triton server, reduced to what a caller needs to
//! marshal requests: its name, version and typed input/output descriptors.

use crate::error::{Error, Result};
use crate::infer::{DataType, ModelMetadata, TensorMetadata};
use crate::readiness;
use crate::request::TritonRequest;
use crate::server::ServerHandle;

/// A tensor name paired with its data type.
pub type TensorInfo = (String, DataType);

/// A loaded model and its parsed metadata.
#[derive(Debug, Clone)]
pub struct TritonModel {
    version: i64,
    metadata: ModelMetadata,
    inputs: Vec<TensorInfo>,
    outputs: Vec<TensorInfo>,
}

impl TritonModel {
    /// Waits for the model to become ready, then fetches and parses its
    /// metadata.
    ///
    /// A model that never reports ready is logged and metadata is requested
    /// anyway; the server's answer to that request decides the outcome.
    ///
    /// # Arguments
    ///
    /// * `server` - Server hosting the model.
    /// * `model_name` - Name of the model in the repository.
    /// * `model_version` - Version to wait for and describe.
    ///
    /// # Errors
    ///
    /// Returns an error if a server query fails, the metadata is not valid
    /// JSON, or a tensor uses an unknown data type.
    pub fn new<S>(server: &S, model_name: &str, model_version: i64) -> Result<Self>
    where
        S: ServerHandle + ?Sized,
    {
        let policy = server.readiness_policy();
        let ready =
            readiness::poll_until(policy, || server.is_model_ready(model_name, model_version))?;
        if !ready {
            tracing::error!(
                model = model_name,
                version = model_version,
                "model failed to be ready in {} iterations",
                policy.attempts()
            );
        }

        let json = server.model_metadata_json(model_name, model_version)?;
        tracing::debug!(model = model_name, metadata = %json, "fetched model metadata");

        let metadata = serde_json::from_str(&json)?;
        Self::from_metadata(metadata, model_version)
    }

    /// Builds a model from metadata obtained elsewhere (e.g. from
    /// [`TritonClient::model_metadata`](crate::client::TritonClient::model_metadata)).
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if a tensor uses an unknown data type.
    pub fn from_metadata(metadata: ModelMetadata, model_version: i64) -> Result<Self> {
        let inputs = typed_tensors(&metadata.inputs)?;
        let outputs = typed_tensors(&metadata.outputs)?;
        Ok(Self {
            version: model_version,
            metadata,
            inputs,
            outputs,
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    #[must_use]
    pub fn version(&self) -> i64 {
        self.version
    }

    #[must_use]
    pub fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }

    /// Input names and data types, in metadata order.
    #[must_use]
    pub fn inputs(&self) -> &[TensorInfo] {
        &self.inputs
    }

    /// Output names and data types, in metadata order.
    #[must_use]
    pub fn outputs(&self) -> &[TensorInfo] {
        &self.outputs
    }

    /// Data type of the named input.
    #[must_use]
    pub fn input(&self, name: &str) -> Option<DataType> {
        lookup(&self.inputs, name)
    }

    /// Data type of the named output.
    #[must_use]
    pub fn output(&self, name: &str) -> Option<DataType> {
        lookup(&self.outputs, name)
    }

    /// Starts a request against this model's inputs and outputs.
    #[must_use]
    pub fn create_inference_request(&self) -> TritonRequest {
        TritonRequest::new(
            self.name(),
            self.version,
            self.inputs.clone(),
            self.outputs.clone(),
        )
    }
}

fn lookup(tensors: &[TensorInfo], name: &str) -> Option<DataType> {
    tensors.iter().find(|(n, _)| n == name).map(|&(_, dt)| dt)
}

fn typed_tensors(tensors: &[TensorMetadata]) -> Result<Vec<TensorInfo>> {
    tensors
        .iter()
        .map(|t| {
            DataType::parse(&t.datatype)
                .map(|dt| (t.name.clone(), dt))
                .ok_or_else(|| {
                    Error::InvalidInput(format!(
                        "tensor '{}' has unknown data type '{}'",
                        t.name, t.datatype
                    ))
                })
        })
        .collect()
}
