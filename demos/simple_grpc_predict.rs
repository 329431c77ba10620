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

//! Simple gRPC prediction example.
//!
//! Waits for a Triton Inference Server to come up, reads the metadata of a
//! FIL model to learn its inputs and outputs, and runs one prediction with
//! retries.
//!
//! This example assumes a model named `fil` with a single FP32 input
//! `input__0` of shape `[-1, N]` and an FP32 output `output__0`.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example simple_grpc_predict
//! ```
//!
//! Optionally pass a custom server URL:
//!
//! ```bash
//! cargo run --example simple_grpc_predict -- http://triton-server:8001
//! ```

use std::time::Duration;

use rapids_triton::client::{grpc_url, TritonClient};
use rapids_triton::error::{Error, Result};
use rapids_triton::infer::{DataType, InferInput};
use rapids_triton::logging;
use rapids_triton::model::TritonModel;

#[tokio::main]
async fn main() -> Result<()> {
    logging::init("info")?;

    let url = std::env::args()
        .nth(1)
        .unwrap_or_else(|| grpc_url("localhost", None));
    let model_name = "fil";

    tracing::info!(%url, "connecting to Triton");
    let client = TritonClient::connect(&url).await?;
    client.wait_for_server(Duration::from_secs(60)).await?;

    // -- Model metadata ------------------------------------------------------

    let metadata = client.model_metadata(model_name, "1").await?;
    let model = TritonModel::from_metadata(metadata, 1)?;
    for (name, datatype) in model.inputs() {
        println!("  Input: {name} ({datatype})");
    }
    for (name, datatype) in model.outputs() {
        println!("  Output: {name} ({datatype})");
    }

    if model.input("input__0") != Some(DataType::Fp32) {
        return Err(Error::InvalidInput(
            "model has no FP32 input named 'input__0'".into(),
        ));
    }
    let features = model
        .metadata()
        .inputs
        .first()
        .and_then(|t| t.shape.last().copied())
        .filter(|&n| n > 0)
        .unwrap_or(1);

    // -- Prediction ----------------------------------------------------------

    let rows = 4;
    let data: Vec<f32> = (0..rows * features).map(|i| i as f32 / 10.0).collect();
    let input = InferInput::from_slice("input__0", vec![rows, features], &data);

    let outputs = client
        .predict(model_name, vec![input], &["output__0"], "1", 3)
        .await?;
    let output = &outputs["output__0"];
    let scores = output.to_vec::<f32>()?;
    println!("output__0 {:?}: {:?}", output.shape, scores);

    client.clear_shared_memory().await?;
    Ok(())
}
