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

//! Typed request/response marshaling for a single model.
//!
//! A [`TritonRequest`] knows the declared inputs and outputs of its model,
//! so element types, names and shapes are checked before anything is sent.
//!
//! ```rust
//! use rapids_triton::infer::DataType;
//! use rapids_triton::request::TritonRequest;
//!
//! let mut request = TritonRequest::new(
//!     "fil",
//!     1,
//!     vec![("input__0".to_owned(), DataType::Fp32)],
//!     vec![("output__0".to_owned(), DataType::Fp32)],
//! );
//! request.set_input("input__0", vec![2, 2], &[0.0_f32, 1.0, 2.0, 3.0])?;
//! let proto = request.build()?;
//! assert_eq!(proto.model_version, "1");
//! # Ok::<(), rapids_triton::error::Error>(())
//! ```

use crate::error::{Error, Result};
use crate::generated::inference;
use crate::infer::{self, DataType, Element, InferInput, InferRequestBuilder, InferResponse};
use crate::model::TensorInfo;

/// An inference request under construction for a specific model.
#[derive(Debug, Clone)]
pub struct TritonRequest {
    model_name: String,
    model_version: i64,
    input_info: Vec<TensorInfo>,
    output_info: Vec<TensorInfo>,
    inputs: Vec<Option<InferInput>>,
    requested: Vec<String>,
}

impl TritonRequest {
    /// Creates an empty request for a model with the given I/O descriptors.
    ///
    /// # Arguments
    ///
    /// * `model_name` - Name of the model to run.
    /// * `model_version` - Version to run; a negative value lets the server
    ///   pick one according to its version policy.
    /// * `input_info` / `output_info` - Declared tensors, in model order.
    #[must_use]
    pub fn new(
        model_name: impl Into<String>,
        model_version: i64,
        input_info: Vec<TensorInfo>,
        output_info: Vec<TensorInfo>,
    ) -> Self {
        let inputs = vec![None; input_info.len()];
        Self {
            model_name: model_name.into(),
            model_version,
            input_info,
            output_info,
            inputs,
            requested: Vec::new(),
        }
    }

    #[must_use]
    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    #[must_use]
    pub fn model_version(&self) -> i64 {
        self.model_version
    }

    #[must_use]
    pub fn inputs(&self) -> &[TensorInfo] {
        &self.input_info
    }

    #[must_use]
    pub fn outputs(&self) -> &[TensorInfo] {
        &self.output_info
    }

    /// Sets the data of one input. Setting an input twice replaces it.
    ///
    /// # Arguments
    ///
    /// * `name` - A declared input of the model.
    /// * `shape` - Tensor shape, batch dimension included.
    /// * `data` - Elements in row-major order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the model has no such input, `T`
    /// does not match the declared data type, or `data` does not hold
    /// exactly as many elements as `shape` describes.
    pub fn set_input<T: Element>(&mut self, name: &str, shape: Vec<i64>, data: &[T]) -> Result<()> {
        let (index, declared) = self.input_slot(name)?;
        if declared != T::DATA_TYPE {
            return Err(Error::InvalidInput(format!(
                "input '{name}' is declared {declared}, got {}",
                T::DATA_TYPE
            )));
        }
        check_count(name, &shape, data.len())?;
        self.inputs[index] = Some(InferInput::new(name, shape, declared).with_data(data));
        Ok(())
    }

    /// Sets one input from raw little-endian bytes, for types without a
    /// Rust element type such as FP16 and BF16.
    ///
    /// For fixed-size types the byte length must match `shape`. BYTES data
    /// must already be length-prefixed; prefer
    /// [`set_input_bytes`](Self::set_input_bytes) for it.
    ///
    /// # Arguments
    ///
    /// * `name` - A declared input of the model.
    /// * `shape` - Tensor shape, batch dimension included.
    /// * `data` - The encoded tensor contents.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the model has no such input, the
    /// shape has a negative dimension, or the byte length is wrong.
    pub fn set_input_raw(&mut self, name: &str, shape: Vec<i64>, data: Vec<u8>) -> Result<()> {
        let (index, declared) = self.input_slot(name)?;
        let count = infer::element_count(&shape)?;
        if let Some(size) = declared.byte_size() {
            let expected = count * size;
            if data.len() != expected {
                return Err(Error::InvalidInput(format!(
                    "input '{name}' ({declared}, shape {shape:?}) needs {expected} bytes, got {}",
                    data.len()
                )));
            }
        }
        self.inputs[index] = Some(InferInput::new(name, shape, declared).with_data_raw(data));
        Ok(())
    }

    /// Sets a BYTES input from one byte sequence per element.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the model has no such input, it is
    /// not declared BYTES, or the item count does not match `shape`.
    pub fn set_input_bytes(&mut self, name: &str, shape: Vec<i64>, data: &[&[u8]]) -> Result<()> {
        let (index, declared) = self.input_slot(name)?;
        if declared != DataType::Bytes {
            return Err(Error::InvalidInput(format!(
                "input '{name}' is declared {declared}, got BYTES"
            )));
        }
        check_count(name, &shape, data.len())?;
        self.inputs[index] = Some(InferInput::new(name, shape, declared).with_data_bytes(data)?);
        Ok(())
    }

    fn input_slot(&self, name: &str) -> Result<(usize, DataType)> {
        position(&self.input_info, name)
            .map(|index| (index, self.input_info[index].1))
            .ok_or_else(|| Error::InvalidInput(format!("model has no input named '{name}'")))
    }

    /// Asks for a specific output. When no output is requested, all
    /// declared outputs are.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the model has no such output.
    pub fn request_output(&mut self, name: &str) -> Result<()> {
        self.output_type(name)?;
        if !self.requested.iter().any(|n| n == name) {
            self.requested.push(name.to_owned());
        }
        Ok(())
    }

    /// Produces the protocol request.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] naming the first declared input that
    /// was never set.
    pub fn build(&self) -> Result<inference::ModelInferRequest> {
        // Negative versions defer to the server's version policy.
        let version = if self.model_version < 0 {
            String::new()
        } else {
            self.model_version.to_string()
        };
        let mut builder = InferRequestBuilder::new(&self.model_name).model_version(version);
        for ((name, _), input) in self.input_info.iter().zip(&self.inputs) {
            let input = input
                .clone()
                .ok_or_else(|| Error::InvalidInput(format!("input '{name}' was not set")))?;
            builder = builder.input(input);
        }
        let outputs: Vec<&str> = if self.requested.is_empty() {
            self.output_info.iter().map(|(n, _)| n.as_str()).collect()
        } else {
            self.requested.iter().map(String::as_str).collect()
        };
        for name in outputs {
            builder = builder.output(name);
        }
        Ok(builder.build())
    }

    /// Reads one output of `response` as elements of type `T`.
    ///
    /// # Arguments
    ///
    /// * `response` - The server's answer to [`build`](Self::build).
    /// * `name` - A declared output of the model.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the model declares no such output
    /// or declares a different type, and [`Error::UnexpectedResponse`] if the
    /// response does not carry it.
    pub fn get_output<T: Element>(&self, response: &InferResponse, name: &str) -> Result<Vec<T>> {
        let declared = self.output_type(name)?;
        if declared != T::DATA_TYPE {
            return Err(Error::InvalidInput(format!(
                "output '{name}' is declared {declared}, requested as {}",
                T::DATA_TYPE
            )));
        }
        infer::decode(self.get_output_raw(response, name)?)
    }

    /// Reads the raw bytes of one output, whatever its declared type.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the model declares no such output
    /// and [`Error::UnexpectedResponse`] if the response does not carry it.
    pub fn get_output_raw<'r>(&self, response: &'r InferResponse, name: &str) -> Result<&'r [u8]> {
        self.output_type(name)?;
        let slot = response.output_index(name).ok_or_else(|| {
            Error::UnexpectedResponse(format!("response has no output named '{name}'"))
        })?;
        response.output_raw(slot)
    }

    fn output_type(&self, name: &str) -> Result<DataType> {
        position(&self.output_info, name)
            .map(|index| self.output_info[index].1)
            .ok_or_else(|| Error::InvalidInput(format!("model has no output named '{name}'")))
    }
}

fn check_count(name: &str, shape: &[i64], given: usize) -> Result<()> {
    let expected = infer::element_count(shape)?;
    if expected != given {
        return Err(Error::InvalidInput(format!(
            "input '{name}' has shape {shape:?} ({expected} elements), got {given} values"
        )));
    }
    Ok(())
}

fn position(tensors: &[TensorInfo], name: &str) -> Option<usize> {
    tensors.iter().position(|(n, _)| n == name)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::generated::inference::model_infer_response::InferOutputTensor;

    fn fil_request() -> TritonRequest {
        TritonRequest::new(
            "fil",
            1,
            vec![
                ("input__0".to_owned(), DataType::Fp32),
                ("mask".to_owned(), DataType::Bool),
            ],
            vec![
                ("output__0".to_owned(), DataType::Fp32),
                ("labels".to_owned(), DataType::Int64),
            ],
        )
    }

    fn response() -> InferResponse {
        let tensor = |name: &str, datatype: &str| InferOutputTensor {
            name: name.into(),
            datatype: datatype.into(),
            shape: vec![2],
            parameters: HashMap::new(),
            contents: None,
        };
        InferResponse::new(inference::ModelInferResponse {
            model_name: "fil".into(),
            model_version: "1".into(),
            id: String::new(),
            parameters: HashMap::new(),
            outputs: vec![tensor("labels", "INT64"), tensor("output__0", "FP32")],
            raw_output_contents: vec![infer::encode(&[4i64, 5]), infer::encode(&[0.5f32, 0.25])],
        })
    }

    #[test]
    fn build_requires_every_input() {
        let mut request = fil_request();
        request.set_input("input__0", vec![1, 2], &[1.0f32, 2.0]).unwrap();
        let err = request.build().unwrap_err();
        assert!(err.to_string().contains("'mask' was not set"));

        request.set_input("mask", vec![1], &[true]).unwrap();
        let proto = request.build().unwrap();
        assert_eq!(proto.inputs[0].name, "input__0");
        assert_eq!(proto.inputs[1].datatype, "BOOL");
        assert_eq!(proto.raw_input_contents[1], vec![1]);
    }

    #[test]
    fn all_outputs_requested_by_default() {
        let mut request = fil_request();
        request.set_input("input__0", vec![0], &[] as &[f32]).unwrap();
        request.set_input("mask", vec![0], &[] as &[bool]).unwrap();
        assert_eq!(request.build().unwrap().outputs.len(), 2);

        request.request_output("labels").unwrap();
        request.request_output("labels").unwrap();
        let proto = request.build().unwrap();
        assert_eq!(proto.outputs.len(), 1);
        assert_eq!(proto.outputs[0].name, "labels");
    }

    #[test]
    fn set_input_checks_name_type_and_shape() {
        let mut request = fil_request();
        assert!(request.set_input("nope", vec![1], &[1.0f32]).is_err());
        assert!(request.set_input("input__0", vec![1], &[1.0f64]).is_err());
        assert!(request.set_input("input__0", vec![2, 2], &[1.0f32; 3]).is_err());
        assert!(request.set_input("input__0", vec![-1], &[1.0f32]).is_err());
        assert!(request.request_output("nope").is_err());
    }

    #[test]
    fn set_input_twice_replaces() {
        let mut request = fil_request();
        request.set_input("mask", vec![1], &[true]).unwrap();
        request.set_input("mask", vec![2], &[false, false]).unwrap();
        request.set_input("input__0", vec![1], &[0.0f32]).unwrap();
        let proto = request.build().unwrap();
        assert_eq!(proto.inputs.len(), 2);
        assert_eq!(proto.raw_input_contents[1], vec![0, 0]);
    }

    #[test]
    fn get_output_decodes_by_name() {
        let request = fil_request();
        let resp = response();
        assert_eq!(request.get_output::<f32>(&resp, "output__0").unwrap(), vec![0.5, 0.25]);
        assert_eq!(request.get_output::<i64>(&resp, "labels").unwrap(), vec![4, 5]);
        assert!(request.get_output::<i32>(&resp, "labels").is_err());
        assert!(request.get_output::<f32>(&resp, "missing").is_err());
    }

    #[test]
    fn negative_version_defers_to_server_policy() {
        let mut request = TritonRequest::new("m", -1, vec![], vec![]);
        assert_eq!(request.build().unwrap().model_version, "");

        request = TritonRequest::new("m", 0, vec![], vec![]);
        assert_eq!(request.build().unwrap().model_version, "0");
    }

    fn text_request() -> TritonRequest {
        TritonRequest::new(
            "tokenizer",
            1,
            vec![
                ("text".to_owned(), DataType::Bytes),
                ("h".to_owned(), DataType::Fp16),
            ],
            vec![("embedding".to_owned(), DataType::Bf16)],
        )
    }

    #[test]
    fn half_precision_and_bytes_inputs_can_be_set() {
        let mut request = text_request();
        request
            .set_input_bytes("text", vec![2], &[b"ab".as_slice(), b"c".as_slice()])
            .unwrap();
        // FP16 1.0 and 2.0.
        request
            .set_input_raw("h", vec![1, 2], vec![0x00, 0x3C, 0x00, 0x40])
            .unwrap();

        let proto = request.build().unwrap();
        assert_eq!(proto.inputs[0].datatype, "BYTES");
        assert_eq!(proto.raw_input_contents[0], vec![2, 0, 0, 0, b'a', b'b', 1, 0, 0, 0, b'c']);
        assert_eq!(proto.inputs[1].datatype, "FP16");
        assert_eq!(proto.raw_input_contents[1].len(), 4);
    }

    #[test]
    fn raw_and_bytes_inputs_are_checked() {
        let mut request = text_request();
        let err = request.set_input_raw("h", vec![2], vec![0; 3]).unwrap_err();
        assert!(err.to_string().contains("needs 4 bytes, got 3"));
        assert!(request.set_input_raw("h", vec![-1], vec![]).is_err());
        assert!(request.set_input_raw("nope", vec![1], vec![0, 0]).is_err());

        assert!(request.set_input_bytes("h", vec![1], &[b"x".as_slice()]).is_err());
        assert!(request.set_input_bytes("text", vec![3], &[b"x".as_slice()]).is_err());

        // BYTES lengths are carried in the data itself.
        request.set_input_raw("text", vec![1], vec![1, 0, 0, 0, b'z']).unwrap();
    }

    #[test]
    fn raw_output_is_read_for_any_type() {
        let request = text_request();
        let resp = InferResponse::new(inference::ModelInferResponse {
            model_name: "tokenizer".into(),
            model_version: "1".into(),
            id: String::new(),
            parameters: HashMap::new(),
            outputs: vec![InferOutputTensor {
                name: "embedding".into(),
                datatype: "BF16".into(),
                shape: vec![1],
                parameters: HashMap::new(),
                contents: None,
            }],
            raw_output_contents: vec![vec![0x80, 0x3F]],
        });
        assert_eq!(request.get_output_raw(&resp, "embedding").unwrap(), &[0x80, 0x3F]);
        assert!(request.get_output_raw(&resp, "text").is_err());
        assert!(request.get_output::<u16>(&resp, "embedding").is_err());
    }

    #[test]
    fn get_output_reports_missing_response_tensor() {
        let outputs = vec![("extra".to_owned(), DataType::Fp32)];
        let request = TritonRequest::new("m", 1, vec![], outputs);
        let err = request.get_output::<f32>(&response(), "extra").unwrap_err();
        assert!(matches!(err, Error::UnexpectedResponse(_)));
    }
}
