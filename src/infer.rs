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

//! Tensor data types and the builder types used to marshal inference
//! requests and responses.
//!
//! The main entry points are [`InferInput`] for describing input tensors,
//! [`InferRequestBuilder`] for assembling a complete request, and
//! [`InferResponse`] for reading outputs back. Scalar element types are tied
//! to their Triton [`DataType`] through the [`Element`] trait.
//!
//! # Example
//!
//! ```rust
//! use rapids_triton::infer::{DataType, InferInput, InferRequestBuilder};
//!
//! let input = InferInput::new("input__0", vec![1, 16], DataType::Fp32)
//!     .with_data(&[1.0_f32; 16]);
//!
//! let request = InferRequestBuilder::new("fil")
//!     .model_version("1")
//!     .request_id("req-001")
//!     .input(input)
//!     .output("output__0")
//!     .build();
//! assert_eq!(request.raw_input_contents[0].len(), 64);
//! ```

use std::collections::HashMap;

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::generated::inference;

// ---------------------------------------------------------------------------
// DataType
// ---------------------------------------------------------------------------

/// Triton tensor data types.
///
/// These map to the string representations used by the inference protocol
/// and the model metadata JSON (e.g. `"FP32"`, `"INT64"`, `"BYTES"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    Bool,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Int8,
    Int16,
    Int32,
    Int64,
    Fp16,
    Fp32,
    Fp64,
    /// Variable-length byte sequences (strings).
    Bytes,
    /// Brain floating point (16-bit).
    Bf16,
}

impl DataType {
    /// Every data type, in native enum order.
    pub const ALL: [DataType; 14] = [
        Self::Bool,
        Self::Uint8,
        Self::Uint16,
        Self::Uint32,
        Self::Uint64,
        Self::Int8,
        Self::Int16,
        Self::Int32,
        Self::Int64,
        Self::Fp16,
        Self::Fp32,
        Self::Fp64,
        Self::Bytes,
        Self::Bf16,
    ];

    /// Returns the protocol string representation of this data type.
    ///
    /// ```rust
    /// use rapids_triton::infer::DataType;
    /// assert_eq!(DataType::Fp32.as_str(), "FP32");
    /// ```
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bool => "BOOL",
            Self::Uint8 => "UINT8",
            Self::Uint16 => "UINT16",
            Self::Uint32 => "UINT32",
            Self::Uint64 => "UINT64",
            Self::Int8 => "INT8",
            Self::Int16 => "INT16",
            Self::Int32 => "INT32",
            Self::Int64 => "INT64",
            Self::Fp16 => "FP16",
            Self::Fp32 => "FP32",
            Self::Fp64 => "FP64",
            Self::Bytes => "BYTES",
            Self::Bf16 => "BF16",
        }
    }

    /// Parses a protocol data type string, returning `None` for unknown
    /// strings.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|dt| dt.as_str() == s)
    }

    /// Parses the model-configuration spelling of a data type
    /// (`"TYPE_FP32"`, `"TYPE_STRING"`, ...).
    ///
    /// ```rust
    /// use rapids_triton::infer::DataType;
    /// assert_eq!(DataType::from_config_str("TYPE_INT32"), Some(DataType::Int32));
    /// assert_eq!(DataType::from_config_str("TYPE_STRING"), Some(DataType::Bytes));
    /// ```
    #[must_use]
    pub fn from_config_str(s: &str) -> Option<Self> {
        match s.strip_prefix("TYPE_")? {
            "STRING" => Some(Self::Bytes),
            other => Self::parse(other),
        }
    }

    /// Converts a model-configuration enum value.
    #[must_use]
    pub fn from_config(dt: inference::DataType) -> Option<Self> {
        use inference::DataType as C;
        Some(match dt {
            C::TypeInvalid => return None,
            C::TypeBool => Self::Bool,
            C::TypeUint8 => Self::Uint8,
            C::TypeUint16 => Self::Uint16,
            C::TypeUint32 => Self::Uint32,
            C::TypeUint64 => Self::Uint64,
            C::TypeInt8 => Self::Int8,
            C::TypeInt16 => Self::Int16,
            C::TypeInt32 => Self::Int32,
            C::TypeInt64 => Self::Int64,
            C::TypeFp16 => Self::Fp16,
            C::TypeFp32 => Self::Fp32,
            C::TypeFp64 => Self::Fp64,
            C::TypeString => Self::Bytes,
            C::TypeBf16 => Self::Bf16,
        })
    }

    /// Size in bytes of one element, or `None` for variable-length
    /// [`DataType::Bytes`].
    #[must_use]
    pub const fn byte_size(self) -> Option<usize> {
        match self {
            Self::Bool | Self::Uint8 | Self::Int8 => Some(1),
            Self::Uint16 | Self::Int16 | Self::Fp16 | Self::Bf16 => Some(2),
            Self::Uint32 | Self::Int32 | Self::Fp32 => Some(4),
            Self::Uint64 | Self::Int64 | Self::Fp64 => Some(8),
            Self::Bytes => None,
        }
    }
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown data type string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseDataTypeError(String);

impl std::fmt::Display for ParseDataTypeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown Triton data type: {}", self.0)
    }
}

impl std::error::Error for ParseDataTypeError {}

impl std::str::FromStr for DataType {
    type Err = ParseDataTypeError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        DataType::parse(s).ok_or_else(|| ParseDataTypeError(s.to_owned()))
    }
}

// ---------------------------------------------------------------------------
// Element
// ---------------------------------------------------------------------------

/// A fixed-size scalar that can be stored in a Triton tensor.
///
/// Tensor data travels as little-endian, row-major bytes.
pub trait Element: Copy + Send + Sync + 'static {
    /// The Triton data type of this element.
    const DATA_TYPE: DataType;
    /// Size of one encoded element in bytes.
    const SIZE: usize;

    /// Appends the little-endian encoding of `self` to `out`.
    fn write_le(self, out: &mut Vec<u8>);

    /// Decodes one element from exactly [`Self::SIZE`] bytes.
    fn read_le(bytes: &[u8]) -> Self;
}

macro_rules! numeric_element {
    ($($ty:ty => $dt:ident),* $(,)?) => {
        $(
            impl Element for $ty {
                const DATA_TYPE: DataType = DataType::$dt;
                const SIZE: usize = std::mem::size_of::<$ty>();

                fn write_le(self, out: &mut Vec<u8>) {
                    out.extend_from_slice(&self.to_le_bytes());
                }

                fn read_le(bytes: &[u8]) -> Self {
                    let mut buf = [0u8; std::mem::size_of::<$ty>()];
                    buf.copy_from_slice(bytes);
                    <$ty>::from_le_bytes(buf)
                }
            }
        )*
    };
}

numeric_element! {
    u8 => Uint8,
    u16 => Uint16,
    u32 => Uint32,
    u64 => Uint64,
    i8 => Int8,
    i16 => Int16,
    i32 => Int32,
    i64 => Int64,
    f32 => Fp32,
    f64 => Fp64,
}

impl Element for bool {
    const DATA_TYPE: DataType = DataType::Bool;
    const SIZE: usize = 1;

    fn write_le(self, out: &mut Vec<u8>) {
        out.push(u8::from(self));
    }

    fn read_le(bytes: &[u8]) -> Self {
        bytes[0] != 0
    }
}

/// Encodes a slice of elements into raw tensor bytes.
#[must_use]
pub fn encode<T: Element>(data: &[T]) -> Vec<u8> {
    let mut raw = Vec::with_capacity(data.len() * T::SIZE);
    for &value in data {
        value.write_le(&mut raw);
    }
    raw
}

/// Decodes raw tensor bytes into elements.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] if the byte length is not a multiple of
/// the element size.
pub fn decode<T: Element>(raw: &[u8]) -> Result<Vec<T>> {
    if raw.len() % T::SIZE != 0 {
        return Err(Error::InvalidInput(format!(
            "{} bytes is not a multiple of the {} element size ({})",
            raw.len(),
            T::DATA_TYPE,
            T::SIZE
        )));
    }
    Ok(raw.chunks_exact(T::SIZE).map(T::read_le).collect())
}

/// Number of elements described by `shape`.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] for negative (variable) dimensions.
pub fn element_count(shape: &[i64]) -> Result<usize> {
    shape.iter().try_fold(1usize, |acc, &dim| {
        usize::try_from(dim)
            .map(|d| acc.saturating_mul(d))
            .map_err(|_| Error::InvalidInput(format!("shape {shape:?} has a negative dimension")))
    })
}

// ---------------------------------------------------------------------------
// Parameters
// ---------------------------------------------------------------------------

/// Wraps a value in the protocol's parameter message.
fn parameter(choice: inference::infer_parameter::ParameterChoice) -> inference::InferParameter {
    inference::InferParameter {
        parameter_choice: Some(choice),
    }
}

/// A value accepted as a request, input or output parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum ParameterValue {
    Bool(bool),
    Int(i64),
    Double(f64),
    String(String),
}

impl ParameterValue {
    fn into_proto(self) -> inference::InferParameter {
        use inference::infer_parameter::ParameterChoice;
        parameter(match self {
            Self::Bool(b) => ParameterChoice::BoolParam(b),
            Self::Int(i) => ParameterChoice::Int64Param(i),
            Self::Double(d) => ParameterChoice::DoubleParam(d),
            Self::String(s) => ParameterChoice::StringParam(s),
        })
    }
}

impl From<bool> for ParameterValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for ParameterValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for ParameterValue {
    fn from(value: f64) -> Self {
        Self::Double(value)
    }
}

impl From<&str> for ParameterValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<String> for ParameterValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

// ---------------------------------------------------------------------------
// InferInput
// ---------------------------------------------------------------------------

/// Describes an input tensor for an inference request.
///
/// ```rust
/// use rapids_triton::infer::{DataType, InferInput};
///
/// let input = InferInput::new("input__0", vec![2, 3], DataType::Int64)
///     .with_data(&[1_i64, 2, 3, 4, 5, 6]);
/// assert_eq!(input.data().map(<[u8]>::len), Some(48));
/// ```
#[derive(Debug, Clone)]
pub struct InferInput {
    name: String,
    shape: Vec<i64>,
    datatype: DataType,
    data: Option<Vec<u8>>,
    parameters: HashMap<String, inference::InferParameter>,
}

impl InferInput {
    /// Creates a new inference input descriptor with no data attached.
    #[must_use]
    pub fn new(name: impl Into<String>, shape: Vec<i64>, datatype: DataType) -> Self {
        Self {
            name: name.into(),
            shape,
            datatype,
            data: None,
            parameters: HashMap::new(),
        }
    }

    /// Creates an input whose data type is taken from the element type.
    #[must_use]
    pub fn from_slice<T: Element>(name: impl Into<String>, shape: Vec<i64>, data: &[T]) -> Self {
        Self::new(name, shape, T::DATA_TYPE).with_data(data)
    }

    /// Attaches typed tensor data.
    #[must_use]
    pub fn with_data<T: Element>(self, data: &[T]) -> Self {
        Self {
            data: Some(encode(data)),
            ..self
        }
    }

    /// Attaches raw little-endian bytes, e.g. for FP16 or BF16 tensors that
    /// lack a native Rust type.
    #[must_use]
    pub fn with_data_raw(self, data: Vec<u8>) -> Self {
        Self {
            data: Some(data),
            ..self
        }
    }

    /// Attaches variable-length byte sequences using the BYTES tensor
    /// encoding (each item prefixed with its 4-byte little-endian length).
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if an item is longer than `u32::MAX`.
    pub fn with_data_bytes(self, data: &[&[u8]]) -> Result<Self> {
        let mut raw = Vec::new();
        for item in data {
            let len = u32::try_from(item.len()).map_err(|_| {
                Error::InvalidInput(format!("byte element of {} bytes is too long", item.len()))
            })?;
            raw.extend_from_slice(&len.to_le_bytes());
            raw.extend_from_slice(item);
        }
        Ok(Self {
            data: Some(raw),
            ..self
        })
    }

    /// Adds a parameter to this input tensor.
    #[must_use]
    pub fn with_parameter(
        mut self,
        key: impl Into<String>,
        value: impl Into<ParameterValue>,
    ) -> Self {
        self.parameters.insert(key.into(), value.into().into_proto());
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn shape(&self) -> &[i64] {
        &self.shape
    }

    #[must_use]
    pub fn datatype(&self) -> DataType {
        self.datatype
    }

    /// Returns the attached raw bytes, if any.
    #[must_use]
    pub fn data(&self) -> Option<&[u8]> {
        self.data.as_deref()
    }

    /// Converts this input into the protobuf tensor and optional raw bytes.
    pub(crate) fn into_proto(
        self,
    ) -> (
        inference::model_infer_request::InferInputTensor,
        Option<Vec<u8>>,
    ) {
        let tensor = inference::model_infer_request::InferInputTensor {
            name: self.name,
            datatype: self.datatype.as_str().to_owned(),
            shape: self.shape,
            parameters: self.parameters,
            // Data always travels in raw_input_contents.
            contents: None,
        };
        (tensor, self.data)
    }
}

// ---------------------------------------------------------------------------
// InferRequestedOutput
// ---------------------------------------------------------------------------

/// Describes a requested output tensor.
///
/// When a request names no outputs, the server returns every output in the
/// model configuration.
#[derive(Debug, Clone)]
pub struct InferRequestedOutput {
    name: String,
    parameters: HashMap<String, inference::InferParameter>,
}

impl InferRequestedOutput {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parameters: HashMap::new(),
        }
    }

    /// Adds a parameter to this output request (e.g. `classification`).
    #[must_use]
    pub fn with_parameter(
        mut self,
        key: impl Into<String>,
        value: impl Into<ParameterValue>,
    ) -> Self {
        self.parameters.insert(key.into(), value.into().into_proto());
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn into_proto(self) -> inference::model_infer_request::InferRequestedOutputTensor {
        inference::model_infer_request::InferRequestedOutputTensor {
            name: self.name,
            parameters: self.parameters,
        }
    }
}

// ---------------------------------------------------------------------------
// InferRequestBuilder
// ---------------------------------------------------------------------------

/// Builder for [`inference::ModelInferRequest`] messages.
#[derive(Debug, Clone)]
pub struct InferRequestBuilder {
    model_name: String,
    model_version: String,
    request_id: String,
    inputs: Vec<InferInput>,
    outputs: Vec<InferRequestedOutput>,
    parameters: HashMap<String, inference::InferParameter>,
}

impl InferRequestBuilder {
    /// Creates a new builder targeting the specified model.
    #[must_use]
    pub fn new(model_name: impl Into<String>) -> Self {
        Self {
            model_name: model_name.into(),
            model_version: String::new(),
            request_id: String::new(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            parameters: HashMap::new(),
        }
    }

    /// Sets the model version. Left empty, the server applies its version
    /// policy.
    #[must_use]
    pub fn model_version(self, version: impl Into<String>) -> Self {
        Self {
            model_version: version.into(),
            ..self
        }
    }

    /// Sets a request identifier that the server echoes in the response.
    #[must_use]
    pub fn request_id(self, id: impl Into<String>) -> Self {
        Self {
            request_id: id.into(),
            ..self
        }
    }

    #[must_use]
    pub fn input(mut self, input: InferInput) -> Self {
        self.inputs.push(input);
        self
    }

    #[must_use]
    pub fn inputs(mut self, inputs: impl IntoIterator<Item = InferInput>) -> Self {
        self.inputs.extend(inputs);
        self
    }

    /// Requests an output by name, with no parameters.
    #[must_use]
    pub fn output(mut self, name: impl Into<String>) -> Self {
        self.outputs.push(InferRequestedOutput::new(name));
        self
    }

    /// Adds a fully-configured requested output.
    #[must_use]
    pub fn output_with(mut self, output: InferRequestedOutput) -> Self {
        self.outputs.push(output);
        self
    }

    /// Adds a request-level parameter.
    #[must_use]
    pub fn parameter(mut self, key: impl Into<String>, value: impl Into<ParameterValue>) -> Self {
        self.parameters.insert(key.into(), value.into().into_proto());
        self
    }

    /// Consumes the builder and produces the protobuf request.
    ///
    /// Input data is placed in `raw_input_contents`, one entry per input in
    /// the order the inputs were added.
    #[must_use]
    pub fn build(self) -> inference::ModelInferRequest {
        let (inputs, raw_input_contents): (Vec<_>, Vec<_>) = self
            .inputs
            .into_iter()
            .map(|input| {
                let (tensor, raw) = input.into_proto();
                (tensor, raw.unwrap_or_default())
            })
            .unzip();

        inference::ModelInferRequest {
            model_name: self.model_name,
            model_version: self.model_version,
            id: self.request_id,
            parameters: self.parameters,
            inputs,
            outputs: self
                .outputs
                .into_iter()
                .map(InferRequestedOutput::into_proto)
                .collect(),
            raw_input_contents,
        }
    }
}

// ---------------------------------------------------------------------------
// InferResponse
// ---------------------------------------------------------------------------

/// Ergonomic wrapper around the raw protobuf inference response.
#[derive(Debug, Clone)]
pub struct InferResponse {
    inner: inference::ModelInferResponse,
}

impl InferResponse {
    #[must_use]
    pub fn new(inner: inference::ModelInferResponse) -> Self {
        Self { inner }
    }

    #[must_use]
    pub fn model_name(&self) -> &str {
        &self.inner.model_name
    }

    #[must_use]
    pub fn model_version(&self) -> &str {
        &self.inner.model_version
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.inner.id
    }

    #[must_use]
    pub fn outputs(&self) -> &[inference::model_infer_response::InferOutputTensor] {
        &self.inner.outputs
    }

    /// Returns the index of the named output tensor.
    #[must_use]
    pub fn output_index(&self, name: &str) -> Option<usize> {
        self.inner.outputs.iter().position(|o| o.name == name)
    }

    /// Returns the raw bytes of the output at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the index is out of bounds.
    pub fn output_raw(&self, index: usize) -> Result<&[u8]> {
        self.inner
            .raw_output_contents
            .get(index)
            .map(Vec::as_slice)
            .ok_or_else(|| Error::InvalidInput(format!("output index {index} out of bounds")))
    }

    /// Decodes the output at `index` as elements of type `T`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the index is out of bounds or the
    /// byte length does not fit the element size.
    pub fn output_as<T: Element>(&self, index: usize) -> Result<Vec<T>> {
        decode(self.output_raw(index)?)
    }

    /// Splits the response into named output tensors.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnexpectedResponse`] if an output has no raw
    /// contents or an unknown data type.
    pub fn into_tensors(self) -> Result<HashMap<String, OutputTensor>> {
        let inference::ModelInferResponse {
            outputs,
            raw_output_contents,
            ..
        } = self.inner;
        if raw_output_contents.len() < outputs.len() {
            return Err(Error::UnexpectedResponse(format!(
                "{} outputs but only {} raw output buffers",
                outputs.len(),
                raw_output_contents.len()
            )));
        }
        outputs
            .into_iter()
            .zip(raw_output_contents)
            .map(|(tensor, data)| {
                let datatype = DataType::parse(&tensor.datatype).ok_or_else(|| {
                    Error::UnexpectedResponse(format!(
                        "output '{}' has unknown data type '{}'",
                        tensor.name, tensor.datatype
                    ))
                })?;
                Ok((
                    tensor.name.clone(),
                    OutputTensor {
                        name: tensor.name,
                        datatype,
                        shape: tensor.shape,
                        data,
                    },
                ))
            })
            .collect()
    }

    #[must_use]
    pub fn into_inner(self) -> inference::ModelInferResponse {
        self.inner
    }
}

/// A single output tensor detached from its response.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputTensor {
    pub name: String,
    pub datatype: DataType,
    pub shape: Vec<i64>,
    pub data: Vec<u8>,
}

impl OutputTensor {
    /// Decodes the tensor data as elements of type `T`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if `T` does not match the tensor's data
    /// type or the byte length does not fit the element size.
    pub fn to_vec<T: Element>(&self) -> Result<Vec<T>> {
        if T::DATA_TYPE != self.datatype {
            return Err(Error::InvalidInput(format!(
                "output '{}' is {}, not {}",
                self.name, self.datatype, T::DATA_TYPE
            )));
        }
        decode(&self.data)
    }
}

// ---------------------------------------------------------------------------
// Metadata
// ---------------------------------------------------------------------------

/// Metadata about the Triton Inference Server.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerMetadata {
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub extensions: Vec<String>,
}

/// Metadata about a model, as reported by the gRPC endpoint or serialized
/// to JSON by the in-process server.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ModelMetadata {
    pub name: String,
    #[serde(default)]
    pub versions: Vec<String>,
    #[serde(default)]
    pub platform: String,
    #[serde(default)]
    pub inputs: Vec<TensorMetadata>,
    #[serde(default)]
    pub outputs: Vec<TensorMetadata>,
}

/// Metadata for a single tensor (input or output).
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TensorMetadata {
    pub name: String,
    /// Protocol data type string (e.g. `"FP32"`).
    pub datatype: String,
    /// Variable-size dimensions are `-1`.
    #[serde(default)]
    pub shape: Vec<i64>,
}

impl From<inference::ModelMetadataResponse> for ModelMetadata {
    fn from(md: inference::ModelMetadataResponse) -> Self {
        let tensor = |t: inference::model_metadata_response::TensorMetadata| TensorMetadata {
            name: t.name,
            datatype: t.datatype,
            shape: t.shape,
        };
        Self {
            name: md.name,
            versions: md.versions,
            platform: md.platform,
            inputs: md.inputs.into_iter().map(tensor).collect(),
            outputs: md.outputs.into_iter().map(tensor).collect(),
        }
    }
}
