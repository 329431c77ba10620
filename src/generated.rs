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

//! Protobuf and gRPC bindings for the Triton inference protocol.
//!
//! Generated at build time by `tonic-build` from `proto/grpc_service.proto`
//! and `proto/model_config.proto`. The vendored files declare only the
//! messages and RPCs this crate uses; field numbers match upstream, so
//! fields missing from the subset are skipped when decoding.

/// Messages, client and server stubs of `inference.GRPCInferenceService`.
pub mod inference {
    #![allow(clippy::all, missing_docs)]
    tonic::include_proto!("inference");
}

#[cfg(test)]
mod tests {
    use super::inference;
    use prost::Message;

    #[test]
    fn model_config_subset_skips_unknown_fields() {
        // A full config carries fields (e.g. instance_group, tag 7) that the
        // subset does not declare.
        #[derive(Clone, PartialEq, ::prost::Message)]
        struct WithInstanceGroup {
            #[prost(string, tag = "1")]
            name: String,
            #[prost(int32, tag = "4")]
            max_batch_size: i32,
            #[prost(string, tag = "7")]
            instance_group: String,
        }

        let bytes = WithInstanceGroup {
            name: "fil".into(),
            max_batch_size: 8,
            instance_group: "KIND_GPU".into(),
        }
        .encode_to_vec();

        let config = inference::ModelConfig::decode(bytes.as_slice()).unwrap();
        assert_eq!(config.name, "fil");
        assert_eq!(config.max_batch_size, 8);
    }

    #[test]
    fn config_data_type_tag_values() {
        assert_eq!(inference::DataType::TypeFp32 as i32, 11);
        assert_eq!(inference::DataType::TypeString as i32, 13);
        assert_eq!(
            inference::DataType::try_from(9).ok(),
            Some(inference::DataType::TypeInt64)
        );
    }
}
