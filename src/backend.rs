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

//! Entry points for writing a Triton backend in Rust.
//!
//! A backend supplies a [`ModelState`] type. [`model_initialize`] and
//! [`model_finalize`] drive its lifecycle against any [`ModelHandle`]; with
//! the `native` feature, [`declare_backend!`](crate::declare_backend) exports
//! the `TRITONBACKEND_ModelInitialize` / `TRITONBACKEND_ModelFinalize`
//! symbols the server looks up, translating every error (and panic) into a
//! `TRITONSERVER_Error`.
//!
//! [`SharedModelState`] reads the model configuration shared by all
//! instances of a model, including the string-typed `parameters` block.

use std::any::Any;
use std::str::FromStr;

use serde_json::Value;

use crate::error::{Error, ErrorCode, Result};

/// Boxed model state stored on the server side.
pub type StateBox = Box<dyn Any + Send>;

/// The model object handed to a backend by the server.
pub trait ModelHandle {
    fn name(&self) -> Result<String>;

    fn version(&self) -> Result<u64>;

    /// The model configuration serialized as JSON.
    fn config_json(&self) -> Result<String>;

    /// Attaches backend state to the model, replacing any previous state.
    ///
    /// # Arguments
    ///
    /// * `state` - The state to attach. On failure it is handed back with the
    ///   error so the caller can release it.
    fn set_state(&self, state: StateBox) -> std::result::Result<(), (Error, StateBox)>;

    /// Detaches and returns the backend state, if any.
    fn take_state(&self) -> Result<Option<StateBox>>;
}

/// Per-model state owned by a backend.
pub trait ModelState: Sized + Send + 'static {
    /// Builds the state for a model that is being initialized.
    fn new(model: &dyn ModelHandle) -> Result<Self>;

    /// Loads whatever the model needs before serving (weights, files, ...).
    fn load(&mut self) -> Result<()>;

    /// Releases resources before the state is dropped.
    fn unload(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Creates, loads and attaches the state of a newly loaded model.
///
/// # Errors
///
/// Returns the first error from reading the model, constructing or loading
/// the state, or attaching it. A loaded state the model refuses is unloaded
/// before the error is returned.
pub fn model_initialize<S: ModelState>(model: &dyn ModelHandle) -> Result<()> {
    let name = model.name()?;
    let version = model.version()?;
    tracing::info!("TRITONBACKEND_ModelInitialize: {name} (version {version})");

    let mut state = S::new(model)?;
    state.load()?;
    let Err((error, rejected)) = model.set_state(Box::new(state)) else {
        return Ok(());
    };
    if let Ok(mut state) = rejected.downcast::<S>() {
        if let Err(e) = state.unload() {
            tracing::warn!(error = %e, "failed to unload rejected model state");
        }
    }
    Err(error)
}

/// Detaches, unloads and drops the state of a model being unloaded.
///
/// A model without state is left alone.
///
/// # Errors
///
/// Returns [`Error::Triton`] with code `Internal` if the attached state is
/// not an `S`, or the error returned by [`ModelState::unload`].
pub fn model_finalize<S: ModelState>(model: &dyn ModelHandle) -> Result<()> {
    let Some(state) = model.take_state()? else {
        return Ok(());
    };
    let mut state = state
        .downcast::<S>()
        .map_err(|_| Error::triton(ErrorCode::Internal, "model state has an unexpected type"))?;
    tracing::info!("TRITONBACKEND_ModelFinalize: delete model state");
    state.unload()
}

// ---------------------------------------------------------------------------
// SharedModelState
// ---------------------------------------------------------------------------

/// A value that can be read from a string-typed model configuration
/// parameter.
pub trait ConfigParam: Sized {
    /// Parses `value`, the `string_value` of parameter `name`.
    fn parse_param(name: &str, value: &str) -> Result<Self>;
}

impl ConfigParam for bool {
    fn parse_param(name: &str, value: &str) -> Result<Self> {
        match value {
            "true" => Ok(true),
            "false" => Ok(false),
            _ => Err(Error::triton(
                ErrorCode::InvalidArg,
                format!("Expected 'true' or 'false' for parameter '{name}', got: '{value}'"),
            )),
        }
    }
}

impl ConfigParam for String {
    fn parse_param(_: &str, value: &str) -> Result<Self> {
        Ok(value.to_owned())
    }
}

macro_rules! parsed_param {
    ($($ty:ty),*) => {
        $(
            impl ConfigParam for $ty {
                fn parse_param(name: &str, value: &str) -> Result<Self> {
                    parse_with_from_str(name, value)
                }
            }
        )*
    };
}

parsed_param!(i32, i64, u32, u64, usize, f32, f64);

fn parse_with_from_str<T>(name: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e| {
        Error::triton(
            ErrorCode::InvalidArg,
            format!(
                "Bad value for parameter '{name}' (expected {}): '{value}': {e}",
                std::any::type_name::<T>()
            ),
        )
    })
}

/// Model configuration shared by every instance of a model.
#[derive(Debug, Clone)]
pub struct SharedModelState {
    config: Value,
}

impl SharedModelState {
    /// Wraps an already-parsed configuration object.
    #[must_use]
    pub fn new(config: Value) -> Self {
        Self { config }
    }

    /// Parses a configuration serialized as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`] if `json` is not valid JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(Self::new(serde_json::from_str(json)?))
    }

    /// Reads the configuration of a model handed to the backend.
    ///
    /// # Errors
    ///
    /// Propagates errors from the model or the JSON parser.
    pub fn from_model(model: &dyn ModelHandle) -> Result<Self> {
        Self::from_json(&model.config_json()?)
    }

    #[must_use]
    pub fn config(&self) -> &Value {
        &self.config
    }

    /// The configured `max_batch_size`, zero when absent.
    #[must_use]
    pub fn max_batch_size(&self) -> u64 {
        self.config
            .get("max_batch_size")
            .and_then(Value::as_u64)
            .unwrap_or(0)
    }

    /// Names of the outputs declared in the configuration, in order.
    #[must_use]
    pub fn output_names(&self) -> Vec<&str> {
        self.config
            .get("output")
            .and_then(Value::as_array)
            .map(|outputs| {
                outputs
                    .iter()
                    .filter_map(|o| o.get("name").and_then(Value::as_str))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Checks that `name` is a declared output.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Triton`] with code `NotFound` otherwise.
    pub fn check_output_name(&self, name: &str) -> Result<()> {
        if self.output_names().contains(&name) {
            Ok(())
        } else {
            Err(Error::triton(
                ErrorCode::NotFound,
                format!("Unknown output name '{name}' in model configuration"),
            ))
        }
    }

    fn raw_param(&self, name: &str) -> Option<&str> {
        self.config
            .get("parameters")?
            .get(name)?
            .get("string_value")?
            .as_str()
    }

    /// Reads and parses a configuration parameter.
    ///
    /// ```rust
    /// use rapids_triton::backend::SharedModelState;
    ///
    /// let state = SharedModelState::from_json(
    ///     r#"{"parameters": {"threshold": {"string_value": "0.5"}}}"#,
    /// )?;
    /// assert_eq!(state.get_config_param::<f32>("threshold")?, 0.5);
    /// # Ok::<(), rapids_triton::error::Error>(())
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`Error::Triton`] with code `NotFound` if the parameter is
    /// missing, or `InvalidArg` if it does not parse.
    pub fn get_config_param<T: ConfigParam>(&self, name: &str) -> Result<T> {
        let value = self.raw_param(name).ok_or_else(|| {
            Error::triton(
                ErrorCode::NotFound,
                format!("Parameter '{name}' not found in model configuration"),
            )
        })?;
        T::parse_param(name, value)
    }

    /// Like [`get_config_param`](Self::get_config_param) but returns
    /// `default` when the parameter is missing.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Triton`] with code `InvalidArg` if a present value
    /// does not parse.
    pub fn get_config_param_or<T: ConfigParam>(&self, name: &str, default: T) -> Result<T> {
        match self.raw_param(name) {
            Some(value) => T::parse_param(name, value),
            None => Ok(default),
        }
    }
}

// ---------------------------------------------------------------------------
// Native entry points
// ---------------------------------------------------------------------------

#[cfg(feature = "native")]
pub use native::{model_finalize_raw, model_initialize_raw, BackendModel};

#[cfg(feature = "native")]
mod native {
    use std::ffi::CStr;
    use std::os::raw::{c_char, c_void};
    use std::panic::{self, AssertUnwindSafe};
    use std::ptr;

    use super::{model_finalize, model_initialize, ModelHandle, ModelState, StateBox};
    use crate::error::{Error, ErrorCode, Result};
    use crate::ffi;

    /// A `TRITONBACKEND_Model` borrowed for the duration of a backend call.
    #[derive(Debug)]
    pub struct BackendModel {
        raw: *mut ffi::TRITONBACKEND_Model,
    }

    impl BackendModel {
        /// # Safety
        ///
        /// `raw` must be a model pointer passed in by the server and stay
        /// valid while the returned value is used.
        #[must_use]
        pub unsafe fn from_raw(raw: *mut ffi::TRITONBACKEND_Model) -> Self {
            Self { raw }
        }
    }

    impl ModelHandle for BackendModel {
        fn name(&self) -> Result<String> {
            let mut name: *const c_char = ptr::null();
            // SAFETY: self.raw is valid per from_raw; the server owns the string.
            unsafe {
                ffi::check(ffi::TRITONBACKEND_ModelName(self.raw, &mut name))?;
                if name.is_null() {
                    return Err(Error::triton(ErrorCode::Internal, "model has no name"));
                }
                Ok(CStr::from_ptr(name).to_string_lossy().into_owned())
            }
        }

        fn version(&self) -> Result<u64> {
            let mut version = 0;
            // SAFETY: self.raw is valid per from_raw.
            unsafe { ffi::check(ffi::TRITONBACKEND_ModelVersion(self.raw, &mut version))? };
            Ok(version)
        }

        fn config_json(&self) -> Result<String> {
            let mut message = ptr::null_mut();
            // SAFETY: self.raw is valid; the message is consumed below.
            unsafe {
                ffi::check(ffi::TRITONBACKEND_ModelConfig(
                    self.raw,
                    ffi::MODEL_CONFIG_VERSION,
                    &mut message,
                ))?;
                ffi::take_message_json(message)
            }
        }

        fn set_state(&self, state: StateBox) -> std::result::Result<(), (Error, StateBox)> {
            // Any state already attached would leak.
            match self.take_state() {
                Ok(previous) => drop(previous),
                Err(e) => return Err((e, state)),
            }
            let raw_state = Box::into_raw(Box::new(state)).cast::<c_void>();
            // SAFETY: self.raw is valid; ownership of raw_state moves to the
            // model until take_state reclaims it.
            let result =
                unsafe { ffi::check(ffi::TRITONBACKEND_ModelSetState(self.raw, raw_state)) };
            result.map_err(|e| {
                // SAFETY: the server did not accept the pointer; reclaim it.
                let state = unsafe { Box::from_raw(raw_state.cast::<StateBox>()) };
                (e, *state)
            })
        }

        fn take_state(&self) -> Result<Option<StateBox>> {
            let mut raw_state: *mut c_void = ptr::null_mut();
            // SAFETY: self.raw is valid per from_raw.
            unsafe { ffi::check(ffi::TRITONBACKEND_ModelState(self.raw, &mut raw_state))? };
            if raw_state.is_null() {
                return Ok(None);
            }
            // Detach first so a failure leaves the model owning its state.
            // SAFETY: self.raw is valid per from_raw.
            unsafe { ffi::check(ffi::TRITONBACKEND_ModelSetState(self.raw, ptr::null_mut()))? };
            // SAFETY: only set_state stores state, always as Box<StateBox>, and
            // the model no longer refers to it.
            let state = unsafe { Box::from_raw(raw_state.cast::<StateBox>()) };
            Ok(Some(*state))
        }
    }

    fn to_raw_error(result: std::thread::Result<Result<()>>) -> *mut ffi::TRITONSERVER_Error {
        match result {
            Ok(Ok(())) => ptr::null_mut(),
            Ok(Err(e)) => {
                tracing::error!(error = %e, "backend call failed");
                ffi::into_raw_error(&e)
            }
            Err(_) => ffi::into_raw_error(&Error::triton(ErrorCode::Internal, "backend panicked")),
        }
    }

    /// Runs [`model_initialize`] for `S` and converts the outcome for the
    /// server.
    ///
    /// # Safety
    ///
    /// `model` must be the pointer the server passed to
    /// `TRITONBACKEND_ModelInitialize`.
    pub unsafe fn model_initialize_raw<S: ModelState>(
        model: *mut ffi::TRITONBACKEND_Model,
    ) -> *mut ffi::TRITONSERVER_Error {
        let model = BackendModel::from_raw(model);
        to_raw_error(panic::catch_unwind(AssertUnwindSafe(|| {
            model_initialize::<S>(&model)
        })))
    }

    /// Runs [`model_finalize`] for `S` and converts the outcome for the
    /// server.
    ///
    /// # Safety
    ///
    /// `model` must be the pointer the server passed to
    /// `TRITONBACKEND_ModelFinalize`.
    pub unsafe fn model_finalize_raw<S: ModelState>(
        model: *mut ffi::TRITONBACKEND_Model,
    ) -> *mut ffi::TRITONSERVER_Error {
        let model = BackendModel::from_raw(model);
        to_raw_error(panic::catch_unwind(AssertUnwindSafe(|| {
            model_finalize::<S>(&model)
        })))
    }
}

/// Exports `TRITONBACKEND_ModelInitialize` and `TRITONBACKEND_ModelFinalize`
/// for a [`ModelState`] type.
///
/// ```rust,ignore
/// struct ForestState { /* ... */ }
/// impl rapids_triton::backend::ModelState for ForestState { /* ... */ }
///
/// rapids_triton::declare_backend!(ForestState);
/// ```
#[cfg(feature = "native")]
#[macro_export]
macro_rules! declare_backend {
    ($state:ty) => {
        /// # Safety
        ///
        /// Called by the Triton server with a valid model pointer.
        #[no_mangle]
        pub unsafe extern "C" fn TRITONBACKEND_ModelInitialize(
            model: *mut $crate::ffi::TRITONBACKEND_Model,
        ) -> *mut $crate::ffi::TRITONSERVER_Error {
            $crate::backend::model_initialize_raw::<$state>(model)
        }

        /// # Safety
        ///
        /// Called by the Triton server with a valid model pointer.
        #[no_mangle]
        pub unsafe extern "C" fn TRITONBACKEND_ModelFinalize(
            model: *mut $crate::ffi::TRITONBACKEND_Model,
        ) -> *mut $crate::ffi::TRITONSERVER_Error {
            $crate::backend::model_finalize_raw::<$state>(model)
        }
    };
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use serde_json::json;

    use super::*;

    fn config_with_param(key: &str, value: &str) -> SharedModelState {
        SharedModelState::new(json!({
            "max_batch_size": 1,
            "output": [],
            "parameters": { key: { "string_value": value } },
        }))
    }

    fn parse_some_bool(value: &str) -> Result<bool> {
        config_with_param("some_bool", value).get_config_param::<bool>("some_bool")
    }

    #[test]
    fn bool_param() {
        assert!(parse_some_bool("true").unwrap());
        assert!(!parse_some_bool("false").unwrap());

        let err = parse_some_bool("True").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Expected 'true' or 'false' for parameter 'some_bool', got: 'True'"
        );
        assert_eq!(err.code(), ErrorCode::InvalidArg);
    }

    #[test]
    fn numeric_and_string_params() {
        let state = config_with_param("threads", " 8 ");
        assert_eq!(state.get_config_param::<usize>("threads").unwrap(), 8);
        assert_eq!(state.get_config_param::<String>("threads").unwrap(), " 8 ");
        assert!(config_with_param("x", "eight").get_config_param::<i32>("x").is_err());
        assert_eq!(
            config_with_param("x", "1e-3").get_config_param::<f64>("x").unwrap(),
            1e-3
        );
    }

    #[test]
    fn missing_param_is_not_found_unless_defaulted() {
        let state = config_with_param("a", "1");
        let err = state.get_config_param::<i64>("b").unwrap_err();
        assert_eq!(err.code(), ErrorCode::NotFound);
        assert_eq!(state.get_config_param_or("b", 42i64).unwrap(), 42);
        assert_eq!(state.get_config_param_or("a", 42i64).unwrap(), 1);
        assert!(state.get_config_param_or("a", false).is_err());
    }

    #[test]
    fn config_without_parameters_block() {
        let state = SharedModelState::from_json(r#"{"name": "fil"}"#).unwrap();
        assert_eq!(state.max_batch_size(), 0);
        assert!(state.output_names().is_empty());
        assert!(state.get_config_param::<bool>("x").is_err());
    }

    #[test]
    fn output_names_and_batch_size() {
        let state = SharedModelState::new(json!({
            "max_batch_size": 32768,
            "output": [{"name": "output__0", "data_type": "TYPE_FP32", "dims": [2]}],
        }));
        assert_eq!(state.max_batch_size(), 32768);
        assert_eq!(state.output_names(), vec!["output__0"]);
        assert!(state.check_output_name("output__0").is_ok());
        assert_eq!(
            state.check_output_name("other").unwrap_err().code(),
            ErrorCode::NotFound
        );
    }

    // -- Lifecycle ---------------------------------------------------------

    struct MockModel {
        config: String,
        state: RefCell<Option<StateBox>>,
        refuse_state: bool,
    }

    impl MockModel {
        fn new(config: &str) -> Self {
            Self {
                config: config.to_owned(),
                state: RefCell::new(None),
                refuse_state: false,
            }
        }
    }

    impl ModelHandle for MockModel {
        fn name(&self) -> Result<String> {
            Ok("fil".into())
        }

        fn version(&self) -> Result<u64> {
            Ok(1)
        }

        fn config_json(&self) -> Result<String> {
            Ok(self.config.clone())
        }

        fn set_state(&self, state: StateBox) -> std::result::Result<(), (Error, StateBox)> {
            if self.refuse_state {
                return Err((Error::triton(ErrorCode::Internal, "state rejected"), state));
            }
            *self.state.borrow_mut() = Some(state);
            Ok(())
        }

        fn take_state(&self) -> Result<Option<StateBox>> {
            Ok(self.state.borrow_mut().take())
        }
    }

    static UNLOADS: AtomicUsize = AtomicUsize::new(0);

    struct ForestState {
        shared: SharedModelState,
        loaded: bool,
    }

    impl ModelState for ForestState {
        fn new(model: &dyn ModelHandle) -> Result<Self> {
            Ok(Self {
                shared: SharedModelState::from_model(model)?,
                loaded: false,
            })
        }

        fn load(&mut self) -> Result<()> {
            if self.shared.get_config_param_or("fail_load", false)? {
                return Err(Error::triton(ErrorCode::Unavailable, "model file missing"));
            }
            self.loaded = true;
            Ok(())
        }

        fn unload(&mut self) -> Result<()> {
            UNLOADS.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[test]
    fn initialize_attaches_loaded_state() {
        let model = MockModel::new(r#"{"max_batch_size": 4}"#);
        model_initialize::<ForestState>(&model).unwrap();

        let state = model.take_state().unwrap().unwrap();
        let state = state.downcast::<ForestState>().unwrap();
        assert!(state.loaded);
        assert_eq!(state.shared.max_batch_size(), 4);
    }

    #[test]
    fn initialize_propagates_load_errors() {
        let model = MockModel::new(
            r#"{"parameters": {"fail_load": {"string_value": "true"}}}"#,
        );
        let err = model_initialize::<ForestState>(&model).unwrap_err();
        assert_eq!(err.code(), ErrorCode::Unavailable);
        assert!(model.state.borrow().is_none());
    }

    #[test]
    fn initialize_unloads_state_the_model_refuses() {
        let model = MockModel {
            refuse_state: true,
            ..MockModel::new("{}")
        };
        let before = UNLOADS.load(Ordering::SeqCst);
        let err = model_initialize::<ForestState>(&model).unwrap_err();
        assert_eq!(err.code(), ErrorCode::Internal);
        assert!(UNLOADS.load(Ordering::SeqCst) > before);
        assert!(model.state.borrow().is_none());
    }

    #[test]
    fn initialize_propagates_bad_config() {
        let model = MockModel::new("not json");
        assert!(matches!(
            model_initialize::<ForestState>(&model),
            Err(Error::Json(_))
        ));
    }

    #[test]
    fn finalize_unloads_and_detaches() {
        let model = MockModel::new("{}");
        model_initialize::<ForestState>(&model).unwrap();
        let before = UNLOADS.load(Ordering::SeqCst);
        model_finalize::<ForestState>(&model).unwrap();
        assert!(UNLOADS.load(Ordering::SeqCst) > before);
        assert!(model.state.borrow().is_none());

        // Nothing attached any more.
        model_finalize::<ForestState>(&model).unwrap();
    }

    #[test]
    fn finalize_rejects_foreign_state() {
        let model = MockModel::new("{}");
        assert!(model.set_state(Box::new(17u32)).is_ok());
        let err = model_finalize::<ForestState>(&model).unwrap_err();
        assert_eq!(err.code(), ErrorCode::Internal);
    }
}
