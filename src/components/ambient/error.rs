//! Failures while acquiring host resources.
//!
//! Only start-up can fail: once a surface and a frame loop are in hand, every
//! numeric input is clamped rather than rejected.

use thiserror::Error;
use wasm_bindgen::JsValue;

/// Reasons the ambient engine could not be started.
#[derive(Debug, Error)]
pub enum EngineError {
	#[error("no global window available")]
	NoWindow,
	#[error("window has no document")]
	NoDocument,
	#[error("no element with id `{0}`")]
	SurfaceMissing(String),
	#[error("element `{0}` is not a canvas")]
	NotACanvas(String),
	#[error("canvas did not provide a 2d rendering context")]
	ContextUnavailable,
	#[error("host call failed: {0}")]
	Host(String),
}

impl From<JsValue> for EngineError {
	fn from(value: JsValue) -> Self {
		EngineError::Host(value.as_string().unwrap_or_else(|| format!("{value:?}")))
	}
}

impl From<EngineError> for JsValue {
	fn from(err: EngineError) -> Self {
		JsValue::from_str(&err.to_string())
	}
}
