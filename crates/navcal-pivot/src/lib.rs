#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

mod calibrator;
pub use calibrator::{
    tool_length, CalibrationError, CalibrationParams, PivotCalibration, SpinCalibration,
    ToolCalibrator,
};

mod pivot;
mod spin;
