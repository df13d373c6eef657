use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use navcal_3d::ops::relative_transform;
use navcal_3d::transforms::rotation_angle_deg;
use navcal_3d::RigidTransform;

use crate::pivot::solve_pivot;
use crate::spin::solve_spin;

/// Error types for tool calibration.
#[derive(Debug, Error)]
pub enum CalibrationError {
    /// Only one sampling window may be active per tool.
    #[error("a sampling window is already active")]
    SamplingInProgress,

    /// No sampling window has been started.
    #[error("no sampling window is active")]
    NotSampling,

    /// The sampling deadline has passed; compute the calibration or start
    /// a new window.
    #[error("the sampling window has expired")]
    WindowExpired,

    /// Too few pose samples were collected during the window.
    #[error("tool calibration requires at least {required} pose samples, got {actual}")]
    InsufficientSamples {
        /// Minimum number of samples required.
        required: usize,
        /// Actual number of samples collected.
        actual: usize,
    },

    /// The sampled poses do not vary enough in orientation to constrain
    /// the solve.
    #[error("pose samples span {span_deg:.1} deg of orientation, need at least {required_deg:.1} deg")]
    InsufficientRotation {
        /// Measured orientation span across the samples, degrees.
        span_deg: f64,
        /// Required orientation span, degrees.
        required_deg: f64,
    },

    /// The least-squares system is numerically rank-deficient (e.g. the
    /// motion never left a single rotation axis during a pivot run).
    #[error("calibration system is ill-conditioned (singular value ratio {ratio:.3e})")]
    IllConditioned {
        /// Ratio of the smallest to the largest singular value.
        ratio: f64,
    },

    /// The solve succeeded but its residual is too large to accept.
    #[error("calibration error {rmse_mm:.2} mm exceeds threshold {threshold_mm:.2} mm")]
    ThresholdExceeded {
        /// Measured RMS residual, mm.
        rmse_mm: f64,
        /// Configured acceptance threshold, mm.
        threshold_mm: f64,
    },

    /// Singular value decomposition failed.
    #[error("SVD computation failed: {0}")]
    SvdFailed(String),
}

/// Parameters controlling sample and result acceptance.
#[derive(Debug, Clone)]
pub struct CalibrationParams {
    /// Minimum number of pose samples for a solve.
    pub min_samples: usize,
    /// RMS error at or above which a successful solve is rejected, mm.
    pub error_threshold_mm: f64,
    /// Minimum orientation spread across the samples, degrees.
    pub min_orientation_span_deg: f64,
}

impl Default for CalibrationParams {
    fn default() -> Self {
        Self {
            min_samples: 10,
            error_threshold_mm: 0.9,
            min_orientation_span_deg: 15.0,
        }
    }
}

/// Result of a pivot calibration run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PivotCalibration {
    /// Tip offset in the tool frame (identity rotation).
    pub tip_to_tool: RigidTransform,
    /// The fixed pivot point expressed in the reference frame.
    pub pivot_in_reference: [f64; 3],
    /// RMS distance of the reconstructed tip from the pivot point, mm.
    pub rmse: f64,
    /// Number of pose samples the solve consumed.
    pub samples_used: usize,
}

/// Result of a spin calibration run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpinCalibration {
    /// Rotation aligning the canonical shaft axis with the measured spin
    /// axis (zero translation; compose with a pivot result for the full
    /// tip transform).
    pub tip_to_tool: RigidTransform,
    /// The common rotation axis expressed in the tool frame, unit length.
    pub spin_axis_in_tool: [f64; 3],
    /// RMS axis-consistency residual across consecutive samples.
    pub rmse: f64,
    /// Number of pose samples the solve consumed.
    pub samples_used: usize,
}

#[derive(Debug)]
struct SamplingWindow {
    started: Instant,
    duration: Duration,
    samples: Vec<RigidTransform>,
}

impl SamplingWindow {
    fn expired(&self) -> bool {
        self.started.elapsed() >= self.duration
    }
}

/// Pivot/spin calibrator for a single tracked tool.
///
/// Accumulates tool-to-reference poses during a time-bounded sampling
/// window, then recovers the tool-tip offset in one shot. The host drives
/// the window cooperatively: a periodic callback records the current pose,
/// watches [`ToolCalibrator::remaining`], and calls a `compute_*` operation
/// once the window has run out. Computing drains the buffer whether or not
/// the solve succeeds, and an abandoned window simply expires: the next
/// [`ToolCalibrator::start_sampling`] discards it.
#[derive(Debug)]
pub struct ToolCalibrator {
    params: CalibrationParams,
    window: Option<SamplingWindow>,
}

impl ToolCalibrator {
    /// Create a calibrator with the given acceptance parameters.
    pub fn new(params: CalibrationParams) -> Self {
        Self {
            params,
            window: None,
        }
    }

    /// The acceptance parameters in use.
    pub fn params(&self) -> &CalibrationParams {
        &self.params
    }

    /// Open a sampling window of the given duration.
    ///
    /// Fails with [`CalibrationError::SamplingInProgress`] while a live
    /// window is open; a stale (expired but never computed) window is
    /// discarded and replaced.
    pub fn start_sampling(&mut self, duration: Duration) -> Result<(), CalibrationError> {
        log::debug!("start sampling for {duration:?}");
        if let Some(window) = &self.window {
            if !window.expired() {
                return Err(CalibrationError::SamplingInProgress);
            }
            log::debug!(
                "discarding expired window with {} samples",
                window.samples.len()
            );
        }
        self.window = Some(SamplingWindow {
            started: Instant::now(),
            duration,
            samples: Vec::new(),
        });
        Ok(())
    }

    /// Whether a sampling window is open and has not yet expired.
    pub fn is_sampling(&self) -> bool {
        matches!(&self.window, Some(window) if !window.expired())
    }

    /// Time left in the current window, if one exists.
    ///
    /// Hosts poll this for countdown display; `Duration::ZERO` means the
    /// window has expired and a `compute_*` call is due.
    pub fn remaining(&self) -> Option<Duration> {
        self.window
            .as_ref()
            .map(|window| window.duration.saturating_sub(window.started.elapsed()))
    }

    /// Number of poses collected so far in the current window.
    pub fn sample_count(&self) -> usize {
        self.window
            .as_ref()
            .map_or(0, |window| window.samples.len())
    }

    /// Append a tool-to-reference pose to the open sampling window.
    pub fn record_pose(&mut self, pose: &RigidTransform) -> Result<(), CalibrationError> {
        let window = self.window.as_mut().ok_or(CalibrationError::NotSampling)?;
        if window.expired() {
            return Err(CalibrationError::WindowExpired);
        }
        window.samples.push(*pose);
        Ok(())
    }

    /// Close the window and solve for a fixed pivot point.
    ///
    /// The recovered tip offset is expressed in the tool frame; the pivot
    /// point is expressed in the reference frame. An RMS residual at or
    /// above `error_threshold_mm` rejects the solve with
    /// [`CalibrationError::ThresholdExceeded`] carrying the measured value.
    pub fn compute_pivot(&mut self) -> Result<PivotCalibration, CalibrationError> {
        let samples = self.take_samples()?;
        log::debug!("pivot calibration over {} samples", samples.len());
        self.check_sample_diversity(&samples)?;

        let (tip, pivot, rmse) = solve_pivot(&samples)?;
        self.check_threshold(rmse)?;

        Ok(PivotCalibration {
            tip_to_tool: RigidTransform::new(RigidTransform::IDENTITY.rotation, tip),
            pivot_in_reference: pivot,
            rmse,
            samples_used: samples.len(),
        })
    }

    /// Close the window and solve for the tool's spin axis.
    ///
    /// The result rotation aligns the canonical shaft axis `(0, 0, -1)`
    /// with the axis the sampled spin motion rotates about, expressed in
    /// the tool frame. The same threshold gate as pivot calibration
    /// applies to the axis-consistency residual.
    pub fn compute_spin(&mut self) -> Result<SpinCalibration, CalibrationError> {
        let samples = self.take_samples()?;
        log::debug!("spin calibration over {} samples", samples.len());
        self.check_sample_diversity(&samples)?;

        let (rotation, axis, rmse) = solve_spin(&samples)?;
        self.check_threshold(rmse)?;

        Ok(SpinCalibration {
            tip_to_tool: RigidTransform::new(rotation, [0.0; 3]),
            spin_axis_in_tool: axis,
            rmse,
            samples_used: samples.len(),
        })
    }

    // Drains the buffer on every compute path, successful or not.
    fn take_samples(&mut self) -> Result<Vec<RigidTransform>, CalibrationError> {
        self.window
            .take()
            .map(|window| window.samples)
            .ok_or(CalibrationError::NotSampling)
    }

    fn check_sample_diversity(&self, samples: &[RigidTransform]) -> Result<(), CalibrationError> {
        if samples.len() < self.params.min_samples {
            return Err(CalibrationError::InsufficientSamples {
                required: self.params.min_samples,
                actual: samples.len(),
            });
        }
        let span_deg = orientation_span_deg(samples);
        if span_deg < self.params.min_orientation_span_deg {
            return Err(CalibrationError::InsufficientRotation {
                span_deg,
                required_deg: self.params.min_orientation_span_deg,
            });
        }
        Ok(())
    }

    fn check_threshold(&self, rmse: f64) -> Result<(), CalibrationError> {
        if rmse >= self.params.error_threshold_mm {
            return Err(CalibrationError::ThresholdExceeded {
                rmse_mm: rmse,
                threshold_mm: self.params.error_threshold_mm,
            });
        }
        Ok(())
    }
}

impl Default for ToolCalibrator {
    fn default() -> Self {
        Self::new(CalibrationParams::default())
    }
}

// Largest orientation difference between the first sample and any other.
fn orientation_span_deg(samples: &[RigidTransform]) -> f64 {
    let Some(first) = samples.first() else {
        return 0.0;
    };
    let first = &first.rotation;
    samples
        .iter()
        .skip(1)
        .map(|sample| rotation_angle_deg(first, &sample.rotation))
        .fold(0.0, f64::max)
}

/// Length of a calibrated tool in mm: the distance from the tip to the
/// tool base.
///
/// # Arguments
///
/// * `tip_to_tool` - The calibrated tip offset.
/// * `base_to_tool` - The fixed transform of the tool base marker.
pub fn tool_length(tip_to_tool: &RigidTransform, base_to_tool: &RigidTransform) -> f64 {
    let tip_to_base = relative_transform(tip_to_tool, base_to_tool);
    let [x, y, z] = tip_to_base.translation;
    (x * x + y * y + z * z).sqrt()
}
