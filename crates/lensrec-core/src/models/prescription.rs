//! Prescription models and numeric validation.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while validating prescription input.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InputError {
    #[error("prescription field {field} has non-numeric value {value:?}")]
    NotNumeric { field: &'static str, value: String },

    #[error("prescription field {field} value {value} is out of range")]
    OutOfRange { field: &'static str, value: f64 },
}

/// Refractive values for a single eye, as written on the prescription.
///
/// Values are kept as the numeric strings the dispensing system received
/// ("+2.00", "-1.25", "180"); parsing happens at the engine boundary so a
/// malformed prescription is rejected before any scoring begins.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EyeRx {
    /// Sphere power in diopters
    pub sphere: String,
    /// Cylinder power in diopters
    pub cylinder: String,
    /// Cylinder axis in degrees (0-180)
    pub axis: String,
    /// Near addition power in diopters
    pub add: String,
}

impl EyeRx {
    /// Create an eye prescription from raw value strings.
    pub fn new(
        sphere: impl Into<String>,
        cylinder: impl Into<String>,
        axis: impl Into<String>,
        add: impl Into<String>,
    ) -> Self {
        Self {
            sphere: sphere.into(),
            cylinder: cylinder.into(),
            axis: axis.into(),
            add: add.into(),
        }
    }

    /// A plano eye with no correction.
    pub fn plano() -> Self {
        Self::new("0.00", "0.00", "0", "0.00")
    }
}

/// A structured refractive prescription for both eyes.
///
/// Read-only input to the engine; never mutated by any component.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Prescription {
    /// Right eye (OD)
    pub od: EyeRx,
    /// Left eye (OS)
    pub os: EyeRx,
    /// Pupillary distance in millimeters
    pub pd: Option<String>,
    /// Frame wrap angle in degrees, when known at prescription time
    pub frame_wrap_angle: Option<f64>,
}

impl Prescription {
    /// Create a prescription for both eyes.
    pub fn new(od: EyeRx, os: EyeRx) -> Self {
        Self {
            od,
            os,
            pd: None,
            frame_wrap_angle: None,
        }
    }

    /// Parse and validate all numeric fields.
    pub fn parsed(&self) -> Result<ParsedPrescription, InputError> {
        Ok(ParsedPrescription {
            od: ParsedEye::from_rx(&self.od, "od")?,
            os: ParsedEye::from_rx(&self.os, "os")?,
            pd: match &self.pd {
                Some(raw) => Some(parse_field("pd", raw, 0.0, 100.0)?),
                None => None,
            },
        })
    }
}

/// Fully parsed per-eye values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParsedEye {
    pub sphere: f64,
    pub cylinder: f64,
    pub axis: f64,
    pub add: f64,
}

impl ParsedEye {
    fn from_rx(rx: &EyeRx, eye: &'static str) -> Result<Self, InputError> {
        // Field labels are static so the error can name the offending eye.
        let (sphere_f, cyl_f, axis_f, add_f) = match eye {
            "od" => ("od.sphere", "od.cylinder", "od.axis", "od.add"),
            _ => ("os.sphere", "os.cylinder", "os.axis", "os.add"),
        };
        Ok(Self {
            sphere: parse_field(sphere_f, &rx.sphere, -30.0, 30.0)?,
            cylinder: parse_field(cyl_f, &rx.cylinder, -30.0, 30.0)?,
            axis: parse_field(axis_f, &rx.axis, 0.0, 180.0)?,
            add: parse_field(add_f, &rx.add, 0.0, 6.0)?,
        })
    }
}

/// A validated prescription ready for scoring.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParsedPrescription {
    pub od: ParsedEye,
    pub os: ParsedEye,
    pub pd: Option<f64>,
}

impl ParsedPrescription {
    /// Both eyes, right first.
    pub fn eyes(&self) -> [ParsedEye; 2] {
        [self.od, self.os]
    }
}

/// Frame measurements supplied with an order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct FrameData {
    /// Frame wrap angle in degrees
    pub wrap_angle: Option<f64>,
    /// Frame model name, for the persisted record
    pub frame_model: Option<String>,
}

/// Parse one numeric prescription field.
///
/// Blank and "plano" values read as 0.0; a leading '+' is accepted.
fn parse_field(field: &'static str, raw: &str, min: f64, max: f64) -> Result<f64, InputError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("plano") || trimmed.eq_ignore_ascii_case("pl")
    {
        return Ok(0.0);
    }
    let cleaned = trimmed.strip_prefix('+').unwrap_or(trimmed);
    let value: f64 = cleaned.parse().map_err(|_| InputError::NotNumeric {
        field,
        value: raw.to_string(),
    })?;
    if value < min || value > max {
        return Err(InputError::OutOfRange { field, value });
    }
    Ok(value)
}
