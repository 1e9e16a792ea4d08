//! Transition curves
//!
//! A transition maps a sample position inside a span to a gain value. It is
//! fitted through two endpoints `(x1, y1)` and `(x2, y2)` at construction and
//! only stores the precomputed coefficients.
//!
//! - Linear: straight line through both endpoints
//! - Cubic: `y = f3·(x-x1)³ + f2·(x-x1)² + y1`, zero slope at both endpoints
//! - Sine: raised cosine, half a period between the endpoints
//!
//! A degenerate span (`x1 == x2`) yields the constant `y1`.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;

/// Transition shape selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransitionType {
    Linear,
    #[default]
    Cubic,
    Sine,
}

impl TransitionType {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "linear" => Some(TransitionType::Linear),
            "cubic" => Some(TransitionType::Cubic),
            "sine" => Some(TransitionType::Sine),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TransitionType::Linear => "linear",
            TransitionType::Cubic => "cubic",
            TransitionType::Sine => "sine",
        }
    }

    pub fn all_variants() -> &'static [TransitionType] {
        &[TransitionType::Linear, TransitionType::Cubic, TransitionType::Sine]
    }
}

impl fmt::Display for TransitionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A fitted transition curve
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Transition {
    /// `y = gradient·x + y_offset`
    Linear { gradient: f64, y_offset: f64 },
    Cubic { x1: f64, y1: f64, factor2: f64, factor3: f64 },
    Sine { x1: f64, x_scale: f64, y_scale: f64, y_offset: f64 },
    /// `x1 == x2`
    Constant { y: f64 },
}

impl Transition {
    pub fn new(kind: TransitionType, x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        if x1 == x2 {
            return Transition::Constant { y: y1 };
        }

        let dx = x2 - x1;
        let dy = y2 - y1;

        match kind {
            TransitionType::Linear => {
                let gradient = dy / dx;
                Transition::Linear {
                    gradient,
                    y_offset: y1 - gradient * x1,
                }
            }
            TransitionType::Cubic => Transition::Cubic {
                x1,
                y1,
                factor2: 3.0 * dy / (dx * dx),
                factor3: -2.0 * dy / (dx * dx * dx),
            },
            TransitionType::Sine => Transition::Sine {
                x1,
                x_scale: PI / dx,
                y_scale: (y1 - y2) / 2.0,
                y_offset: (y1 + y2) / 2.0,
            },
        }
    }

    /// Curve rising from 0 at position 0 to 1 at `len - 1`
    pub fn fade_in(kind: TransitionType, len: i64) -> Self {
        Self::new(kind, 0.0, 0.0, (len - 1) as f64, 1.0)
    }

    /// Curve falling from 1 at position 0 to 0 at `len - 1`
    pub fn fade_out(kind: TransitionType, len: i64) -> Self {
        Self::new(kind, 0.0, 1.0, (len - 1) as f64, 0.0)
    }

    pub fn calc_y(&self, x: f64) -> f64 {
        match *self {
            Transition::Linear { gradient, y_offset } => gradient * x + y_offset,
            Transition::Cubic { x1, y1, factor2, factor3 } => {
                let xs = x - x1;
                factor3 * xs * xs * xs + factor2 * xs * xs + y1
            }
            Transition::Sine { x1, x_scale, y_scale, y_offset } => {
                ((x - x1) * x_scale).cos() * y_scale + y_offset
            }
            Transition::Constant { y } => y,
        }
    }
}
