//! Proxy-to-quantity conversion
//!
//! Turns a raw raster value (e.g. an estimated population) into the sampling
//! weight of a candidate location (e.g. an estimated building count).

use serde::{Deserialize, Serialize};

use crate::core::error::{ResampleError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProxyFunction {
    /// Weight equals the proxy value
    Identity,
    /// Weight equals the proxy value above `min`, zero at or below it.
    /// Buildings directly proportional to population.
    Threshold { min: f64 },
    /// Square root of the proxy value above `min`, zero at or below it.
    /// Spreads assets more evenly, e.g. for industrial occupancy.
    SquareRoot { min: f64 },
}

impl Default for ProxyFunction {
    fn default() -> Self {
        ProxyFunction::Threshold { min: 0.35 }
    }
}

impl ProxyFunction {
    /// Weight for a raw value. Never negative, never NaN.
    pub fn apply(&self, value: f64) -> f64 {
        if !value.is_finite() || value <= 0.0 {
            return 0.0;
        }
        match *self {
            ProxyFunction::Identity => value,
            ProxyFunction::Threshold { min } => {
                if value > min {
                    value
                } else {
                    0.0
                }
            }
            ProxyFunction::SquareRoot { min } => {
                if value > min {
                    value.sqrt()
                } else {
                    0.0
                }
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        match *self {
            ProxyFunction::Identity => Ok(()),
            ProxyFunction::Threshold { min } | ProxyFunction::SquareRoot { min } => {
                if min.is_finite() && min >= 0.0 {
                    Ok(())
                } else {
                    Err(ResampleError::InvalidConfig(format!(
                        "proxy threshold must be non-negative, got {}",
                        min
                    )))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_zeroes_low_values() {
        let proxy = ProxyFunction::Threshold { min: 0.35 };
        assert_eq!(proxy.apply(0.2), 0.0);
        assert_eq!(proxy.apply(0.35), 0.0);
        assert_eq!(proxy.apply(4.0), 4.0);
    }

    #[test]
    fn test_square_root() {
        let proxy = ProxyFunction::SquareRoot { min: 1.0 };
        assert_eq!(proxy.apply(16.0), 4.0);
        assert_eq!(proxy.apply(0.5), 0.0);
    }

    #[test]
    fn test_never_negative() {
        assert_eq!(ProxyFunction::Identity.apply(-3.0), 0.0);
        assert_eq!(ProxyFunction::Identity.apply(f64::NAN), 0.0);
    }
}
