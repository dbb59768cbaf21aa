//! Response curves mapping a 0-100 severity to a likelihood in [0, 1].

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum ResponseCurve {
    Constant {
        value: f64,
    },
    /// `height / (1 + exp(-slope * (x - midpoint)))`
    Sigmoid {
        height: f64,
        midpoint: f64,
        slope: f64,
    },
    /// `height * exp(-(x - center)^2 / (2 * variance))`
    Gaussian {
        height: f64,
        center: f64,
        variance: f64,
    },
    Sum {
        terms: Vec<ResponseCurve>,
    },
    /// `value` when severity is strictly below `threshold`
    Below {
        threshold: f64,
        value: f64,
        curve: Box<ResponseCurve>,
    },
    /// `value` when severity is strictly above `threshold`
    Above {
        threshold: f64,
        value: f64,
        curve: Box<ResponseCurve>,
    },
}

impl ResponseCurve {
    pub fn sigmoid(height: f64, midpoint: f64, slope: f64) -> Self {
        ResponseCurve::Sigmoid {
            height,
            midpoint,
            slope,
        }
    }

    pub fn gaussian(height: f64, center: f64, variance: f64) -> Self {
        ResponseCurve::Gaussian {
            height,
            center,
            variance,
        }
    }

    /// Likelihood at `severity`, clamped to [0, 1]. NaN reads as 0.
    pub fn eval(&self, severity: f64) -> f64 {
        let raw = self.raw(severity);
        if raw.is_nan() {
            0.0
        } else {
            raw.clamp(0.0, 1.0)
        }
    }

    fn raw(&self, x: f64) -> f64 {
        match self {
            ResponseCurve::Constant { value } => *value,
            ResponseCurve::Sigmoid {
                height,
                midpoint,
                slope,
            } => height / (1.0 + (-slope * (x - midpoint)).exp()),
            ResponseCurve::Gaussian {
                height,
                center,
                variance,
            } => {
                if *variance <= 0.0 {
                    return 0.0;
                }
                height * (-(x - center).powi(2) / (2.0 * variance)).exp()
            }
            ResponseCurve::Sum { terms } => terms.iter().map(|t| t.raw(x)).sum(),
            ResponseCurve::Below {
                threshold,
                value,
                curve,
            } => {
                if x < *threshold {
                    *value
                } else {
                    curve.raw(x)
                }
            }
            ResponseCurve::Above {
                threshold,
                value,
                curve,
            } => {
                if x > *threshold {
                    *value
                } else {
                    curve.raw(x)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_sigmoid_anchor_points() {
        let curve = ResponseCurve::sigmoid(1.0, 50.0, 0.062);
        assert_abs_diff_eq!(curve.eval(20.0), 0.15, epsilon = 0.02);
        assert_abs_diff_eq!(curve.eval(50.0), 0.50, epsilon = 1e-12);
        assert_abs_diff_eq!(curve.eval(80.0), 0.87, epsilon = 0.01);
    }

    #[test]
    fn test_sigmoid_is_monotonic() {
        let curve = ResponseCurve::sigmoid(1.0, 50.0, 0.062);
        let mut last = 0.0;
        for s in 0..=100 {
            let v = curve.eval(s as f64);
            assert!(v >= last);
            last = v;
        }
    }

    #[test]
    fn test_gaussian_peaks_at_center() {
        let curve = ResponseCurve::gaussian(0.6, 40.0, 225.0);
        assert_abs_diff_eq!(curve.eval(40.0), 0.6, epsilon = 1e-12);
        assert!(curve.eval(10.0) < curve.eval(40.0));
        assert!(curve.eval(70.0) < curve.eval(40.0));
    }

    #[test]
    fn test_above_overrides() {
        let curve = ResponseCurve::Above {
            threshold: 70.0,
            value: 0.3,
            curve: Box::new(ResponseCurve::gaussian(0.6, 40.0, 225.0)),
        };
        assert_abs_diff_eq!(curve.eval(71.0), 0.3);
        assert!(curve.eval(70.0) < 0.3);
    }

    #[test]
    fn test_sum_is_clamped() {
        let curve = ResponseCurve::Sum {
            terms: vec![
                ResponseCurve::Constant { value: 0.8 },
                ResponseCurve::Constant { value: 0.8 },
            ],
        };
        assert_abs_diff_eq!(curve.eval(0.0), 1.0);
    }

    #[test]
    fn test_degenerate_gaussian() {
        let curve = ResponseCurve::gaussian(1.0, 50.0, 0.0);
        assert_abs_diff_eq!(curve.eval(50.0), 0.0);
    }
}
