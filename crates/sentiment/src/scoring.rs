//! Score math.
//!
//! Maps price and load deviations onto bounded [0, 100] sub-scores, where
//! cheaper-than-usual and lighter-than-usual conditions score high.

use rtm_core::config::SentimentWeights;

/// Makes MAD comparable to a standard deviation under normality.
pub const ROBUST_Z_SCALE: f64 = 0.6745;

/// Robust z-scores are clipped to +/- this before mapping.
pub const Z_CLIP: f64 = 2.0;

/// Load percentage deviations are clipped to +/- this before mapping.
pub const LOAD_PCT_CLIP: f64 = 0.20;

/// Upper bound of every score.
pub const MAX_SCORE: f64 = 100.0;

/// Map `value` in [-clip, clip] linearly onto [100, 0].
fn clipped_linear_score(value: f64, clip: f64) -> f64 {
    let clipped = value.clamp(-clip, clip);
    let score = (1.0 - (clipped + clip) / (2.0 * clip)) * MAX_SCORE;
    score.clamp(0.0, MAX_SCORE)
}

/// `0.6745 * (value - baseline) / mad`, or 0 whenever an input is missing,
/// the MAD is zero, or the result is not finite.
pub fn robust_z_score(value: Option<f64>, baseline: Option<f64>, mad: Option<f64>) -> f64 {
    match (value, baseline, mad) {
        (Some(value), Some(baseline), Some(mad)) if mad != 0.0 => {
            let z = ROBUST_Z_SCALE * (value - baseline) / mad;
            if z.is_finite() {
                z
            } else {
                0.0
            }
        }
        _ => 0.0,
    }
}

/// z = -2 scores 100, z = +2 scores 0.
pub fn z_to_score(z: f64) -> f64 {
    clipped_linear_score(z, Z_CLIP)
}

/// `(load - baseline) / baseline`, or 0 when undefined or infinite.
pub fn load_pct_deviation(load: Option<f64>, baseline: Option<f64>) -> f64 {
    match (load, baseline) {
        (Some(load), Some(baseline)) if baseline != 0.0 => {
            let pct = (load - baseline) / baseline;
            if pct.is_finite() {
                pct
            } else {
                0.0
            }
        }
        _ => 0.0,
    }
}

/// -20% scores 100, +20% scores 0.
pub fn pct_to_score(pct: f64) -> f64 {
    clipped_linear_score(pct, LOAD_PCT_CLIP)
}

/// Weighted combination of the sub-scores, clipped to [0, 100].
///
/// `weights` should already be normalized.
pub fn combine(price_score: f64, load_score: f64, weights: &SentimentWeights) -> f64 {
    let sentiment = price_score * weights.price + load_score * weights.load;
    sentiment.clamp(0.0, MAX_SCORE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_z_score() {
        // 0.6745 * (30 - 20) / 5
        assert_abs_diff_eq!(
            robust_z_score(Some(30.0), Some(20.0), Some(5.0)),
            1.349,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_z_score_fallbacks() {
        assert_eq!(robust_z_score(Some(30.0), Some(20.0), Some(0.0)), 0.0);
        assert_eq!(robust_z_score(Some(30.0), None, None), 0.0);
        assert_eq!(robust_z_score(None, Some(20.0), Some(1.0)), 0.0);
        assert_eq!(robust_z_score(Some(30.0), Some(20.0), None), 0.0);
    }

    #[test]
    fn test_z_to_score_mapping() {
        assert_abs_diff_eq!(z_to_score(-2.0), 100.0);
        assert_abs_diff_eq!(z_to_score(0.0), 50.0);
        assert_abs_diff_eq!(z_to_score(2.0), 0.0);
        assert_abs_diff_eq!(z_to_score(1.0), 25.0);
        assert_abs_diff_eq!(z_to_score(-7.5), 100.0);
        assert_abs_diff_eq!(z_to_score(9.0), 0.0);
    }

    #[test]
    fn test_load_deviation() {
        assert_abs_diff_eq!(load_pct_deviation(Some(110.0), Some(100.0)), 0.1, epsilon = 1e-12);
        assert_eq!(load_pct_deviation(Some(110.0), Some(0.0)), 0.0);
        assert_eq!(load_pct_deviation(None, Some(100.0)), 0.0);
        assert_eq!(load_pct_deviation(Some(110.0), None), 0.0);
    }

    #[test]
    fn test_pct_to_score_mapping() {
        assert_abs_diff_eq!(pct_to_score(-0.2), 100.0, epsilon = 1e-9);
        assert_abs_diff_eq!(pct_to_score(0.0), 50.0, epsilon = 1e-9);
        assert_abs_diff_eq!(pct_to_score(0.2), 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(pct_to_score(0.1), 25.0, epsilon = 1e-9);
        assert_abs_diff_eq!(pct_to_score(-0.5), 100.0, epsilon = 1e-9);
    }

    #[test]
    fn test_combine() {
        let weights = SentimentWeights::default().normalized();
        assert_abs_diff_eq!(combine(100.0, 0.0, &weights), 60.0, epsilon = 1e-9);
        assert_abs_diff_eq!(combine(50.0, 50.0, &weights), 50.0, epsilon = 1e-9);
        assert_abs_diff_eq!(combine(100.0, 100.0, &weights), 100.0, epsilon = 1e-9);
    }

    #[test]
    fn test_combine_clips() {
        let weights = SentimentWeights { price: 2.0, load: 0.0 };
        assert_abs_diff_eq!(combine(100.0, 0.0, &weights), 100.0);
    }
}
