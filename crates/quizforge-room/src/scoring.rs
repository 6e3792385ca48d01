//! Time-based answer scoring.

use std::time::Duration;

/// Points for an instant correct answer.
pub const MAX_SCORE: u32 = 1000;

/// Points for a correct answer at or after the end of the window.
pub const MIN_SCORE: u32 = 100;

/// The window over which the score decays.
pub const SCORING_WINDOW: Duration = Duration::from_secs(30);

/// Points for a correct answer submitted `elapsed` after the question was
/// posted.
///
/// Decays linearly from [`MAX_SCORE`] at zero to [`MIN_SCORE`] at
/// [`SCORING_WINDOW`], rounding to the nearest point. Never increases with
/// `elapsed` and never leaves `MIN_SCORE..=MAX_SCORE`.
pub fn score(elapsed: Duration) -> u32 {
    if elapsed >= SCORING_WINDOW {
        return MIN_SCORE;
    }
    let remaining = 1.0 - elapsed.as_secs_f64() / SCORING_WINDOW.as_secs_f64();
    let points = (f64::from(MAX_SCORE) * remaining).round() as u32;
    points.clamp(MIN_SCORE, MAX_SCORE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instant_answer_scores_max() {
        assert_eq!(score(Duration::ZERO), 1000);
    }

    #[test]
    fn test_late_answer_scores_min() {
        assert_eq!(score(SCORING_WINDOW), 100);
        assert_eq!(score(Duration::from_secs(90)), 100);
    }

    #[test]
    fn test_linear_decay_rounds() {
        assert_eq!(score(Duration::from_secs(15)), 500);
        assert_eq!(score(Duration::from_secs(3)), 900);
        // 1000 * (1 - 0.1/30) = 996.67
        assert_eq!(score(Duration::from_millis(100)), 997);
    }

    #[test]
    fn test_never_below_min_inside_window() {
        // 1000 * (1 - 29.9/30) = 3.33, floored to the minimum
        assert_eq!(score(Duration::from_millis(29_900)), 100);
    }

    #[test]
    fn test_non_increasing_over_window() {
        let mut previous = score(Duration::ZERO);
        for ms in (0..=30_000).step_by(250) {
            let current = score(Duration::from_millis(ms));
            assert!(current <= previous, "score rose at {ms}ms");
            previous = current;
        }
    }
}
