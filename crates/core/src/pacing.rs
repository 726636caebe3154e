//! Turn pacing and end-of-session scoring.

use crate::scenario::Difficulty;
use rand::Rng;
use std::time::Duration;

/// Upper bound (exclusive) of the random delay added to every turn.
pub const DELAY_JITTER_MS: u64 = 2000;

/// Fixed part of the wait before an agent speaks.
pub fn base_delay_ms(difficulty: Difficulty) -> u64 {
    match difficulty {
        Difficulty::Easy => 8000,
        Difficulty::Medium => 5000,
        Difficulty::Hard => 3000,
    }
}

pub fn score_multiplier(difficulty: Difficulty) -> f64 {
    match difficulty {
        Difficulty::Easy => 1.0,
        Difficulty::Medium => 1.2,
        Difficulty::Hard => 1.5,
    }
}

/// How long to wait before the next agent line, in `[base, base + 2000)` ms.
pub fn response_delay<R: Rng + ?Sized>(rng: &mut R, difficulty: Difficulty) -> Duration {
    let jitter = rng.random_range(0..DELAY_JITTER_MS);
    Duration::from_millis(base_delay_ms(difficulty) + jitter)
}

/// Final session score.
///
/// Ten points per user message plus a time bonus that shrinks by one point
/// every ten seconds and bottoms out at zero, scaled by difficulty.
pub fn score(user_message_count: u32, elapsed_seconds: u64, difficulty: Difficulty) -> u32 {
    let base = f64::from(user_message_count) * 10.0;
    let time_bonus = (100.0 - elapsed_seconds as f64 / 10.0).max(0.0);
    ((base + time_bonus) * score_multiplier(difficulty)).round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};

    #[test]
    fn test_response_delay_stays_in_tier_window() {
        let mut rng = StdRng::seed_from_u64(0);
        for difficulty in [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard] {
            let base = base_delay_ms(difficulty);
            for _ in 0..500 {
                let ms = response_delay(&mut rng, difficulty).as_millis() as u64;
                assert!(ms >= base && ms < base + DELAY_JITTER_MS, "{} ms", ms);
            }
        }
        assert_eq!(base_delay_ms(Difficulty::Easy), 8000);
        assert_eq!(base_delay_ms(Difficulty::Medium), 5000);
        assert_eq!(base_delay_ms(Difficulty::Hard), 3000);
    }

    #[test]
    fn test_response_delay_actually_jitters() {
        let mut rng = StdRng::seed_from_u64(99);
        let first = response_delay(&mut rng, Difficulty::Hard);
        let varied = (0..20).any(|_| response_delay(&mut rng, Difficulty::Hard) != first);
        assert!(varied);
    }

    #[test]
    fn test_score_reference_values() {
        assert_eq!(score(0, 0, Difficulty::Easy), 100);
        assert_eq!(score(10, 0, Difficulty::Hard), 300);
        assert_eq!(score(5, 200, Difficulty::Medium), 156); // (50 + 80) * 1.2
        assert_eq!(score(3, 5000, Difficulty::Easy), 30);
    }

    #[test]
    fn test_score_rounds_half_up() {
        // (10 + 99.5) * 1.0
        assert_eq!(score(1, 5, Difficulty::Easy), 110);
    }

    #[test]
    fn test_score_non_increasing_in_elapsed_time() {
        for difficulty in [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard] {
            let mut previous = score(4, 0, difficulty);
            for elapsed in (0..=1500).step_by(7) {
                let current = score(4, elapsed, difficulty);
                assert!(current <= previous);
                previous = current;
            }
            assert_eq!(score(4, 1000, difficulty), score(4, 1400, difficulty));
        }
    }

    #[test]
    fn test_score_increasing_in_message_count() {
        assert!(score(6, 120, Difficulty::Hard) > score(5, 120, Difficulty::Hard));
        assert!(score(1, 0, Difficulty::Medium) > score(0, 0, Difficulty::Medium));
    }
}
