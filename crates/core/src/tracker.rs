//! Talking-Point Tracker
//!
//! Decides which talking points the conversation has already touched and
//! which one to raise next. "Touched" is a keyword-overlap heuristic; on a
//! short point a single shared keyword is enough.

use crate::USER_LABEL;
use crate::lexicon::{keyword_set, tokenize};
use crate::topic::TalkingPoint;
use std::cmp::Reverse;
use tracing::trace;

/// Keyword overlap a point with `token_count` keywords needs before it counts
/// as addressed: `min(2, max(1, floor(0.2 * n)))`.
pub fn overlap_threshold(token_count: usize) -> usize {
    (token_count / 5).clamp(1, 2)
}

/// Whether `point_text` already came up anywhere in `history`.
pub fn is_addressed(point_text: &str, history: &[String]) -> bool {
    if history.is_empty() {
        return false;
    }
    let point_tokens = tokenize(point_text);
    if point_tokens.is_empty() {
        return false;
    }
    let history_tokens = keyword_set(&history.join(" \n "));
    let overlap = point_tokens
        .iter()
        .filter(|t| history_tokens.contains(*t))
        .count();
    let threshold = overlap_threshold(point_tokens.len());
    trace!(point = point_text, overlap, threshold, "Checked talking point coverage");
    overlap >= threshold
}

/// The most important talking point with text that `history` has not covered.
///
/// Ties keep their input order.
pub fn choose_next<'a>(points: &'a [TalkingPoint], history: &[String]) -> Option<&'a TalkingPoint> {
    let mut open: Vec<&TalkingPoint> = points
        .iter()
        .filter(|p| p.has_text())
        .filter(|p| !is_addressed(&p.text, history))
        .collect();
    open.sort_by_key(|p| Reverse(p.importance));
    open.into_iter().next()
}

/// The most recent thing the user said.
///
/// Prefers the newest line attributed to the user, returned without its
/// label. Without one, falls back to the newest non-blank line of anyone,
/// label included.
pub fn last_user_utterance(history: &[String]) -> Option<String> {
    let user_prefix = format!("{}:", USER_LABEL);
    if let Some(line) = history.iter().rev().find(|l| l.starts_with(&user_prefix)) {
        return Some(line[user_prefix.len()..].trim().to_string());
    }
    history
        .iter()
        .rev()
        .map(|l| l.trim())
        .find(|l| !l.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_overlap_threshold_rounding() {
        assert_eq!(overlap_threshold(1), 1);
        assert_eq!(overlap_threshold(4), 1);
        assert_eq!(overlap_threshold(5), 1);
        assert_eq!(overlap_threshold(9), 1);
        assert_eq!(overlap_threshold(10), 2);
        assert_eq!(overlap_threshold(40), 2);
    }

    #[test]
    fn test_budget_point_addressed_by_one_shared_keyword() {
        // "discuss the budget overview" -> discuss, budget, overview: threshold 1.
        assert_eq!(tokenize("discuss the budget overview").len(), 3);
        let history = lines(&["You: let's talk about the budget"]);
        assert!(is_addressed("discuss the budget overview", &history));
    }

    #[test]
    fn test_budget_point_not_addressed_without_overlap() {
        let history = lines(&["You: let's talk about the weather"]);
        assert!(!is_addressed("discuss the budget overview", &history));
    }

    #[test]
    fn test_long_point_needs_two_overlaps() {
        let point = "quarterly revenue growth targets hiring plans marketing spend regional expansion roadmap";
        assert_eq!(tokenize(point).len(), 10);

        let one = lines(&["You: our revenue looked fine"]);
        assert!(!is_addressed(point, &one));

        let two = lines(&["You: our revenue looked fine", "Sarah: and hiring?"]);
        assert!(is_addressed(point, &two));
    }

    #[test]
    fn test_is_addressed_empty_inputs() {
        assert!(!is_addressed("budget", &[]));
        assert!(!is_addressed("to be or not", &lines(&["You: to be or not"])));
    }

    #[test]
    fn test_choose_next_prefers_highest_unaddressed_importance() {
        let points = vec![
            TalkingPoint::new("team culture", 2),
            TalkingPoint::new("budget overview", 5),
            TalkingPoint::new("launch timeline", 4),
        ];
        let history = lines(&["You: the budget is tight"]);

        let next = choose_next(&points, &history).expect("a point remains");
        assert_eq!(next.text, "launch timeline");

        let next = choose_next(&points, &[]).unwrap();
        assert_eq!(next.text, "budget overview");
    }

    #[test]
    fn test_choose_next_never_returns_addressed_point() {
        let points = vec![
            TalkingPoint::new("budget", 5),
            TalkingPoint::new("timeline", 5),
        ];
        let history = lines(&["You: budget and timeline are settled"]);
        assert!(choose_next(&points, &history).is_none());
    }

    #[test]
    fn test_choose_next_skips_blank_and_keeps_tie_order() {
        let points = vec![
            TalkingPoint::new("   ", 5),
            TalkingPoint::new("first topic", 3),
            TalkingPoint::new("second topic", 3),
        ];
        assert_eq!(choose_next(&points, &[]).unwrap().text, "first topic");
        assert!(choose_next(&[], &[]).is_none());
    }

    #[test]
    fn test_last_user_utterance_prefers_user_lines() {
        let history = lines(&[
            "You: I led a team of five.",
            "Sarah: Interesting.",
            "You:   We shipped on time.  ",
            "Mike: Nice!",
        ]);
        assert_eq!(
            last_user_utterance(&history).as_deref(),
            Some("We shipped on time.")
        );
    }

    #[test]
    fn test_last_user_utterance_falls_back_to_any_speaker() {
        let history = lines(&["Sarah: Welcome!", "  ", ""]);
        assert_eq!(last_user_utterance(&history).as_deref(), Some("Sarah: Welcome!"));
        assert!(last_user_utterance(&[]).is_none());
        assert!(last_user_utterance(&lines(&["", "  "])).is_none());
    }
}
