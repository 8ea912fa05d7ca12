//! Dual-detector arbitration and final list assembly.
//!
//! Geometry decides first. A tilted reading is authoritative; a level
//! reading gets a second opinion from the advisor's level check. Whenever
//! either detector reports tilt, a correction occupies step 1 and at most
//! four advisor suggestions follow. An unreadable second opinion counts as
//! tilted with an unknown side.

use async_trait::async_trait;
use tracing::{debug, info};

use shotcoach_models::{
    Direction, Intensity, LevelSource, Suggestion, TiltDirection, TiltEstimate, MAX_SUGGESTIONS,
};

use crate::metrics;

const LEFT_HIGH_WORDS: &[&str] = &["left_high", "left-high", "left high", "左边高", "左高", "左倾", "左侧高", "左边"];
const RIGHT_HIGH_WORDS: &[&str] = &["right_high", "right-high", "right high", "右边高", "右高", "右倾", "右侧高", "右边"];
const LEVEL_WORDS: &[&str] = &["level", "水平", "平稳", "正常", "不倾斜"];
const NOT_LEVEL_WORDS: &[&str] = &["not level", "isn't level", "unlevel", "不水平", "不平"];

/// Map the level check's reply onto a tilt direction.
///
/// Side keywords win over level keywords, so "不水平，左边高" reads as
/// left-high. Both sides, a bare negation, or no keyword at all give
/// `Unknown`.
pub fn parse_level_verdict(text: &str) -> TiltDirection {
    let lower = text.trim().to_lowercase();
    let has = |words: &[&str]| words.iter().any(|w| lower.contains(w));

    match (has(LEFT_HIGH_WORDS), has(RIGHT_HIGH_WORDS)) {
        (true, false) => TiltDirection::LeftHigh,
        (false, true) => TiltDirection::RightHigh,
        (true, true) => TiltDirection::Unknown,
        (false, false) => {
            if has(LEVEL_WORDS) && !has(NOT_LEVEL_WORDS) {
                TiltDirection::Level
            } else {
                TiltDirection::Unknown
            }
        }
    }
}

/// Step-1 correction for a detected tilt. The move is opposite the high side.
pub fn correction_for(direction: TiltDirection) -> Suggestion {
    let intensity = Intensity::new(2).unwrap_or(Intensity::DEFAULT);
    match direction {
        TiltDirection::RightHigh => Suggestion::new(
            "Raise your left hand a little to bring the horizon level",
            Direction::LeftUp,
            intensity,
            "correct right-high tilt",
        ),
        TiltDirection::LeftHigh => Suggestion::new(
            "Raise your right hand a little to bring the horizon level",
            Direction::RightUp,
            intensity,
            "correct left-high tilt",
        ),
        TiltDirection::Level | TiltDirection::Unknown => Suggestion::new(
            "Adjust the phone angle to keep the frame level",
            Direction::Up,
            intensity,
            "keep frame level",
        ),
    }
}

/// Advisor suggestions requested for a list with or without a correction.
pub fn advice_slots(has_correction: bool) -> usize {
    if has_correction {
        MAX_SUGGESTIONS - 1
    } else {
        MAX_SUGGESTIONS
    }
}

/// Correction first, then advice, capped and numbered 1..n.
pub fn assemble(correction: Option<Suggestion>, advice: Vec<Suggestion>) -> Vec<Suggestion> {
    let slots = advice_slots(correction.is_some());
    let mut suggestions: Vec<Suggestion> = correction
        .into_iter()
        .chain(advice.into_iter().take(slots))
        .collect();
    Suggestion::renumber(&mut suggestions);
    suggestions
}

/// Advisor-backed inputs to one arbitration.
#[async_trait]
pub trait GuidanceSource: Send + Sync {
    /// Raw level-check reply, `None` when the call failed.
    async fn level_verdict(&self) -> Option<String>;

    /// A never-empty set of up to `count` non-tilt suggestions.
    async fn suggestions(&self, count: usize) -> Vec<Suggestion>;
}

/// Outcome of arbitration for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    pub suggestions: Vec<Suggestion>,
    pub is_level: bool,
    pub tilt_direction: TiltDirection,
    pub level_source: LevelSource,
}

/// Which detector is trusted and whether a correction is needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Verdict {
    tilt: Option<TiltDirection>,
    source: LevelSource,
}

async fn settle_levelness(tilt: &TiltEstimate, source: &dyn GuidanceSource) -> Verdict {
    if !tilt.is_level {
        let direction = match tilt.tilt_direction {
            TiltDirection::Level => TiltDirection::Unknown,
            other => other,
        };
        return Verdict {
            tilt: Some(direction),
            source: LevelSource::Geometry,
        };
    }

    match source.level_verdict().await {
        Some(reply) => match parse_level_verdict(&reply) {
            TiltDirection::Level => Verdict {
                tilt: None,
                source: LevelSource::Secondary,
            },
            direction => {
                info!(verdict = %direction, reply = %reply.trim(), "Level check overrides geometry");
                Verdict {
                    tilt: Some(direction),
                    source: LevelSource::Secondary,
                }
            }
        },
        None => {
            debug!("Level check unavailable, keeping geometry reading");
            Verdict {
                tilt: None,
                source: LevelSource::Geometry,
            }
        }
    }
}

/// Arbitrate one frame and assemble its suggestion list.
pub async fn decide(tilt: &TiltEstimate, source: &dyn GuidanceSource) -> Decision {
    let verdict = settle_levelness(tilt, source).await;

    let correction = verdict.tilt.map(|direction| {
        metrics::record_tilt_correction(verdict.source.as_str());
        correction_for(direction)
    });

    let advice = source.suggestions(advice_slots(correction.is_some())).await;
    let suggestions = assemble(correction, advice);

    Decision {
        suggestions,
        is_level: verdict.tilt.is_none(),
        tilt_direction: verdict.tilt.unwrap_or(TiltDirection::Level),
        level_source: verdict.source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Fixed {
        verdict: Option<String>,
        requested: Mutex<Vec<usize>>,
        level_checks: Mutex<u32>,
    }

    impl Fixed {
        fn new(verdict: Option<&str>) -> Self {
            Self {
                verdict: verdict.map(str::to_string),
                requested: Mutex::new(Vec::new()),
                level_checks: Mutex::new(0),
            }
        }
    }

    #[async_trait]
    impl GuidanceSource for Fixed {
        async fn level_verdict(&self) -> Option<String> {
            *self.level_checks.lock().unwrap() += 1;
            self.verdict.clone()
        }

        async fn suggestions(&self, count: usize) -> Vec<Suggestion> {
            self.requested.lock().unwrap().push(count);
            // Deliberately more than asked for.
            (0..6)
                .map(|i| Suggestion::new(format!("advice {}", i), Direction::Down, Intensity::DEFAULT, "r"))
                .collect()
        }
    }

    fn tilted(direction: TiltDirection) -> TiltEstimate {
        TiltEstimate {
            is_level: false,
            tilt_angle: 10.0,
            tilt_direction: direction,
            confidence: 1.0,
        }
    }

    #[test]
    fn test_parse_level_verdict() {
        assert_eq!(parse_level_verdict("level"), TiltDirection::Level);
        assert_eq!(parse_level_verdict(" Level. "), TiltDirection::Level);
        assert_eq!(parse_level_verdict("水平"), TiltDirection::Level);
        assert_eq!(parse_level_verdict("不倾斜"), TiltDirection::Level);
        assert_eq!(parse_level_verdict("left_high"), TiltDirection::LeftHigh);
        assert_eq!(parse_level_verdict("左边高"), TiltDirection::LeftHigh);
        assert_eq!(parse_level_verdict("RIGHT_HIGH"), TiltDirection::RightHigh);
        assert_eq!(parse_level_verdict("不水平，右边高"), TiltDirection::RightHigh);
    }

    #[test]
    fn test_ambiguous_verdicts_are_unknown() {
        assert_eq!(parse_level_verdict("不水平"), TiltDirection::Unknown);
        assert_eq!(parse_level_verdict("not level"), TiltDirection::Unknown);
        assert_eq!(parse_level_verdict("slightly tilted"), TiltDirection::Unknown);
        assert_eq!(parse_level_verdict(""), TiltDirection::Unknown);
        assert_eq!(parse_level_verdict("left_high or right_high"), TiltDirection::Unknown);
    }

    #[test]
    fn test_correction_table() {
        let right = correction_for(TiltDirection::RightHigh);
        assert_eq!(right.direction, Direction::LeftUp);
        assert_eq!(right.intensity.value(), 2);
        assert_eq!(right.reason, "correct right-high tilt");

        let left = correction_for(TiltDirection::LeftHigh);
        assert_eq!(left.direction, Direction::RightUp);
        assert_eq!(left.reason, "correct left-high tilt");

        let unknown = correction_for(TiltDirection::Unknown);
        assert_eq!(unknown.direction, Direction::Up);
        assert_eq!(unknown.intensity.value(), 2);
        assert_eq!(unknown.reason, "keep frame level");
    }

    #[test]
    fn test_assemble_caps_and_renumbers() {
        let advice: Vec<Suggestion> = (0..7)
            .map(|i| Suggestion::new(format!("a{}", i), Direction::Left, Intensity::DEFAULT, "r"))
            .collect();

        let with = assemble(Some(correction_for(TiltDirection::LeftHigh)), advice.clone());
        assert_eq!(with.len(), 5);
        assert_eq!(with[0].direction, Direction::RightUp);
        assert_eq!(with[1].action, "a0");
        assert_eq!(with.iter().map(|s| s.step).collect::<Vec<_>>(), vec![1, 2, 3, 4, 5]);

        let without = assemble(None, advice);
        assert_eq!(without.len(), 5);
        assert_eq!(without[0].action, "a0");

        let short = assemble(None, Vec::new());
        assert!(short.is_empty());
    }

    #[tokio::test]
    async fn test_geometry_tilt_is_authoritative() {
        let source = Fixed::new(Some("level"));
        let decision = decide(&tilted(TiltDirection::RightHigh), &source).await;

        assert_eq!(*source.level_checks.lock().unwrap(), 0);
        assert_eq!(source.requested.lock().unwrap().clone(), vec![4]);
        assert!(!decision.is_level);
        assert_eq!(decision.level_source, LevelSource::Geometry);
        assert_eq!(decision.tilt_direction, TiltDirection::RightHigh);
        assert_eq!(decision.suggestions.len(), 5);
        assert_eq!(decision.suggestions[0].direction, Direction::LeftUp);
        assert_eq!(decision.suggestions[0].step, 1);
    }

    #[tokio::test]
    async fn test_confirmed_level_gets_five_suggestions() {
        let source = Fixed::new(Some("level"));
        let decision = decide(&TiltEstimate::level(1.0), &source).await;

        assert_eq!(source.requested.lock().unwrap().clone(), vec![5]);
        assert!(decision.is_level);
        assert_eq!(decision.level_source, LevelSource::Secondary);
        assert_eq!(decision.suggestions.len(), 5);
        assert!(decision.suggestions.iter().all(|s| s.direction == Direction::Down));
    }

    #[tokio::test]
    async fn test_secondary_override() {
        let source = Fixed::new(Some("left_high"));
        let decision = decide(&TiltEstimate::level(1.0), &source).await;

        assert!(!decision.is_level);
        assert_eq!(decision.level_source, LevelSource::Secondary);
        assert_eq!(decision.tilt_direction, TiltDirection::LeftHigh);
        assert_eq!(decision.suggestions[0].direction, Direction::RightUp);
        assert_eq!(source.requested.lock().unwrap().clone(), vec![4]);
    }

    #[tokio::test]
    async fn test_unreadable_secondary_inserts_generic_correction() {
        let source = Fixed::new(Some("I think it might be fine?"));
        let decision = decide(&TiltEstimate::no_lines(), &source).await;

        assert!(!decision.is_level);
        assert_eq!(decision.tilt_direction, TiltDirection::Unknown);
        assert_eq!(decision.suggestions[0].direction, Direction::Up);
        assert_eq!(decision.suggestions[0].reason, "keep frame level");
        assert_eq!(decision.suggestions.len(), 5);
    }

    #[tokio::test]
    async fn test_failed_secondary_keeps_geometry() {
        let source = Fixed::new(None);
        let decision = decide(&TiltEstimate::level(0.8), &source).await;

        assert!(decision.is_level);
        assert_eq!(decision.level_source, LevelSource::Geometry);
        assert_eq!(decision.tilt_direction, TiltDirection::Level);
        assert_eq!(source.requested.lock().unwrap().clone(), vec![5]);
    }
}
