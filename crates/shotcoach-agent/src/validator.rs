//! Normalization of free-form advisor output into canonical suggestions.
//!
//! The advisor is asked for JSON but answers are not trusted: the text is
//! first parsed into an [`AdviceParse`], then [`interpret`] walks the
//! explicit fallback chain (structured records, numbered-line heuristic,
//! fixed set).

use serde_json::Value;

use shotcoach_models::{BrightnessTier, Direction, Intensity, Suggestion};

/// Reason attached when a record carries none.
pub const DEFAULT_REASON: &str = "Improves the overall shot";

/// Reason attached to suggestions recovered from plain text.
pub const INFERRED_REASON: &str = "inferred from action";

/// Suggestions recovered from plain text at most.
pub const MAX_HEURISTIC_SUGGESTIONS: usize = 4;

const REFUSAL_MARKERS: &[&str] = &["sorry", "can't help", "cannot help", "unable to", "抱歉", "无法"];

/// Outcome of parsing advisor text as structured data.
#[derive(Debug, Clone, PartialEq)]
pub enum AdviceParse {
    Parsed(Vec<Suggestion>),
    Unparseable(String),
}

/// Where a validated suggestion set came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdviceSource {
    /// JSON records from the advisor.
    Structured,
    /// Numbered lines from a non-JSON answer.
    Heuristic,
    /// The advisor declined; fixed set substituted.
    Refusal,
    /// Nothing usable in the answer; fixed set substituted.
    Fallback,
    /// The advisor could not be reached; fixed set substituted.
    Unavailable,
}

impl AdviceSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdviceSource::Structured => "structured",
            AdviceSource::Heuristic => "heuristic",
            AdviceSource::Refusal => "refusal",
            AdviceSource::Fallback => "fallback",
            AdviceSource::Unavailable => "unavailable",
        }
    }

    /// Sets built from an advisor answer may be cached; stand-ins for a
    /// failed call may not.
    pub fn is_cacheable(&self) -> bool {
        !matches!(self, AdviceSource::Unavailable)
    }
}

/// A never-empty suggestion set plus its provenance.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedAdvice {
    pub suggestions: Vec<Suggestion>,
    pub source: AdviceSource,
}

impl ValidatedAdvice {
    /// Fixed set for a failed advisor call.
    pub fn unavailable(tier: BrightnessTier) -> Self {
        Self {
            suggestions: fallback_suggestions(tier),
            source: AdviceSource::Unavailable,
        }
    }
}

// ============================================================================
// Structured path
// ============================================================================

/// Pull the JSON payload out of a model answer.
///
/// Looks for a fenced ```json block, then any fenced block, then the
/// outermost `{...}` span; otherwise returns the trimmed text.
pub fn extract_json(text: &str) -> &str {
    if let Some(start) = text.find("```json") {
        let body = &text[start + "```json".len()..];
        if let Some(end) = body.find("```") {
            return body[..end].trim();
        }
    }

    if let Some(start) = text.find("```") {
        let body = &text[start + 3..];
        if let Some(end) = body.find("```") {
            return body[..end].trim();
        }
    }

    if let (Some(start), Some(end)) = (text.find('{'), text.rfind('}')) {
        if start < end {
            return text[start..=end].trim();
        }
    }

    text.trim()
}

/// Parse advisor text into records.
///
/// Accepts `{"suggestions": [...]}` or a bare array. Anything else is
/// `Unparseable` carrying the original text.
pub fn parse_advice(text: &str) -> AdviceParse {
    let payload = extract_json(text);
    match serde_json::from_str::<Value>(payload) {
        Ok(Value::Object(map)) => match map.get("suggestions") {
            Some(Value::Array(items)) => AdviceParse::Parsed(validate(items)),
            _ => AdviceParse::Unparseable(text.to_string()),
        },
        Ok(Value::Array(items)) => AdviceParse::Parsed(validate(&items)),
        _ => AdviceParse::Unparseable(text.to_string()),
    }
}

/// Normalize raw candidate records, dropping those without an action or
/// direction. Input order is kept; steps stay unassigned.
pub fn validate(raw: &[Value]) -> Vec<Suggestion> {
    raw.iter().filter_map(validate_one).collect()
}

fn validate_one(candidate: &Value) -> Option<Suggestion> {
    let record = candidate.as_object()?;

    let action = match record.get("action")? {
        Value::String(s) => s.trim().to_string(),
        Value::Null => return None,
        other => other.to_string(),
    };
    if action.is_empty() {
        return None;
    }

    let direction = match record.get("direction")? {
        Value::Null => return None,
        Value::String(s) => normalize_direction(s),
        other => normalize_direction(&other.to_string()),
    };

    let intensity = record
        .get("intensity")
        .map(normalize_intensity)
        .unwrap_or(Intensity::DEFAULT);

    let reason = match record.get("reason") {
        Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
        _ => DEFAULT_REASON.to_string(),
    };

    Some(Suggestion::new(action, direction, intensity, reason))
}

/// Map a direction label (canonical or synonym) onto the 8-way enum;
/// anything unknown becomes `up`.
pub fn normalize_direction(raw: &str) -> Direction {
    let label = raw.trim().to_lowercase();
    if let Ok(direction) = label.parse::<Direction>() {
        return direction;
    }

    match label.as_str() {
        "upward" | "upwards" | "上" | "向上" => Direction::Up,
        "downward" | "downwards" | "下" | "向下" => Direction::Down,
        "leftward" | "leftwards" | "left-ward" | "左" | "向左" => Direction::Left,
        "rightward" | "rightwards" | "right-ward" | "右" | "向右" => Direction::Right,
        "left-up" | "leftup" | "up_left" | "左上" => Direction::LeftUp,
        "left-down" | "leftdown" | "down_left" | "左下" => Direction::LeftDown,
        "right-up" | "rightup" | "up_right" | "右上" => Direction::RightUp,
        "right-down" | "rightdown" | "down_right" | "右下" => Direction::RightDown,
        _ => Direction::Up,
    }
}

/// Coerce an intensity value to 1-5, truncating fractions; anything else
/// becomes the default of 3.
pub fn normalize_intensity(raw: &Value) -> Intensity {
    let value = match raw {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };

    value
        .and_then(|v| u8::try_from(v).ok())
        .and_then(|v| Intensity::new(v).ok())
        .unwrap_or(Intensity::DEFAULT)
}

// ============================================================================
// Text fallbacks
// ============================================================================

/// True when the answer reads as a refusal rather than advice.
pub fn is_refusal(text: &str) -> bool {
    let lower = text.to_lowercase();
    REFUSAL_MARKERS.iter().any(|marker| lower.contains(marker))
}

/// Recover up to four suggestions from numbered lines.
pub fn heuristic_suggestions(text: &str) -> Vec<Suggestion> {
    let mut suggestions = Vec::new();

    for line in text.lines() {
        let action = match strip_list_marker(line.trim()) {
            Some(action) => action,
            None => continue,
        };

        let lower = action.to_lowercase();
        suggestions.push(Suggestion::new(
            action,
            infer_direction(&lower),
            infer_intensity(&lower),
            INFERRED_REASON,
        ));

        if suggestions.len() == MAX_HEURISTIC_SUGGESTIONS {
            break;
        }
    }

    suggestions
}

/// Text after a leading `1.`, `1、` or `1)` marker, if any is left.
fn strip_list_marker(line: &str) -> Option<&str> {
    let rest = line.trim_start_matches(|c: char| c.is_ascii_digit());
    if rest.len() == line.len() {
        return None;
    }

    let rest = rest
        .strip_prefix('.')
        .or_else(|| rest.strip_prefix('、'))
        .or_else(|| rest.strip_prefix(')'))?
        .trim();
    (!rest.is_empty()).then_some(rest)
}

fn contains_any(text: &str, words: &[&str]) -> bool {
    words.iter().any(|w| text.contains(w))
}

fn infer_direction(lower: &str) -> Direction {
    if contains_any(lower, &["左", "left", "往左"]) {
        Direction::Left
    } else if contains_any(lower, &["右", "right", "往右"]) {
        Direction::Right
    } else if contains_any(lower, &["蹲", "down", "降低", "向下", "crouch", "lower"]) {
        Direction::Down
    } else {
        Direction::Up
    }
}

fn infer_intensity(lower: &str) -> Intensity {
    let value = if contains_any(lower, &["稍微", "一点点", "轻微", "slightly", "a little bit", "a tiny bit"]) {
        1
    } else if contains_any(lower, &["一点", "1步", "小幅", "a little", "a bit", "1 step", "one step"]) {
        2
    } else if contains_any(lower, &["2步", "3步", "几步", "2 steps", "3 steps", "a few steps", "several steps"]) {
        3
    } else if contains_any(lower, &["很多", "大幅", "大量", "很大", "a lot", "a long way"]) {
        5
    } else if contains_any(lower, &["4步", "5步", "较大", "多", "4 steps", "5 steps", "considerably"]) {
        4
    } else {
        3
    };
    Intensity::new(value).unwrap_or(Intensity::DEFAULT)
}

/// Fixed generic set used when nothing usable came back.
pub fn fallback_suggestions(tier: BrightnessTier) -> Vec<Suggestion> {
    let intensity = |v: u8| Intensity::new(v).unwrap_or(Intensity::DEFAULT);

    let last = if tier == BrightnessTier::Dim {
        Suggestion::new(
            "Move somewhere brighter",
            Direction::Right,
            intensity(2),
            "The frame is too dark",
        )
    } else {
        Suggestion::new(
            "Fine-tune your position to balance the frame",
            Direction::Right,
            intensity(2),
            "Balances the composition",
        )
    };

    vec![
        Suggestion::new(
            "Shift your angle to find a stronger composition",
            Direction::Left,
            Intensity::DEFAULT,
            "Improves the composition",
        ),
        Suggestion::new(
            "Lower the phone and try a different height",
            Direction::Down,
            intensity(2),
            "Adds a fresh viewpoint",
        ),
        Suggestion::new(
            "Zoom in slightly to emphasise the subject",
            Direction::Up,
            intensity(2),
            "Makes the subject stand out",
        ),
        last,
    ]
}

/// Turn advisor text into a never-empty suggestion set.
pub fn interpret(text: &str, tier: BrightnessTier) -> ValidatedAdvice {
    match parse_advice(text) {
        AdviceParse::Parsed(suggestions) if !suggestions.is_empty() => ValidatedAdvice {
            suggestions,
            source: AdviceSource::Structured,
        },
        AdviceParse::Parsed(_) => ValidatedAdvice {
            suggestions: fallback_suggestions(tier),
            source: AdviceSource::Fallback,
        },
        AdviceParse::Unparseable(raw) => {
            if is_refusal(&raw) {
                return ValidatedAdvice {
                    suggestions: fallback_suggestions(tier),
                    source: AdviceSource::Refusal,
                };
            }

            let recovered = heuristic_suggestions(&raw);
            if recovered.is_empty() {
                ValidatedAdvice {
                    suggestions: fallback_suggestions(tier),
                    source: AdviceSource::Fallback,
                }
            } else {
                ValidatedAdvice {
                    suggestions: recovered,
                    source: AdviceSource::Heuristic,
                }
            }
        }
    }
}
