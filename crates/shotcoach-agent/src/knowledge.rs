//! Photography tip base injected into prompts.
//!
//! The file is a flat JSON object mapping a topic to a one-line tip. Topics
//! are kept sorted so prompt contents are reproducible.

use std::collections::BTreeMap;
use std::path::Path;

use tracing::{info, warn};

const ADVICE_TIPS: usize = 5;
const LEVEL_TIPS: usize = 4;

const ADVICE_KEYWORDS: &[&str] = &[
    "构图", "光线", "角度", "人像", "风景", "色彩", "技巧", "拍摄", "摄影", "视角", "背景", "前景", "对比",
    "层次", "composition", "light", "angle", "portrait", "landscape", "color", "colour", "technique",
    "perspective", "background", "foreground", "contrast", "depth",
];

const LEVEL_KEYWORDS: &[&str] = &[
    "水平", "构图", "稳定", "平衡", "对称", "辅助线", "参考线", "视觉", "倾斜", "横平竖直", "视角", "重心",
    "level", "horizon", "composition", "stable", "balance", "symmetry", "grid", "guide", "tilt",
];

/// Topic groups tried first for level checks, in order.
const LEVEL_PRIORITY: &[&[&str]] = &[
    &["水平", "level", "horizon"],
    &["辅助线", "grid", "guide"],
    &["对称", "symmetry"],
    &["稳定", "stable"],
    &["构图", "composition"],
];

const DEFAULT_ADVICE_TIPS: &str = "Use basic composition principles: rule of thirds, clear subject, clean background";

const DEFAULT_LEVEL_TIPS: &str = "• Keep the camera level to avoid a crooked frame and a steadier picture
• Grid lines help judge whether horizontals and verticals are straight
• Symmetric compositions reveal left/right tilt immediately
• Visual balance is a key cue when judging levelness";

/// Topic→tip knowledge base.
#[derive(Debug, Clone, Default)]
pub struct KnowledgeBase {
    tips: BTreeMap<String, String>,
}

impl KnowledgeBase {
    pub fn from_map(tips: BTreeMap<String, String>) -> Self {
        Self { tips }
    }

    /// Load from disk; a missing or unreadable file yields an empty base.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(raw) => match serde_json::from_str::<BTreeMap<String, String>>(&raw) {
                Ok(tips) => {
                    info!(path = %path.display(), tips = tips.len(), "Loaded knowledge base");
                    Self { tips }
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Knowledge base is not a topic→tip map, ignoring");
                    Self::default()
                }
            },
            Err(e) => {
                info!(path = %path.display(), error = %e, "No knowledge base loaded");
                Self::default()
            }
        }
    }

    pub fn len(&self) -> usize {
        self.tips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tips.is_empty()
    }

    /// Up to five tips on composition, light and angle for suggestion prompts.
    pub fn advice_tips(&self) -> String {
        if self.tips.is_empty() {
            return DEFAULT_ADVICE_TIPS.to_string();
        }

        let relevant: Vec<&String> = self
            .tips
            .keys()
            .filter(|topic| matches_any(topic, ADVICE_KEYWORDS))
            .take(ADVICE_TIPS)
            .collect();

        let selected = if relevant.is_empty() {
            self.tips.keys().take(ADVICE_TIPS).collect()
        } else {
            relevant
        };

        self.bullets(&selected).unwrap_or_else(|| DEFAULT_ADVICE_TIPS.to_string())
    }

    /// Up to four tips for the level-only check, levelness topics first.
    pub fn level_tips(&self) -> String {
        let relevant: Vec<&String> = self
            .tips
            .keys()
            .filter(|topic| matches_any(topic, LEVEL_KEYWORDS))
            .collect();

        let mut selected: Vec<&String> = Vec::with_capacity(LEVEL_TIPS);
        for group in LEVEL_PRIORITY {
            for topic in relevant.iter().filter(|t| matches_any(t, group)) {
                if selected.len() >= LEVEL_TIPS {
                    break;
                }
                if !selected.contains(topic) {
                    selected.push(*topic);
                }
            }
        }
        for topic in &relevant {
            if selected.len() >= LEVEL_TIPS {
                break;
            }
            if !selected.contains(topic) {
                selected.push(*topic);
            }
        }

        self.bullets(&selected).unwrap_or_else(|| DEFAULT_LEVEL_TIPS.to_string())
    }

    fn bullets(&self, topics: &[&String]) -> Option<String> {
        let lines: Vec<String> = topics
            .iter()
            .filter_map(|topic| self.tips.get(*topic))
            .map(|tip| format!("• {}", tip.trim()))
            .collect();
        if lines.is_empty() {
            None
        } else {
            Some(lines.join("\n"))
        }
    }
}

fn matches_any(topic: &str, keywords: &[&str]) -> bool {
    let lower = topic.to_lowercase();
    keywords.iter().any(|k| lower.contains(k))
}
