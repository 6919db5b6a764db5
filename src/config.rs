use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::layout::BoundingBox;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub style: StyleConfig,
    pub spans: SpanConfig,
    pub lines: LineConfig,
    pub paragraphs: ParagraphConfig,
    pub joiner: JoinerConfig,
    pub scripts: ScriptConfig,
    pub decorations: DecorationConfig,
    pub tagging: TaggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleConfig {
    pub size_precision: u32,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self { size_precision: 2 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpanConfig {
    pub baseline_epsilon: f64,
    pub include_rotated: bool,
    pub clip: Option<BoundingBox>,
}

impl Default for SpanConfig {
    fn default() -> Self {
        Self {
            baseline_epsilon: 0.1,
            include_rotated: false,
            clip: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LineConfig {
    pub x_margin: f64,
}

impl Default for LineConfig {
    fn default() -> Self {
        Self { x_margin: 20.0 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ParagraphConfig {
    pub interpara_factor: f64,
    pub gap_precision: u32,
}

impl Default for ParagraphConfig {
    fn default() -> Self {
        Self {
            interpara_factor: 1.5,
            gap_precision: 2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JoinerConfig {
    pub header_height: f64,
    pub footer_height: f64,
    pub paragraph_separator_factor: f64,
    pub baseline_epsilon: f64,
    pub bullet_chars: Vec<char>,
}

impl Default for JoinerConfig {
    fn default() -> Self {
        Self {
            header_height: 70.0,
            footer_height: 70.0,
            paragraph_separator_factor: 1.4,
            baseline_epsilon: 0.1,
            bullet_chars: vec!['\u{25CF}', '\u{00B7}'],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptConfig {
    pub size_ratio: f64,
    pub offset_fraction: f64,
}

impl Default for ScriptConfig {
    fn default() -> Self {
        Self {
            size_ratio: 0.9,
            offset_fraction: 0.15,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DecorationConfig {
    pub max_thickness: f64,
    pub max_curves: usize,
    pub max_curve_points: usize,
}

impl Default for DecorationConfig {
    fn default() -> Self {
        Self {
            max_thickness: 1.0,
            max_curves: 500,
            max_curve_points: 200,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TaggingConfig {
    pub max_splits: usize,
}

impl Default for TaggingConfig {
    fn default() -> Self {
        Self { max_splits: 10 }
    }
}

impl PipelineConfig {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let raw = fs::read(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config: PipelineConfig = serde_json::from_slice(&raw)
            .with_context(|| format!("failed to parse config {}", path.display()))?;
        Ok(config)
    }
}
