use std::cmp::Ordering;

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::{JoinerConfig, PipelineConfig, ScriptConfig};
use crate::model::{CurveRecord, GlyphDocument, GlyphPage, GlyphRecord, RectRecord};
use crate::tree::{Document, Element, ElementKind};

mod decoration;
mod geometry;
mod joiner;
mod line;
mod page;
mod paragraph;
mod span;
mod style;

pub use decoration::{convert_curves, convert_rects, decorations_element};
pub use geometry::BoundingBox;
pub use joiner::{PageBands, PageStreamJoiner, STREAM_STYLES};
pub use line::{
    CompositeLine, ScriptPosition, build_lines, classify_scripts, sort_reading_order,
};
pub use page::{
    AssembledDocument, AssemblyPath, PageOutput, PageSelection, assemble_document,
};
pub use paragraph::segment_paragraphs;
pub use span::{Span, assemble_spans};
pub use style::{Style, round_to};
