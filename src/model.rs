use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlyphDocument {
    #[serde(default)]
    pub source: Option<String>,
    pub pages: Vec<GlyphPage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlyphPage {
    pub page_number: u32,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub glyphs: Vec<GlyphRecord>,
    #[serde(default)]
    pub rects: Vec<RectRecord>,
    #[serde(default)]
    pub curves: Vec<CurveRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlyphRecord {
    pub x0: f64,
    pub x1: f64,
    pub y0: f64,
    pub y1: f64,
    pub font_name: String,
    pub font_height: f64,
    #[serde(default)]
    pub fill_color: Option<String>,
    #[serde(default)]
    pub stroke_color: Option<String>,
    pub text: String,
    #[serde(default)]
    pub transform: Option<[f64; 6]>,
}

impl GlyphRecord {
    pub fn is_rotated(&self) -> bool {
        match self.transform {
            Some([_, b, c, _, _, _]) => b != 0.0 || c != 0.0,
            None => false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RectRecord {
    pub x0: f64,
    pub y0: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub fill_color: Option<String>,
    #[serde(default)]
    pub stroke_color: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurveRecord {
    pub points: Vec<[f64; 2]>,
    #[serde(default)]
    pub stroke_color: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceHash {
    pub path: String,
    pub sha256: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunCounts {
    pub pages_total: usize,
    pub pages_assembled: usize,
    pub pages_failed: usize,
    pub spans: usize,
    pub lines: usize,
    pub paragraphs: usize,
    pub header_spans: usize,
    pub footer_spans: usize,
    pub tagged_spans: usize,
    pub unmatched_spans: usize,
    pub targets: usize,
    pub unparsed_targets: usize,
    pub link_rows: usize,
    pub bad_links: usize,
    pub fetches: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunManifest {
    pub manifest_version: u32,
    pub run_id: String,
    pub command: String,
    pub status: String,
    pub started_at: String,
    pub updated_at: String,
    pub inputs: Vec<SourceHash>,
    pub outputs: Vec<String>,
    pub counts: RunCounts,
    pub warnings: Vec<String>,
}
