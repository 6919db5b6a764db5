use super::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontWeight {
    Normal,
    Bold,
}

impl FontWeight {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Bold => "bold",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontSlant {
    Normal,
    Italic,
}

impl FontSlant {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Italic => "italic",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Style {
    pub family: String,
    pub size: f64,
    pub weight: Option<FontWeight>,
    pub slant: FontSlant,
    pub fill: Option<String>,
    pub stroke: Option<String>,
}

impl PartialEq for Style {
    fn eq(&self, other: &Self) -> bool {
        self.family == other.family
            && self.size == other.size
            && self.weight == other.weight
            && self.fill == other.fill
            && self.stroke == other.stroke
    }
}

pub fn round_to(value: f64, places: u32) -> f64 {
    let scale = 10_f64.powi(places as i32);
    (value * scale).round() / scale
}

pub fn normalize_font_name(name: &str) -> &str {
    match name.split_once('+') {
        Some((prefix, rest))
            if prefix.len() == 6 && prefix.chars().all(|ch| ch.is_ascii_uppercase()) =>
        {
            rest
        }
        _ => name,
    }
}

impl Style {
    pub fn from_glyph(glyph: &GlyphRecord, size_precision: u32) -> Self {
        let family = normalize_font_name(&glyph.font_name).to_string();
        let bold = family.contains("Bold") || family.contains(".B");
        let italic =
            family.contains("Italic") || family.contains("Oblique") || family.contains(".I");

        Self {
            size: round_to(glyph.font_height, size_precision),
            weight: Some(if bold {
                FontWeight::Bold
            } else {
                FontWeight::Normal
            }),
            slant: if italic {
                FontSlant::Italic
            } else {
                FontSlant::Normal
            },
            fill: glyph.fill_color.clone(),
            stroke: glyph.stroke_color.clone(),
            family,
        }
    }

    pub fn is_italic(&self) -> bool {
        self.slant == FontSlant::Italic
    }

    pub fn css(&self) -> String {
        let mut parts = vec![
            format!("font-size: {}px", self.size),
            format!("font-family: {}", self.family),
        ];
        if let Some(weight) = self.weight {
            parts.push(format!("font-weight: {}", weight.as_str()));
        }
        if self.is_italic() {
            parts.push(format!("font-style: {}", self.slant.as_str()));
        }
        if let Some(fill) = &self.fill {
            parts.push(format!("color: {fill}"));
        }
        if let Some(stroke) = &self.stroke {
            parts.push(format!("stroke: {stroke}"));
        }
        parts.join("; ") + ";"
    }

    pub fn difference(&self, other: &Style) -> Vec<String> {
        let mut diffs = Vec::new();
        if self.family != other.family {
            diffs.push(format!("family {} != {}", self.family, other.family));
        }
        if self.size != other.size {
            diffs.push(format!("size {} != {}", self.size, other.size));
        }
        if self.weight != other.weight {
            diffs.push(format!("weight {:?} != {:?}", self.weight, other.weight));
        }
        if self.fill != other.fill {
            diffs.push(format!("fill {:?} != {:?}", self.fill, other.fill));
        }
        if self.stroke != other.stroke {
            diffs.push(format!("stroke {:?} != {:?}", self.stroke, other.stroke));
        }
        diffs
    }
}
