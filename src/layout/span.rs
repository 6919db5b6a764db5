use super::*;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Span {
    pub style: Style,
    pub text: String,
    pub x0: f64,
    pub x1: f64,
    pub y: f64,
}

impl Span {
    pub fn bbox(&self) -> BoundingBox {
        BoundingBox::new(self.x0, self.y, self.x1, self.y + self.style.size)
    }

    fn extend(&mut self, glyph: &GlyphRecord) {
        self.text.push_str(&glyph.text);
        self.x1 = self.x1.max(glyph.x1);
    }

    pub fn to_element(&self, position: ScriptPosition) -> Element {
        let kind = match position {
            ScriptPosition::Normal => ElementKind::Span,
            ScriptPosition::Superscript => ElementKind::Sup,
            ScriptPosition::Subscript => ElementKind::Sub,
        };
        let mut element = Element::with_text(kind, self.text.clone());
        element.set_attr("x0", format!("{}", round_to(self.x0, 2)));
        element.set_attr("x1", format!("{}", round_to(self.x1, 2)));
        element.set_attr("y0", format!("{}", round_to(self.y, 2)));
        element.set_attr("style", self.style.css());
        element
    }
}

#[derive(Debug, Default, Clone)]
pub struct SpanStats {
    pub glyphs_seen: usize,
    pub rotated_skipped: usize,
    pub clipped: usize,
    pub whitespace_dropped: usize,
}

#[derive(Default)]
struct SpanAccumulator {
    spans: Vec<Span>,
    stats: SpanStats,
}

impl SpanAccumulator {
    fn same_baseline(&self, y: f64, epsilon: f64) -> Option<usize> {
        let last = self.spans.len().checked_sub(1)?;
        ((self.spans[last].y - y).abs() <= epsilon).then_some(last)
    }

    fn accept(mut self, glyph: &GlyphRecord, config: &PipelineConfig) -> Self {
        let epsilon = config.spans.baseline_epsilon;

        if glyph.text.trim().is_empty() {
            match self.same_baseline(glyph.y0, epsilon) {
                Some(index) => self.spans[index].extend(glyph),
                None => self.stats.whitespace_dropped += 1,
            }
            return self;
        }

        let style = Style::from_glyph(glyph, config.style.size_precision);
        let baseline = self.same_baseline(glyph.y0, epsilon);
        if let Some(index) = baseline
            && self.spans[index].style != style
        {
            debug!(
                text = %glyph.text,
                changes = ?self.spans[index].style.difference(&style),
                "style break on shared baseline"
            );
        }
        let continues = baseline.filter(|index| self.spans[*index].style == style);

        match continues {
            Some(index) => self.spans[index].extend(glyph),
            None => self.spans.push(Span {
                style,
                text: glyph.text.clone(),
                x0: glyph.x0,
                x1: glyph.x1,
                y: glyph.y0,
            }),
        }
        self
    }
}

pub fn assemble_spans(glyphs: &[GlyphRecord], config: &PipelineConfig) -> (Vec<Span>, SpanStats) {
    let clip = config.spans.clip;
    let include_rotated = config.spans.include_rotated;

    let mut skipped = SpanStats::default();
    let accumulator = glyphs
        .iter()
        .filter(|glyph| {
            skipped.glyphs_seen += 1;
            if !include_rotated && glyph.is_rotated() {
                skipped.rotated_skipped += 1;
                return false;
            }
            if let Some(clip) = clip
                && !clip.contains_point(glyph.x0, glyph.y0)
            {
                skipped.clipped += 1;
                return false;
            }
            true
        })
        .fold(SpanAccumulator::default(), |acc, glyph| acc.accept(glyph, config));

    let stats = SpanStats {
        whitespace_dropped: accumulator.stats.whitespace_dropped,
        ..skipped
    };
    (accumulator.spans, stats)
}
