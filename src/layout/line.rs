use super::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScriptPosition {
    Normal,
    Superscript,
    Subscript,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeLine {
    pub spans: Vec<Span>,
    pub bbox: BoundingBox,
}

impl CompositeLine {
    fn seed(span: Span) -> Self {
        let bbox = span.bbox();
        Self {
            spans: vec![span],
            bbox,
        }
    }

    fn absorb(&mut self, span: Span) {
        self.bbox = self.bbox.union(&span.bbox());
        self.spans.push(span);
    }

    fn merge(&mut self, other: CompositeLine) {
        self.bbox = self.bbox.union(&other.bbox);
        self.spans.extend(other.spans);
        self.spans.sort_by(|a, b| a.x0.total_cmp(&b.x0));
    }

    fn accepts(&self, candidate: &BoundingBox, x_margin: f64) -> bool {
        candidate.expanded_x(x_margin).intersects(&self.bbox)
    }

    #[cfg(test)]
    pub fn text(&self) -> String {
        self.spans.iter().map(|span| span.text.as_str()).collect()
    }
}

// Source y grows upward, so the top of the page sorts first.
pub fn sort_reading_order(spans: &mut [Span]) {
    spans.sort_by(|a, b| match b.y.total_cmp(&a.y) {
        Ordering::Equal => a.x0.total_cmp(&b.x0),
        other => other,
    });
}

pub fn build_lines(spans: Vec<Span>, x_margin: f64) -> Vec<CompositeLine> {
    let mut lines: Vec<CompositeLine> = Vec::new();

    for span in spans {
        match lines.last_mut() {
            Some(line) if line.accepts(&span.bbox(), x_margin) => line.absorb(span),
            _ => lines.push(CompositeLine::seed(span)),
        }
    }

    for line in &mut lines {
        line.spans.sort_by(|a, b| a.x0.total_cmp(&b.x0));
    }

    loop {
        let merge_at = lines
            .windows(2)
            .position(|pair| pair[0].accepts(&pair[1].bbox, x_margin));
        let Some(index) = merge_at else {
            break;
        };
        let next = lines.remove(index + 1);
        debug!(index, "merged overlapping composite lines");
        lines[index].merge(next);
    }

    lines
}

pub fn classify_scripts(line: &CompositeLine, config: &ScriptConfig) -> Vec<ScriptPosition> {
    let spans = &line.spans;
    (0..spans.len())
        .map(|index| {
            let neighbour = if index > 0 {
                spans.get(index - 1)
            } else {
                spans.get(1)
            };
            let Some(neighbour) = neighbour else {
                return ScriptPosition::Normal;
            };
            let span = &spans[index];
            if span.style.size >= neighbour.style.size * config.size_ratio {
                return ScriptPosition::Normal;
            }
            let offset = span.y - neighbour.y;
            let threshold = neighbour.style.size * config.offset_fraction;
            if offset > threshold {
                ScriptPosition::Superscript
            } else if offset < -threshold {
                ScriptPosition::Subscript
            } else {
                ScriptPosition::Normal
            }
        })
        .collect()
}
