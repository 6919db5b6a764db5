use super::*;

use crate::config::ParagraphConfig;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paragraph {
    pub lines: Vec<CompositeLine>,
}

impl Paragraph {
    #[cfg(test)]
    pub fn text(&self) -> String {
        self.lines
            .iter()
            .map(CompositeLine::text)
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn bbox(&self) -> Option<BoundingBox> {
        self.lines
            .iter()
            .map(|line| line.bbox)
            .reduce(|acc, bbox| acc.union(&bbox))
    }

    pub fn to_element(&self, scripts: &ScriptConfig) -> Element {
        let mut div = Element::new(ElementKind::Div);
        div.set_attr("class", "para");
        if let Some(bbox) = self.bbox() {
            div.set_attr("left", format!("{}", round_to(bbox.x0, 2)));
            div.set_attr("right", format!("{}", round_to(bbox.x1, 2)));
            div.set_attr("top", format!("{}", round_to(bbox.y1, 2)));
        }
        for (index, line) in self.lines.iter().enumerate() {
            if index > 0 {
                div.push(Element::new(ElementKind::Br));
            }
            let positions = classify_scripts(line, scripts);
            for (span, position) in line.spans.iter().zip(positions) {
                div.push(span.to_element(position));
            }
        }
        div
    }
}

pub fn line_gaps(lines: &[CompositeLine], precision: u32) -> Vec<f64> {
    lines
        .windows(2)
        .map(|pair| round_to(pair[0].bbox.y0 - pair[1].bbox.y0, precision))
        .collect()
}

pub fn gap_mode(gaps: &[f64], precision: u32) -> Option<f64> {
    let scale = 10_f64.powi(precision as i32);
    let mut tallies: Vec<(i64, usize)> = Vec::new();

    for gap in gaps {
        let key = (gap * scale).round() as i64;
        match tallies.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, count)) => *count += 1,
            None => tallies.push((key, 1)),
        }
    }

    // Ties keep the gap seen first.
    let mut best: Option<(i64, usize)> = None;
    for (key, count) in tallies {
        if best.is_none_or(|(_, best_count)| count > best_count) {
            best = Some((key, count));
        }
    }
    best.map(|(key, _)| key as f64 / scale)
}

pub fn paragraph_threshold(lines: &[CompositeLine], config: &ParagraphConfig) -> Option<f64> {
    let gaps = line_gaps(lines, config.gap_precision);
    gap_mode(&gaps, config.gap_precision).map(|mode| mode * config.interpara_factor)
}

pub fn segment_paragraphs(lines: Vec<CompositeLine>, config: &ParagraphConfig) -> Vec<Paragraph> {
    if lines.is_empty() {
        return Vec::new();
    }

    let gaps = line_gaps(&lines, config.gap_precision);
    let Some(threshold) = paragraph_threshold(&lines, config) else {
        return vec![Paragraph { lines }];
    };
    debug!(threshold, lines = lines.len(), "segmenting paragraphs");

    let mut paragraphs = Vec::new();
    let mut current = Vec::new();
    for (index, line) in lines.into_iter().enumerate() {
        if index > 0 && gaps[index - 1] > threshold {
            paragraphs.push(Paragraph {
                lines: std::mem::take(&mut current),
            });
        }
        current.push(line);
    }
    paragraphs.push(Paragraph { lines: current });
    paragraphs
}
