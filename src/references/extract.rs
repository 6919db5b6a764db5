use super::*;

const TEXT_PREFIX_CHARS: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetRow {
    pub paragraph_id: Option<String>,
    pub section_id: Option<String>,
    #[serde(flatten)]
    pub target: Target,
    pub text_prefix: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct TargetExtraction {
    pub rows: Vec<TargetRow>,
    pub containers: usize,
    pub unparsed: usize,
}

impl TargetExtraction {
    pub fn unparsed_fraction(&self) -> f64 {
        if self.rows.is_empty() {
            0.0
        } else {
            self.unparsed as f64 / self.rows.len() as f64
        }
    }
}

fn is_text_container(element: &Element) -> bool {
    element
        .children
        .iter()
        .any(|child| child.kind.is_inline_text())
}

fn text_prefix(text: &str) -> String {
    text.chars().take(TEXT_PREFIX_CHARS).collect()
}

pub fn extract_targets(document: &Document, parser: &TargetParser) -> Result<TargetExtraction> {
    let curly = Regex::new(r"\{([^{}]*)\}").context("failed to compile curly group regex")?;
    let section_label =
        Regex::new(r"^(?:[A-Z]|\d)(?:\.\d+)*$").context("failed to compile section label regex")?;

    let mut extraction = TargetExtraction::default();
    let mut last_section: Option<String> = None;

    document.body.for_each_container(&mut |container| {
        if !is_text_container(container) {
            return;
        }
        extraction.containers += 1;

        if let Some(first) = container
            .children
            .iter()
            .find(|child| child.kind.is_inline_text())
        {
            let label = first.text_content();
            let label = label.trim();
            if section_label.is_match(label) {
                last_section = Some(label.to_string());
            }
        }

        let text = container.text_content();
        for group in curly_groups(&text, &curly) {
            let group = parser.add_missing_commas(&group);
            for clause in parser.split_clauses(&group) {
                let target = parser.parse_normalized(&clause);
                if !target.is_fully_parsed() {
                    extraction.unparsed += 1;
                }
                extraction.rows.push(TargetRow {
                    paragraph_id: container.id().map(str::to_string),
                    section_id: last_section.clone(),
                    target,
                    text_prefix: text_prefix(&text),
                });
            }
        }
    });

    info!(
        containers = extraction.containers,
        targets = extraction.rows.len(),
        unparsed = extraction.unparsed,
        "extracted citation targets"
    );
    Ok(extraction)
}

pub fn commonest(rows: &[TargetRow], field: TargetField) -> Vec<(String, usize)> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for row in rows {
        let value = row.target.field(field);
        if !value.is_empty() {
            *counts.entry(value).or_default() += 1;
        }
    }

    let mut common: Vec<(String, usize)> = counts
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|(value, count)| (value.to_string(), count))
        .collect();
    common.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    common
}
