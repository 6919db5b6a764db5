use super::*;

#[derive(Debug, Clone, Copy)]
pub struct TaggerOptions {
    pub split: bool,
    pub max_splits: usize,
    pub span_range: Option<(usize, usize)>,
}

impl Default for TaggerOptions {
    fn default() -> Self {
        Self {
            split: false,
            max_splits: 10,
            span_range: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct TagReport {
    pub tagged: usize,
    pub splits: usize,
    pub binding_errors: usize,
    pub class_counts: BTreeMap<String, usize>,
    pub unmatched: BTreeMap<String, usize>,
}

impl TagReport {
    pub fn unmatched_total(&self) -> usize {
        self.unmatched.values().sum()
    }

    pub fn most_common_unmatched(&self, limit: usize) -> Vec<(&str, usize)> {
        let mut entries: Vec<(&str, usize)> = self
            .unmatched
            .iter()
            .map(|(text, count)| (text.as_str(), *count))
            .collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        entries.truncate(limit);
        entries
    }
}

pub struct SectionTagger<'a> {
    rules: &'a RuleTable,
    options: TaggerOptions,
}

impl<'a> SectionTagger<'a> {
    pub fn new(rules: &'a RuleTable, options: TaggerOptions) -> Self {
        Self { rules, options }
    }

    pub fn tag_document(&self, document: &mut Document) -> Result<TagReport, ContractError> {
        let mut report = TagReport::default();
        let mut failure = None;

        document.body.for_each_container_mut(&mut |container| {
            if failure.is_some() {
                return;
            }
            if let Err(err) = self.tag_container(container, &mut report) {
                failure = Some(err);
            }
        });
        if let Some(err) = failure {
            return Err(err);
        }

        for style in self.rules.head_styles() {
            document.add_style(style);
        }
        info!(
            tagged = report.tagged,
            splits = report.splits,
            unmatched = report.unmatched_total(),
            binding_errors = report.binding_errors,
            "tagged document"
        );
        Ok(report)
    }

    fn eligible(&self, rule: &MarkupRule, ordinal: usize) -> bool {
        let caller_allows = self
            .options
            .span_range
            .is_none_or(|(lo, hi)| lo <= ordinal && ordinal < hi);
        caller_allows && rule.in_range(ordinal)
    }

    pub fn tag_container(
        &self,
        container: &mut Element,
        report: &mut TagReport,
    ) -> Result<(), ContractError> {
        container.ensure_kind(ElementKind::Div, "tag_container")?;
        if self.options.split {
            return self.tag_fragments(container, report);
        }

        let mut ordinal = 0;
        for span in container
            .children
            .iter_mut()
            .filter(|child| child.kind == ElementKind::Span)
        {
            self.classify_span(span, ordinal, report);
            ordinal += 1;
        }
        Ok(())
    }

    fn classify_span(&self, span: &mut Element, ordinal: usize, report: &mut TagReport) {
        for rule in self.rules.iter() {
            if !self.eligible(rule, ordinal) {
                continue;
            }
            let Some(found) = try_rule(rule, &span.text, report) else {
                continue;
            };
            record(rule, report);
            stamp(span, rule, &found);
            return;
        }
        count_unmatched(&span.text, report);
    }

    // Each rule sees every fragment left untagged by the rules before it.
    fn tag_fragments(
        &self,
        container: &mut Element,
        report: &mut TagReport,
    ) -> Result<(), ContractError> {
        let mut slots = Vec::with_capacity(container.children.len());
        let mut ordinal = 0;
        for child in &container.children {
            if child.kind == ElementKind::Span {
                slots.push(Some(Slot {
                    ordinal,
                    claimed: false,
                }));
                ordinal += 1;
            } else {
                slots.push(None);
            }
        }
        let mut splits = vec![0usize; ordinal];

        for rule in self.rules.iter() {
            let mut index = 0;
            while index < container.children.len() {
                let Some(slot) = slots[index]
                    .filter(|slot| !slot.claimed && self.eligible(rule, slot.ordinal))
                else {
                    index += 1;
                    continue;
                };
                let Some(found) = try_rule(rule, &container.children[index].text, report) else {
                    index += 1;
                    continue;
                };

                if !rule.split {
                    record(rule, report);
                    stamp(&mut container.children[index], rule, &found);
                    slots[index] = Some(Slot {
                        claimed: true,
                        ..slot
                    });
                    index += 1;
                    continue;
                }
                if splits[slot.ordinal] >= self.options.max_splits {
                    index += 1;
                    continue;
                }

                record(rule, report);
                let claimed = split_span(container, index, rule, &found)?;
                splits[slot.ordinal] += 1;
                report.splits += 1;
                slots.splice(
                    index..=index,
                    claimed.into_iter().map(|claimed| {
                        Some(Slot {
                            ordinal: slot.ordinal,
                            claimed,
                        })
                    }),
                );
                // The pre fragment is looked at again; the hit is claimed.
            }
        }

        for (child, slot) in container.children.iter().zip(&slots) {
            if slot.is_some_and(|slot| !slot.claimed) {
                count_unmatched(&child.text, report);
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
struct Slot {
    ordinal: usize,
    claimed: bool,
}

fn try_rule(rule: &MarkupRule, text: &str, report: &mut TagReport) -> Option<RuleMatch> {
    match rule.apply(text)? {
        Ok(found) => Some(found),
        Err(err) => {
            debug!(rule = %rule.name, error = %err, "template binding failed");
            report.binding_errors += 1;
            None
        }
    }
}

fn record(rule: &MarkupRule, report: &mut TagReport) {
    report.tagged += 1;
    *report.class_counts.entry(rule.class.clone()).or_default() += 1;
}

fn count_unmatched(text: &str, report: &mut TagReport) {
    let key = text.trim();
    if !key.is_empty() {
        *report.unmatched.entry(key.to_string()).or_default() += 1;
    }
}

fn stamp(element: &mut Element, rule: &MarkupRule, found: &RuleMatch) {
    element.set_attr("class", rule.class.clone());
    if let Some(background) = rule.background_style() {
        let style = match element.attr("style") {
            Some(existing) if !existing.is_empty() => format!("{existing} {background}"),
            _ => background,
        };
        element.set_attr("style", style);
    }
    if let Some(id) = &found.id {
        element.set_attr("id", id.clone());
    }
}

fn fragment(original: &Element, text: &str) -> Element {
    let mut element = Element::with_text(ElementKind::Span, text);
    element.attributes = original.attributes.clone();
    element.remove_attr("id");
    element
}

fn split_span(
    container: &mut Element,
    index: usize,
    rule: &MarkupRule,
    found: &RuleMatch,
) -> Result<Vec<bool>, ContractError> {
    let original = &container.children[index];
    original.ensure_kind(ElementKind::Span, "split_span")?;
    let text = &original.text;

    let pre = &text[..found.start];
    let hit = &text[found.start..found.end];
    let post = &text[found.end..];

    let mut fragments = Vec::with_capacity(3);
    let mut claimed = Vec::with_capacity(3);
    if !pre.is_empty() {
        fragments.push(fragment(original, pre));
        claimed.push(false);
    }

    let mut matched = fragment(original, hit);
    stamp(&mut matched, rule, found);
    if let Some(href) = &found.href {
        let mut anchor = Element::with_text(ElementKind::A, std::mem::take(&mut matched.text));
        anchor.set_attr("href", href.clone());
        matched.push(anchor);
    }
    fragments.push(matched);
    claimed.push(true);

    if !post.is_empty() {
        fragments.push(fragment(original, post));
        claimed.push(false);
    }

    container.children.splice(index..=index, fragments);
    Ok(claimed)
}
