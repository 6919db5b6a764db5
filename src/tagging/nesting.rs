use super::*;

#[derive(Debug, Clone, Default, Serialize)]
pub struct NestReport {
    pub sections: usize,
    pub attached: usize,
    pub unexpected_parent: usize,
}

struct OpenSection {
    level: usize,
    rule: String,
    element: Element,
}

fn section_rule<'r>(container: &Element, rules: &'r RuleTable) -> Option<&'r MarkupRule> {
    container
        .children
        .iter()
        .find(|child| child.kind.is_inline_text())
        .and_then(|child| child.attr("class"))
        .and_then(|class| rules.by_class(class))
}

fn flatten_pages(body: &mut Element) -> Vec<Element> {
    let mut flat = Vec::new();
    for child in std::mem::take(&mut body.children) {
        if child.kind == ElementKind::Div && child.has_class("page") {
            flat.extend(child.children);
        } else {
            flat.push(child);
        }
    }
    flat
}

fn close_top(stack: &mut Vec<OpenSection>, top_level: &mut Vec<Element>) {
    if let Some(closed) = stack.pop() {
        match stack.last_mut() {
            Some(parent) => parent.element.push(closed.element),
            None => top_level.push(closed.element),
        }
    }
}

pub fn nest_sections(document: &mut Document, rules: &RuleTable) -> NestReport {
    let mut report = NestReport::default();
    let mut stack: Vec<OpenSection> = Vec::new();
    let mut top_level = Vec::new();

    for mut container in flatten_pages(&mut document.body) {
        let rule = if container.kind == ElementKind::Div {
            section_rule(&container, rules)
        } else {
            None
        };

        let Some(rule) = rule else {
            match stack.last_mut() {
                Some(open) => {
                    open.element.push(container);
                    report.attached += 1;
                }
                None => top_level.push(container),
            }
            continue;
        };

        while stack.last().is_some_and(|open| open.level >= rule.level) {
            close_top(&mut stack, &mut top_level);
        }

        if let Some(parent) = stack.last()
            && !rule.parents.is_empty()
            && !rule.parents.contains(&parent.rule)
        {
            warn!(
                section = %rule.name,
                parent = %parent.rule,
                "section nested under an undeclared parent"
            );
            report.unexpected_parent += 1;
        }

        container.set_attr("data-level", rule.name.clone());
        report.sections += 1;
        stack.push(OpenSection {
            level: rule.level,
            rule: rule.name.clone(),
            element: container,
        });
    }

    while !stack.is_empty() {
        close_top(&mut stack, &mut top_level);
    }
    document.body.children = top_level;

    info!(
        sections = report.sections,
        attached = report.attached,
        unexpected_parent = report.unexpected_parent,
        "nested sections"
    );
    report
}
