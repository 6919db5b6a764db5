use super::*;

pub fn escape_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}

pub fn escape_attribute(value: &str) -> String {
    escape_text(value).replace('"', "&quot;")
}

pub fn render_document(document: &Document) -> String {
    let mut out = String::new();
    out.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"UTF-8\"/>\n");
    if let Some(title) = &document.title {
        out.push_str("<title>");
        out.push_str(&escape_text(title));
        out.push_str("</title>\n");
    }
    if !document.styles.is_empty() {
        out.push_str("<style>\n");
        for style in &document.styles {
            out.push_str(style);
            out.push('\n');
        }
        out.push_str("</style>\n");
    }
    out.push_str("</head>\n");
    render_element(&document.body, 0, &mut out);
    out.push_str("</html>\n");
    out
}

fn render_element(element: &Element, depth: usize, out: &mut String) {
    let tag = element.kind.as_str();
    let block = matches!(element.kind, ElementKind::Body | ElementKind::Div);

    if block {
        out.push_str(&"  ".repeat(depth));
    }
    out.push('<');
    out.push_str(tag);
    for (name, value) in &element.attributes {
        out.push(' ');
        out.push_str(name);
        out.push_str("=\"");
        out.push_str(&escape_attribute(value));
        out.push('"');
    }

    if element.kind.is_void() {
        out.push_str("/>");
        return;
    }
    out.push('>');
    out.push_str(&escape_text(&element.text));

    let has_block_children = element
        .children
        .iter()
        .any(|child| child.kind == ElementKind::Div);
    for child in &element.children {
        if child.kind == ElementKind::Div {
            out.push('\n');
        }
        render_element(child, depth + 1, out);
    }

    if has_block_children {
        out.push('\n');
        out.push_str(&"  ".repeat(depth));
    }
    out.push_str("</");
    out.push_str(tag);
    out.push('>');
    if element.kind == ElementKind::Body {
        out.push('\n');
    }
}
