use super::*;

pub const POSITIONAL_ATTRIBUTES: [&str; 7] = ["x0", "x1", "y0", "y1", "top", "left", "right"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    Body,
    Div,
    Span,
    Sup,
    Sub,
    A,
    Br,
}

impl ElementKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Body => "body",
            Self::Div => "div",
            Self::Span => "span",
            Self::Sup => "sup",
            Self::Sub => "sub",
            Self::A => "a",
            Self::Br => "br",
        }
    }

    pub fn is_void(self) -> bool {
        matches!(self, Self::Br)
    }

    pub fn is_inline_text(self) -> bool {
        matches!(self, Self::Span | Self::Sup | Self::Sub | Self::A)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub kind: ElementKind,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub attributes: IndexMap<String, String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Element>,
}

impl Element {
    pub fn new(kind: ElementKind) -> Self {
        Self {
            kind,
            attributes: IndexMap::new(),
            text: String::new(),
            children: Vec::new(),
        }
    }

    pub fn with_text(kind: ElementKind, text: impl Into<String>) -> Self {
        let mut element = Self::new(kind);
        element.text = text.into();
        element
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        self.attributes.insert(name.to_string(), value.into());
    }

    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        self.attributes.shift_remove(name)
    }

    pub fn id(&self) -> Option<&str> {
        self.attr("id").filter(|value| !value.is_empty())
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .map(|value| value.split_whitespace().any(|item| item == class))
            .unwrap_or(false)
    }

    pub fn push(&mut self, child: Element) {
        self.children.push(child);
    }

    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        out.push_str(&self.text);
        for child in &self.children {
            child.collect_text(out);
        }
    }

    pub fn ensure_kind(
        &self,
        expected: ElementKind,
        operation: &'static str,
    ) -> Result<(), ContractError> {
        if self.kind == expected {
            Ok(())
        } else {
            Err(ContractError {
                operation,
                expected: expected.as_str(),
                found: self.kind.as_str(),
            })
        }
    }

    pub fn count_kind(&self, kind: ElementKind) -> usize {
        let own = usize::from(self.kind == kind);
        own + self
            .children
            .iter()
            .map(|child| child.count_kind(kind))
            .sum::<usize>()
    }

    pub fn strip_attributes(&mut self, names: &[&str]) {
        for name in names {
            self.attributes.shift_remove(*name);
        }
        for child in &mut self.children {
            child.strip_attributes(names);
        }
    }

    pub fn for_each_container<'a>(&'a self, visit: &mut dyn FnMut(&'a Element)) {
        if self.kind == ElementKind::Div {
            visit(self);
        }
        for child in &self.children {
            child.for_each_container(visit);
        }
    }

    pub fn for_each_container_mut(&mut self, visit: &mut dyn FnMut(&mut Element)) {
        if self.kind == ElementKind::Div {
            visit(self);
        }
        for child in &mut self.children {
            child.for_each_container_mut(visit);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub styles: Vec<String>,
    pub body: Element,
}

impl Default for Document {
    fn default() -> Self {
        Self {
            title: None,
            styles: Vec::new(),
            body: Element::new(ElementKind::Body),
        }
    }
}

impl Document {
    pub fn add_style(&mut self, declaration: impl Into<String>) {
        let declaration = declaration.into();
        if !self.styles.contains(&declaration) {
            self.styles.push(declaration);
        }
    }

    pub fn strip_positional_attributes(&mut self) {
        self.body.strip_attributes(&POSITIONAL_ATTRIBUTES);
    }
}
