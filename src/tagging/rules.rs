use super::*;

pub const DEFAULT_SPAN_RANGE: (usize, usize) = (0, 99_999);

const DECISION_RULES: &str = include_str!("../../rules/decisions.json");
const INLINE_RULES: &str = include_str!("../../rules/inline.json");
const TARGET_RULES: &str = include_str!("../../rules/targets.json");

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    fn to_vec(&self) -> Vec<String> {
        match self {
            Self::One(value) => vec![value.clone()],
            Self::Many(values) => values.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawRule {
    level: usize,
    #[serde(default)]
    parent: Vec<String>,
    regex: OneOrMany,
    class: Option<String>,
    background: Option<String>,
    span_range: Option<(usize, usize)>,
    template: Option<Templater>,
    href_template: Option<Templater>,
    #[serde(default)]
    search: bool,
    #[serde(default)]
    split: bool,
}

#[derive(Debug, Clone)]
pub struct MarkupRule {
    pub name: String,
    pub level: usize,
    pub parents: Vec<String>,
    regexes: Vec<Regex>,
    pub class: String,
    pub background: Option<String>,
    pub span_range: (usize, usize),
    pub template: Option<Templater>,
    pub href_template: Option<Templater>,
    pub search: bool,
    pub split: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleMatch {
    pub start: usize,
    pub end: usize,
    pub id: Option<String>,
    pub href: Option<String>,
}

impl MarkupRule {
    pub fn in_range(&self, ordinal: usize) -> bool {
        self.span_range.0 <= ordinal && ordinal < self.span_range.1
    }

    fn find<'t>(&self, text: &'t str) -> Option<(&Regex, Captures<'t>)> {
        self.regexes.iter().find_map(|regex| {
            let captures = regex.captures(text)?;
            let whole = captures.get(0)?;
            if whole.is_empty() || (!self.search && whole.start() != 0) {
                return None;
            }
            Some((regex, captures))
        })
    }

    fn joined_groups(captures: &Captures<'_>, regex: &Regex) -> Option<String> {
        let values: Vec<&str> = regex
            .capture_names()
            .flatten()
            .filter_map(|name| captures.name(name))
            .map(|value| value.as_str())
            .filter(|value| !value.is_empty())
            .collect();
        (!values.is_empty()).then(|| values.join("_"))
    }

    pub fn apply(&self, text: &str) -> Option<Result<RuleMatch, TemplateError>> {
        let (regex, captures) = self.find(text)?;
        let whole = captures.get(0)?;

        let id = match &self.template {
            Some(template) => match template.render(&captures) {
                Ok(id) => Some(id),
                Err(err) => return Some(Err(err)),
            },
            None => Self::joined_groups(&captures, regex),
        };
        let href = match &self.href_template {
            Some(template) => match template.render(&captures) {
                Ok(href) => Some(href),
                Err(err) => return Some(Err(err)),
            },
            None => None,
        };

        Some(Ok(RuleMatch {
            start: whole.start(),
            end: whole.end(),
            id,
            href,
        }))
    }

    #[cfg(test)]
    pub fn is_match(&self, text: &str) -> bool {
        self.find(text).is_some()
    }

    pub fn background_style(&self) -> Option<String> {
        self.background
            .as_ref()
            .map(|background| format!("background : {background}"))
    }
}

#[derive(Debug, Clone, Default)]
pub struct RuleTable {
    rules: Vec<MarkupRule>,
}

impl RuleTable {
    pub fn from_json(raw: &str) -> Result<Self> {
        let parsed: IndexMap<String, RawRule> =
            serde_json::from_str(raw).context("failed to parse markup rule table")?;
        Ok(Self::from_raw(parsed)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read rule table {}", path.display()))?;
        Self::from_json(&raw).with_context(|| format!("invalid rule table {}", path.display()))
    }

    pub fn decisions() -> Result<Self> {
        Self::from_json(DECISION_RULES)
    }

    pub fn inline_references() -> Result<Self> {
        Self::from_json(INLINE_RULES)
    }

    pub fn citation_targets() -> Result<Self> {
        Self::from_json(TARGET_RULES)
    }

    fn from_raw(parsed: IndexMap<String, RawRule>) -> Result<Self, RuleError> {
        let mut rules = Vec::with_capacity(parsed.len());

        for (name, raw) in &parsed {
            let patterns = raw.regex.to_vec();
            if patterns.is_empty() {
                return Err(RuleError::NoRegex { rule: name.clone() });
            }
            let mut regexes = Vec::with_capacity(patterns.len());
            for pattern in patterns {
                let regex = Regex::new(&pattern).map_err(|source| RuleError::InvalidRegex {
                    rule: name.clone(),
                    pattern: pattern.clone(),
                    source,
                })?;
                regexes.push(regex);
            }

            if let Some(parent) = raw.parent.iter().find(|parent| !parsed.contains_key(*parent)) {
                return Err(RuleError::UnknownParent {
                    rule: name.clone(),
                    parent: parent.clone(),
                });
            }

            let span_range = raw.span_range.unwrap_or(DEFAULT_SPAN_RANGE);
            if span_range.0 > span_range.1 {
                return Err(RuleError::InvertedRange {
                    rule: name.clone(),
                    lo: span_range.0,
                    hi: span_range.1,
                });
            }

            rules.push(MarkupRule {
                name: name.clone(),
                level: raw.level,
                parents: raw.parent.clone(),
                regexes,
                class: raw.class.clone().unwrap_or_else(|| name.clone()),
                background: raw.background.clone(),
                span_range,
                template: raw.template.clone(),
                href_template: raw.href_template.clone(),
                search: raw.search,
                split: raw.split,
            });
        }

        debug!(rules = rules.len(), "loaded markup rule table");
        Ok(Self { rules })
    }

    pub fn iter(&self) -> impl Iterator<Item = &MarkupRule> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    #[cfg(test)]
    pub fn get(&self, name: &str) -> Option<&MarkupRule> {
        self.rules.iter().find(|rule| rule.name == name)
    }

    pub fn by_class(&self, class: &str) -> Option<&MarkupRule> {
        self.rules.iter().find(|rule| rule.class == class)
    }

    pub fn head_styles(&self) -> Vec<String> {
        self.rules
            .iter()
            .filter_map(|rule| {
                rule.background
                    .as_ref()
                    .map(|background| format!(".{} {{background: {background};}}", rule.class))
            })
            .collect()
    }
}
