use super::*;

const SUBSTITUTIONS: &[(&str, &str)] = &[
    (r"SR\s*1\.5", "SR1.5 "),
    (r"WG1\.", "WG1 "),
    (r"TS\.", "TS "),
    (r"SPM\.", "SPM "),
    (r"\s+", " "),
    (r"WPM", "SPM"),
    (r"WG\s*I", "WGI"),
    (r"Cross-([Cc]hapter)\s*[Bb]ox", "CCBox"),
    (r"Cross-([Ss]ection)\s*[Bb]ox", "CSBox"),
    (r"Cross-([Ww]orking\s+[Gg]roup|WG)\s+[Bb]ox", "CWGBox"),
];

const PACKAGE_PATTERN: &str = r"^(?:WGI+|WG[123]|SR(?:CCL|OCC|1\.?5))";
const SECTION_PATTERN: &str = r"^(?:Chapter|Anne(?:xe)?|SPM|SM|TS|ES|[Ss]ections?)";
const OBJECT_PATTERN: &str = r"^(?:[Ff]ig(?:ure)?|[Tt]ab(?:le)?|[Ff]ootnote|Box|CCBox|CSBox)";
const SUBSECTION_PATTERN: &str = r"^(?:\d+$|[A-F]$|ES|[A-E]?\.?\d+(?:\.\d+)?(?:\.\d+)?)";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    pub raw: String,
    pub package: String,
    pub section: String,
    pub object: String,
    pub subsection: String,
    pub unparsed: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetField {
    Package,
    Section,
    Object,
    Subsection,
    Unparsed,
}

impl TargetField {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Package => "package",
            Self::Section => "section",
            Self::Object => "object",
            Self::Subsection => "subsection",
            Self::Unparsed => "unparsed",
        }
    }
}

impl Target {
    pub fn field(&self, field: TargetField) -> &str {
        match field {
            TargetField::Package => &self.package,
            TargetField::Section => &self.section,
            TargetField::Object => &self.object,
            TargetField::Subsection => &self.subsection,
            TargetField::Unparsed => &self.unparsed,
        }
    }

    pub fn is_fully_parsed(&self) -> bool {
        self.unparsed.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct TargetParser {
    substitutions: Vec<(Regex, &'static str)>,
    package: Regex,
    section: Regex,
    object: Regex,
    subsection: Regex,
    missing_comma: Regex,
    clause_separator: Regex,
}

impl TargetParser {
    pub fn new() -> Result<Self> {
        let mut substitutions = Vec::with_capacity(SUBSTITUTIONS.len());
        for (pattern, replacement) in SUBSTITUTIONS {
            let regex = Regex::new(pattern)
                .with_context(|| format!("failed to compile citation substitution `{pattern}`"))?;
            substitutions.push((regex, *replacement));
        }

        Ok(Self {
            substitutions,
            package: Regex::new(PACKAGE_PATTERN).context("failed to compile package regex")?,
            section: Regex::new(SECTION_PATTERN).context("failed to compile section regex")?,
            object: Regex::new(OBJECT_PATTERN).context("failed to compile object regex")?,
            subsection: Regex::new(SUBSECTION_PATTERN)
                .context("failed to compile subsection regex")?,
            missing_comma: Regex::new(r"([^,;:\s])\s+(WG|SR)")
                .context("failed to compile missing-comma regex")?,
            clause_separator: Regex::new(r"\s*[:;,]\s*")
                .context("failed to compile clause separator regex")?,
        })
    }

    pub fn clean(&self, raw: &str) -> String {
        let mut text = raw.to_string();
        for (regex, replacement) in &self.substitutions {
            text = regex.replace_all(&text, *replacement).into_owned();
        }
        text.trim().to_string()
    }

    pub fn add_missing_commas(&self, text: &str) -> String {
        self.missing_comma.replace_all(text, "$1, $2").into_owned()
    }

    pub fn split_clauses(&self, text: &str) -> Vec<String> {
        self.clause_separator
            .split(text)
            .map(str::trim)
            .filter(|clause| !clause.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn parse(&self, raw: &str) -> Target {
        let cleaned = self.clean(raw);
        let tokens: Vec<&str> = cleaned.split_whitespace().collect();
        let mut cursor = 0;

        let mut take = |regex: &Regex| -> String {
            match tokens.get(cursor) {
                Some(token) if regex.is_match(token) => {
                    cursor += 1;
                    (*token).to_string()
                }
                _ => String::new(),
            }
        };
        let package = take(&self.package);
        let section = take(&self.section);
        let object = take(&self.object);
        let subsection = take(&self.subsection);

        Target {
            raw: raw.trim().to_string(),
            package,
            section,
            object,
            subsection,
            unparsed: tokens[cursor..].join(" "),
        }
    }

    pub fn normalize(&self, target: &mut Target) {
        let mut words: Vec<String> = target
            .unparsed
            .split_whitespace()
            .map(str::to_string)
            .collect();

        if let Some(first) = words.first()
            && ((target.section.is_empty() && self.section.is_match(first))
                || target.section == *first)
        {
            target.section = words.remove(0);
        }

        if words.len() == 1 && target.subsection.is_empty() {
            target.subsection = words.remove(0);
        }

        if target.object == "CCBox"
            && target.subsection.is_empty()
            && words
                .first()
                .and_then(|word| word.chars().next())
                .is_some_and(char::is_uppercase)
        {
            target.subsection = words.remove(0);
        }

        if target.section.is_empty() && words.len() == 3 && words[0] == "in" && words[1] == "Chapter"
        {
            target.section = "Chapter".to_string();
            target.subsection = if target.subsection.is_empty() {
                words[2].clone()
            } else {
                format!("{}.{}", words[2], target.subsection)
            };
            words.clear();
        }

        // "Chapter 7 Table 7.3": the chapter number was taken as subsection
        // before the object was seen.
        if target.object.is_empty()
            && !target.subsection.is_empty()
            && target.subsection.chars().all(|ch| ch.is_ascii_digit())
            && words.len() == 2
            && self.object.is_match(&words[0])
            && words[1].starts_with(&format!("{}.", target.subsection))
        {
            target.subsection = words.remove(1);
            target.object = words.remove(0);
        }

        if words
            .first()
            .is_some_and(|word| !target.subsection.is_empty() && *word == target.subsection)
        {
            words.remove(0);
        }

        target.unparsed = words.join(" ");
    }

    pub fn parse_normalized(&self, raw: &str) -> Target {
        let mut target = self.parse(raw);
        self.normalize(&mut target);
        if !target.is_fully_parsed() {
            debug!(raw = %target.raw, unparsed = %target.unparsed, "citation residue left unparsed");
        }
        target
    }
}
