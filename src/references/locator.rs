use super::*;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteLocator {
    pub site: String,
    pub owner: String,
    pub repository: String,
    pub branch: String,
    pub stem: Option<String>,
    pub leaf_name: Option<String>,
}

impl Default for RemoteLocator {
    fn default() -> Self {
        Self {
            site: "https://raw.githubusercontent.com".to_string(),
            owner: "petermr".to_string(),
            repository: "semanticClimate".to_string(),
            branch: "main".to_string(),
            stem: Some("ipcc/ar6".to_string()),
            leaf_name: None,
        }
    }
}

impl RemoteLocator {
    pub fn address(&self, report: &str, chapter: &str) -> String {
        let mut parts: Vec<&str> = vec![
            self.site.trim_end_matches('/'),
            &self.owner,
            &self.repository,
            &self.branch,
        ];
        if let Some(stem) = self.stem.as_deref() {
            parts.push(stem.trim_matches('/'));
        }
        parts.push(report);
        parts.push(chapter);
        if let Some(leaf) = self.leaf_name.as_deref() {
            parts.push(leaf);
        }
        parts.join("/")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedReference {
    pub reference: String,
    pub report: String,
    pub chapter: String,
    pub id: String,
    pub address: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkFactory {
    pub anchor: RemoteLocator,
    pub target: RemoteLocator,
    pub report_aliases: IndexMap<String, String>,
    pub chapter_kinds: Vec<String>,
}

impl Default for LinkFactory {
    fn default() -> Self {
        let report_aliases = [
            ("WGI", "wg1"),
            ("WG1", "wg1"),
            ("WGII", "wg2"),
            ("WG2", "wg2"),
            ("WGIII", "wg3"),
            ("WG3", "wg3"),
            ("SYR", "syr"),
        ]
        .into_iter()
        .map(|(alias, report)| (alias.to_string(), report.to_string()))
        .collect();

        Self {
            anchor: RemoteLocator::default(),
            target: RemoteLocator {
                leaf_name: Some("fulltext.annotations.id.html".to_string()),
                ..RemoteLocator::default()
            },
            report_aliases,
            chapter_kinds: vec!["spm".to_string(), "lr".to_string(), "ts".to_string()],
        }
    }
}

impl LinkFactory {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read link factory {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("invalid link factory {}", path.display()))
    }

    fn report_for(&self, token: &str) -> Option<&str> {
        self.report_aliases
            .get(token)
            .or_else(|| {
                self.report_aliases
                    .iter()
                    .find(|(alias, _)| alias.eq_ignore_ascii_case(token))
                    .map(|(_, report)| report)
            })
            .map(String::as_str)
    }

    pub fn resolve_reference(&self, reference: &str) -> Result<ResolvedReference, ReferenceError> {
        let reference = reference.trim();
        let tokens: Vec<&str> = reference.split_whitespace().collect();
        let &[report_token, chapter_token, id] = tokens.as_slice() else {
            return Err(ReferenceError::WrongShape {
                reference: reference.to_string(),
                tokens: tokens.len(),
            });
        };

        let report = self
            .report_for(report_token)
            .ok_or_else(|| ReferenceError::UnknownReport {
                reference: reference.to_string(),
                report: report_token.to_string(),
            })?;

        let chapter = chapter_token.to_lowercase();
        if !self.chapter_kinds.contains(&chapter) {
            return Err(ReferenceError::UnknownChapterKind {
                reference: reference.to_string(),
                chapter,
            });
        }

        Ok(ResolvedReference {
            reference: reference.to_string(),
            report: report.to_string(),
            address: self.target.address(report, &chapter),
            chapter,
            id: id.to_string(),
        })
    }
}
