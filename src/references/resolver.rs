use super::*;

pub const TARGETS_CLASS: &str = "targets";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkRow {
    pub anchor_id: String,
    pub anchor_text: String,
    pub reference: String,
    pub target_id: String,
    pub target_text: String,
    pub target_address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anchor_address: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct BadLink {
    pub reference: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct LinkTable {
    pub rows: Vec<LinkRow>,
    pub bad_links: BTreeSet<BadLink>,
    pub anonymous_anchors: usize,
}

impl LinkTable {
    fn extend(&mut self, other: LinkTable) {
        self.rows.extend(other.rows);
        self.bad_links.extend(other.bad_links);
        self.anonymous_anchors += other.anonymous_anchors;
    }
}

pub struct LinkResolver<'f, F> {
    factory: &'f LinkFactory,
    cache: FetchCache<F>,
    curly: Regex,
    separator: Regex,
    targets_class: String,
    anchor_address: Option<String>,
}

impl<'f, F: RemoteFetcher> LinkResolver<'f, F> {
    pub fn new(factory: &'f LinkFactory, fetcher: F) -> Result<Self> {
        Ok(Self {
            factory,
            cache: FetchCache::new(fetcher),
            curly: Regex::new(r"\{([^}]+)\}").context("failed to compile curly group regex")?,
            separator: Regex::new(r"[,;]").context("failed to compile reference separator")?,
            targets_class: TARGETS_CLASS.to_string(),
            anchor_address: None,
        })
    }

    pub fn with_targets_class(mut self, class: impl Into<String>) -> Self {
        self.targets_class = class.into();
        self
    }

    pub fn with_anchor_document(mut self, report: &str, chapter: &str) -> Self {
        self.anchor_address = Some(self.factory.anchor.address(report, chapter));
        self
    }

    pub fn fetches(&self) -> usize {
        self.cache.fetches()
    }

    fn is_link_container(&self, element: &Element) -> bool {
        element.kind == ElementKind::Div
            && element.children.iter().any(|child| {
                child.kind == ElementKind::Span && child.has_class(&self.targets_class)
            })
    }

    fn anchor_id(container: &Element) -> Option<String> {
        container
            .id()
            .or_else(|| {
                container
                    .children
                    .iter()
                    .find(|child| child.kind == ElementKind::Span)
                    .and_then(Element::id)
            })
            .map(str::to_string)
    }

    pub fn resolve_container(&mut self, container: &Element) -> Result<LinkTable, ContractError> {
        container.ensure_kind(ElementKind::Div, "resolve_container")?;
        let mut table = LinkTable::default();

        let Some(anchor_id) = Self::anchor_id(container) else {
            warn!(
                text = %container.text_content().chars().take(40).collect::<String>(),
                "citation container has no id, skipping"
            );
            table.anonymous_anchors += 1;
            return Ok(table);
        };
        let anchor_text = container.text_content();

        let mut references = Vec::new();
        for group in curly_groups(&anchor_text, &self.curly) {
            references.extend(
                self.separator
                    .split(&group)
                    .map(str::trim)
                    .filter(|reference| !reference.is_empty())
                    .map(str::to_string),
            );
        }

        for reference in references {
            match self.resolve_reference(&reference) {
                Ok((resolved, target_text)) => table.rows.push(LinkRow {
                    anchor_id: anchor_id.clone(),
                    anchor_text: anchor_text.clone(),
                    reference,
                    target_id: resolved.id,
                    target_text,
                    target_address: resolved.address,
                    anchor_address: self.anchor_address.clone(),
                }),
                Err(reason) => {
                    debug!(anchor = %anchor_id, reference = %reference, reason = %reason, "bad link");
                    table.bad_links.insert(BadLink { reference, reason });
                }
            }
        }
        Ok(table)
    }

    fn resolve_reference(&mut self, reference: &str) -> Result<(ResolvedReference, String), String> {
        let resolved = self
            .factory
            .resolve_reference(reference)
            .map_err(|err| err.to_string())?;
        let document = self
            .cache
            .get(&resolved.address)
            .map_err(|err| err.to_string())?;
        let text = document.target_text(&resolved.id).ok_or_else(|| {
            FetchError::AnchorNotFound {
                address: resolved.address.clone(),
                id: resolved.id.clone(),
            }
            .to_string()
        })?;
        Ok((resolved, text))
    }

    pub fn resolve_document(&mut self, document: &Document) -> Result<LinkTable, ContractError> {
        let mut containers = Vec::new();
        document.body.for_each_container(&mut |element| {
            if self.is_link_container(element) {
                containers.push(element);
            }
        });

        let mut table = LinkTable::default();
        for container in containers {
            table.extend(self.resolve_container(container)?);
        }
        info!(
            rows = table.rows.len(),
            bad_links = table.bad_links.len(),
            fetches = self.cache.fetches(),
            "resolved citation links"
        );
        Ok(table)
    }
}
