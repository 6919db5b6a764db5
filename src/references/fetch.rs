use super::*;

pub const TARGET_SEPARATOR: &str = "SEP";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct RemoteDocument {
    html: Html,
}

impl RemoteDocument {
    pub fn parse(source: &str) -> Self {
        Self {
            html: Html::parse_document(source),
        }
    }

    pub fn target_text(&self, id: &str) -> Option<String> {
        let selector = Selector::parse("[id]").ok()?;
        let texts: Vec<String> = self
            .html
            .select(&selector)
            .filter(|element| element.value().attr("id") == Some(id))
            .map(|element| {
                let enclosing = element
                    .parent()
                    .and_then(ElementRef::wrap)
                    .unwrap_or(element);
                enclosing.text().collect::<String>()
            })
            .collect();

        (!texts.is_empty()).then(|| texts.join(TARGET_SEPARATOR))
    }
}

pub trait RemoteFetcher {
    fn fetch(&mut self, address: &str) -> Result<RemoteDocument, FetchError>;
}

#[derive(Debug)]
pub struct HttpFetcher {
    agent: ureq::Agent,
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Self {
        Self {
            agent: ureq::AgentBuilder::new().timeout(timeout).build(),
        }
    }
}

impl RemoteFetcher for HttpFetcher {
    fn fetch(&mut self, address: &str) -> Result<RemoteDocument, FetchError> {
        debug!(address, "fetching remote document");
        let response = self.agent.get(address).call().map_err(|err| match err {
            ureq::Error::Status(status, _) => FetchError::Status {
                address: address.to_string(),
                status,
            },
            ureq::Error::Transport(transport) => FetchError::Transport {
                address: address.to_string(),
                message: transport.to_string(),
            },
        })?;

        let body = response.into_string().map_err(|err| FetchError::Body {
            address: address.to_string(),
            message: err.to_string(),
        })?;
        Ok(RemoteDocument::parse(&body))
    }
}

pub struct FetchCache<F> {
    fetcher: F,
    documents: HashMap<String, Result<RemoteDocument, FetchError>>,
    fetches: usize,
}

impl<F: RemoteFetcher> FetchCache<F> {
    pub fn new(fetcher: F) -> Self {
        Self {
            fetcher,
            documents: HashMap::new(),
            fetches: 0,
        }
    }

    pub fn get(&mut self, address: &str) -> Result<&RemoteDocument, FetchError> {
        let fetcher = &mut self.fetcher;
        let fetches = &mut self.fetches;
        let cached = self
            .documents
            .entry(address.to_string())
            .or_insert_with(|| {
                *fetches += 1;
                let fetched = fetcher.fetch(address);
                if let Err(err) = &fetched {
                    warn!(address, error = %err, "remote document unavailable");
                }
                fetched
            });
        cached.as_ref().map_err(Clone::clone)
    }

    pub fn fetches(&self) -> usize {
        self.fetches
    }
}
