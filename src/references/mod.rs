use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use indexmap::IndexMap;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{ContractError, FetchError, ReferenceError};
use crate::tree::{Document, Element, ElementKind};

mod extract;
mod fetch;
mod locator;
mod resolver;
mod target;
#[cfg(test)]
mod tests;

pub use extract::{TargetExtraction, TargetRow, commonest, extract_targets};
pub use fetch::{FetchCache, HttpFetcher, RemoteFetcher};
#[cfg(test)]
pub use fetch::RemoteDocument;
pub use locator::{LinkFactory, ResolvedReference};
pub use resolver::{LinkResolver, LinkTable};
pub use target::{Target, TargetField, TargetParser};

fn curly_groups(text: &str, pattern: &Regex) -> Vec<String> {
    pattern
        .captures_iter(text)
        .filter_map(|captures| captures.get(1))
        .map(|group| group.as_str().to_string())
        .collect()
}
