use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use indexmap::IndexMap;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{ContractError, RuleError, TemplateError};
use crate::tree::{Document, Element, ElementKind};

mod nesting;
mod rules;
mod tagger;
mod template;

pub use nesting::{NestReport, nest_sections};
pub use rules::{MarkupRule, RuleMatch, RuleTable};
pub use tagger::{SectionTagger, TagReport, TaggerOptions};
pub use template::Templater;
