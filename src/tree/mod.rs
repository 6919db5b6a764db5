use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::ContractError;

mod element;
mod html;

pub use element::{Document, Element, ElementKind};
pub use html::render_document;
