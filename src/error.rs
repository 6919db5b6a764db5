#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    #[error("template `{template}` needs group `{group}` which is absent from the match")]
    MissingGroup {
        template: String,
        group: String,
    },

    #[error("unterminated placeholder in template `{template}`")]
    Unterminated {
        template: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReferenceError {
    #[error("reference `{reference}` has {tokens} components, expected 3")]
    WrongShape {
        reference: String,
        tokens: usize,
    },

    #[error("unknown report `{report}` in `{reference}`")]
    UnknownReport {
        reference: String,
        report: String,
    },

    #[error("unknown chapter kind `{chapter}` in `{reference}`")]
    UnknownChapterKind {
        reference: String,
        chapter: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("transport error fetching {address}: {message}")]
    Transport { address: String, message: String },

    #[error("status {status} fetching {address}")]
    Status { address: String, status: u16 },

    #[error("unreadable body from {address}: {message}")]
    Body { address: String, message: String },

    #[error("no element with id `{id}` in {address}")]
    AnchorNotFound { address: String, id: String },
}

#[derive(Debug, thiserror::Error)]
pub enum RuleError {
    #[error("rule `{rule}` has an invalid regex `{pattern}`")]
    InvalidRegex {
        rule: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("rule `{rule}` has no regex")]
    NoRegex { rule: String },

    #[error("rule `{rule}` names unknown parent `{parent}`")]
    UnknownParent { rule: String, parent: String },

    #[error("rule `{rule}` has inverted span range {lo}..{hi}")]
    InvertedRange { rule: String, lo: usize, hi: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{operation} expects a <{expected}> element, got <{found}>")]
pub struct ContractError {
    pub operation: &'static str,
    pub expected: &'static str,
    pub found: &'static str,
}
