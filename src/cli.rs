use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::layout::AssemblyPath;

#[derive(Parser, Debug)]
#[command(
    name = "doclinker",
    version,
    about = "Reconstruct, tag and cross-link documents from positioned glyphs"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Reconstruct(ReconstructArgs),
    Tag(TagArgs),
    Targets(TargetsArgs),
    Links(LinksArgs),
    Status(StatusArgs),
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum AssemblyMode {
    Lines,
    Stream,
}

impl AssemblyMode {
    pub fn as_str(self) -> &'static str {
        self.path().as_str()
    }

    pub fn path(self) -> AssemblyPath {
        match self {
            Self::Lines => AssemblyPath::Lines,
            Self::Stream => AssemblyPath::Stream,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum RuleSet {
    Decisions,
    Inline,
    Targets,
}

impl RuleSet {
    pub fn splits_spans(self) -> bool {
        matches!(self, Self::Inline | Self::Targets)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Decisions => "decisions",
            Self::Inline => "inline",
            Self::Targets => "targets",
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct ReconstructArgs {
    #[arg(long)]
    pub input: PathBuf,

    #[arg(long, default_value = ".cache/doclinker")]
    pub out_dir: PathBuf,

    #[arg(long)]
    pub config: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = AssemblyMode::Lines)]
    pub mode: AssemblyMode,

    #[arg(long)]
    pub pages: Option<String>,

    #[arg(long)]
    pub header_height: Option<f64>,

    #[arg(long)]
    pub footer_height: Option<f64>,

    #[arg(long, default_value_t = false)]
    pub strip_positions: bool,
}

#[derive(Args, Debug, Clone)]
pub struct TagArgs {
    #[arg(long)]
    pub input: PathBuf,

    #[arg(long, default_value = ".cache/doclinker")]
    pub out_dir: PathBuf,

    #[arg(long)]
    pub config: Option<PathBuf>,

    #[arg(long)]
    pub rules: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = RuleSet::Decisions)]
    pub rule_set: RuleSet,

    #[arg(long, default_value_t = false)]
    pub split: bool,

    #[arg(long)]
    pub max_splits: Option<usize>,

    #[arg(long, value_parser = parse_span_range)]
    pub span_range: Option<(usize, usize)>,

    #[arg(long, default_value_t = false)]
    pub nest: bool,

    #[arg(long, default_value_t = 20)]
    pub report_unmatched: usize,
}

#[derive(Args, Debug, Clone)]
pub struct TargetsArgs {
    #[arg(long, required_unless_present = "citations")]
    pub input: Option<PathBuf>,

    #[arg(long, conflicts_with = "input")]
    pub citations: Option<PathBuf>,

    #[arg(long, default_value = ".cache/doclinker")]
    pub out_dir: PathBuf,

    #[arg(long)]
    pub db_path: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct LinksArgs {
    #[arg(long)]
    pub input: PathBuf,

    #[arg(long, default_value = ".cache/doclinker")]
    pub out_dir: PathBuf,

    #[arg(long)]
    pub factory: Option<PathBuf>,

    #[arg(long, default_value = "targets")]
    pub targets_class: String,

    #[arg(long, requires = "anchor_chapter")]
    pub anchor_report: Option<String>,

    #[arg(long, requires = "anchor_report")]
    pub anchor_chapter: Option<String>,

    #[arg(long, default_value_t = 30)]
    pub timeout_secs: u64,

    #[arg(long)]
    pub db_path: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub fail_on_bad_links: bool,
}

#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    #[arg(long, default_value = ".cache/doclinker")]
    pub out_dir: PathBuf,

    #[arg(long)]
    pub db_path: Option<PathBuf>,
}

pub fn parse_span_range(raw: &str) -> Result<(usize, usize), String> {
    let (lo, hi) = raw
        .split_once("..")
        .ok_or_else(|| format!("expected `lo..hi`, got `{raw}`"))?;
    let lo = lo
        .trim()
        .parse::<usize>()
        .map_err(|err| format!("invalid lower bound `{lo}`: {err}"))?;
    let hi = hi
        .trim()
        .parse::<usize>()
        .map_err(|err| format!("invalid upper bound `{hi}`: {err}"))?;
    if lo > hi {
        return Err(format!("span range {lo}..{hi} is inverted"));
    }
    Ok((lo, hi))
}
