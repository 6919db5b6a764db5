use super::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssemblyPath {
    Lines,
    Stream,
}

impl AssemblyPath {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Lines => "lines",
            Self::Stream => "stream",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSelection {
    ranges: Vec<(u32, u32)>,
}

impl PageSelection {
    pub fn parse(raw: &str) -> Result<Self> {
        let mut ranges = Vec::new();
        for part in raw.split(',').map(str::trim).filter(|part| !part.is_empty()) {
            let (lo, hi) = match part.split_once('-') {
                Some((lo, hi)) => (lo.trim().parse::<u32>()?, hi.trim().parse::<u32>()?),
                None => {
                    let page = part.parse::<u32>()?;
                    (page, page)
                }
            };
            if lo > hi {
                bail!("page range {part} is inverted");
            }
            ranges.push((lo, hi));
        }
        if ranges.is_empty() {
            bail!("page selection `{raw}` names no pages");
        }
        Ok(Self { ranges })
    }

    pub fn contains(&self, page: u32) -> bool {
        self.ranges.iter().any(|(lo, hi)| (*lo..=*hi).contains(&page))
    }
}

#[derive(Debug, Clone)]
pub struct PageOutput {
    pub page_number: u32,
    pub element: Element,
    pub headers: Vec<String>,
    pub footers: Vec<String>,
    pub span_count: usize,
    pub line_count: usize,
    pub paragraph_count: usize,
}

#[derive(Debug, Clone, Default)]
pub struct AssembledDocument {
    pub document: Document,
    pub pages: Vec<Option<PageOutput>>,
    pub warnings: Vec<String>,
}

impl AssembledDocument {
    pub fn failed_pages(&self) -> usize {
        self.pages.iter().filter(|page| page.is_none()).count()
    }

    pub fn assembled(&self) -> impl Iterator<Item = &PageOutput> {
        self.pages.iter().flatten()
    }
}

fn validate_page(page: &GlyphPage) -> Result<()> {
    let usable = page.width.is_finite() && page.height.is_finite();
    if !usable || page.width <= 0.0 || page.height <= 0.0 {
        bail!(
            "page {} has invalid size {}x{}",
            page.page_number,
            page.width,
            page.height
        );
    }
    for (index, glyph) in page.glyphs.iter().enumerate() {
        let bbox = BoundingBox::new(glyph.x0, glyph.y0, glyph.x1, glyph.y1);
        if !bbox.is_finite() || !glyph.font_height.is_finite() || glyph.font_height <= 0.0 {
            bail!(
                "page {} glyph {index} ({:?}) has unusable geometry",
                page.page_number,
                glyph.text
            );
        }
    }
    Ok(())
}

pub fn assemble_page(
    page: &GlyphPage,
    path: AssemblyPath,
    config: &PipelineConfig,
) -> Result<PageOutput> {
    validate_page(page)?;

    let (spans, span_stats) = assemble_spans(&page.glyphs, config);
    debug!(
        page = page.page_number,
        glyphs = span_stats.glyphs_seen,
        rotated = span_stats.rotated_skipped,
        clipped = span_stats.clipped,
        whitespace_dropped = span_stats.whitespace_dropped,
        spans = spans.len(),
        "assembled spans"
    );

    let mut element = Element::new(ElementKind::Div);
    element.set_attr("class", "page");
    element.set_attr("id", format!("page_{}", page.page_number));

    let span_count = spans.len();
    let mut line_count = 0;
    let mut headers = Vec::new();
    let mut footers = Vec::new();

    let paragraph_count = match path {
        AssemblyPath::Lines => {
            let mut spans = spans;
            sort_reading_order(&mut spans);
            let lines = build_lines(spans, config.lines.x_margin);
            line_count = lines.len();
            let paragraphs = segment_paragraphs(lines, &config.paragraphs);
            for paragraph in &paragraphs {
                element.push(paragraph.to_element(&config.scripts));
            }
            paragraphs.len()
        }
        AssemblyPath::Stream => {
            let media_box = BoundingBox::new(0.0, 0.0, page.width, page.height);
            let bands = PageBands::for_page(media_box, &config.joiner);
            let joined = PageStreamJoiner::new(&config.joiner, bands).join(spans);
            headers = joined.headers.into_iter().map(|span| span.text).collect();
            footers = joined.footers.into_iter().map(|span| span.text).collect();
            let count = joined.containers.len();
            for container in joined.containers {
                element.push(container);
            }
            count
        }
    };

    let mut decorations = convert_rects(&page.rects, &config.decorations);
    decorations.extend(convert_curves(&page.curves, &config.decorations));
    if let Some(decorations) = decorations_element(&decorations) {
        element.push(decorations);
    }

    Ok(PageOutput {
        page_number: page.page_number,
        element,
        headers,
        footers,
        span_count,
        line_count,
        paragraph_count,
    })
}

pub fn assemble_document(
    glyphs: &GlyphDocument,
    path: AssemblyPath,
    selection: Option<&PageSelection>,
    config: &PipelineConfig,
) -> AssembledDocument {
    let mut pages: Vec<&GlyphPage> = glyphs
        .pages
        .iter()
        .filter(|page| selection.is_none_or(|selection| selection.contains(page.page_number)))
        .collect();
    pages.sort_by_key(|page| page.page_number);

    let mut assembled = AssembledDocument::default();
    assembled.document.title = glyphs.source.clone();
    if path == AssemblyPath::Stream {
        for style in STREAM_STYLES {
            assembled.document.add_style(style);
        }
    }

    for page in pages {
        match assemble_page(page, path, config) {
            Ok(output) => {
                assembled.document.body.push(output.element.clone());
                assembled.pages.push(Some(output));
            }
            Err(err) => {
                warn!(page = page.page_number, error = %err, "page assembly failed");
                assembled
                    .warnings
                    .push(format!("page {}: {err}", page.page_number));
                assembled.pages.push(None);
            }
        }
    }

    info!(
        path = path.as_str(),
        pages = assembled.pages.len(),
        failed = assembled.failed_pages(),
        "assembled document"
    );
    assembled
}
