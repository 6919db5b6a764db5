use super::*;

pub const STREAM_STYLES: [&str; 2] = [
    "div {border: red solid 0.5px}",
    "span {border: blue dotted 0.5px}",
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageBands {
    pub header_y: f64,
    pub footer_y: f64,
}

impl PageBands {
    pub fn for_page(media_box: BoundingBox, config: &JoinerConfig) -> Self {
        Self {
            header_y: media_box.y1 - config.header_height,
            footer_y: media_box.y0 + config.footer_height,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinDecision {
    Header,
    Footer,
    OpenContainer,
    Concatenate { joiner: &'static str },
    AppendSpan,
}

#[derive(Debug, Clone, Default)]
pub struct JoinedPage {
    pub containers: Vec<Element>,
    pub headers: Vec<Span>,
    pub footers: Vec<Span>,
    pub decisions: Vec<JoinDecision>,
}

enum JoinerState {
    NoContainer,
    InContainer {
        container: Element,
        last_style: Style,
    },
}

pub struct PageStreamJoiner<'a> {
    config: &'a JoinerConfig,
    bands: PageBands,
    state: JoinerState,
    last_y0: Option<f64>,
    page: JoinedPage,
}

impl<'a> PageStreamJoiner<'a> {
    pub fn new(config: &'a JoinerConfig, bands: PageBands) -> Self {
        Self {
            config,
            bands,
            state: JoinerState::NoContainer,
            last_y0: None,
            page: JoinedPage::default(),
        }
    }

    pub fn join(mut self, spans: impl IntoIterator<Item = Span>) -> JoinedPage {
        for span in spans {
            let decision = self.accept(span);
            self.page.decisions.push(decision);
        }
        self.close_container();
        self.page
    }

    fn accept(&mut self, span: Span) -> JoinDecision {
        let bbox = span.bbox();
        if bbox.y0 > self.bands.header_y {
            self.page.headers.push(span);
            return JoinDecision::Header;
        }
        if bbox.y1 < self.bands.footer_y {
            self.page.footers.push(span);
            return JoinDecision::Footer;
        }

        let delta_y = self.last_y0.map(|last| last - span.y);
        self.last_y0 = Some(span.y);

        let new_paragraph = self.must_start_paragraph(&span, delta_y);
        let same_style = match &self.state {
            JoinerState::InContainer { last_style, .. } if !new_paragraph => {
                Some(*last_style == span.style)
            }
            _ => None,
        };

        match same_style {
            None => {
                self.open_container(span);
                JoinDecision::OpenContainer
            }
            Some(true) => match self.joiner_for(&span, delta_y) {
                Some(joiner) => {
                    self.concatenate(&span, joiner);
                    JoinDecision::Concatenate { joiner }
                }
                None => {
                    self.open_container(span);
                    JoinDecision::OpenContainer
                }
            },
            Some(false) => {
                self.append_span(span);
                JoinDecision::AppendSpan
            }
        }
    }

    fn must_start_paragraph(&self, span: &Span, delta_y: Option<f64>) -> bool {
        let Some(delta_y) = delta_y else {
            return false;
        };
        if span.text.trim().is_empty() {
            return false;
        }
        delta_y.abs() > span.style.size * self.config.paragraph_separator_factor
    }

    fn joiner_for(&self, span: &Span, delta_y: Option<f64>) -> Option<&'static str> {
        let first = span.text.trim_start().chars().next();
        if first.is_some_and(|ch| self.config.bullet_chars.contains(&ch)) {
            return None;
        }

        let same_baseline = delta_y.is_none_or(|delta| delta.abs() <= self.config.baseline_epsilon);
        if same_baseline {
            return Some("");
        }

        let JoinerState::InContainer { container, .. } = &self.state else {
            return Some(" ");
        };
        let previous_ends_blank = container
            .children
            .last()
            .is_some_and(|last| last.text.ends_with(char::is_whitespace));
        if previous_ends_blank || span.text.ends_with(char::is_whitespace) {
            Some("")
        } else {
            Some(" ")
        }
    }

    fn close_container(&mut self) {
        if let JoinerState::InContainer { container, .. } =
            std::mem::replace(&mut self.state, JoinerState::NoContainer)
        {
            self.page.containers.push(container);
        }
    }

    fn open_container(&mut self, span: Span) {
        self.close_container();
        let bbox = span.bbox();
        let mut container = Element::new(ElementKind::Div);
        container.set_attr("left", format!("{}", round_to(bbox.x0, 2)));
        container.set_attr("right", format!("{}", round_to(bbox.x1, 2)));
        container.set_attr("top", format!("{}", round_to(bbox.y1, 2)));
        container.push(span.to_element(ScriptPosition::Normal));
        self.state = JoinerState::InContainer {
            container,
            last_style: span.style,
        };
    }

    fn append_span(&mut self, span: Span) {
        if let JoinerState::InContainer {
            container,
            last_style,
        } = &mut self.state
        {
            container.push(span.to_element(ScriptPosition::Normal));
            *last_style = span.style;
        }
    }

    fn concatenate(&mut self, span: &Span, joiner: &str) {
        let JoinerState::InContainer { container, .. } = &mut self.state else {
            return;
        };
        let Some(previous) = container.children.last_mut() else {
            return;
        };
        previous.text.push_str(joiner);
        previous.text.push_str(&span.text);

        let right = previous
            .attr("x1")
            .and_then(|value| value.parse::<f64>().ok())
            .map_or(span.x1, |x1| x1.max(span.x1));
        previous.set_attr("x1", format!("{}", round_to(right, 2)));
    }
}
