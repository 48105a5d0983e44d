use crate::animator::ScoreDisplay;
use crate::renderer::{Polarity, ReportModel, ScoreBucket};
use crate::validator::{AddressShape, FormField};
use html_escape::{encode_double_quoted_attribute, encode_text};
use std::collections::HashMap;
use std::fmt::Write as _;
use std::io::Write as _;
use std::sync::{Arc, Mutex};

pub const TRIGGER_LABEL_IDLE: &str = "Analyze Email";
pub const TRIGGER_LABEL_BUSY: &str = "Analyzing...";
pub const RESULTS_HEADING: &str = "Overall Risk Score";
pub const GENERIC_ERROR_MESSAGE: &str =
    "An error occurred. Please check the console for details.";

/// Surface the form controller drives. Implementations decide how the
/// state is actually presented.
pub trait FormView {
    type Score: ScoreDisplay;

    fn set_address_hint(&mut self, field: FormField, shape: AddressShape);
    fn set_trigger_enabled(&mut self, enabled: bool);
    fn set_busy(&mut self, busy: bool);
    /// Replace the results content with a freshly rendered report. The
    /// score element starts at 0 and is advanced through `score_display`.
    fn show_report(&mut self, report: &ReportModel);
    fn show_error(&mut self, message: &str);
    fn reveal_results(&mut self);
    /// Handle bound to the score element of the current results.
    fn score_display(&self) -> Self::Score;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScoreElement {
    pub value: u8,
    pub bucket: Option<ScoreBucket>,
}

impl ScoreElement {
    pub fn css_class(&self) -> String {
        match self.bucket {
            Some(bucket) => format!("score {}", bucket.css_class()),
            None => "score".to_string(),
        }
    }
}

/// Shared handle to the score element.
#[derive(Debug, Clone, Default)]
pub struct ScoreHandle {
    element: Arc<Mutex<ScoreElement>>,
    live: bool,
}

impl ScoreHandle {
    pub fn get(&self) -> ScoreElement {
        self.element.lock().map(|e| *e).unwrap_or_default()
    }

    fn reset(&self) {
        if let Ok(mut element) = self.element.lock() {
            *element = ScoreElement::default();
        }
    }
}

impl ScoreDisplay for ScoreHandle {
    fn show_score(&mut self, value: u8, bucket: Option<ScoreBucket>) {
        if let Ok(mut element) = self.element.lock() {
            element.value = value;
            if bucket.is_some() {
                element.bucket = bucket;
            }
        }

        if self.live {
            let mut stderr = std::io::stderr();
            let _ = write!(stderr, "\r{}: {}%", RESULTS_HEADING, value);
            if bucket.is_some() {
                let _ = writeln!(stderr);
            }
            let _ = stderr.flush();
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ResultsContent {
    #[default]
    Empty,
    Report(ReportModel),
    Error(String),
}

/// In-memory page: the three inputs' hints, the trigger control, the busy
/// indicator and the (initially hidden) results container.
#[derive(Debug, Clone)]
pub struct Page {
    hints: HashMap<FormField, AddressShape>,
    trigger_enabled: bool,
    busy: bool,
    results: ResultsContent,
    results_visible: bool,
    score: ScoreHandle,
}

impl Page {
    pub fn new() -> Self {
        Self {
            hints: HashMap::new(),
            trigger_enabled: true,
            busy: false,
            results: ResultsContent::Empty,
            results_visible: false,
            score: ScoreHandle::default(),
        }
    }

    /// Echo the score animation to stderr as it runs.
    pub fn with_live_score(mut self) -> Self {
        self.score.live = true;
        self
    }

    pub fn hint(&self, field: FormField) -> Option<AddressShape> {
        self.hints.get(&field).copied()
    }

    pub fn trigger_enabled(&self) -> bool {
        self.trigger_enabled
    }

    pub fn trigger_label(&self) -> &'static str {
        if self.busy {
            TRIGGER_LABEL_BUSY
        } else {
            TRIGGER_LABEL_IDLE
        }
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn results(&self) -> &ResultsContent {
        &self.results
    }

    pub fn results_visible(&self) -> bool {
        self.results_visible
    }

    pub fn score(&self) -> ScoreElement {
        self.score.get()
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new()
    }
}

impl FormView for Page {
    type Score = ScoreHandle;

    fn set_address_hint(&mut self, field: FormField, shape: AddressShape) {
        self.hints.insert(field, shape);
    }

    fn set_trigger_enabled(&mut self, enabled: bool) {
        self.trigger_enabled = enabled;
    }

    fn set_busy(&mut self, busy: bool) {
        self.busy = busy;
    }

    fn show_report(&mut self, report: &ReportModel) {
        self.score.reset();
        self.results = ResultsContent::Report(report.clone());
    }

    fn show_error(&mut self, message: &str) {
        self.score.reset();
        self.results = ResultsContent::Error(message.to_string());
    }

    fn reveal_results(&mut self) {
        self.results_visible = true;
    }

    fn score_display(&self) -> ScoreHandle {
        self.score.clone()
    }
}

/// Render the results container as an HTML fragment.
pub fn render_html(page: &Page) -> String {
    let mut html = String::new();
    let class = if page.results_visible() {
        ""
    } else {
        " class=\"hidden\""
    };
    let _ = writeln!(html, "<div id=\"results-container\"{class}>");
    html.push_str("<div id=\"results\">\n");

    match page.results() {
        ResultsContent::Empty => {}
        ResultsContent::Error(message) => {
            let _ = writeln!(html, "<p class=\"error\">{}</p>", encode_text(message));
        }
        ResultsContent::Report(report) => {
            let score = page.score();
            let _ = writeln!(html, "<h3>{RESULTS_HEADING}</h3>");
            let _ = writeln!(
                html,
                "<div class=\"{}\">{}%</div>",
                encode_double_quoted_attribute(&score.css_class()),
                score.value
            );
            html.push_str("<ul>\n");
            for item in &report.items {
                let _ = writeln!(
                    html,
                    "<li class=\"{}\"><div class=\"factor-finding\">{}</div><div class=\"factor-details\">{}</div></li>",
                    encode_double_quoted_attribute(item.polarity.css_class()),
                    encode_text(&item.finding),
                    encode_text(&item.details)
                );
            }
            html.push_str("</ul>\n");
        }
    }

    html.push_str("</div>\n</div>\n");
    html
}

/// Render the results container for a terminal.
pub fn render_text(page: &Page) -> String {
    let mut text = String::new();
    if !page.results_visible() {
        return text;
    }

    match page.results() {
        ResultsContent::Empty => {}
        ResultsContent::Error(message) => {
            let _ = writeln!(text, "❌ {message}");
        }
        ResultsContent::Report(report) => {
            let score = page.score();
            let bucket = score
                .bucket
                .map(|b| format!(" ({})", b.label()))
                .unwrap_or_default();
            let _ = writeln!(text, "📊 {}: {}%{}", RESULTS_HEADING, score.value, bucket);
            let _ = writeln!(text, "═══════════════════════════════════════");
            if report.items.is_empty() {
                let _ = writeln!(text, "  No evidence factors reported");
            }
            for item in &report.items {
                let marker = match item.polarity {
                    Polarity::Negative => "⚠️ ",
                    Polarity::Positive => "✅",
                };
                let _ = writeln!(text, "  {} {}", marker, item.finding);
                let _ = writeln!(text, "     {}", item.details);
            }
        }
    }

    text
}
