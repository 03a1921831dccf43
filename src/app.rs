use dove_news::{Article, Source};
use ratatui::widgets::ListState;

/// One row of the list, built from either an article or a source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Left column: publish time for articles, category for sources.
    pub detail: String,
    pub title: String,
    /// Right column: publisher or source id.
    pub tag: String,
}

impl From<&Article> for Entry {
    fn from(article: &Article) -> Self {
        Self {
            detail: article
                .published_at
                .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|| "no date".into()),
            title: article.title.clone().unwrap_or_else(|| "(untitled)".into()),
            tag: article
                .source
                .name
                .clone()
                .or_else(|| article.category.clone())
                .unwrap_or_default(),
        }
    }
}

impl From<&Source> for Entry {
    fn from(source: &Source) -> Self {
        Self {
            detail: source.category.clone().unwrap_or_default(),
            title: source
                .name
                .clone()
                .or_else(|| source.id.clone())
                .unwrap_or_else(|| "(unnamed)".into()),
            tag: source.id.clone().unwrap_or_default(),
        }
    }
}

pub struct App {
    /// Rows from the most recent response, in API order.
    pub entries: Vec<Entry>,
    /// List selection state for scrolling.
    pub list_state: ListState,
    /// Title shown on the list border.
    pub title: String,
    /// Whether the user has requested to quit.
    pub quit: bool,
    /// Set by the `r` key; cleared by the main loop once the request is issued.
    pub refresh: bool,
    /// Last status message.
    pub status: String,
}

impl App {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            entries: Vec::new(),
            list_state: ListState::default(),
            title: title.into(),
            quit: false,
            refresh: false,
            status: "Loading…".into(),
        }
    }

    /// Replace the list with a fresh response, keeping the selection in range.
    pub fn show(&mut self, entries: Vec<Entry>) {
        self.entries = entries;
        match self.list_state.selected() {
            _ if self.entries.is_empty() => self.list_state.select(None),
            Some(i) if i >= self.entries.len() => {
                self.list_state.select(Some(self.entries.len() - 1))
            }
            _ => {}
        }
    }

    // -- navigation ----------------------------------------------------------

    pub fn select_next(&mut self) {
        if self.entries.is_empty() {
            return;
        }
        let i = match self.list_state.selected() {
            Some(i) => (i + 1).min(self.entries.len() - 1),
            None => 0,
        };
        self.list_state.select(Some(i));
    }

    pub fn select_previous(&mut self) {
        if self.entries.is_empty() {
            return;
        }
        let i = match self.list_state.selected() {
            Some(i) => i.saturating_sub(1),
            None => 0,
        };
        self.list_state.select(Some(i));
    }

    pub fn select_first(&mut self) {
        if !self.entries.is_empty() {
            self.list_state.select(Some(0));
        }
    }

    pub fn select_last(&mut self) {
        if !self.entries.is_empty() {
            self.list_state.select(Some(self.entries.len() - 1));
        }
    }
}
