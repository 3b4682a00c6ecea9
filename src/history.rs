use url::Url;

/// The page's navigation history as seen by the archive: a list of entries and
/// the one currently shown.
#[derive(Debug, Clone)]
pub struct SessionHistory {
    entries: Vec<Url>,
    current: usize,
}

impl SessionHistory {
    pub fn new(initial: Url) -> Self {
        Self {
            entries: vec![initial],
            current: 0,
        }
    }

    pub fn location(&self) -> &Url {
        &self.entries[self.current]
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Rewrites the current entry in place; back/forward are unaffected.
    pub fn replace_state(&mut self, url: Url) {
        self.entries[self.current] = url;
    }

    /// Adds a new entry after the current one, dropping any forward entries.
    pub fn push_state(&mut self, url: Url) {
        self.entries.truncate(self.current + 1);
        self.entries.push(url);
        self.current = self.entries.len() - 1;
    }

    pub fn back(&mut self) -> bool {
        if self.current == 0 {
            return false;
        }
        self.current -= 1;
        true
    }
}
