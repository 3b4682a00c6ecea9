/// The reader-controlled part of the archive view.
///
/// `year` and `term` are empty when unconstrained. `page` is 1-based and is
/// clamped into the valid range on every recompute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterState {
    pub year: String,
    pub term: String,
    pub page: u32,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            year: String::new(),
            term: String::new(),
            page: 1,
        }
    }
}

impl FilterState {
    pub fn has_year(&self) -> bool {
        !self.year.is_empty()
    }

    /// The search term as used for matching; whitespace-only means no term.
    pub fn trimmed_term(&self) -> &str {
        self.term.trim()
    }

    pub fn has_term(&self) -> bool {
        !self.trimmed_term().is_empty()
    }

    pub fn is_default(&self) -> bool {
        !self.has_year() && !self.has_term() && self.page == 1
    }
}
