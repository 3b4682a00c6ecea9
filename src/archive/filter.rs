use regex::{Regex, RegexBuilder};

use super::index::IndexedPost;
use super::state::FilterState;

/// Case-insensitive literal matcher for the search box.
///
/// The raw term is regex-escaped before compiling, so `.` `*` `+` and friends
/// only ever match themselves.
#[derive(Debug, Clone)]
pub enum TermMatcher {
    Any,
    Pattern(Regex),
    Lowercase(String),
}

impl TermMatcher {
    pub fn new(term: &str) -> Self {
        let term = term.trim();
        if term.is_empty() {
            return TermMatcher::Any;
        }
        match RegexBuilder::new(&regex::escape(term))
            .case_insensitive(true)
            .build()
        {
            Ok(regex) => TermMatcher::Pattern(regex),
            Err(err) => {
                tracing::debug!(?err, "search term too large for a pattern, using plain matching");
                TermMatcher::Lowercase(term.to_lowercase())
            }
        }
    }

    pub fn is_any(&self) -> bool {
        matches!(self, TermMatcher::Any)
    }

    pub fn matches(&self, text: &str) -> bool {
        match self {
            TermMatcher::Any => true,
            TermMatcher::Pattern(regex) => regex.is_match(text),
            TermMatcher::Lowercase(term) => text.to_lowercase().contains(term.as_str()),
        }
    }

    pub fn regex(&self) -> Option<&Regex> {
        match self {
            TermMatcher::Pattern(regex) => Some(regex),
            _ => None,
        }
    }
}

/// The eligible subsequence of `all_items` for `state`, order preserved.
pub fn filter_posts<'a>(all_items: &'a [IndexedPost], state: &FilterState) -> Vec<&'a IndexedPost> {
    let matcher = TermMatcher::new(&state.term);
    if !state.has_year() && matcher.is_any() {
        return all_items.iter().collect();
    }
    all_items
        .iter()
        .filter(|post| !state.has_year() || post.year == state.year)
        .filter(|post| matcher.matches(&post.search_text))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::index::{ArchiveIndex, RawPost};

    fn index(posts: &[(&str, &str)]) -> ArchiveIndex {
        ArchiveIndex::build(posts.iter().map(|(date, text)| RawPost {
            datetime: Some(date.to_string()),
            search_text: text.to_string(),
        }))
    }

    fn titles<'a>(posts: &[&'a IndexedPost]) -> Vec<&'a str> {
        posts.iter().map(|p| p.search_text.as_str()).collect()
    }

    fn state(year: &str, term: &str) -> FilterState {
        FilterState {
            year: year.into(),
            term: term.into(),
            page: 1,
        }
    }

    #[test]
    fn year_and_term_must_both_hold() {
        let index = index(&[
            ("2024-03-01", "Bear notes"),
            ("2023-03-01", "Bearing up"),
            ("2023-02-01", "Other"),
        ]);
        let eligible = filter_posts(index.all_items(), &state("2023", "BEAR"));
        assert_eq!(titles(&eligible), vec!["Bearing up"]);

        let eligible = filter_posts(index.all_items(), &state("", "bear"));
        assert_eq!(titles(&eligible), vec!["Bear notes", "Bearing up"]);

        let eligible = filter_posts(index.all_items(), &state("2023", "   "));
        assert_eq!(titles(&eligible), vec!["Bearing up", "Other"]);
    }

    #[test]
    fn metacharacters_match_literally() {
        let index = index(&[
            ("2024-01-03", "Learning c++ templates"),
            ("2024-01-02", "ccc"),
            ("2024-01-01", "a.b and a*b"),
            ("2023-12-01", "axb"),
        ]);
        assert_eq!(
            titles(&filter_posts(index.all_items(), &state("", "c++"))),
            vec!["Learning c++ templates"]
        );
        assert_eq!(
            titles(&filter_posts(index.all_items(), &state("", "a.b"))),
            vec!["a.b and a*b"]
        );
        assert_eq!(
            titles(&filter_posts(index.all_items(), &state("", "a*b"))),
            vec!["a.b and a*b"]
        );
        assert!(filter_posts(index.all_items(), &state("", "(")).is_empty());
    }

    #[test]
    fn filtering_is_idempotent() {
        let index = index(&[
            ("2024-03-01", "one"),
            ("2024-02-01", "two"),
            ("2023-03-01", "three"),
        ]);
        let query = state("2024", "o");
        let first: Vec<_> = filter_posts(index.all_items(), &query)
            .iter()
            .map(|p| p.id)
            .collect();
        let second: Vec<_> = filter_posts(index.all_items(), &query)
            .iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(first, second);
    }

    #[test]
    fn unknown_year_matches_nothing() {
        let index = index(&[("2024-03-01", "one")]);
        assert!(filter_posts(index.all_items(), &state("1999", "")).is_empty());
    }
}
