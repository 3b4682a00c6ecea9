//! Reading and writing the archive's filter state in the query string.

use url::Url;

use crate::archive::FilterState;
use crate::config::QueryParams;

/// Reads `{year, term, page}` from `url`. Missing parameters take their
/// defaults; a page that is not a positive integer becomes 1.
pub fn read_state(url: &Url, params: &QueryParams) -> FilterState {
    let mut year = None;
    let mut term = None;
    let mut page = None;
    for (key, value) in url.query_pairs() {
        if key == params.year.as_str() {
            year.get_or_insert_with(|| value.into_owned());
        } else if key == params.search.as_str() {
            term.get_or_insert_with(|| value.into_owned());
        } else if key == params.page.as_str() {
            page.get_or_insert_with(|| value.into_owned());
        }
    }

    FilterState {
        year: year.unwrap_or_default(),
        term: term.unwrap_or_default(),
        page: page.as_deref().map(parse_page).unwrap_or(1),
    }
}

// Strict integer parse: trailing garbage such as `2abc` reads as page 1.
fn parse_page(raw: &str) -> u32 {
    match raw.trim().parse::<i64>() {
        Ok(value) if value > 0 => u32::try_from(value).unwrap_or(u32::MAX),
        _ => 1,
    }
}

/// Returns `url` with the archive parameters set to `state`. Parameters equal
/// to their default are removed; unrelated parameters keep their position.
pub fn write_state(url: &Url, state: &FilterState, params: &QueryParams) -> Url {
    let year = state.year.trim();
    let term = state.trimmed_term();
    let wanted: [(&str, Option<String>); 3] = [
        (params.year.as_str(), (!year.is_empty()).then(|| year.to_string())),
        (params.search.as_str(), (!term.is_empty()).then(|| term.to_string())),
        (params.page.as_str(), (state.page > 1).then(|| state.page.to_string())),
    ];

    let mut written = [false; 3];
    let mut pairs: Vec<(String, String)> = Vec::new();
    for (key, value) in url.query_pairs() {
        match wanted.iter().position(|(name, _)| *name == key) {
            Some(slot) => {
                if written[slot] {
                    continue;
                }
                written[slot] = true;
                if let Some(new_value) = &wanted[slot].1 {
                    pairs.push((key.into_owned(), new_value.clone()));
                }
            }
            None => pairs.push((key.into_owned(), value.into_owned())),
        }
    }
    for (slot, (name, value)) in wanted.iter().enumerate() {
        if let (false, Some(value)) = (written[slot], value) {
            pairs.push((name.to_string(), value.clone()));
        }
    }

    let mut next = url.clone();
    if pairs.is_empty() {
        next.set_query(None);
    } else {
        next.query_pairs_mut().clear().extend_pairs(pairs);
    }
    next
}
