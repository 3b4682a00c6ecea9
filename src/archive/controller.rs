use std::time::Instant;

use crate::config::{ArchiveConfig, QueryParams};
use crate::debounce::Debouncer;
use crate::dom::{Document, NodeId, Selector};
use crate::history::SessionHistory;
use crate::url_state;

use super::filter::filter_posts;
use super::index::ArchiveIndex;
use super::markup::{Anchors, ArchiveMarkup};
use super::paginate::paginate;
use super::visibility::VisibilityPlan;
use super::{FilterState, SkipReason};

/// Outcome of mounting the archive on a page.
#[derive(Debug)]
pub enum Mounted {
    Active(ArchiveController),
    Skipped(SkipReason),
}

impl Mounted {
    pub fn active(self) -> Option<ArchiveController> {
        match self {
            Mounted::Active(controller) => Some(controller),
            Mounted::Skipped(_) => None,
        }
    }
}

/// Owns the archive's filter state and the handles into the page it was
/// mounted on. Every change runs the same pass: filter, paginate, render,
/// then rewrite the URL.
#[derive(Debug)]
pub struct ArchiveController {
    page_size: usize,
    params: QueryParams,
    index: ArchiveIndex,
    markup: ArchiveMarkup,
    state: FilterState,
    plan: VisibilityPlan,
    search_debounce: Debouncer,
    history: SessionHistory,
}

impl ArchiveController {
    /// Groups the page's posts and replaces the source list with the archive.
    /// Pages that do not qualify are left untouched.
    pub fn mount(doc: &mut Document, history: SessionHistory, config: &ArchiveConfig) -> Mounted {
        let anchors = match Anchors::locate(doc, config) {
            Ok(anchors) => anchors,
            Err(reason) => {
                tracing::debug!(%reason, "archive not applied");
                return Mounted::Skipped(reason);
            }
        };

        let index = ArchiveIndex::build(anchors.raw_posts(doc));
        if index.is_empty() {
            tracing::debug!(items = anchors.items.len(), "archive not applied: no dated posts");
            return Mounted::Skipped(SkipReason::NoDatedPosts);
        }

        let markup = ArchiveMarkup::materialize(doc, &anchors, &index, config);

        let mut state = url_state::read_state(history.location(), &config.params);
        if state.has_year() && !index.years().contains(&state.year) {
            tracing::debug!(year = %state.year, "ignoring unknown year from the query string");
            state.year.clear();
        }

        let page_size = config.page_size.max(1);
        let plan = compute(&index, &mut state, page_size);
        let mut controller = Self {
            page_size,
            params: config.params.clone(),
            index,
            markup,
            state,
            plan,
            search_debounce: Debouncer::new(config.search_debounce()),
            history,
        };
        controller.render(doc);
        tracing::debug!(
            posts = controller.index.len(),
            months = controller.index.buckets().len(),
            "archive mounted"
        );
        Mounted::Active(controller)
    }

    pub fn state(&self) -> &FilterState {
        &self.state
    }

    pub fn plan(&self) -> &VisibilityPlan {
        &self.plan
    }

    pub fn index(&self) -> &ArchiveIndex {
        &self.index
    }

    pub fn markup(&self) -> &ArchiveMarkup {
        &self.markup
    }

    pub fn history(&self) -> &SessionHistory {
        &self.history
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn search_pending(&self) -> bool {
        self.search_debounce.is_pending()
    }

    /// Year selector change. A year the index does not know selects all years.
    pub fn select_year(&mut self, doc: &mut Document, year: &str) {
        let year = year.trim();
        self.state.year = if self.index.years().contains(year) {
            year.to_string()
        } else {
            String::new()
        };
        self.state.page = 1;
        self.search_debounce.cancel();
        self.recompute(doc);
    }

    /// Search box edit. The recompute waits for the debounce period; call
    /// [`ArchiveController::poll`] to let it run.
    pub fn input_search(&mut self, doc: &mut Document, term: &str, now: Instant) {
        self.state.term = term.to_string();
        self.state.page = 1;
        self.markup.sync_controls(doc, &self.state);
        self.search_debounce.schedule(now);
    }

    /// Runs a pending search recompute once its quiet period is over.
    pub fn poll(&mut self, doc: &mut Document, now: Instant) -> bool {
        if !self.search_debounce.poll(now) {
            return false;
        }
        self.recompute(doc);
        true
    }

    /// Runs a pending search recompute right away.
    pub fn flush_search(&mut self, doc: &mut Document) -> bool {
        if !self.search_debounce.flush() {
            return false;
        }
        self.recompute(doc);
        true
    }

    pub fn next_page(&mut self, doc: &mut Document) -> bool {
        if self.plan.next_disabled {
            return false;
        }
        self.state.page = self.state.page.saturating_add(1);
        self.recompute(doc);
        true
    }

    pub fn prev_page(&mut self, doc: &mut Document) -> bool {
        if self.plan.prev_disabled {
            return false;
        }
        self.state.page = self.state.page.saturating_sub(1).max(1);
        self.recompute(doc);
        true
    }

    fn recompute(&mut self, doc: &mut Document) {
        self.plan = compute(&self.index, &mut self.state, self.page_size);
        self.render(doc);
    }

    fn render(&mut self, doc: &mut Document) {
        self.markup.apply(doc, &self.index, &self.plan);
        self.markup.sync_controls(doc, &self.state);
        let next = url_state::write_state(self.history.location(), &self.state, &self.params);
        if &next != self.history.location() {
            self.history.replace_state(next);
        }
        tracing::trace!(
            year = %self.state.year,
            term = %self.state.trimmed_term(),
            page = self.plan.current_page,
            pages = self.plan.total_pages,
            eligible = self.plan.eligible,
            "archive rendered"
        );
    }

    /// Reads back what a visitor would currently see on the page.
    pub fn view(&self, doc: &Document) -> ArchiveView {
        let select = doc.get(self.markup.year_select);
        let year_options = doc
            .children(self.markup.year_select)
            .iter()
            .map(|option| YearOption {
                value: doc.get(*option).attr("value").unwrap_or_default().to_string(),
                label: doc.text_content(*option),
            })
            .collect();

        let sections = self
            .markup
            .sections
            .iter()
            .filter(|section| !doc.get(section.header).hidden)
            .map(|section| SectionView {
                label: doc.text_content(section.header),
                posts: doc
                    .children(section.list)
                    .iter()
                    .filter(|item| !doc.get(**item).hidden)
                    .map(|item| post_view(doc, *item))
                    .collect(),
            })
            .collect();

        let pagination_visible = !doc.get(self.markup.pagination).hidden;
        ArchiveView {
            year: select.value.clone(),
            term: doc.get(self.markup.search_input).value.clone(),
            year_options,
            sections,
            page_info: pagination_visible.then(|| doc.text_content(self.markup.page_info)),
            prev_enabled: !doc.get(self.markup.prev_button).disabled,
            next_enabled: !doc.get(self.markup.next_button).disabled,
            location: self.history.location().to_string(),
        }
    }
}

fn compute(index: &ArchiveIndex, state: &mut FilterState, page_size: usize) -> VisibilityPlan {
    let eligible = filter_posts(index.all_items(), state);
    let page = paginate(&eligible, i64::from(state.page), page_size);
    state.page = page.current;
    VisibilityPlan::build(index, &page, eligible.len(), page_size)
}

fn post_view(doc: &Document, item: NodeId) -> PostView {
    let datetime = doc
        .find(item, &Selector::parse("time[datetime]"))
        .and_then(|time| doc.get(time).attr("datetime"))
        .map(str::to_string);
    let title = match doc.find(item, &Selector::tag("a")) {
        Some(link) => doc.text_content(link),
        None => doc.text_content(item),
    };
    PostView {
        datetime,
        title: title.trim().to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YearOption {
    pub value: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostView {
    pub datetime: Option<String>,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionView {
    pub label: String,
    pub posts: Vec<PostView>,
}

/// The visible state of a mounted archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveView {
    pub year: String,
    pub term: String,
    pub year_options: Vec<YearOption>,
    pub sections: Vec<SectionView>,
    /// `None` while the pagination block is hidden.
    pub page_info: Option<String>,
    pub prev_enabled: bool,
    pub next_enabled: bool,
    pub location: String,
}

impl ArchiveView {
    pub fn visible_posts(&self) -> usize {
        self.sections.iter().map(|section| section.posts.len()).sum()
    }

    pub fn selected_year_label(&self) -> &str {
        self.year_options
            .iter()
            .find(|option| option.value == self.year)
            .map(|option| option.label.as_str())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::time::Duration;

    use assert_matches::assert_matches;
    use serde_json::{json, Value};
    use url::Url;

    use super::*;
    use crate::archive::markup::YEAR_ATTR;
    use crate::archive::PostId;

    fn post(date: Option<&str>, title: &str) -> Value {
        let mut children = Vec::new();
        if let Some(date) = date {
            children.push(json!({"tag": "time", "attrs": {"datetime": date}, "text": date}));
        }
        children.push(json!({"tag": "a", "attrs": {"href": "/post/"}, "text": title}));
        json!({"tag": "li", "children": children})
    }

    fn page_with(extra: Vec<Value>, posts: Vec<Value>) -> Document {
        let mut main_children = vec![
            json!({"tag": "h1", "text": "Blog"}),
            json!({"tag": "ul", "class": "blog-posts", "children": posts}),
        ];
        main_children.extend(extra);
        let page = json!({
            "tag": "html",
            "children": [{"tag": "body", "class": "blog", "children": [
                {"tag": "main", "children": main_children}
            ]}]
        });
        Document::from_json(&page.to_string()).expect("page snapshot")
    }

    fn page(posts: Vec<Value>) -> Document {
        page_with(Vec::new(), posts)
    }

    fn history(query: &str) -> SessionHistory {
        SessionHistory::new(Url::parse(&format!("https://blog.example/blog/{query}")).expect("url"))
    }

    fn config(page_size: usize) -> ArchiveConfig {
        ArchiveConfig {
            page_size,
            ..ArchiveConfig::default()
        }
    }

    fn mount(doc: &mut Document, query: &str, page_size: usize) -> ArchiveController {
        match ArchiveController::mount(doc, history(query), &config(page_size)) {
            Mounted::Active(controller) => controller,
            Mounted::Skipped(reason) => panic!("archive skipped: {reason}"),
        }
    }

    /// 25 posts in 2024 followed by 22 in 2023, spread over every month.
    fn forty_seven_posts() -> Vec<Value> {
        (0..47)
            .map(|i| {
                let year = if i < 25 { 2024 } else { 2023 };
                let date = format!("{year}-{:02}-{:02}", i % 12 + 1, i % 28 + 1);
                post(Some(&date), &format!("Post {i}"))
            })
            .collect()
    }

    #[test]
    fn first_page_shows_newest_posts() {
        let mut doc = page(forty_seven_posts());
        let archive = mount(&mut doc, "", 20);

        assert_eq!(archive.plan().total_pages, 3);
        assert_eq!(archive.state().page, 1);
        let newest: HashSet<PostId> = archive.index().all_items()[..20]
            .iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(archive.plan().visible_posts, newest);

        let view = archive.view(&doc);
        assert_eq!(view.visible_posts(), 20);
        assert_eq!(view.sections[0].label, "December 2024");
        assert_eq!(view.page_info.as_deref(), Some("Page 1 of 3"));
        assert!(!view.prev_enabled);
        assert!(view.next_enabled);
        assert_eq!(view.year_options[0].label, "All posts (47)");
        assert_eq!(view.year_options[1].label, "2024 (25)");
        assert_eq!(view.year_options[2].label, "2023 (22)");
        assert_eq!(view.location, "https://blog.example/blog/");
    }

    #[test]
    fn year_with_few_posts_hides_pagination() {
        let posts = (0..30)
            .map(|i| {
                let year = if i < 12 { 2023 } else { 2024 };
                post(Some(&format!("{year}-03-{:02}", i % 28 + 1)), &format!("Post {i}"))
            })
            .collect();
        let mut doc = page(posts);
        let mut archive = mount(&mut doc, "", 20);
        archive.select_year(&mut doc, "2023");

        assert_eq!(archive.plan().eligible, 12);
        assert_eq!(archive.plan().total_pages, 1);
        assert!(doc.get(archive.markup().pagination).hidden);
        assert_eq!(archive.view(&doc).page_info, None);
        assert_eq!(archive.history().location().query(), Some("y=2023"));
    }

    #[test]
    fn search_is_literal_and_debounced() {
        let mut doc = page(vec![
            post(Some("2024-02-01"), "Notes on C++ templates"),
            post(Some("2024-01-01"), "cccc"),
            post(Some("2023-01-01"), "Rust"),
        ]);
        let mut archive = mount(&mut doc, "", 20);
        let start = Instant::now();

        archive.input_search(&mut doc, "c", start);
        archive.input_search(&mut doc, "c+", start + Duration::from_millis(50));
        archive.input_search(&mut doc, "c++", start + Duration::from_millis(100));
        assert!(archive.search_pending());
        assert!(!archive.poll(&mut doc, start + Duration::from_millis(200)));
        assert_eq!(archive.view(&doc).visible_posts(), 3);

        assert!(archive.poll(&mut doc, start + Duration::from_millis(240)));
        let view = archive.view(&doc);
        assert_eq!(view.visible_posts(), 1);
        assert_eq!(view.sections[0].posts[0].title, "Notes on C++ templates");
        assert_eq!(view.term, "c++");
        assert_eq!(archive.history().location().query(), Some("s=c%2B%2B"));
        assert!(!archive.poll(&mut doc, start + Duration::from_secs(5)));
    }

    #[test]
    fn search_resets_page_before_the_recompute() {
        let mut doc = page(forty_seven_posts());
        let mut archive = mount(&mut doc, "?p=2", 20);
        assert_eq!(archive.state().page, 2);

        archive.input_search(&mut doc, "Post 1", Instant::now());
        assert_eq!(archive.state().page, 1);
        assert!(archive.flush_search(&mut doc));
        // "Post 1" and "Post 10".."Post 19"
        assert_eq!(archive.plan().eligible, 11);
        assert_eq!(archive.history().location().query(), Some("s=Post+1"));
    }

    #[test]
    fn paging_stops_at_both_ends() {
        let mut doc = page(forty_seven_posts());
        let mut archive = mount(&mut doc, "", 20);

        assert!(!archive.prev_page(&mut doc));
        assert!(archive.next_page(&mut doc));
        assert!(archive.next_page(&mut doc));
        assert_eq!(archive.state().page, 3);
        assert!(!archive.next_page(&mut doc));
        assert_eq!(archive.view(&doc).visible_posts(), 7);
        assert_eq!(archive.history().location().query(), Some("p=3"));

        assert!(archive.prev_page(&mut doc));
        assert!(archive.prev_page(&mut doc));
        assert_eq!(archive.history().location().query(), None);
        assert_eq!(archive.history().len(), 1);
    }

    #[test]
    fn query_state_is_restored_and_clamped() {
        let mut doc = page(forty_seven_posts());
        let archive = mount(&mut doc, "?q=rust&y=2024&s=post&p=99", 20);

        assert_eq!(archive.state().year, "2024");
        assert_eq!(archive.state().term, "post");
        assert_eq!(archive.state().page, 2);
        assert_eq!(
            archive.history().location().query(),
            Some("q=rust&y=2024&s=post&p=2")
        );
        assert_eq!(archive.history().len(), 1);

        let view = archive.view(&doc);
        assert_eq!(view.year, "2024");
        assert_eq!(view.selected_year_label(), "2024 (25)");
        assert_eq!(view.visible_posts(), 5);
    }

    #[test]
    fn unknown_year_in_query_selects_all_years() {
        let mut doc = page(forty_seven_posts());
        let archive = mount(&mut doc, "?y=1999", 20);
        assert_eq!(archive.state().year, "");
        assert_eq!(archive.plan().eligible, 47);
        assert_eq!(archive.history().location().query(), None);
    }

    #[test]
    fn posts_are_moved_and_tagged() {
        let mut doc = page(vec![
            post(Some("2024-01-31"), "Late January"),
            post(None, "Undated"),
            post(Some("2023-07-04"), "July"),
        ]);
        let items = doc.find_all(doc.root(), &Selector::tag("li"));
        let archive = mount(&mut doc, "", 20);

        let container = archive.markup().container;
        assert!(doc.is_attached(items[0]));
        assert!(doc.is_attached(items[2]));
        assert!(!doc.is_attached(items[1]));
        assert_eq!(doc.get(items[0]).attr(YEAR_ATTR), Some("2024"));
        assert_eq!(doc.get(items[2]).attr(YEAR_ATTR), Some("2023"));
        assert_eq!(
            doc.closest(items[0], &Selector::id("bearming-archive")),
            Some(container)
        );
        assert_eq!(doc.find_all(doc.root(), &Selector::tag("li")).len(), 2);
        assert_eq!(archive.view(&doc).year_options[0].label, "All posts (2)");
    }

    #[test]
    fn tag_block_moves_to_the_end() {
        let tags = json!({"tag": "small", "children": [
            {"tag": "span", "id": "tags", "text": "#rust #bears"}
        ]});
        let mut doc = page_with(vec![tags], vec![post(Some("2024-01-01"), "Hello")]);
        let archive = mount(&mut doc, "", 20);

        let container = archive.markup().container;
        let last = *doc.children(container).last().expect("children");
        assert_eq!(doc.get(last).tag, "small");
        assert_eq!(doc.find_all(doc.root(), &Selector::id("tags")).len(), 1);
    }

    #[test]
    fn second_mount_is_a_no_op() {
        let mut doc = page(forty_seven_posts());
        let _archive = mount(&mut doc, "", 20);
        let before = doc.descendants(doc.root()).len();

        let again = ArchiveController::mount(&mut doc, history(""), &config(20));
        assert_matches!(again, Mounted::Skipped(SkipReason::AlreadyMounted));
        assert_eq!(doc.descendants(doc.root()).len(), before);
    }

    #[test]
    fn undated_pages_are_left_alone() {
        let mut doc = page(vec![post(None, "One"), post(Some("whenever"), "Two")]);
        let list = doc
            .find(doc.root(), &Selector::parse("ul.blog-posts"))
            .expect("list");
        let before = doc.descendants(doc.root()).len();

        let outcome = ArchiveController::mount(&mut doc, history("?p=3"), &config(20));
        assert_matches!(outcome, Mounted::Skipped(SkipReason::NoDatedPosts));
        assert!(doc.is_attached(list));
        assert_eq!(doc.descendants(doc.root()).len(), before);
        assert!(doc.find(doc.root(), &Selector::tag("select")).is_none());
    }

    #[test]
    fn missing_anchors_skip_quietly() {
        let mut doc = Document::from_json(r#"{"tag": "body", "class": "post"}"#).expect("doc");
        assert_matches!(
            ArchiveController::mount(&mut doc, history(""), &config(20)),
            Mounted::Skipped(SkipReason::NotBlogPage(class)) if class == "blog"
        );

        let mut doc = Document::from_json(r#"{"tag": "body", "class": "blog"}"#).expect("doc");
        assert_matches!(
            ArchiveController::mount(&mut doc, history(""), &config(20)),
            Mounted::Skipped(SkipReason::MissingMain)
        );

        let mut doc = Document::from_json(
            r#"{"tag": "body", "class": "blog", "children": [{"tag": "main"}]}"#,
        )
        .expect("doc");
        assert_matches!(
            ArchiveController::mount(&mut doc, history(""), &config(20)),
            Mounted::Skipped(SkipReason::MissingSourceList)
        );
    }

    #[test]
    fn embedded_list_is_preferred() {
        let page = json!({"tag": "body", "class": "blog", "children": [{"tag": "main", "children": [
            {"tag": "ul", "class": "blog-posts", "children": [post(Some("2020-01-01"), "Plain")]},
            {"tag": "ul", "class": "embedded blog-posts", "children": [post(Some("2021-01-01"), "Embedded")]}
        ]}]});
        let mut doc = Document::from_json(&page.to_string()).expect("doc");
        let archive = mount(&mut doc, "", 20);
        let view = archive.view(&doc);
        assert_eq!(view.sections.len(), 1);
        assert_eq!(view.sections[0].posts[0].title, "Embedded");
    }
}
