//! Builds the archive's markup in place of the source list and writes each
//! render pass back into it.

use crate::config::ArchiveConfig;
use crate::dom::{Document, NodeId, Selector};

use super::index::{ArchiveIndex, PostId, RawPost};
use super::visibility::VisibilityPlan;
use super::{FilterState, SkipReason};

pub const YEAR_ATTR: &str = "data-archive-year";

const SOURCE_LISTS: [&str; 2] = ["ul.embedded.blog-posts", "ul.blog-posts"];

/// Where the archive hooks into the host page.
#[derive(Debug, Clone)]
pub struct Anchors {
    pub main: NodeId,
    pub source_list: NodeId,
    pub items: Vec<NodeId>,
    pub tags_block: Option<NodeId>,
}

impl Anchors {
    /// Checks the page preconditions in order; the first one that fails is
    /// the reason the archive stays out of the page.
    pub fn locate(doc: &Document, config: &ArchiveConfig) -> Result<Self, SkipReason> {
        let body_class = &config.markup.body_class;
        let is_blog = doc
            .body()
            .map(|body| doc.get(body).has_class(body_class))
            .unwrap_or(false);
        if !is_blog {
            return Err(SkipReason::NotBlogPage(body_class.clone()));
        }

        let main = doc
            .find(doc.root(), &Selector::tag("main"))
            .ok_or(SkipReason::MissingMain)?;

        let source_list = SOURCE_LISTS
            .iter()
            .find_map(|selector| doc.find(main, &Selector::parse(selector)))
            .ok_or(SkipReason::MissingSourceList)?;

        if doc
            .find(main, &Selector::class(&config.markup.container_id))
            .is_some()
        {
            return Err(SkipReason::AlreadyMounted);
        }

        let items = doc.find_all(source_list, &Selector::tag("li"));
        if items.is_empty() {
            return Err(SkipReason::NoPosts);
        }

        let tags_block = doc
            .find(main, &Selector::id(&config.markup.tags_anchor_id))
            .and_then(|tags| doc.closest(tags, &Selector::tag("small")));

        Ok(Self {
            main,
            source_list,
            items,
            tags_block,
        })
    }

    /// Reads the timestamp and search text of every source item.
    pub fn raw_posts(&self, doc: &Document) -> Vec<RawPost> {
        let time = Selector::parse("time[datetime]");
        let link = Selector::tag("a");
        self.items
            .iter()
            .map(|item| {
                let datetime = doc
                    .find(*item, &time)
                    .and_then(|node| doc.get(node).attr("datetime"))
                    .filter(|value| !value.is_empty())
                    .map(str::to_string);
                let search_text = match doc.find(*item, &link) {
                    Some(anchor) => doc.text_content(anchor),
                    None => doc.text_content(*item),
                };
                RawPost {
                    datetime,
                    search_text,
                }
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct MonthSection {
    pub header: NodeId,
    pub list: NodeId,
}

/// Handles to every element the archive generated.
#[derive(Debug, Clone)]
pub struct ArchiveMarkup {
    pub container: NodeId,
    pub year_select: NodeId,
    pub search_input: NodeId,
    pub sections: Vec<MonthSection>,
    pub pagination: NodeId,
    pub prev_button: NodeId,
    pub page_info: NodeId,
    pub next_button: NodeId,
    /// Source item of each post, indexed by [`PostId`].
    post_nodes: Vec<NodeId>,
}

impl ArchiveMarkup {
    /// Replaces the source list with the grouped archive. Post items are
    /// moved into their month lists, never copied.
    pub fn materialize(
        doc: &mut Document,
        anchors: &Anchors,
        index: &ArchiveIndex,
        config: &ArchiveConfig,
    ) -> Self {
        let container_id = config.markup.container_id.as_str();
        let locale = &config.locale;

        doc.remove(anchors.source_list);

        let container = doc.create_with_class("div", container_id);
        doc.get_mut(container).id = Some(container_id.to_string());
        doc.append_child(anchors.main, container);

        let controls = doc.create_with_class("div", &format!("{container_id}-controls"));
        let year_select = doc.create_element("select");
        doc.set_attr(year_select, "aria-label", "Filter posts by year");
        doc.set_attr(year_select, "aria-controls", container_id);
        let all_option = doc.create_element("option");
        doc.set_attr(all_option, "value", "");
        doc.set_text(all_option, format!("{} ({})", locale.all_posts, index.len()));
        doc.append_child(year_select, all_option);
        for (year, count) in index.years().descending() {
            let option = doc.create_element("option");
            doc.set_attr(option, "value", year);
            doc.set_text(option, format!("{year} ({count})"));
            doc.append_child(year_select, option);
        }

        let search_input = doc.create_element("input");
        doc.set_attr(search_input, "type", "search");
        doc.set_attr(search_input, "placeholder", locale.search_placeholder.as_str());
        doc.set_attr(search_input, "autocomplete", "off");
        doc.set_attr(search_input, "spellcheck", "false");
        doc.set_attr(search_input, "aria-label", "Search posts");
        doc.set_attr(search_input, "aria-controls", container_id);

        doc.append_child(controls, year_select);
        doc.append_child(controls, search_input);
        doc.append_child(container, controls);

        let mut sections = Vec::with_capacity(index.buckets().len());
        let lookup = index
            .all_items()
            .iter()
            .map(|post| (post.id, post.year.as_str()))
            .collect::<std::collections::HashMap<PostId, &str>>();
        for bucket in index.buckets() {
            let header = doc.create_with_class("h3", &format!("{container_id}-h3"));
            doc.set_text(header, bucket.label.clone());
            let list = doc.create_with_class("ul", "blog-posts");
            for id in &bucket.posts {
                let item = anchors.items[id.0];
                if let Some(year) = lookup.get(id) {
                    doc.set_attr(item, YEAR_ATTR, *year);
                }
                doc.append_child(list, item);
            }
            doc.append_child(container, header);
            doc.append_child(container, list);
            sections.push(MonthSection { header, list });
        }

        let pagination =
            doc.create_with_class("div", &format!("pagination {container_id}-pagination"));
        let prev_button = doc.create_element("button");
        doc.set_attr(prev_button, "type", "button");
        doc.get_mut(prev_button).id = Some("prevPage".into());
        doc.set_text(prev_button, locale.previous.clone());
        doc.set_attr(prev_button, "aria-controls", container_id);
        let page_info = doc.create_element("span");
        doc.get_mut(page_info).id = Some("pageInfo".into());
        let next_button = doc.create_element("button");
        doc.set_attr(next_button, "type", "button");
        doc.get_mut(next_button).id = Some("nextPage".into());
        doc.set_text(next_button, locale.next.clone());
        doc.set_attr(next_button, "aria-controls", container_id);
        doc.append_child(pagination, prev_button);
        doc.append_child(pagination, page_info);
        doc.append_child(pagination, next_button);
        doc.append_child(container, pagination);

        if let Some(tags) = anchors.tags_block {
            doc.append_child(container, tags);
        }

        Self {
            container,
            year_select,
            search_input,
            sections,
            pagination,
            prev_button,
            page_info,
            next_button,
            post_nodes: anchors.items.clone(),
        }
    }

    pub fn post_node(&self, id: PostId) -> NodeId {
        self.post_nodes[id.0]
    }

    /// Mirrors the filter into the year select and the search box.
    pub fn sync_controls(&self, doc: &mut Document, state: &FilterState) {
        doc.get_mut(self.year_select).value = state.year.clone();
        doc.get_mut(self.search_input).value = state.term.clone();
    }

    /// Writes one render pass: post and month visibility, then pagination.
    pub fn apply(&self, doc: &mut Document, index: &ArchiveIndex, plan: &VisibilityPlan) {
        for post in index.all_items() {
            doc.get_mut(self.post_node(post.id)).hidden = !plan.is_post_visible(post.id);
        }
        for (section, visible) in self.sections.iter().zip(&plan.visible_buckets) {
            doc.get_mut(section.header).hidden = !visible;
            doc.get_mut(section.list).hidden = !visible;
        }

        doc.set_text(self.page_info, plan.page_info.clone());
        set_disabled(doc, self.prev_button, plan.prev_disabled);
        set_disabled(doc, self.next_button, plan.next_disabled);
        doc.get_mut(self.pagination).hidden = !plan.pagination_visible;
    }
}

fn set_disabled(doc: &mut Document, button: NodeId, disabled: bool) {
    doc.get_mut(button).disabled = disabled;
    doc.set_attr(button, "aria-disabled", if disabled { "true" } else { "false" });
}
