use std::collections::HashSet;

use super::index::{ArchiveIndex, IndexedPost, PostId};
use super::paginate::Page;

/// Everything one render pass writes to the page. It is computed from the
/// current filter and page alone; nothing is read back from earlier passes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisibilityPlan {
    pub visible_posts: HashSet<PostId>,
    /// One flag per bucket, in bucket order.
    pub visible_buckets: Vec<bool>,
    pub pagination_visible: bool,
    pub prev_disabled: bool,
    pub next_disabled: bool,
    pub page_info: String,
    pub eligible: usize,
    pub current_page: u32,
    pub total_pages: u32,
}

impl VisibilityPlan {
    pub fn build(
        index: &ArchiveIndex,
        page: &Page<'_, &IndexedPost>,
        eligible: usize,
        page_size: usize,
    ) -> Self {
        let visible_posts: HashSet<PostId> = page.items.iter().map(|post| post.id).collect();
        let visible_buckets = index
            .buckets()
            .iter()
            .map(|bucket| bucket.posts.iter().any(|id| visible_posts.contains(id)))
            .collect();
        Self {
            visible_posts,
            visible_buckets,
            pagination_visible: eligible > page_size.max(1),
            prev_disabled: page.current == 1,
            next_disabled: page.current == page.total,
            page_info: format!("Page {} of {}", page.current, page.total),
            eligible,
            current_page: page.current,
            total_pages: page.total,
        }
    }

    pub fn is_post_visible(&self, id: PostId) -> bool {
        self.visible_posts.contains(&id)
    }
}
