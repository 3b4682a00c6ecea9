//! Month-grouped, filterable, paginated archive listing.

use thiserror::Error;

mod controller;
pub mod filter;
pub mod index;
pub mod markup;
pub mod paginate;
mod state;
pub mod visibility;

pub use controller::{ArchiveController, ArchiveView, Mounted, PostView, SectionView, YearOption};
pub use filter::{filter_posts, TermMatcher};
pub use index::{ArchiveIndex, IndexedPost, MonthBucket, PostId, RawPost, YearIndex};
pub use paginate::{paginate, total_pages, Page};
pub use state::FilterState;
pub use visibility::VisibilityPlan;

/// Why the archive left a page untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SkipReason {
    #[error("page body does not carry the `{0}` class")]
    NotBlogPage(String),
    #[error("page has no <main> element")]
    MissingMain,
    #[error("no blog post list inside <main>")]
    MissingSourceList,
    #[error("archive is already mounted on this page")]
    AlreadyMounted,
    #[error("post list is empty")]
    NoPosts,
    #[error("no post carries a usable date")]
    NoDatedPosts,
}
