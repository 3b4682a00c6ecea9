use std::collections::BTreeMap;

use indexmap::IndexMap;
use time::OffsetDateTime;

use crate::date::{parse_post_date, PostDate};

/// Position of a post in the source list, in original document order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PostId(pub usize);

/// What the index needs to know about one source entry.
#[derive(Debug, Clone, Default)]
pub struct RawPost {
    pub datetime: Option<String>,
    /// Text the search term is matched against.
    pub search_text: String,
}

#[derive(Debug, Clone)]
pub struct IndexedPost {
    pub id: PostId,
    pub date: PostDate,
    pub year: String,
    pub month_key: String,
    pub search_text: String,
}

#[derive(Debug, Clone)]
pub struct MonthBucket {
    pub key: String,
    pub label: String,
    pub sort_date: OffsetDateTime,
    pub posts: Vec<PostId>,
}

/// Post counts per year.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct YearIndex {
    counts: BTreeMap<String, usize>,
}

impl YearIndex {
    fn record(&mut self, year: &str) {
        *self.counts.entry(year.to_string()).or_insert(0) += 1;
    }

    pub fn count(&self, year: &str) -> usize {
        self.counts.get(year).copied().unwrap_or(0)
    }

    pub fn contains(&self, year: &str) -> bool {
        self.counts.contains_key(year)
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Years newest first, compared numerically.
    pub fn descending(&self) -> Vec<(&str, usize)> {
        let mut years: Vec<(&str, usize)> = self
            .counts
            .iter()
            .map(|(year, count)| (year.as_str(), *count))
            .collect();
        years.sort_by_key(|(year, _)| std::cmp::Reverse(year.parse::<i64>().unwrap_or(i64::MIN)));
        years
    }
}

/// Month buckets, year counts and the flat reading order derived from them.
#[derive(Debug, Clone, Default)]
pub struct ArchiveIndex {
    buckets: Vec<MonthBucket>,
    years: YearIndex,
    all_items: Vec<IndexedPost>,
}

impl ArchiveIndex {
    pub fn build<I>(posts: I) -> Self
    where
        I: IntoIterator<Item = RawPost>,
    {
        let mut years = YearIndex::default();
        let mut groups: IndexMap<String, (MonthBucket, Vec<IndexedPost>)> = IndexMap::new();

        for (position, raw) in posts.into_iter().enumerate() {
            let id = PostId(position);
            let Some(date) = raw.datetime.as_deref().and_then(parse_post_date) else {
                tracing::debug!(?id, datetime = ?raw.datetime, "skipping post without a usable date");
                continue;
            };
            let year = date.year_key();
            let month_key = date.month_key();
            years.record(&year);

            let (bucket, members) = groups.entry(month_key.clone()).or_insert_with(|| {
                (
                    MonthBucket {
                        key: month_key.clone(),
                        label: date.month_label(),
                        sort_date: date.instant(),
                        posts: Vec::new(),
                    },
                    Vec::new(),
                )
            });
            bucket.posts.push(id);
            members.push(IndexedPost {
                id,
                date,
                year,
                month_key,
                search_text: raw.search_text,
            });
        }

        let mut groups: Vec<(MonthBucket, Vec<IndexedPost>)> = groups.into_values().collect();
        groups.sort_by(|(a, _), (b, _)| b.sort_date.cmp(&a.sort_date));

        let mut buckets = Vec::with_capacity(groups.len());
        let mut all_items = Vec::new();
        for (bucket, members) in groups {
            all_items.extend(members);
            buckets.push(bucket);
        }

        Self {
            buckets,
            years,
            all_items,
        }
    }

    pub fn buckets(&self) -> &[MonthBucket] {
        &self.buckets
    }

    pub fn years(&self) -> &YearIndex {
        &self.years
    }

    /// Dated posts, newest bucket first, document order within a bucket.
    pub fn all_items(&self) -> &[IndexedPost] {
        &self.all_items
    }

    pub fn is_empty(&self) -> bool {
        self.all_items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.all_items.len()
    }
}
