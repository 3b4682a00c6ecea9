#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<'a, T> {
    pub items: &'a [T],
    pub current: u32,
    pub total: u32,
}

pub fn total_pages(len: usize, page_size: usize) -> u32 {
    let page_size = page_size.max(1);
    let pages = len.div_ceil(page_size).max(1);
    u32::try_from(pages).unwrap_or(u32::MAX)
}

/// Slices one page out of `eligible`. `requested` is clamped into
/// `1..=total`, so stale or hostile page numbers always land on a real page.
pub fn paginate<T>(eligible: &[T], requested: i64, page_size: usize) -> Page<'_, T> {
    let page_size = page_size.max(1);
    let total = total_pages(eligible.len(), page_size);
    let current = requested.clamp(1, i64::from(total)) as u32;
    let start = (current as usize - 1).saturating_mul(page_size).min(eligible.len());
    let end = start.saturating_add(page_size).min(eligible.len());
    Page {
        items: &eligible[start..end],
        current,
        total,
    }
}
