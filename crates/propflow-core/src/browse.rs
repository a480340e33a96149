// ── Client-side list browsing ──
//
// Pagination and search over in-memory snapshots. Every listing except
// cheques arrives unpaginated from the backend, so slicing and matching
// happen synchronously on whatever the store last fetched.

/// A page sliced out of an in-memory list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSlice<T> {
    pub items: Vec<T>,
    /// 1-based page number, clamped into range.
    pub page: usize,
    pub total_pages: usize,
    pub total_items: usize,
}

/// Slice `items` into the requested 1-based page.
///
/// Out-of-range pages clamp to the last page rather than returning
/// empty; an empty list yields a single empty page.
pub fn paginate<T: Clone>(items: &[T], page: usize, page_size: usize) -> PageSlice<T> {
    let page_size = page_size.max(1);
    let total_items = items.len();
    let total_pages = total_items.div_ceil(page_size).max(1);
    let page = page.clamp(1, total_pages);

    let start = (page - 1) * page_size;
    let end = (start + page_size).min(total_items);
    let slice = if start < total_items {
        items[start..end].to_vec()
    } else {
        Vec::new()
    };

    PageSlice {
        items: slice,
        page,
        total_pages,
        total_items,
    }
}

/// Case-insensitive substring search over the display fields `extract`
/// yields for each item. A blank query matches everything.
pub fn search<'a, T>(
    items: &'a [T],
    query: &str,
    extract: impl Fn(&T) -> Vec<&str>,
) -> Vec<&'a T> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return items.iter().collect();
    }

    items
        .iter()
        .filter(|item| {
            extract(item)
                .iter()
                .any(|field| field.to_lowercase().contains(&needle))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paginates_with_clamping() {
        let items: Vec<u32> = (1..=7).collect();

        let first = paginate(&items, 1, 3);
        assert_eq!(first.items, vec![1, 2, 3]);
        assert_eq!(first.total_pages, 3);
        assert_eq!(first.total_items, 7);

        let last = paginate(&items, 3, 3);
        assert_eq!(last.items, vec![7]);

        // Out-of-range clamps to the last page, zero clamps to the first.
        assert_eq!(paginate(&items, 99, 3).page, 3);
        assert_eq!(paginate(&items, 0, 3).page, 1);
    }

    #[test]
    fn empty_list_is_one_empty_page() {
        let slice = paginate::<u32>(&[], 5, 10);
        assert!(slice.items.is_empty());
        assert_eq!(slice.page, 1);
        assert_eq!(slice.total_pages, 1);
    }

    #[test]
    fn search_is_case_insensitive_over_all_fields() {
        let rows = vec![
            ("Riverside Tower", "A-101"),
            ("Canal Court", "B-7"),
            ("Hillview", "a-203"),
        ];
        let hits = search(&rows, "a-", |r| vec![r.0, r.1]);
        assert_eq!(hits.len(), 2);

        let hits = search(&rows, "CANAL", |r| vec![r.0, r.1]);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].0, "Canal Court");
    }

    #[test]
    fn blank_query_matches_everything() {
        let rows = vec![("x", "y")];
        assert_eq!(search(&rows, "   ", |r| vec![r.0]).len(), 1);
    }
}
