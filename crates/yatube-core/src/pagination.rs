//! Page-number pagination over an already ordered collection.

use serde::Serialize;

/// Number of posts shown on each listing page.
pub const POSTS_PER_PAGE: usize = 10;

/// Splits an ordered collection into fixed-size pages.
#[derive(Debug, Clone)]
pub struct Paginator<T> {
    items: Vec<T>,
    per_page: usize,
}

/// One page of a [`Paginator`], numbered from 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub number: usize,
    pub num_pages: usize,
    /// Size of the whole collection, not of this page.
    pub count: usize,
    pub has_next: bool,
    pub has_previous: bool,
    pub next_page_number: Option<usize>,
    pub previous_page_number: Option<usize>,
    pub object_list: Vec<T>,
}

impl<T: Clone> Paginator<T> {
    pub fn new(items: Vec<T>, per_page: usize) -> Self {
        Self {
            items,
            per_page: per_page.max(1),
        }
    }

    /// Always at least one, so an empty collection still renders an (empty) first page.
    pub fn num_pages(&self) -> usize {
        self.items.len().div_ceil(self.per_page).max(1)
    }

    /// Resolve a raw `?page=` value to a page.
    ///
    /// Missing or non-numeric input yields the first page; numbers outside
    /// `1..=num_pages` are clamped to the nearest valid page.
    pub fn get_page(&self, raw: Option<&str>) -> Page<T> {
        let last = self.num_pages();
        let number = match raw.map(str::trim) {
            None => 1,
            Some(s) => match s.parse::<i64>() {
                Ok(n) => usize::try_from(n).unwrap_or(1),
                // Too many digits for any integer: still a page past the end.
                Err(_) if is_positive_number(s) => last,
                Err(_) => 1,
            },
        };

        self.page(number.clamp(1, last))
    }

    /// Build page `number`, which must already be in range.
    fn page(&self, number: usize) -> Page<T> {
        let last = self.num_pages();
        let start = (number - 1) * self.per_page;
        let end = (start + self.per_page).min(self.items.len());
        let object_list = self.items.get(start..end).unwrap_or_default().to_vec();

        Page {
            number,
            num_pages: last,
            count: self.items.len(),
            has_next: number < last,
            has_previous: number > 1,
            next_page_number: (number < last).then_some(number + 1),
            previous_page_number: (number > 1).then(|| number - 1),
            object_list,
        }
    }

    /// The full, unpaginated collection.
    pub fn into_items(self) -> Vec<T> {
        self.items
    }
}

fn is_positive_number(s: &str) -> bool {
    let digits = s.strip_prefix('+').unwrap_or(s);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paginator(n: usize) -> Paginator<usize> {
        Paginator::new((1..=n).collect(), 10)
    }

    #[test]
    fn test_first_page_by_default() {
        let page = paginator(13).get_page(None);

        assert_eq!(page.number, 1);
        assert_eq!(page.num_pages, 2);
        assert_eq!(page.count, 13);
        assert_eq!(page.object_list, (1..=10).collect::<Vec<_>>());
        assert!(page.has_next);
        assert!(!page.has_previous);
        assert_eq!(page.next_page_number, Some(2));
    }

    #[test]
    fn test_last_page_is_partial() {
        let page = paginator(13).get_page(Some("2"));

        assert_eq!(page.object_list, vec![11, 12, 13]);
        assert!(!page.has_next);
        assert_eq!(page.previous_page_number, Some(1));
    }

    #[test]
    fn test_out_of_range_clamps_to_nearest_page() {
        let p = paginator(25);

        assert_eq!(p.get_page(Some("99")).number, 3);
        assert_eq!(p.get_page(Some("0")).number, 1);
        assert_eq!(p.get_page(Some("-4")).number, 1);
    }

    #[test]
    fn test_overflowing_page_number_clamps_to_last_page() {
        let p = paginator(25);

        assert_eq!(p.get_page(Some("99999999999999999999")).number, 3);
        assert_eq!(p.get_page(Some("+99999999999999999999")).number, 3);
        assert_eq!(p.get_page(Some("-99999999999999999999")).number, 1);
    }

    #[test]
    fn test_garbage_page_number_falls_back_to_first() {
        assert_eq!(paginator(25).get_page(Some("abc")).number, 1);
        assert_eq!(paginator(25).get_page(Some("")).number, 1);
    }

    #[test]
    fn test_empty_collection_has_one_empty_page() {
        let page = paginator(0).get_page(Some("5"));

        assert_eq!(page.number, 1);
        assert_eq!(page.num_pages, 1);
        assert!(page.object_list.is_empty());
        assert!(!page.has_next);
    }

    #[test]
    fn test_exact_multiple_of_page_size() {
        let p = paginator(20);

        assert_eq!(p.num_pages(), 2);
        assert_eq!(p.get_page(Some("2")).object_list.len(), 10);
    }
}
