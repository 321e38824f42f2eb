use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Page sizes offered by the "per page" selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "usize", into = "usize")]
pub enum PageSize {
    Ten,
    Fifteen,
    #[default]
    TwentyFive,
}

impl PageSize {
    pub const ALL: [PageSize; 3] = [PageSize::Ten, PageSize::Fifteen, PageSize::TwentyFive];

    pub fn get(self) -> usize {
        match self {
            PageSize::Ten => 10,
            PageSize::Fifteen => 15,
            PageSize::TwentyFive => 25,
        }
    }
}

impl From<PageSize> for usize {
    fn from(size: PageSize) -> Self {
        size.get()
    }
}

impl TryFrom<usize> for PageSize {
    type Error = String;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        match value {
            10 => Ok(PageSize::Ten),
            15 => Ok(PageSize::Fifteen),
            25 => Ok(PageSize::TwentyFive),
            other => Err(format!("Unsupported page size: {} (expected 10, 15 or 25)", other)),
        }
    }
}

impl FromStr for PageSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: usize = s
            .trim()
            .parse()
            .map_err(|_| format!("Unsupported page size: {}", s))?;
        PageSize::try_from(value)
    }
}

impl fmt::Display for PageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.get())
    }
}

/// Page window over an ordered list of items.
///
/// The current page is always kept inside `1..=max(total_pages, 1)`, so every
/// navigation request is clamped rather than rejected.
#[derive(Debug, Clone)]
pub struct Paginator<T> {
    items: Vec<T>,
    current_page: usize,
    page_size: PageSize,
}

impl<T> Paginator<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self::with_page_size(items, PageSize::default())
    }

    pub fn with_page_size(items: Vec<T>, page_size: PageSize) -> Self {
        Self {
            items,
            current_page: 1,
            page_size,
        }
    }

    /// Replace the underlying list, keeping the page size and re-clamping the page.
    pub fn set_items(&mut self, items: Vec<T>) {
        self.items = items;
        self.current_page = self.current_page.min(self.total_pages().max(1));
    }

    /// Change the page size. Always restarts at page 1.
    pub fn set_page_size(&mut self, page_size: PageSize) {
        self.page_size = page_size;
        self.current_page = 1;
    }

    pub fn go_to_page(&mut self, page: i64) {
        let last = self.total_pages().max(1) as i64;
        self.current_page = page.clamp(1, last) as usize;
    }

    pub fn next_page(&mut self) {
        self.go_to_page(self.current_page as i64 + 1);
    }

    pub fn prev_page(&mut self) {
        self.go_to_page(self.current_page as i64 - 1);
    }

    pub fn paginated_data(&self) -> &[T] {
        let size = self.page_size.get();
        let start = (self.current_page - 1) * size;
        if start >= self.items.len() {
            return &[];
        }
        let end = (start + size).min(self.items.len());
        &self.items[start..end]
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn page_size(&self) -> PageSize {
        self.page_size
    }

    pub fn total_pages(&self) -> usize {
        self.items.len().div_ceil(self.page_size.get())
    }

    pub fn total_items(&self) -> usize {
        self.items.len()
    }

    pub fn has_next_page(&self) -> bool {
        self.current_page < self.total_pages()
    }

    pub fn has_prev_page(&self) -> bool {
        self.current_page > 1
    }

    /// Footer text such as `"26-50 of 60"`, or `"0 items"` for an empty list.
    pub fn range_label(&self) -> String {
        let total = self.total_items();
        if total == 0 {
            return "0 items".to_string();
        }
        let size = self.page_size.get();
        let start = (self.current_page - 1) * size + 1;
        let end = (self.current_page * size).min(total);
        format!("{}-{} of {}", start, end, total)
    }
}

impl<T> Default for Paginator<T> {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbers(n: usize) -> Vec<usize> {
        (0..n).collect()
    }

    #[test]
    fn test_defaults_to_twenty_five() {
        let pager = Paginator::new(numbers(30));
        assert_eq!(pager.page_size(), PageSize::TwentyFive);
        assert_eq!(pager.current_page(), 1);
        assert_eq!(pager.paginated_data(), &numbers(25)[..]);
    }

    #[test]
    fn test_total_pages_is_ceiling() {
        for size in PageSize::ALL {
            for total in 0..80 {
                let pager = Paginator::with_page_size(numbers(total), size);
                assert_eq!(pager.total_pages(), (total + size.get() - 1) / size.get());
            }
        }
        assert_eq!(Paginator::<u8>::default().total_pages(), 0);
    }

    #[test]
    fn test_windows_cover_every_item_once() {
        for size in PageSize::ALL {
            for total in [0, 1, 9, 10, 11, 15, 24, 25, 26, 51, 77] {
                let mut pager = Paginator::with_page_size(numbers(total), size);
                let mut seen = Vec::new();
                for page in 1..=pager.total_pages() {
                    pager.go_to_page(page as i64);
                    let window = pager.paginated_data();
                    assert!(window.len() <= size.get());
                    seen.extend_from_slice(window);
                }
                assert_eq!(seen, numbers(total));
            }
        }
    }

    #[test]
    fn test_go_to_page_clamps() {
        let mut pager = Paginator::with_page_size(numbers(35), PageSize::Ten);
        for (requested, expected) in [(-5, 1), (0, 1), (1, 1), (3, 3), (4, 4), (5, 4), (1000, 4)] {
            pager.go_to_page(requested);
            assert_eq!(pager.current_page(), expected, "requested page {}", requested);
        }
    }

    #[test]
    fn test_go_to_page_on_empty_list_stays_on_first_page() {
        let mut pager: Paginator<usize> = Paginator::default();
        pager.go_to_page(7);
        assert_eq!(pager.current_page(), 1);
        assert!(pager.paginated_data().is_empty());
        assert!(!pager.has_next_page());
        assert!(!pager.has_prev_page());
    }

    #[test]
    fn test_set_page_size_resets_to_first_page() {
        let mut pager = Paginator::with_page_size(numbers(100), PageSize::Ten);
        pager.go_to_page(6);
        pager.set_page_size(PageSize::Fifteen);
        assert_eq!(pager.current_page(), 1);
        pager.go_to_page(2);
        pager.set_page_size(PageSize::Fifteen);
        assert_eq!(pager.current_page(), 1);
    }

    #[test]
    fn test_next_and_prev_flags() {
        let mut pager = Paginator::with_page_size(numbers(20), PageSize::Ten);
        assert!(pager.has_next_page());
        assert!(!pager.has_prev_page());
        pager.next_page();
        assert_eq!(pager.paginated_data(), &numbers(20)[10..]);
        assert!(!pager.has_next_page());
        assert!(pager.has_prev_page());
        pager.next_page();
        assert_eq!(pager.current_page(), 2);
        pager.prev_page();
        pager.prev_page();
        assert_eq!(pager.current_page(), 1);
    }

    #[test]
    fn test_set_items_reclamps_current_page() {
        let mut pager = Paginator::with_page_size(numbers(50), PageSize::Ten);
        pager.go_to_page(5);
        pager.set_items(numbers(12));
        assert_eq!(pager.current_page(), 2);
        assert_eq!(pager.page_size(), PageSize::Ten);
        assert_eq!(pager.paginated_data(), &[10, 11]);
    }

    #[test]
    fn test_range_label() {
        let mut pager = Paginator::new(numbers(60));
        assert_eq!(pager.range_label(), "1-25 of 60");
        pager.go_to_page(3);
        assert_eq!(pager.range_label(), "51-60 of 60");
        assert_eq!(Paginator::<u8>::default().range_label(), "0 items");
    }

    #[test]
    fn test_page_size_parsing() {
        assert_eq!("15".parse::<PageSize>(), Ok(PageSize::Fifteen));
        assert!("20".parse::<PageSize>().is_err());
        assert!("ten".parse::<PageSize>().is_err());
        assert_eq!(serde_json::to_string(&PageSize::Ten).unwrap(), "10");
        assert_eq!(serde_json::from_str::<PageSize>("25").unwrap(), PageSize::TwentyFive);
    }
}
