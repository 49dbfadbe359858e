//! QueryBuilder for fluent list query construction

use super::filters::{Filter, Listable};
use super::result::Paged;

pub const DEFAULT_PER_PAGE: usize = 20;

/// Reusable description of a filtered, paginated listing
#[derive(Debug, Clone, PartialEq)]
pub struct ListQuery {
    pub filters: Vec<Filter>,
    /// 1-based page number
    pub page: usize,
    pub per_page: usize,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            filters: Vec::new(),
            page: 1,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

impl ListQuery {
    pub fn matches<T: Listable>(&self, item: &T) -> bool {
        self.filters.iter().all(|f| f.matches(item))
    }

    /// Filter then paginate a fetched collection
    pub fn apply<T: Listable + Clone>(&self, items: &[T]) -> Paged<T> {
        let matching: Vec<&T> = items.iter().filter(|item| self.matches(*item)).collect();
        let per_page = self.per_page.max(1);
        let total = matching.len();
        let total_pages = total.div_ceil(per_page).max(1);
        let page = self.page.clamp(1, total_pages);

        let items = matching
            .into_iter()
            .skip((page - 1) * per_page)
            .take(per_page)
            .cloned()
            .collect();

        Paged {
            items,
            page,
            per_page,
            total,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct QueryBuilder {
    query: ListQuery,
}

impl QueryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Free-text search; blank text is ignored
    pub fn search(mut self, text: impl Into<String>) -> Self {
        let text = text.into();
        if !text.trim().is_empty() {
            self.query.filters.push(Filter::search(text));
        }
        self
    }

    pub fn status(mut self, status: impl Into<String>) -> Self {
        self.query.filters.push(Filter::status(status));
        self
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.query.filters.push(filter);
        self
    }

    pub fn page(mut self, page: usize) -> Self {
        self.query.page = page;
        self
    }

    pub fn per_page(mut self, per_page: usize) -> Self {
        self.query.per_page = per_page;
        self
    }

    pub fn build(self) -> ListQuery {
        self.query
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::Function;

    fn functions(count: usize) -> Vec<Function> {
        (1..=count)
            .map(|i| Function {
                id: i.to_string(),
                name: format!("Function {}", i),
                is_active: i % 2 == 0,
            })
            .collect()
    }

    #[test]
    fn test_basic_pagination() {
        let items = functions(45);
        let page = QueryBuilder::new().page(3).per_page(20).build().apply(&items);
        assert_eq!(page.items.len(), 5);
        assert_eq!(page.total, 45);
        assert_eq!(page.total_pages(), 3);
        assert!(!page.has_next());
        assert!(page.has_previous());
    }

    #[test]
    fn test_page_is_clamped() {
        let items = functions(3);
        let page = QueryBuilder::new().page(9).build().apply(&items);
        assert_eq!(page.page, 1);
        assert_eq!(page.items.len(), 3);

        let empty: Vec<Function> = Vec::new();
        let page = QueryBuilder::new().build().apply(&empty);
        assert_eq!(page.total_pages(), 1);
        assert!(page.items.is_empty());
    }

    #[test]
    fn test_filters_apply_before_paging() {
        let items = functions(10);
        let page = QueryBuilder::new()
            .status("active")
            .search("function 1")
            .build()
            .apply(&items);
        // Function 10 is the only active match for "function 1"
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].name, "Function 10");
    }
}
