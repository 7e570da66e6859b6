//! Catalog page view model.
//!
//! The catalog loads every product once and filters, sorts and pages in
//! memory. Paging is "load more": page `n` shows the first `n * per_page`
//! matches.

use marys_fashion_core::Product;
use serde::Serialize;

/// Products added per "load more".
pub const DEFAULT_PER_PAGE: usize = 12;

/// Catalog sort order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CatalogSort {
    /// Alphabetical by name, ignoring case.
    #[default]
    Name,
    PriceAsc,
    PriceDesc,
    /// Featured products first, otherwise unchanged.
    Featured,
}

impl CatalogSort {
    /// Parse from URL parameter value. Unknown values sort by name.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s {
            "price-asc" => Self::PriceAsc,
            "price-desc" => Self::PriceDesc,
            "featured" => Self::Featured,
            _ => Self::Name,
        }
    }

    /// Convert to URL parameter value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::PriceAsc => "price-asc",
            Self::PriceDesc => "price-desc",
            Self::Featured => "featured",
        }
    }

    fn sort(self, products: &mut [Product]) {
        match self {
            Self::Name => products.sort_by_cached_key(|p| p.name.to_lowercase()),
            Self::PriceAsc => products.sort_by_key(|p| p.price),
            Self::PriceDesc => products.sort_by(|a, b| b.price.cmp(&a.price)),
            Self::Featured => products.sort_by_key(|p| !p.is_featured()),
        }
    }
}

/// Catalog filters and paging state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogQuery {
    /// Case-insensitive substring of name, description or category.
    pub search: Option<String>,
    /// Exact category label.
    pub category: Option<String>,
    pub sort: CatalogSort,
    /// 1-based.
    pub page: usize,
    pub per_page: usize,
}

impl Default for CatalogQuery {
    fn default() -> Self {
        Self {
            search: None,
            category: None,
            sort: CatalogSort::default(),
            page: 1,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

/// One rendering of the catalog.
#[derive(Debug, Clone, Serialize)]
pub struct CatalogPage {
    pub products: Vec<Product>,
    /// Matches before paging.
    pub total: usize,
    pub has_more: bool,
    pub page: usize,
}

impl CatalogQuery {
    /// Filter, sort and page `products`.
    #[must_use]
    pub fn apply(&self, products: Vec<Product>) -> CatalogPage {
        let search = self
            .search
            .as_deref()
            .filter(|text| !text.trim().is_empty());
        let category = self.category.as_deref().filter(|c| !c.is_empty());

        let mut matched: Vec<Product> = products
            .into_iter()
            .filter(|p| search.is_none_or(|text| p.matches_text(text)))
            .filter(|p| category.is_none_or(|c| p.category == c))
            .collect();
        self.sort.sort(&mut matched);

        let page = self.page.max(1);
        let total = matched.len();
        matched.truncate(page.saturating_mul(self.per_page));

        CatalogPage {
            has_more: matched.len() < total,
            products: matched,
            total,
            page,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::gateway::{decode_rows, seed};

    fn products() -> Vec<Product> {
        decode_rows(seed::demo_products()).unwrap()
    }

    fn names(page: &CatalogPage) -> Vec<&str> {
        page.products.iter().map(|p| p.name.as_str()).collect()
    }

    #[test]
    fn test_sort_parse_roundtrip_and_fallback() {
        for sort in [
            CatalogSort::Name,
            CatalogSort::PriceAsc,
            CatalogSort::PriceDesc,
            CatalogSort::Featured,
        ] {
            assert_eq!(CatalogSort::parse(sort.as_str()), sort);
        }
        assert_eq!(CatalogSort::parse("popular"), CatalogSort::Name);
    }

    #[test]
    fn test_default_sorts_by_name() {
        let page = CatalogQuery::default().apply(products());
        assert_eq!(names(&page)[0], "Blazer Feminino Clássico");
        assert_eq!(page.total, 6);
        assert!(!page.has_more);
    }

    #[test]
    fn test_price_sorts() {
        let asc = CatalogQuery {
            sort: CatalogSort::PriceAsc,
            ..Default::default()
        }
        .apply(products());
        assert_eq!(names(&asc)[0], "Saia Midi Plissada");

        let desc = CatalogQuery {
            sort: CatalogSort::PriceDesc,
            ..Default::default()
        }
        .apply(products());
        assert_eq!(names(&desc)[0], "Blazer Feminino Clássico");
    }

    #[test]
    fn test_featured_first_keeps_relative_order() {
        let page = CatalogQuery {
            sort: CatalogSort::Featured,
            ..Default::default()
        }
        .apply(products());
        assert!(page.products[0].is_featured());
        assert!(page.products[1].is_featured());
        assert_eq!(names(&page)[2], "Calça Jeans Skinny");
    }

    #[test]
    fn test_search_and_category_filters() {
        let page = CatalogQuery {
            search: Some("ELEGANTE".to_string()),
            category: Some("saias".to_string()),
            ..Default::default()
        }
        .apply(products());
        assert_eq!(names(&page), vec!["Saia Midi Plissada"]);
        assert_eq!(page.total, 1);

        let blank = CatalogQuery {
            search: Some("   ".to_string()),
            ..Default::default()
        }
        .apply(products());
        assert_eq!(blank.total, 6);
    }

    #[test]
    fn test_load_more_paging() {
        let first = CatalogQuery {
            per_page: 4,
            ..Default::default()
        }
        .apply(products());
        assert_eq!(first.products.len(), 4);
        assert!(first.has_more);

        let second = CatalogQuery {
            per_page: 4,
            page: 2,
            ..Default::default()
        }
        .apply(products());
        assert_eq!(second.products.len(), 6);
        assert!(!second.has_more);
        assert_eq!(second.products[..4], first.products[..]);
    }
}
