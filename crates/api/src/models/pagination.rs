//! Pagination and sorting for list endpoints.
//!
//! Pages are 1-based. `size` is clamped to `1..=MAX_PAGE_SIZE`. Sorting is
//! expressed as `field,DIR` and resolved against a per-resource whitelist, so
//! user input never reaches SQL as an identifier.

use serde::Serialize;

/// Largest page a client can request.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Page number and size, already clamped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub size: u32,
}

impl PageRequest {
    /// Build from raw query values, falling back to `default_size`.
    #[must_use]
    pub fn new(page: Option<i64>, size: Option<i64>, default_size: u32) -> Self {
        let page = page.unwrap_or(1).clamp(1, i64::from(u32::MAX));
        let size = size
            .unwrap_or_else(|| i64::from(default_size))
            .clamp(1, i64::from(MAX_PAGE_SIZE));

        Self {
            page: u32::try_from(page).unwrap_or(1),
            size: u32::try_from(size).unwrap_or(MAX_PAGE_SIZE),
        }
    }

    #[must_use]
    pub fn limit(self) -> i64 {
        i64::from(self.size)
    }

    #[must_use]
    pub fn offset(self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.size)
    }
}

/// One page of results plus the total match count.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub request: PageRequest,
    pub total_elements: i64,
}

impl<T> Page<T> {
    #[must_use]
    pub fn total_pages(&self) -> i64 {
        if self.total_elements <= 0 {
            return 0;
        }
        let size = i64::from(self.request.size);
        (self.total_elements + size - 1) / size
    }

    /// Convert each item, keeping paging metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            request: self.request,
            total_elements: self.total_elements,
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// A sortable column of some resource.
pub trait SortField: Copy + Default {
    /// Match a client-supplied field name (`created_at`, `price`, ...).
    fn from_name(name: &str) -> Option<Self>;

    /// Column expression used in `ORDER BY`.
    fn column(self) -> &'static str;

    /// Name echoed back to the client.
    fn name(self) -> &'static str;
}

/// Parsed `sort=field,DIR` parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Sort<F> {
    pub field: F,
    pub direction: SortDirection,
}

impl<F: SortField> Sort<F> {
    /// Parse `field,DIR`. Unknown fields fall back to the default field;
    /// anything other than `ASC` (case-insensitive) sorts descending.
    #[must_use]
    pub fn parse(raw: Option<&str>) -> Self {
        let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
            return Self::default();
        };

        let (name, dir) = raw.split_once(',').unwrap_or((raw, "DESC"));
        let field = F::from_name(name.trim()).unwrap_or_default();
        let direction = if dir.trim().eq_ignore_ascii_case("ASC") {
            SortDirection::Asc
        } else {
            SortDirection::Desc
        };

        Self { field, direction }
    }

    /// `ORDER BY` clause body, with `tiebreak` appended for stable paging.
    #[must_use]
    pub fn order_by(self, tiebreak: &str) -> String {
        format!(
            "{} {}, {tiebreak} {}",
            self.field.column(),
            self.direction.as_sql(),
            self.direction.as_sql()
        )
    }

    /// Echo form, e.g. `price,ASC`.
    #[must_use]
    pub fn describe(self) -> String {
        format!("{},{}", self.field.name(), self.direction.as_sql())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    enum TestField {
        #[default]
        CreatedAt,
        Title,
    }

    impl SortField for TestField {
        fn from_name(name: &str) -> Option<Self> {
            match name {
                "created_at" => Some(Self::CreatedAt),
                "title" => Some(Self::Title),
                _ => None,
            }
        }

        fn column(self) -> &'static str {
            match self {
                Self::CreatedAt => "b.created_at",
                Self::Title => "b.title",
            }
        }

        fn name(self) -> &'static str {
            match self {
                Self::CreatedAt => "created_at",
                Self::Title => "title",
            }
        }
    }

    #[test]
    fn test_page_request_defaults() {
        let req = PageRequest::new(None, None, 20);
        assert_eq!(req, PageRequest { page: 1, size: 20 });
        assert_eq!(req.offset(), 0);
    }

    #[test]
    fn test_page_request_clamps() {
        assert_eq!(PageRequest::new(Some(0), Some(0), 20).page, 1);
        assert_eq!(PageRequest::new(Some(-3), Some(-1), 20).size, 1);
        assert_eq!(PageRequest::new(Some(2), Some(5000), 20).size, MAX_PAGE_SIZE);
    }

    #[test]
    fn test_page_request_offset() {
        let req = PageRequest::new(Some(3), Some(10), 20);
        assert_eq!(req.limit(), 10);
        assert_eq!(req.offset(), 20);
    }

    #[test]
    fn test_total_pages() {
        let page = |total| Page::<()> {
            items: Vec::new(),
            request: PageRequest { page: 1, size: 10 },
            total_elements: total,
        };
        assert_eq!(page(0).total_pages(), 0);
        assert_eq!(page(1).total_pages(), 1);
        assert_eq!(page(10).total_pages(), 1);
        assert_eq!(page(11).total_pages(), 2);
    }

    #[test]
    fn test_sort_parse() {
        let sort = Sort::<TestField>::parse(Some("title,ASC"));
        assert_eq!(sort.field, TestField::Title);
        assert_eq!(sort.direction, SortDirection::Asc);
        assert_eq!(sort.describe(), "title,ASC");
    }

    #[test]
    fn test_sort_defaults_and_unknown_fields() {
        let sort = Sort::<TestField>::parse(None);
        assert_eq!(sort.describe(), "created_at,DESC");

        let sort = Sort::<TestField>::parse(Some("password_hash,asc"));
        assert_eq!(sort.field, TestField::CreatedAt);
        assert_eq!(sort.direction, SortDirection::Asc);

        let sort = Sort::<TestField>::parse(Some("title"));
        assert_eq!(sort.direction, SortDirection::Desc);
    }

    #[test]
    fn test_order_by_includes_tiebreak() {
        let sort = Sort::<TestField>::parse(Some("title,ASC"));
        assert_eq!(sort.order_by("b.book_id"), "b.title ASC, b.book_id ASC");
    }
}
