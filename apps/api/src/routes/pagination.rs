use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::AppError;
use crate::serializers::FieldErrors;
use crate::store::Page;

/// `?limit=N&offset=M` on list endpoints. Without `limit` the whole
/// collection is returned unpaged.
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl PageParams {
    pub fn page(&self, max_page_size: i64) -> Result<Option<Page>, AppError> {
        let Some(limit) = self.limit else {
            return Ok(None);
        };
        let offset = self.offset.unwrap_or(0);

        let mut errors = FieldErrors::default();
        if limit < 1 {
            errors.add("limit", "Ensure this value is greater than or equal to 1.");
        }
        if offset < 0 {
            errors.add("offset", "Ensure this value is greater than or equal to 0.");
        }
        if !errors.is_empty() {
            return Err(AppError::Validation(errors));
        }

        Ok(Some(Page {
            limit: limit.min(max_page_size),
            offset,
        }))
    }
}

/// Envelope for a paged list response.
#[derive(Debug, Serialize)]
pub struct Paginated {
    pub count: i64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<Value>,
}

impl Paginated {
    pub fn new(path: &str, page: Page, count: i64, results: Vec<Value>) -> Self {
        let Page { limit, offset } = page;
        let next = offset
            .checked_add(limit)
            .filter(|&next| next < count)
            .map(|next| format!("{path}?limit={limit}&offset={next}"));
        let previous = (offset > 0).then(|| {
            let prev = offset - limit;
            if prev <= 0 {
                format!("{path}?limit={limit}")
            } else {
                format!("{path}?limit={limit}&offset={prev}")
            }
        });
        Paginated {
            count,
            next,
            previous,
            results,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_limit_means_unpaged() {
        let params = PageParams { limit: None, offset: Some(5) };
        assert_eq!(params.page(100).unwrap(), None);
    }

    #[test]
    fn test_limit_is_clamped() {
        let params = PageParams { limit: Some(500), offset: None };
        assert_eq!(params.page(100).unwrap(), Some(Page { limit: 100, offset: 0 }));
    }

    #[test]
    fn test_invalid_window_rejected() {
        let params = PageParams { limit: Some(0), offset: Some(-1) };
        match params.page(100) {
            Err(AppError::Validation(errors)) => {
                assert_eq!(errors.fields().collect::<Vec<_>>(), vec!["limit", "offset"]);
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_offset_near_max_has_no_next_link() {
        let p = Paginated::new("/skills/", Page { limit: 10, offset: i64::MAX }, 5, vec![]);
        assert_eq!(p.next, None);
        assert_eq!(
            p.previous,
            Some(format!("/skills/?limit=10&offset={}", i64::MAX - 10))
        );
    }

    #[test]
    fn test_links_first_page() {
        let p = Paginated::new("/skills/", Page { limit: 2, offset: 0 }, 5, vec![]);
        assert_eq!(p.next.as_deref(), Some("/skills/?limit=2&offset=2"));
        assert_eq!(p.previous, None);
    }

    #[test]
    fn test_links_middle_and_last_page() {
        let p = Paginated::new("/skills/", Page { limit: 2, offset: 2 }, 5, vec![]);
        assert_eq!(p.next.as_deref(), Some("/skills/?limit=2&offset=4"));
        assert_eq!(p.previous.as_deref(), Some("/skills/?limit=2"));

        let p = Paginated::new("/skills/", Page { limit: 2, offset: 4 }, 5, vec![]);
        assert_eq!(p.next, None);
        assert_eq!(p.previous.as_deref(), Some("/skills/?limit=2&offset=2"));
    }
}
