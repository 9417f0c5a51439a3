//! List-response normalization.
//!
//! The backend answers list endpoints in several shapes:
//!
//! | Shape | Example |
//! |-------|---------|
//! | bare array | `[{..}, {..}]` |
//! | Spring page | `{"content": [..], "totalElements": 42, "totalPages": 3}` |
//! | named list | `{"users": [..]}`, `{"data": [..]}`, `{"results": [..]}` |
//! | nothing | `null` |
//!
//! [`Page::from_value`] turns all of them into one [`Page`]. Totals the
//! backend omits are derived from the items and the requested page size.

use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Envelope fields that may carry the item list, in lookup order.
const LIST_FIELDS: [&str; 4] = ["content", "users", "data", "results"];

/// Fields that may carry the total item count, in lookup order.
const TOTAL_FIELDS: [&str; 3] = ["totalElements", "total", "count"];

/// One page of a list endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Total matching items across all pages.
    pub total: u64,
    pub total_pages: u64,
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            total: 0,
            total_pages: 0,
        }
    }
}

impl<T> Page<T> {
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Transform the items, keeping the totals.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            total_pages: self.total_pages,
        }
    }
}

impl<T: DeserializeOwned> Page<T> {
    /// Normalize any observed list shape.
    ///
    /// `page_size` is the `size` the caller requested; it is only used to
    /// derive `total_pages` when the backend does not send one.
    ///
    /// # Errors
    ///
    /// Fails if the value is not a recognised list shape or an item does not
    /// deserialize into `T`.
    pub fn from_value(value: Value, page_size: Option<u32>) -> Result<Self, serde_json::Error> {
        let (raw_items, total, total_pages) = match value {
            Value::Null => (Vec::new(), None, None),
            Value::Array(items) => (items, None, None),
            Value::Object(mut map) => {
                let items = LIST_FIELDS
                    .iter()
                    .find_map(|field| match map.remove(*field) {
                        Some(Value::Array(items)) => Some(items),
                        _ => None,
                    })
                    .ok_or_else(|| {
                        serde_json::Error::custom(format!(
                            "neočekivan oblik liste (očekivano jedno od: {})",
                            LIST_FIELDS.join(", ")
                        ))
                    })?;
                let total = TOTAL_FIELDS
                    .iter()
                    .find_map(|field| map.get(*field).and_then(Value::as_u64));
                let total_pages = map.get("totalPages").and_then(Value::as_u64);
                (items, total, total_pages)
            }
            other => {
                return Err(serde_json::Error::custom(format!(
                    "neočekivan oblik liste: {other}"
                )));
            }
        };

        let items = raw_items
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<T>, _>>()?;

        let total = total.unwrap_or(items.len() as u64);
        let total_pages = total_pages.unwrap_or_else(|| derive_total_pages(total, page_size));

        Ok(Self {
            items,
            total,
            total_pages,
        })
    }
}

/// `ceil(total / size)`; a single page when no size was requested.
fn derive_total_pages(total: u64, page_size: Option<u32>) -> u64 {
    match page_size {
        Some(size) if size > 0 => total.div_ceil(u64::from(size)),
        _ => u64::from(total > 0),
    }
}
