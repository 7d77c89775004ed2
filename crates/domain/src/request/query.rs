//! Query string assembly

use crate::error::{DomainError, DomainResult};

/// Ordered query parameters.
///
/// Absent values are dropped when pushed, so `?limit=` never goes out
/// for an unset limit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    items: Vec<(String, String)>,
}

impl QueryParams {
    /// Creates an empty query parameter collection.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Adds a parameter.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.items.push((key.into(), value.to_string()));
        self
    }

    /// Adds a parameter only when `value` is present.
    #[must_use]
    pub fn with_opt<V: ToString>(self, key: impl Into<String>, value: Option<V>) -> Self {
        match value {
            Some(v) => self.with(key, v),
            None => self,
        }
    }

    /// Returns true if there are no parameters.
    #[must_use]
    #[allow(clippy::missing_const_for_fn)]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns the parameters in insertion order.
    #[must_use]
    pub fn pairs(&self) -> &[(String, String)] {
        &self.items
    }

    /// Encodes the parameters as `application/x-www-form-urlencoded`.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails.
    pub fn encode(&self) -> DomainResult<String> {
        serde_urlencoded::to_string(&self.items)
            .map_err(|e| DomainError::InvalidQuery(e.to_string()))
    }
}

impl<K: Into<String>, V: ToString> FromIterator<(K, Option<V>)> for QueryParams {
    fn from_iter<T: IntoIterator<Item = (K, Option<V>)>>(iter: T) -> Self {
        iter.into_iter()
            .fold(Self::new(), |params, (k, v)| params.with_opt(k, v))
    }
}
