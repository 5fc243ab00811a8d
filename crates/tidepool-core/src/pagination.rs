//! Opaque-token pagination over stable, insertion-ordered lists.
//!
//! A [`PageToken`] encodes the offset of the next page. A token is emitted
//! only when more items remain past the current page, so the absence of a
//! token is the end-of-list signal.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Page size used when a caller does not request one.
pub const DEFAULT_MAX_RESULTS: usize = 500;

/// Upper bound applied to every requested page size.
pub const MAX_PAGE_SIZE: usize = 1000;

/// Continuation cursor for list operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageToken {
    offset: usize,
}

impl PageToken {
    /// Creates a token resuming at `offset`.
    #[must_use]
    pub const fn new(offset: usize) -> Self {
        Self { offset }
    }

    /// Returns the offset this token resumes at.
    #[must_use]
    pub const fn offset(self) -> usize {
        self.offset
    }

    /// Encodes the token for transport.
    #[must_use]
    pub fn encode(self) -> String {
        self.offset.to_string()
    }

    /// Decodes a token produced by [`PageToken::encode`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPageToken`] when `raw` is not a non-negative offset.
    pub fn decode(raw: &str) -> Result<Self> {
        raw.trim()
            .parse::<usize>()
            .map(Self::new)
            .map_err(|_| Error::InvalidPageToken {
                token: raw.to_string(),
            })
    }
}

impl fmt::Display for PageToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.offset)
    }
}

impl FromStr for PageToken {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::decode(s)
    }
}

impl Serialize for PageToken {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.encode())
    }
}

impl<'de> Deserialize<'de> for PageToken {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::decode(&raw).map_err(serde::de::Error::custom)
    }
}

/// A page of results plus the token for the next page, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentAndToken<T> {
    /// Items on this page, in list order.
    pub content: Vec<T>,
    /// Present iff more items remain.
    pub token: Option<PageToken>,
}

impl<T> ContentAndToken<T> {
    /// Maps every item on the page, keeping the token.
    #[must_use]
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> ContentAndToken<U> {
        ContentAndToken {
            content: self.content.into_iter().map(f).collect(),
            token: self.token,
        }
    }
}

/// Page-size defaults and bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLimits {
    /// Page size used when none (or zero) is requested.
    pub default_max_results: usize,
    /// Largest page size ever served.
    pub max_page_size: usize,
}

impl Default for PageLimits {
    fn default() -> Self {
        Self {
            default_max_results: DEFAULT_MAX_RESULTS,
            max_page_size: MAX_PAGE_SIZE,
        }
    }
}

impl PageLimits {
    /// Resolves an incoming token and page size into a page request.
    ///
    /// A missing or zero `max_results` falls back to the default; every
    /// effective size is clamped to `max_page_size` and is at least 1.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPageToken`] when `token` cannot be decoded.
    pub fn request(&self, token: Option<&str>, max_results: Option<usize>) -> Result<PageRequest> {
        let offset = token.map(PageToken::decode).transpose()?.map_or(0, PageToken::offset);
        let max_results = match max_results {
            None | Some(0) => self.default_max_results,
            Some(n) => n,
        }
        .min(self.max_page_size)
        .max(1);
        Ok(PageRequest {
            offset,
            max_results,
        })
    }
}

/// A resolved page position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// Index of the first item on the page.
    pub offset: usize,
    /// Maximum number of items on the page.
    pub max_results: usize,
}

impl PageRequest {
    /// Creates a page request.
    #[must_use]
    pub const fn new(offset: usize, max_results: usize) -> Self {
        Self {
            offset,
            max_results,
        }
    }
}

/// Slices `items` into the requested page.
///
/// The returned token points at `offset + max_results` and is present only
/// when that index is still inside the list.
#[must_use]
pub fn paginate<T>(items: Vec<T>, request: PageRequest) -> ContentAndToken<T> {
    let total = items.len();
    let end = request.offset.saturating_add(request.max_results);
    let content = items
        .into_iter()
        .skip(request.offset)
        .take(request.max_results)
        .collect();
    ContentAndToken {
        content,
        token: (end < total).then(|| PageToken::new(end)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_decoding_rejects_garbage_and_negative_offsets() {
        assert_eq!(PageToken::decode("42").unwrap().offset(), 42);
        assert!(matches!(
            PageToken::decode("-1"),
            Err(Error::InvalidPageToken { .. })
        ));
        assert!(PageToken::decode("abc").is_err());
        assert!(PageToken::decode("").is_err());
    }

    #[test]
    fn token_present_only_when_more_remain() {
        let page = paginate(vec![1, 2, 3, 4], PageRequest::new(0, 2));
        assert_eq!(page.content, vec![1, 2]);
        assert_eq!(page.token, Some(PageToken::new(2)));

        let last = paginate(vec![1, 2, 3, 4], PageRequest::new(2, 2));
        assert_eq!(last.content, vec![3, 4]);
        assert_eq!(last.token, None);
    }

    #[test]
    fn offset_past_end_yields_empty_page_without_token() {
        let page = paginate(vec![1, 2], PageRequest::new(10, 5));
        assert!(page.content.is_empty());
        assert!(page.token.is_none());
    }

    #[test]
    fn zero_or_missing_max_results_uses_default_and_large_is_clamped() {
        let limits = PageLimits {
            default_max_results: 3,
            max_page_size: 10,
        };
        assert_eq!(limits.request(None, None).unwrap(), PageRequest::new(0, 3));
        assert_eq!(limits.request(None, Some(0)).unwrap(), PageRequest::new(0, 3));
        assert_eq!(
            limits.request(Some("4"), Some(50)).unwrap(),
            PageRequest::new(4, 10)
        );
    }

    #[test]
    fn tokens_serialize_as_strings() {
        let json = serde_json::to_string(&PageToken::new(7)).unwrap();
        assert_eq!(json, "\"7\"");
        let back: PageToken = serde_json::from_str(&json).unwrap();
        assert_eq!(back, PageToken::new(7));
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn following_tokens_visits_every_item_once_in_order(
                total in 0usize..200,
                page_size in 1usize..40,
            ) {
                let items: Vec<usize> = (0..total).collect();
                let limits = PageLimits { default_max_results: page_size, max_page_size: 1000 };

                let mut seen = Vec::new();
                let mut token: Option<String> = None;
                loop {
                    let request = limits.request(token.as_deref(), Some(page_size))
                        .unwrap_or_else(|e| panic!("request failed: {e}"));
                    let page = paginate(items.clone(), request);
                    prop_assert!(page.content.len() <= page_size);
                    seen.extend(page.content);
                    match page.token {
                        Some(next) => token = Some(next.encode()),
                        None => break,
                    }
                }

                prop_assert_eq!(seen, items);
            }
        }
    }
}
