//! Page accumulation for continuation-token listings.
//!
//! `Pager` owns the accumulated collection and the continuation cursor. It is
//! synchronous; the controller drives it between awaited listing calls.

use serde::Serialize;

use crate::providers::{ListPage, RemoteObject};

/// Where a scan stands in the continuation chain
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "token", rename_all = "snake_case")]
pub enum ContinuationState {
    /// No page requested yet
    #[default]
    NotStarted,
    /// The last page pointed at another one
    HasMore(String),
    /// The server reported the end of the listing
    Exhausted,
}

impl ContinuationState {
    /// Token to send with the next request. `None` both before the first
    /// page and after the last; use `is_exhausted` to tell them apart.
    pub fn token(&self) -> Option<&str> {
        match self {
            ContinuationState::HasMore(token) => Some(token),
            _ => None,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        matches!(self, ContinuationState::Exhausted)
    }
}

/// Accumulated objects plus the cursor for the next page
#[derive(Debug, Clone, Default)]
pub struct Pager {
    objects: Vec<RemoteObject>,
    continuation: ContinuationState,
    pages: u32,
}

impl Pager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop everything from a previous scan
    pub fn reset(&mut self) {
        self.objects.clear();
        self.continuation = ContinuationState::NotStarted;
        self.pages = 0;
    }

    /// Append one page and advance the cursor. Returns whether another page
    /// should be requested.
    pub fn merge_page(&mut self, page: ListPage) -> bool {
        let next = page.next_token().map(str::to_string);
        // An absent object list contributes nothing
        if let Some(objects) = page.objects {
            self.objects.extend(objects);
        }
        self.pages += 1;
        self.continuation = match next {
            Some(token) => ContinuationState::HasMore(token),
            None => ContinuationState::Exhausted,
        };
        !self.continuation.is_exhausted()
    }

    /// Accumulated objects in server page order
    pub fn objects(&self) -> &[RemoteObject] {
        &self.objects
    }

    pub fn continuation(&self) -> &ContinuationState {
        &self.continuation
    }

    /// Pages merged since the last reset
    pub fn pages(&self) -> u32 {
        self.pages
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(keys: &[&str]) -> Vec<RemoteObject> {
        keys.iter().map(|k| RemoteObject::new(*k, None, 1)).collect()
    }

    fn keys(pager: &Pager) -> Vec<&str> {
        pager.objects().iter().map(|o| o.sort_name()).collect()
    }

    #[test]
    fn test_initial_state_is_not_started() {
        let pager = Pager::new();
        assert_eq!(pager.continuation(), &ContinuationState::NotStarted);
        assert_eq!(pager.continuation().token(), None);
        assert!(!pager.continuation().is_exhausted());
        assert!(pager.objects().is_empty());
    }

    #[test]
    fn test_merge_until_exhausted() {
        let mut pager = Pager::new();
        assert!(pager.merge_page(ListPage::truncated(named(&["a", "b"]), "t1")));
        assert_eq!(pager.continuation().token(), Some("t1"));

        assert!(pager.merge_page(ListPage::truncated(named(&["c"]), "t2")));
        assert!(!pager.merge_page(ListPage::last(named(&["d"]))));

        assert_eq!(keys(&pager), vec!["a", "b", "c", "d"]);
        assert_eq!(pager.continuation(), &ContinuationState::Exhausted);
        assert_eq!(pager.pages(), 3);
    }

    #[test]
    fn test_null_object_list_is_empty_contribution() {
        let mut pager = Pager::new();
        let page = ListPage {
            objects: None,
            is_truncated: true,
            next_continuation_token: Some("next".to_string()),
        };
        assert!(pager.merge_page(page));
        assert!(pager.objects().is_empty());
        assert_eq!(pager.continuation().token(), Some("next"));
    }

    #[test]
    fn test_overlapping_pages_are_not_deduplicated() {
        let mut pager = Pager::new();
        pager.merge_page(ListPage::truncated(named(&["a", "b"]), "t"));
        pager.merge_page(ListPage::last(named(&["b", "c"])));
        assert_eq!(keys(&pager), vec!["a", "b", "b", "c"]);
    }

    #[test]
    fn test_reset_discards_previous_scan() {
        let mut pager = Pager::new();
        pager.merge_page(ListPage::last(named(&["old"])));
        pager.reset();
        assert!(pager.objects().is_empty());
        assert_eq!(pager.continuation(), &ContinuationState::NotStarted);
        assert_eq!(pager.pages(), 0);
    }
}
