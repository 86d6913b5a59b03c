//! The bookmarkable browsing location.
//!
//! Only the `page` query parameter is owned here; every other part of the URL
//! is carried through untouched.

use reqwest::Url;

pub const PAGE_PARAM: &str = "page";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Bookmark {
    url: Url,
}

impl Bookmark {
    pub fn new(url: Url) -> Self {
        Self { url }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// 1-based page encoded in the location.
    ///
    /// Absent, non-numeric, zero or out-of-range values all read as page 1.
    pub fn page(&self) -> u32 {
        self.url
            .query_pairs()
            .find(|(name, _)| name == PAGE_PARAM)
            .and_then(|(_, value)| value.parse::<u32>().ok())
            .filter(|page| *page >= 1)
            .unwrap_or(1)
    }

    /// Same location with the page parameter set to `page`.
    pub fn with_page(&self, page: u32) -> Self {
        let others: Vec<(String, String)> = self
            .url
            .query_pairs()
            .filter(|(name, _)| name != PAGE_PARAM)
            .map(|(name, value)| (name.into_owned(), value.into_owned()))
            .collect();

        let mut url = self.url.clone();
        url.query_pairs_mut()
            .clear()
            .extend_pairs(others)
            .append_pair(PAGE_PARAM, &page.to_string());
        Self { url }
    }
}
