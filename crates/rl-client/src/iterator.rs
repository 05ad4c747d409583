//! Lazy pagination over list responses.
//!
//! An [`ApiIterator`] hands out one record at a time and asks its
//! [`PageFetcher`] for the next page when the current one is used up. It stops
//! when the reported total is reached, when `max_items` records have been
//! returned, when `max_pages` pages have been fetched, or when the API returns
//! an empty page.

use std::fmt;
use std::ops::Index;

use async_trait::async_trait;
use futures::Stream;
use tracing::debug;

use crate::error::{Error, Result};

/// One page of results.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Total number of records across all pages, when the API reports it.
    pub total: Option<u64>,
}

impl<T> Page<T> {
    /// A page without a reported total.
    pub fn new(items: Vec<T>) -> Self {
        Self { items, total: None }
    }

    /// A page that also reports the overall total.
    pub fn with_total(items: Vec<T>, total: u64) -> Self {
        Self {
            items,
            total: Some(total),
        }
    }
}

/// Iterator counters at the time a page is requested.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageCursor {
    /// Records returned so far.
    pub count: u64,
    /// Pages fetched so far.
    pub num_pages: u64,
    /// Records returned from the current page.
    pub page_count: usize,
}

/// Knows how to fetch the next page of some listing.
///
/// Implementations keep whatever state they need between pages, such as a
/// session handle, an offset or a cursor token.
#[async_trait]
pub trait PageFetcher: Send {
    type Item: Clone + Send;

    async fn fetch_page(&mut self, cursor: PageCursor) -> Result<Page<Self::Item>>;
}

/// Walks a paginated listing one record at a time.
pub struct ApiIterator<F: PageFetcher> {
    fetcher: F,
    page: Vec<F::Item>,
    count: u64,
    page_count: usize,
    num_pages: u64,
    total: Option<u64>,
    max_pages: Option<u64>,
    max_items: Option<u64>,
    done: bool,
}

impl<F: PageFetcher> fmt::Debug for ApiIterator<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiIterator")
            .field("count", &self.count)
            .field("page_count", &self.page_count)
            .field("num_pages", &self.num_pages)
            .field("total", &self.total)
            .field("max_pages", &self.max_pages)
            .field("max_items", &self.max_items)
            .finish_non_exhaustive()
    }
}

impl<F: PageFetcher> ApiIterator<F> {
    pub fn new(fetcher: F) -> Self {
        Self {
            fetcher,
            page: Vec::new(),
            count: 0,
            page_count: 0,
            num_pages: 0,
            total: None,
            max_pages: None,
            max_items: None,
            done: false,
        }
    }

    /// Stop after this many pages have been fetched.
    pub fn with_max_pages(mut self, max_pages: Option<u64>) -> Self {
        self.max_pages = max_pages;
        self
    }

    /// Stop after this many records have been returned.
    pub fn with_max_items(mut self, max_items: Option<u64>) -> Self {
        self.max_items = max_items;
        self
    }

    /// Records returned so far.
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Records returned from the current page.
    pub fn page_count(&self) -> usize {
        self.page_count
    }

    /// Pages fetched so far.
    pub fn num_pages(&self) -> u64 {
        self.num_pages
    }

    /// Total reported by the API, if any.
    pub fn total(&self) -> Option<u64> {
        self.total
    }

    pub fn max_pages(&self) -> Option<u64> {
        self.max_pages
    }

    pub fn max_items(&self) -> Option<u64> {
        self.max_items
    }

    /// The current page.
    pub fn page(&self) -> &[F::Item] {
        &self.page
    }

    /// An item of the current page.
    pub fn get(&self, index: usize) -> Option<&F::Item> {
        self.page.get(index)
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    pub fn fetcher_mut(&mut self) -> &mut F {
        &mut self.fetcher
    }

    fn cursor(&self) -> PageCursor {
        PageCursor {
            count: self.count,
            num_pages: self.num_pages,
            page_count: self.page_count,
        }
    }

    fn limits_reached(&self) -> bool {
        self.total.is_some_and(|total| self.count + 1 > total)
            || self.max_items.is_some_and(|max| self.count >= max)
    }

    /// Return the next record, fetching a new page when needed.
    ///
    /// Returns `Ok(None)` once the listing is exhausted; every later call
    /// returns `Ok(None)` as well. A failed page fetch leaves the iterator
    /// where it was, so the call can be repeated.
    #[allow(clippy::should_implement_trait)]
    pub async fn next(&mut self) -> Result<Option<F::Item>> {
        if self.done || self.limits_reached() {
            self.done = true;
            return Ok(None);
        }

        if self.page_count >= self.page.len() {
            if self.max_pages.is_some_and(|max| self.num_pages + 1 > max) {
                self.done = true;
                return Ok(None);
            }

            let page = self.fetcher.fetch_page(self.cursor()).await?;
            if page.total.is_some() {
                self.total = page.total;
            }
            self.page = page.items;
            self.page_count = 0;
            self.num_pages += 1;
            debug!(
                num_pages = self.num_pages,
                page_size = self.page.len(),
                total = ?self.total,
                "Fetched page"
            );

            if self.page.is_empty() || self.limits_reached() {
                self.done = true;
                return Ok(None);
            }
        }

        let item = self.page[self.page_count].clone();
        self.count += 1;
        self.page_count += 1;
        Ok(Some(item))
    }

    /// Turn the iterator into a stream of records.
    pub fn into_stream(self) -> impl Stream<Item = Result<F::Item>> {
        futures::stream::try_unfold(self, |mut iter| async move {
            Ok::<_, Error>(iter.next().await?.map(|item| (item, iter)))
        })
    }

    /// Drain the iterator into a vector.
    pub async fn collect_all(mut self) -> Result<Vec<F::Item>> {
        let mut items = Vec::new();
        while let Some(item) = self.next().await? {
            items.push(item);
        }
        Ok(items)
    }
}

impl<F: PageFetcher> Index<usize> for ApiIterator<F> {
    type Output = F::Item;

    fn index(&self, index: usize) -> &Self::Output {
        &self.page[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use futures::TryStreamExt;
    use serde_json::{json, Value};

    /// 100 records in pages of 10.
    #[derive(Debug, Default)]
    struct ExampleFetcher {
        offset: u64,
        cursors: Vec<PageCursor>,
    }

    #[async_trait]
    impl PageFetcher for ExampleFetcher {
        type Item = Value;

        async fn fetch_page(&mut self, cursor: PageCursor) -> Result<Page<Value>> {
            self.cursors.push(cursor);
            let items = (0..10).map(|i| json!({"id": i + self.offset})).collect();
            self.offset += 10;
            Ok(Page::with_total(items, 100))
        }
    }

    struct EmptyFetcher;

    #[async_trait]
    impl PageFetcher for EmptyFetcher {
        type Item = Value;

        async fn fetch_page(&mut self, _cursor: PageCursor) -> Result<Page<Value>> {
            Ok(Page::new(Vec::new()))
        }
    }

    fn ids(page: &[Value]) -> Vec<u64> {
        page.iter().filter_map(|v| v["id"].as_u64()).collect()
    }

    #[tokio::test]
    async fn test_get_key() {
        let mut items = ApiIterator::new(ExampleFetcher::default());
        items.next().await.unwrap();
        assert_eq!(items.get(0), Some(&json!({"id": 0})));
        assert_eq!(items[0], json!({"id": 0}));
        assert_eq!(items.get(101), None);
    }

    #[tokio::test]
    async fn test_blank_page() {
        let mut items = ApiIterator::new(EmptyFetcher);
        assert_eq!(items.next().await.unwrap(), None);
        assert_eq!(items.num_pages(), 1);
    }

    #[tokio::test]
    async fn test_walks_every_page() {
        let mut items = ApiIterator::new(ExampleFetcher::default());
        let mut last = None;
        while let Some(item) = items.next().await.unwrap() {
            last = Some(item);
        }

        assert_eq!(last, Some(json!({"id": 99})));
        assert_eq!(items.total(), Some(100));
        assert_eq!(items.count(), 100);
        assert_eq!(items.num_pages(), 10);
        assert_eq!(items.page_count(), 10);
        assert_eq!(ids(items.page()), (90..100).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_max_items() {
        let mut items = ApiIterator::new(ExampleFetcher::default()).with_max_items(Some(15));
        let mut last = None;
        while let Some(item) = items.next().await.unwrap() {
            last = Some(item);
        }

        assert_eq!(last, Some(json!({"id": 14})));
        assert_eq!(items.total(), Some(100));
        assert_eq!(items.count(), 15);
        assert_eq!(items.num_pages(), 2);
        assert_eq!(items.page_count(), 5);
        assert_eq!(ids(items.page()), (10..20).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_max_pages() {
        let mut items = ApiIterator::new(ExampleFetcher::default()).with_max_pages(Some(2));
        let mut last = None;
        while let Some(item) = items.next().await.unwrap() {
            last = Some(item);
        }

        assert_eq!(last, Some(json!({"id": 19})));
        assert_eq!(items.count(), 20);
        assert_eq!(items.num_pages(), 2);
        assert_eq!(items.page_count(), 10);
        assert_eq!(ids(items.page()), (10..20).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_fetcher_sees_cursor() {
        let mut items = ApiIterator::new(ExampleFetcher::default()).with_max_pages(Some(3));
        while items.next().await.unwrap().is_some() {}

        let cursors = &items.fetcher().cursors;
        assert_eq!(cursors.len(), 3);
        assert_eq!(cursors[0], PageCursor::default());
        assert_eq!(
            cursors[2],
            PageCursor {
                count: 20,
                num_pages: 2,
                page_count: 10
            }
        );
    }

    #[tokio::test]
    async fn test_stays_stopped() {
        let mut items = ApiIterator::new(ExampleFetcher::default()).with_max_items(Some(1));
        assert!(items.next().await.unwrap().is_some());
        assert!(items.next().await.unwrap().is_none());
        assert!(items.next().await.unwrap().is_none());
        assert_eq!(items.num_pages(), 1);
    }

    #[tokio::test]
    async fn test_zero_total_stops_after_first_page() {
        struct NothingThere;

        #[async_trait]
        impl PageFetcher for NothingThere {
            type Item = u32;

            async fn fetch_page(&mut self, _cursor: PageCursor) -> Result<Page<u32>> {
                Ok(Page::with_total(vec![1, 2, 3], 0))
            }
        }

        let mut items = ApiIterator::new(NothingThere);
        assert_eq!(items.next().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_stream_and_collect() {
        let all: Vec<Value> = ApiIterator::new(ExampleFetcher::default())
            .with_max_items(Some(25))
            .into_stream()
            .try_collect()
            .await
            .unwrap();
        assert_eq!(all.len(), 25);
        assert_eq!(all[24], json!({"id": 24}));

        let all = ApiIterator::new(ExampleFetcher::default())
            .collect_all()
            .await
            .unwrap();
        assert_eq!(all.len(), 100);
    }

    #[tokio::test]
    async fn test_fetch_error_propagates() {
        struct Failing;

        #[async_trait]
        impl PageFetcher for Failing {
            type Item = u32;

            async fn fetch_page(&mut self, _cursor: PageCursor) -> Result<Page<u32>> {
                Err(Error::new(ErrorKind::Other("page unavailable".into())))
            }
        }

        let mut items = ApiIterator::new(Failing);
        let err = items.next().await.unwrap_err();
        assert_eq!(err.to_string(), "page unavailable");
        assert_eq!(items.num_pages(), 0);
    }
}
