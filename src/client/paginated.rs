//! Lazy, cursor-driven iteration over listings.
//!
//! A [`ListingStream`] implements `Stream`: it fetches the first page when
//! first polled, yields items one at a time, and fetches the next page only
//! when the current one is drained.

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_util::Stream;
use serde_json::Value;
use tracing::{debug, warn};

use super::ClientInner;
use crate::command::Command;
use crate::models::{FromThing, ListingPage};
use crate::Result;

/// Default number of items requested per page.
pub const DEFAULT_ITEMS_PER_REQUEST: u32 = 25;

/// Largest page size the API honours.
pub const MAX_ITEMS_PER_REQUEST: u32 = 100;

/// Paging controls for a listing stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationOptions {
    /// Sent as the `limit` query parameter
    pub items_per_request: u32,
    /// Stop after this many items; `None` for no cap
    pub maximum_items: Option<usize>,
}

impl Default for PaginationOptions {
    fn default() -> Self {
        Self {
            items_per_request: DEFAULT_ITEMS_PER_REQUEST,
            maximum_items: None,
        }
    }
}

impl PaginationOptions {
    /// Set the page size, clamped to `1..=100`.
    pub fn with_items_per_request(mut self, items: u32) -> Self {
        self.items_per_request = items.clamp(1, MAX_ITEMS_PER_REQUEST);
        self
    }

    /// Cap the total number of items yielded.
    pub fn with_maximum_items(mut self, maximum: usize) -> Self {
        self.maximum_items = Some(maximum);
        self
    }
}

/// Parameters of a single page fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    /// Cursor from the previous page; `None` for the first page
    pub after: Option<String>,
    /// Requested page size
    pub limit: u32,
}

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Future resolving to a raw page, or `None` when the server sent no page.
pub type PageFuture = BoxFuture<'static, Result<Option<ListingPage<Value>>>>;

type FetchPage = Box<dyn Fn(PageRequest) -> PageFuture + Send + Sync>;
type MapItem<T> = Box<dyn Fn(Value) -> Result<T> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    NotStarted,
    InPage,
    Exhausted,
}

/// A stream of decoded listing items.
///
/// Dropping the stream cancels any in-flight page request. After an error
/// has been yielded the stream is exhausted.
///
/// # Example
///
/// ```no_run
/// use futures_util::StreamExt;
/// use reddit_rs::PaginationOptions;
///
/// # async fn example(client: reddit_rs::RedditClient) -> reddit_rs::Result<()> {
/// let options = PaginationOptions::default().with_maximum_items(50);
/// let mut posts = client.subreddits().hot("rust", options);
///
/// while let Some(post) = posts.next().await {
///     println!("{}", post?.title);
/// }
/// # Ok(())
/// # }
/// ```
pub struct ListingStream<T> {
    fetch_page: FetchPage,
    map_item: MapItem<T>,
    options: PaginationOptions,
    state: State,
    items: VecDeque<Value>,
    /// Cursor for the next fetch; `None` once the current page is the last.
    next_cursor: Option<String>,
    previous_after: Option<String>,
    pending_fetch: Option<PageFuture>,
    yielded: usize,
    pages_fetched: usize,
}

impl<T> ListingStream<T> {
    /// Create a stream from a page fetcher and an item decoder.
    ///
    /// `items_per_request` is clamped to `1..=100` however the options
    /// were built.
    pub fn new<F, M>(mut options: PaginationOptions, fetch_page: F, map_item: M) -> Self
    where
        F: Fn(PageRequest) -> PageFuture + Send + Sync + 'static,
        M: Fn(Value) -> Result<T> + Send + Sync + 'static,
    {
        options.items_per_request = options.items_per_request.clamp(1, MAX_ITEMS_PER_REQUEST);
        Self {
            fetch_page: Box::new(fetch_page),
            map_item: Box::new(map_item),
            options,
            state: State::NotStarted,
            items: VecDeque::new(),
            next_cursor: None,
            previous_after: None,
            pending_fetch: None,
            yielded: 0,
            pages_fetched: 0,
        }
    }

    /// Number of items yielded so far.
    pub fn yielded(&self) -> usize {
        self.yielded
    }

    /// Number of pages received so far.
    pub fn pages_fetched(&self) -> usize {
        self.pages_fetched
    }

    fn exhaust(&mut self, reason: &'static str) {
        if self.state != State::Exhausted {
            debug!(reason, yielded = self.yielded, pages = self.pages_fetched, "Listing finished");
        }
        self.state = State::Exhausted;
        self.items.clear();
        self.next_cursor = None;
        self.pending_fetch = None;
    }

    fn accept_page(&mut self, page: ListingPage<Value>) {
        self.pages_fetched += 1;
        self.state = State::InPage;

        let after = page.next_cursor().map(str::to_owned);
        self.next_cursor = match &after {
            Some(cursor) if self.previous_after.as_ref() == Some(cursor) => {
                warn!(cursor = %cursor, "Listing cursor did not advance; stopping");
                None
            }
            other => other.clone(),
        };
        if after.is_some() {
            self.previous_after = after;
        }
        self.items = page.items.into();
    }

    fn request(&self, after: Option<String>) -> PageRequest {
        PageRequest {
            after,
            limit: self.options.items_per_request,
        }
    }
}

impl<T> Stream for ListingStream<T> {
    type Item = Result<T>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = &mut *self;

        loop {
            if this.state == State::Exhausted {
                return Poll::Ready(None);
            }

            // The cap is checked before anything else so no extra page is fetched.
            if let Some(max) = this.options.maximum_items {
                if this.yielded >= max {
                    this.exhaust("maximum items reached");
                    return Poll::Ready(None);
                }
            }

            if let Some(raw) = this.items.pop_front() {
                return match (this.map_item)(raw) {
                    Ok(item) => {
                        this.yielded += 1;
                        Poll::Ready(Some(Ok(item)))
                    }
                    Err(e) => {
                        this.exhaust("item failed to decode");
                        Poll::Ready(Some(Err(e)))
                    }
                };
            }

            if let Some(fut) = this.pending_fetch.as_mut() {
                match fut.as_mut().poll(cx) {
                    Poll::Pending => return Poll::Pending,
                    Poll::Ready(Err(e)) => {
                        this.exhaust("page fetch failed");
                        return Poll::Ready(Some(Err(e)));
                    }
                    Poll::Ready(Ok(None)) => {
                        this.exhaust("no page returned");
                        return Poll::Ready(None);
                    }
                    Poll::Ready(Ok(Some(page))) => {
                        this.pending_fetch = None;
                        this.accept_page(page);
                        continue;
                    }
                }
            }

            match this.state {
                State::NotStarted => {
                    let request = this.request(None);
                    this.pending_fetch = Some((this.fetch_page)(request));
                }
                State::InPage => match this.next_cursor.take() {
                    Some(cursor) => {
                        let request = this.request(Some(cursor));
                        this.pending_fetch = Some((this.fetch_page)(request));
                    }
                    None => {
                        this.exhaust("no further cursor");
                        return Poll::Ready(None);
                    }
                },
                State::Exhausted => return Poll::Ready(None),
            }
        }
    }
}

impl<T> Unpin for ListingStream<T> {}

impl<T> std::fmt::Debug for ListingStream<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListingStream")
            .field("options", &self.options)
            .field("state", &self.state)
            .field("yielded", &self.yielded)
            .field("pages_fetched", &self.pages_fetched)
            .finish()
    }
}

/// Builds a [`ListingStream`] that pages a command through the pipeline.
pub(crate) struct ListingStreamBuilder {
    inner: Arc<ClientInner>,
    command: Command,
    options: PaginationOptions,
}

impl ListingStreamBuilder {
    pub(crate) fn new(inner: Arc<ClientInner>, command: Command) -> Self {
        Self {
            inner,
            command,
            options: PaginationOptions::default(),
        }
    }

    pub(crate) fn options(mut self, options: PaginationOptions) -> Self {
        self.options = options;
        self
    }

    pub(crate) fn build<T: FromThing + 'static>(self) -> ListingStream<T> {
        let inner = self.inner;
        let command = self.command;

        ListingStream::new(
            self.options,
            move |page: PageRequest| -> PageFuture {
                let inner = inner.clone();
                let mut command = command.clone();

                Box::pin(async move {
                    let request = command.request_mut();
                    request.set_query("limit", page.limit.to_string());
                    match page.after {
                        Some(after) => request.set_query("after", after),
                        None => request.remove_query("after"),
                    }

                    let body: Value = inner.execute(&command).await?.parse()?;
                    if body.is_null() {
                        return Ok(None);
                    }
                    ListingPage::from_envelope(body).map(Some)
                })
            },
            T::from_thing,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use futures_util::StreamExt;
    use parking_lot::Mutex;
    use serde_json::json;

    /// Serves `pages` in order and records each request.
    fn scripted(
        pages: Vec<Result<Option<ListingPage<Value>>>>,
    ) -> (
        Arc<Mutex<Vec<PageRequest>>>,
        impl Fn(PageRequest) -> PageFuture + Send + Sync + 'static,
    ) {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let pages = Arc::new(Mutex::new(VecDeque::from(pages)));
        let log = requests.clone();

        let fetch = move |request: PageRequest| -> PageFuture {
            log.lock().push(request);
            let next = pages.lock().pop_front().unwrap_or(Ok(None));
            Box::pin(async move { next })
        };
        (requests, fetch)
    }

    fn page(ids: std::ops::Range<u32>, after: Option<&str>) -> Result<Option<ListingPage<Value>>> {
        Ok(Some(ListingPage {
            items: ids.map(|i| json!(i)).collect(),
            before: None,
            after: after.map(str::to_owned),
        }))
    }

    fn as_number(value: Value) -> Result<u32> {
        value
            .as_u64()
            .map(|n| n as u32)
            .ok_or_else(|| Error::Decode("not a number".to_string()))
    }

    #[tokio::test]
    async fn test_walks_cursors_in_order() {
        let (requests, fetch) = scripted(vec![
            page(0..3, Some("A")),
            page(3..5, Some("B")),
            page(5..6, None),
        ]);
        let stream = ListingStream::new(PaginationOptions::default(), fetch, as_number);

        let items: Vec<u32> = stream.map(|r| r.unwrap()).collect().await;
        assert_eq!(items, vec![0, 1, 2, 3, 4, 5]);

        let afters: Vec<Option<String>> = requests.lock().iter().map(|r| r.after.clone()).collect();
        assert_eq!(afters, vec![None, Some("A".to_string()), Some("B".to_string())]);
        assert!(requests.lock().iter().all(|r| r.limit == DEFAULT_ITEMS_PER_REQUEST));
    }

    #[tokio::test]
    async fn test_three_pages_yield_everything() {
        let (requests, fetch) = scripted(vec![
            page(0..25, Some("A")),
            page(25..50, Some("B")),
            page(50..60, None),
        ]);
        let options = PaginationOptions::default().with_items_per_request(25);
        let mut stream = ListingStream::new(options, fetch, as_number);

        let mut items = Vec::new();
        while let Some(item) = stream.next().await {
            items.push(item.unwrap());
        }
        assert_eq!(items, (0..60).collect::<Vec<_>>());
        assert_eq!(stream.pages_fetched(), 3);

        let afters: Vec<Option<String>> = requests.lock().iter().map(|r| r.after.clone()).collect();
        assert_eq!(afters, vec![None, Some("A".to_string()), Some("B".to_string())]);
    }

    #[tokio::test]
    async fn test_maximum_items_limits_fetches() {
        let (requests, fetch) = scripted(vec![
            page(0..25, Some("A")),
            page(25..50, Some("B")),
            page(50..75, Some("C")),
        ]);
        let options = PaginationOptions::default()
            .with_items_per_request(25)
            .with_maximum_items(40);
        let stream = ListingStream::new(options, fetch, as_number);

        let items: Vec<u32> = stream.map(|r| r.unwrap()).collect().await;
        assert_eq!(items, (0..40).collect::<Vec<_>>());
        assert_eq!(requests.lock().len(), 2);
    }

    #[tokio::test]
    async fn test_repeated_cursor_stops_after_page() {
        let (requests, fetch) = scripted(vec![
            page(0..2, Some("A")),
            page(2..4, Some("A")),
            page(4..6, Some("B")),
        ]);
        let stream = ListingStream::new(PaginationOptions::default(), fetch, as_number);

        let items: Vec<u32> = stream.map(|r| r.unwrap()).collect().await;
        assert_eq!(items, vec![0, 1, 2, 3]);
        assert_eq!(requests.lock().len(), 2);
    }

    #[tokio::test]
    async fn test_empty_after_ends_stream() {
        let (requests, fetch) = scripted(vec![page(0..2, Some("")), page(2..4, None)]);
        let stream = ListingStream::new(PaginationOptions::default(), fetch, as_number);

        let items: Vec<u32> = stream.map(|r| r.unwrap()).collect().await;
        assert_eq!(items, vec![0, 1]);
        assert_eq!(requests.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_first_page_is_empty() {
        let (_, fetch) = scripted(vec![Ok(None)]);
        let mut stream = ListingStream::new(PaginationOptions::default(), fetch, as_number);

        assert!(stream.next().await.is_none());
        assert_eq!(stream.pages_fetched(), 0);
    }

    #[tokio::test]
    async fn test_error_surfaces_once_then_ends() {
        let (requests, fetch) = scripted(vec![
            page(0..2, Some("A")),
            Err(Error::Transport {
                status: 503,
                body: String::new(),
            }),
            page(2..4, None),
        ]);
        let mut stream = ListingStream::new(PaginationOptions::default(), fetch, as_number);

        assert_eq!(stream.next().await.unwrap().unwrap(), 0);
        assert_eq!(stream.next().await.unwrap().unwrap(), 1);
        assert!(stream.next().await.unwrap().unwrap_err().is_retryable());
        assert!(stream.next().await.is_none());
        assert!(stream.next().await.is_none());
        assert_eq!(requests.lock().len(), 2);
    }

    #[tokio::test]
    async fn test_decode_error_terminates() {
        let (_, fetch) = scripted(vec![Ok(Some(ListingPage {
            items: vec![json!(1), json!("x"), json!(3)],
            before: None,
            after: None,
        }))]);
        let mut stream = ListingStream::new(PaginationOptions::default(), fetch, as_number);

        assert_eq!(stream.next().await.unwrap().unwrap(), 1);
        assert!(stream.next().await.unwrap().unwrap_err().is_decode_error());
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn test_nothing_fetched_until_polled() {
        let (requests, fetch) = scripted(vec![page(0..1, None)]);
        let stream = ListingStream::new(PaginationOptions::default(), fetch, as_number);

        assert!(requests.lock().is_empty());
        drop(stream);
        assert!(requests.lock().is_empty());
    }

    #[tokio::test]
    async fn test_literal_options_are_clamped() {
        let (requests, fetch) = scripted(vec![page(0..1, None)]);
        let options = PaginationOptions {
            items_per_request: 0,
            maximum_items: None,
        };
        let stream = ListingStream::new(options, fetch, as_number);

        let items: Vec<u32> = stream.map(|r| r.unwrap()).collect().await;
        assert_eq!(items, vec![0]);
        assert_eq!(requests.lock()[0].limit, 1);

        let (requests, fetch) = scripted(vec![page(0..1, None)]);
        let options = PaginationOptions {
            items_per_request: 1_000,
            maximum_items: None,
        };
        let _: Vec<_> = ListingStream::new(options, fetch, as_number).collect().await;
        assert_eq!(requests.lock()[0].limit, MAX_ITEMS_PER_REQUEST);
    }

    #[test]
    fn test_items_per_request_clamped() {
        assert_eq!(PaginationOptions::default().with_items_per_request(500).items_per_request, 100);
        assert_eq!(PaginationOptions::default().with_items_per_request(0).items_per_request, 1);
    }
}
