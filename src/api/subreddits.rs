//! Subreddit listings and metadata.

use std::sync::Arc;

use crate::auth::USER_CONTEXT;
use crate::client::paginated::{ListingStream, ListingStreamBuilder, PaginationOptions};
use crate::client::ClientInner;
use crate::command::{CommandDefinition, RequestDescriptor};
use crate::models::{Submission, Subreddit};
use crate::{Error, Result};

/// Time window for `top` listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeFilter {
    /// Past hour
    Hour,
    /// Past day
    #[default]
    Day,
    /// Past week
    Week,
    /// Past month
    Month,
    /// Past year
    Year,
    /// All time
    All,
}

impl TimeFilter {
    /// Value of the `t` query parameter.
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeFilter::Hour => "hour",
            TimeFilter::Day => "day",
            TimeFilter::Week => "week",
            TimeFilter::Month => "month",
            TimeFilter::Year => "year",
            TimeFilter::All => "all",
        }
    }
}

/// Parameters of [`TOP`].
#[derive(Debug, Clone)]
pub struct TopParams {
    /// Subreddit name without the `r/` prefix
    pub subreddit: String,
    /// Time window
    pub time: TimeFilter,
}

fn hot_request(subreddit: &str) -> RequestDescriptor {
    RequestDescriptor::get(format!("/r/{subreddit}/hot"))
}

fn new_request(subreddit: &str) -> RequestDescriptor {
    RequestDescriptor::get(format!("/r/{subreddit}/new"))
}

fn top_request(params: &TopParams) -> RequestDescriptor {
    RequestDescriptor::get(format!("/r/{}/top", params.subreddit)).with_query("t", params.time.as_str())
}

fn about_request(subreddit: &str) -> RequestDescriptor {
    RequestDescriptor::get(format!("/r/{subreddit}/about"))
}

/// `GET /r/{subreddit}/hot`
pub const HOT: CommandDefinition<str> = CommandDefinition::new("subreddit.hot", USER_CONTEXT, hot_request);

/// `GET /r/{subreddit}/new`
pub const NEW: CommandDefinition<str> = CommandDefinition::new("subreddit.new", USER_CONTEXT, new_request);

/// `GET /r/{subreddit}/top?t={time}`
pub const TOP: CommandDefinition<TopParams> =
    CommandDefinition::new("subreddit.top", USER_CONTEXT, top_request);

/// `GET /r/{subreddit}/about`
pub const ABOUT: CommandDefinition<str> =
    CommandDefinition::new("subreddit.about", USER_CONTEXT, about_request);

/// Service for subreddit operations.
///
/// # Example
///
/// ```no_run
/// use futures_util::StreamExt;
/// use reddit_rs::api::TimeFilter;
/// use reddit_rs::PaginationOptions;
///
/// # async fn example(client: reddit_rs::RedditClient) -> reddit_rs::Result<()> {
/// let options = PaginationOptions::default().with_maximum_items(10);
/// let mut top = client.subreddits().top("rust", TimeFilter::Week, options);
///
/// while let Some(post) = top.next().await {
///     let post = post?;
///     println!("{} ({} points)", post.title, post.score);
/// }
/// # Ok(())
/// # }
/// ```
pub struct SubredditsService {
    inner: Arc<ClientInner>,
}

impl SubredditsService {
    pub(crate) fn new(inner: Arc<ClientInner>) -> Self {
        Self { inner }
    }

    /// Stream the hot listing.
    pub fn hot(&self, subreddit: &str, options: PaginationOptions) -> ListingStream<Submission> {
        ListingStreamBuilder::new(self.inner.clone(), HOT.bind(subreddit))
            .options(options)
            .build()
    }

    /// Stream the newest submissions.
    pub fn new_posts(&self, subreddit: &str, options: PaginationOptions) -> ListingStream<Submission> {
        ListingStreamBuilder::new(self.inner.clone(), NEW.bind(subreddit))
            .options(options)
            .build()
    }

    /// Stream the top submissions within a time window.
    pub fn top(
        &self,
        subreddit: &str,
        time: TimeFilter,
        options: PaginationOptions,
    ) -> ListingStream<Submission> {
        let params = TopParams {
            subreddit: subreddit.to_string(),
            time,
        };
        ListingStreamBuilder::new(self.inner.clone(), TOP.bind(&params))
            .options(options)
            .build()
    }

    /// Get subreddit metadata.
    pub async fn about(&self, subreddit: &str) -> Result<Subreddit> {
        if subreddit.is_empty() {
            return Err(Error::InvalidInput("subreddit name is empty".to_string()));
        }
        self.inner.fetch(&ABOUT.bind(subreddit)).await
    }
}
