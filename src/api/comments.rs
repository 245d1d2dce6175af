//! Comment threads and collapsed-reply expansion.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;

use crate::auth::USER_CONTEXT;
use crate::client::ClientInner;
use crate::command::{CommandDefinition, RequestDescriptor};
use crate::models::{CommentTreeNode, Fullname, FromThing, ListingPage, Submission};
use crate::{Error, Result};

/// Most ids `morechildren` accepts in one call.
pub const MAX_MORE_CHILDREN: usize = 100;

/// Parameters of [`MORE_CHILDREN`].
#[derive(Debug, Clone)]
pub struct MoreChildrenParams {
    /// Submission the comments belong to
    pub link_id: Fullname,
    /// Comment ids taken from a [`More`](crate::models::More) node
    pub children: Vec<String>,
}

fn thread_request(article: &str) -> RequestDescriptor {
    RequestDescriptor::get(format!("/comments/{article}"))
}

fn more_children_request(params: &MoreChildrenParams) -> RequestDescriptor {
    RequestDescriptor::get("/api/morechildren")
        .with_query("api_type", "json")
        .with_query("link_id", params.link_id.as_str())
        .with_query("children", params.children.join(","))
}

/// `GET /comments/{article}`
pub const THREAD: CommandDefinition<str> =
    CommandDefinition::new("comments.thread", USER_CONTEXT, thread_request);

/// `GET /api/morechildren`
pub const MORE_CHILDREN: CommandDefinition<MoreChildrenParams> =
    CommandDefinition::new("comments.more_children", USER_CONTEXT, more_children_request);

/// `{"json": {"errors": [[code, message, field]], "data": {"things": [...]}}}`
#[derive(Deserialize)]
struct MoreChildrenResponse {
    json: MoreChildrenJson,
}

#[derive(Deserialize)]
struct MoreChildrenJson {
    #[serde(default)]
    errors: Vec<Vec<Value>>,
    #[serde(default)]
    data: Option<MoreChildrenData>,
}

#[derive(Deserialize)]
struct MoreChildrenData {
    #[serde(default)]
    things: Vec<Value>,
}

/// Service for comment trees.
///
/// # Example
///
/// ```no_run
/// use reddit_rs::models::CommentTreeNode;
///
/// # async fn example(client: reddit_rs::RedditClient) -> reddit_rs::Result<()> {
/// let (post, comments) = client.comments().thread("15bfi0").await?;
/// println!("{}", post.title);
///
/// for node in comments {
///     match node {
///         CommentTreeNode::Comment(c) => println!("{}: {}", c.author.unwrap_or_default(), c.body),
///         CommentTreeNode::More(more) => {
///             let expanded = client.comments().more_children(&post.name, more.children).await?;
///             println!("expanded {} hidden comments", expanded.len());
///         }
///     }
/// }
/// # Ok(())
/// # }
/// ```
pub struct CommentsService {
    inner: Arc<ClientInner>,
}

impl CommentsService {
    pub(crate) fn new(inner: Arc<ClientInner>) -> Self {
        Self { inner }
    }

    /// Get a submission and its top-level comment nodes.
    ///
    /// The response is a two-element array: a listing holding the
    /// submission, then a listing of comment tree nodes.
    pub async fn thread(&self, article: &str) -> Result<(Submission, Vec<CommentTreeNode>)> {
        let body: Vec<Value> = self.inner.execute(&THREAD.bind(article)).await?.parse()?;
        let mut parts = body.into_iter();

        let (Some(post_listing), Some(comment_listing)) = (parts.next(), parts.next()) else {
            return Err(Error::decode("thread response must hold two listings"));
        };

        let post = ListingPage::<Submission>::from_thing(post_listing)?
            .items
            .into_iter()
            .next()
            .ok_or_else(|| Error::decode("thread response has no submission"))?;
        let comments = ListingPage::<CommentTreeNode>::from_thing(comment_listing)?.items;

        Ok((post, comments))
    }

    /// Expand the ids of a collapsed-replies node.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] for an empty id list or more than
    /// [`MAX_MORE_CHILDREN`] ids, and [`Error::ApiValidation`] when the
    /// response reports an error.
    pub async fn more_children(
        &self,
        link_id: &Fullname,
        children: Vec<String>,
    ) -> Result<Vec<CommentTreeNode>> {
        if children.is_empty() {
            return Err(Error::InvalidInput("no comment ids to expand".to_string()));
        }
        if children.len() > MAX_MORE_CHILDREN {
            return Err(Error::InvalidInput(format!(
                "at most {MAX_MORE_CHILDREN} comment ids per request, got {}",
                children.len()
            )));
        }

        let params = MoreChildrenParams {
            link_id: link_id.clone(),
            children,
        };
        let response: MoreChildrenResponse =
            self.inner.execute(&MORE_CHILDREN.bind(&params)).await?.parse()?;

        if let Some(first) = response.json.errors.first() {
            let text = |i: usize| first.get(i).and_then(Value::as_str).map(str::to_owned);
            return Err(Error::ApiValidation {
                status: 200,
                reason: text(0),
                message: text(1).unwrap_or_default(),
                explanation: None,
                fields: text(2).into_iter().collect(),
            });
        }

        response
            .json
            .data
            .map(|data| data.things)
            .unwrap_or_default()
            .into_iter()
            .map(CommentTreeNode::from_thing)
            .collect()
    }
}
