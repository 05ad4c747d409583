//! The users API.
//!
//! Docs: <https://docs.github.com/en/rest/users/users>

use async_trait::async_trait;
use tracing::{debug, instrument};

use restline_client::utils::url::encode_segment;
use restline_client::{ApiEndpoint, ApiIterator, Endpoint, Page, PageCursor, PageFetcher, Session};

use crate::error::Result;
use crate::types::User;

/// Largest page GitHub serves for the user listing.
pub const MAX_PER_PAGE: u32 = 100;

/// Parameters for [`UsersApi::list`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListUsers {
    /// Users per page, capped at [`MAX_PER_PAGE`].
    pub per_page: u32,
    /// Only list users with an id greater than this.
    pub since: u64,
    pub max_pages: Option<u64>,
    pub max_items: Option<u64>,
}

impl Default for ListUsers {
    fn default() -> Self {
        Self {
            per_page: 10,
            since: 0,
            max_pages: Some(5),
            max_items: Some(50),
        }
    }
}

impl ListUsers {
    pub fn per_page(mut self, per_page: u32) -> Self {
        self.per_page = per_page;
        self
    }

    pub fn since(mut self, since: u64) -> Self {
        self.since = since;
        self
    }

    pub fn max_pages(mut self, max_pages: Option<u64>) -> Self {
        self.max_pages = max_pages;
        self
    }

    pub fn max_items(mut self, max_items: Option<u64>) -> Self {
        self.max_items = max_items;
        self
    }
}

/// Fetches pages of the user listing.
///
/// GitHub pages this listing by id: each page asks for users after the last
/// id seen. No total is reported.
#[derive(Debug, Clone)]
pub struct UsersPager {
    endpoint: Endpoint,
    per_page: u32,
    since: u64,
}

impl UsersPager {
    /// The id the next page starts after.
    pub fn since(&self) -> u64 {
        self.since
    }

    pub fn per_page(&self) -> u32 {
        self.per_page
    }
}

#[async_trait]
impl PageFetcher for UsersPager {
    type Item = User;

    async fn fetch_page(&mut self, cursor: PageCursor) -> restline_client::Result<Page<User>> {
        let request = self
            .endpoint
            .get("")
            .query("per_page", self.per_page)
            .query("since", self.since);
        let users: Vec<User> = self.endpoint.send_json(request).await?;

        debug!(
            page = cursor.num_pages + 1,
            since = self.since,
            returned = users.len(),
            "Fetched users page"
        );
        if let Some(last) = users.last() {
            self.since = last.id;
        }
        Ok(Page::new(users))
    }
}

/// GitHub users: the public listing, single profiles and the
/// authenticated user.
#[derive(Debug, Clone)]
pub struct UsersApi {
    endpoint: Endpoint,
}

impl ApiEndpoint for UsersApi {
    fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }
}

impl UsersApi {
    pub fn new(session: Session) -> Self {
        Self {
            endpoint: Endpoint::with_path(session, "users"),
        }
    }

    /// Iterate over all users in the order they signed up.
    ///
    /// Nothing is requested until the iterator is advanced.
    pub fn list(&self, params: ListUsers) -> ApiIterator<UsersPager> {
        let pager = UsersPager {
            endpoint: self.endpoint.clone(),
            per_page: params.per_page.clamp(1, MAX_PER_PAGE),
            since: params.since,
        };
        ApiIterator::new(pager)
            .with_max_pages(params.max_pages)
            .with_max_items(params.max_items)
    }

    /// Get a user by login.
    #[instrument(skip(self))]
    pub async fn get(&self, login: &str) -> Result<User> {
        self.endpoint
            .get_json(&encode_segment(login))
            .await
            .map_err(Into::into)
    }

    /// Get the authenticated user.
    ///
    /// Docs: <https://docs.github.com/en/rest/users/users#get-the-authenticated-user>
    #[instrument(skip(self))]
    pub async fn current_user(&self) -> Result<User> {
        self.session().get_json("user").await.map_err(Into::into)
    }
}
