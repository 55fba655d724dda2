// Page-by-page list draining
//
// List endpoints take zero-based `page` and `limit` query parameters and
// wrap results as `{ "data": [...] }`. Upstream termination is unreliable,
// so a sweep stops on the first of: non-list payload, empty page, short
// page. Between full pages it waits a fixed courtesy delay.

use std::time::Duration;

use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{error, info, warn};

use crate::client::ResilientClient;
use crate::error::Error;

/// Device list endpoint.
pub const DEVICES_PATH: &str = "/devices";

/// Page size used by the device sweep.
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Pause between full pages to stay clear of upstream rate limiting.
pub const PAGE_DELAY: Duration = Duration::from_secs(3);

/// Why a sweep stopped.
#[derive(Debug)]
pub enum SweepEnd {
    /// An empty page came back.
    Drained,
    /// A page shorter than the page size came back; it was kept.
    ShortPage,
    /// A request failed or a page was malformed. Earlier pages are kept.
    Aborted(Error),
}

impl SweepEnd {
    pub fn is_complete(&self) -> bool {
        !matches!(self, Self::Aborted(_))
    }
}

/// Items accumulated by one sweep plus how it ended.
#[derive(Debug)]
pub struct Sweep<T> {
    pub items: Vec<T>,
    /// Number of page requests issued.
    pub requests: u32,
    pub end: SweepEnd,
}

/// Drains a paginated list endpoint through a [`ResilientClient`].
pub struct Paginator<'a> {
    client: &'a mut ResilientClient,
    page_delay: Duration,
}

impl<'a> Paginator<'a> {
    pub fn new(client: &'a mut ResilientClient) -> Self {
        Self {
            client,
            page_delay: PAGE_DELAY,
        }
    }

    pub fn with_page_delay(mut self, page_delay: Duration) -> Self {
        self.page_delay = page_delay;
        self
    }

    /// Fetch every page of `path`.
    ///
    /// Request failures and malformed pages end the sweep softly with
    /// [`SweepEnd::Aborted`]; only [`Error::Authentication`] is returned
    /// as `Err`, since no further progress is possible without a token.
    pub async fn fetch_all<T: DeserializeOwned>(
        &mut self,
        path: &str,
        page_size: u32,
    ) -> Result<Sweep<T>, Error> {
        let page_size = page_size.max(1);
        let limit = usize::try_from(page_size).unwrap_or(usize::MAX);
        let mut items: Vec<T> = Vec::new();
        let mut page: u32 = 0;
        let mut requests: u32 = 0;

        let end = loop {
            let query = [("page", page.to_string()), ("limit", page_size.to_string())];
            requests += 1;

            let resp = match self
                .client
                .request(Method::GET, path, Some(&query), None)
                .await
            {
                Ok(resp) => resp,
                Err(e) if e.is_auth_failure() => return Err(e),
                Err(e) => {
                    error!("error fetching {path} (page {page}): {e}");
                    break SweepEnd::Aborted(e);
                }
            };

            let batch = match read_page::<T>(path, resp).await {
                Ok(batch) => batch,
                Err(e) => {
                    warn!("stopping pagination of {path} at page {page}: {e}");
                    break SweepEnd::Aborted(e);
                }
            };

            if batch.is_empty() {
                info!("no items on page {page} of {path}, stopping pagination");
                break SweepEnd::Drained;
            }

            let received = batch.len();
            items.extend(batch);
            info!(
                "fetched {received} items on page {page} of {path} (total: {})",
                items.len()
            );

            if received < limit {
                break SweepEnd::ShortPage;
            }

            page += 1;
            self.client.sleep(self.page_delay).await;
        };

        info!("finished fetching {} items from {path}", items.len());
        Ok(Sweep {
            items,
            requests,
            end,
        })
    }
}

/// Extract the `data` list from one page response.
///
/// A missing `data` key reads as an empty page; anything else that is not
/// a list is a [`Error::MalformedResponse`].
async fn read_page<T: DeserializeOwned>(
    path: &str,
    resp: reqwest::Response,
) -> Result<Vec<T>, Error> {
    let body = resp.text().await?;
    let payload: Value = serde_json::from_str(&body).map_err(|e| Error::MalformedResponse {
        path: path.to_owned(),
        message: format!("body is not JSON: {e}"),
    })?;

    let data = match payload {
        Value::Object(mut map) => map.remove("data"),
        other => {
            return Err(Error::MalformedResponse {
                path: path.to_owned(),
                message: format!("expected an object, got {}", kind(&other)),
            });
        }
    };

    let list = match data {
        None => return Ok(Vec::new()),
        Some(Value::Array(list)) => list,
        Some(other) => {
            return Err(Error::MalformedResponse {
                path: path.to_owned(),
                message: format!("expected a list under `data`, got {}", kind(&other)),
            });
        }
    };

    list.into_iter()
        .map(serde_json::from_value)
        .collect::<Result<Vec<T>, _>>()
        .map_err(|e| Error::Deserialization {
            message: format!("page item from {path}: {e}"),
            body,
        })
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
