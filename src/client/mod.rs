//! Paginated API client
//!
//! Wraps the transport with endpoint knowledge and produces lazy record
//! streams: pages are fetched on demand as the consumer pulls records, so a
//! run can stop early (interrupt, satisfied strategy probe) without paying
//! for pages nobody reads.

use std::pin::Pin;
use std::sync::Arc;

use futures_util::{stream, Stream, StreamExt};
use tracing::debug;

use crate::endpoints::Endpoints;
use crate::http::{HttpClient, TransportError, TransportResult};
use crate::Record;

pub mod page;

pub use page::Page;

/// Stream of records pulled page by page from a listing endpoint
pub type RecordStream = Pin<Box<dyn Stream<Item = TransportResult<Record>> + Send>>;

/// Pagination cursor threaded through a record stream
enum PageCursor {
    /// First request: listing URL plus query parameters
    Start {
        url: String,
        params: Vec<(String, String)>,
    },
    /// Follow-up request: the server-issued locator, used verbatim
    Next(String),
    /// Pagination finished
    Done,
}

/// Client for the Mindat REST API.
///
/// Cheap to clone; the transport is shared behind an [`Arc`].
#[derive(Clone)]
pub struct MindatClient {
    http: Arc<HttpClient>,
    endpoints: Endpoints,
    page_size: u32,
}

impl MindatClient {
    /// Create a new client
    pub fn new(http: Arc<HttpClient>, endpoints: Endpoints, page_size: u32) -> Self {
        Self {
            http,
            endpoints,
            page_size,
        }
    }

    /// Records requested per page
    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Stream localities matching the given query parameters.
    ///
    /// The first request carries `params` plus the configured page size.
    /// Follow-up requests use the `next` locator from the previous page
    /// verbatim, with no re-merged parameters. An error mid-stream is
    /// yielded once, then the stream ends.
    pub fn search_localities(&self, params: Vec<(String, String)>) -> RecordStream {
        let mut params = params;
        params.push(("page_size".to_string(), self.page_size.to_string()));
        let start = PageCursor::Start {
            url: self.endpoints.localities_url(),
            params,
        };

        let client = self.clone();
        let stream = stream::unfold(start, move |cursor| {
            let client = client.clone();

            async move {
                let fetched = match &cursor {
                    PageCursor::Start { url, params } => client.http.get_json(url, params).await,
                    PageCursor::Next(url) => client.http.get_json(url, &[]).await,
                    PageCursor::Done => return None,
                };

                Some(match fetched {
                    Ok(body) => {
                        let page = Page::from_body(body);
                        debug!(
                            "Fetched page with {} records (count hint: {:?})",
                            page.records.len(),
                            page.count
                        );

                        let next = match page.next {
                            Some(url) => PageCursor::Next(url),
                            None => PageCursor::Done,
                        };
                        let items: Vec<TransportResult<Record>> =
                            page.records.into_iter().map(Ok).collect();
                        (stream::iter(items), next)
                    }
                    Err(e) => (stream::iter(vec![Err(e)]), PageCursor::Done),
                })
            }
        })
        .flatten();

        Box::pin(stream)
    }

    /// Fetch the full detail record for one locality.
    ///
    /// With `expand_geomaterials` set, the response includes the expanded
    /// geomaterials listing the service otherwise abbreviates.
    pub async fn locality_detail(
        &self,
        id: u64,
        expand_geomaterials: bool,
    ) -> TransportResult<Record> {
        let url = self.endpoints.locality_detail_url(id);
        let mut params = vec![("format".to_string(), "json".to_string())];
        if expand_geomaterials {
            params.push(("expand".to_string(), "geomaterials".to_string()));
        }

        let body = self.http.get_json(&url, &params).await?;
        match body {
            serde_json::Value::Object(map) => Ok(map),
            _ => Err(TransportError::Decode {
                url,
                detail: "expected a JSON object for the detail record".to_string(),
            }),
        }
    }

    /// Fetch every mineral recorded at a locality, draining all pages.
    ///
    /// Related lists are small (tens of entries per locality), so a `Vec`
    /// is more convenient here than a stream.
    pub async fn locality_minerals(&self, locality_id: u64) -> TransportResult<Vec<Record>> {
        let url = self.endpoints.locality_minerals_url();
        let params = vec![
            ("format".to_string(), "json".to_string()),
            ("locality".to_string(), locality_id.to_string()),
            ("page_size".to_string(), self.page_size.to_string()),
        ];

        let mut minerals = Vec::new();
        let mut body = self.http.get_json(&url, &params).await?;
        loop {
            let page = Page::from_body(body);
            minerals.extend(page.records);
            match page.next {
                Some(next) => body = self.http.get_json(&next, &[]).await?,
                None => break,
            }
        }

        debug!(
            "Drained {} minerals for locality {}",
            minerals.len(),
            locality_id
        );
        Ok(minerals)
    }
}
