//! Strategy-driven locality search
//!
//! The listing endpoint answers different query vocabularies (locality type
//! codes, free-text matches), and which one actually finds mines varies by
//! country. A repository holds an ordered list of strategies and probes them
//! until one produces a record; that strategy then serves the entire
//! download, and later strategies are never consulted.

use futures_util::{stream, StreamExt};
use tracing::{debug, info, warn};

use crate::client::{MindatClient, RecordStream};
use crate::config::SearchStrategy;

/// Resolver state threaded through the unfold
enum TrialState {
    /// Probe strategies in order until one yields a record
    Probing,
    /// A strategy won; hand the rest of its stream through
    Draining(RecordStream),
    /// Nothing further to yield
    Finished,
}

/// Repository that finds mine localities for a country via fallback
/// search strategies.
#[derive(Clone)]
pub struct LocalitiesRepository {
    client: MindatClient,
    strategies: Vec<SearchStrategy>,
}

impl LocalitiesRepository {
    /// Create a repository with the given strategy order
    pub fn new(client: MindatClient, strategies: Vec<SearchStrategy>) -> Self {
        Self { client, strategies }
    }

    /// Configured strategies, in probe order
    pub fn strategies(&self) -> &[SearchStrategy] {
        &self.strategies
    }

    /// Stream mine localities for one country.
    ///
    /// Strategies are probed in order. The first strategy whose stream
    /// yields a record becomes the exclusive source: its first record is
    /// re-yielded, then its remaining pages flow through untouched. A
    /// strategy whose stream ends without records is skipped. A transport
    /// error while probing is yielded once and ends the stream.
    pub fn stream_country_mines(&self, country: &str) -> RecordStream {
        let client = self.client.clone();
        let strategies = self.strategies.clone();
        let country = country.to_string();

        let stream = stream::unfold(TrialState::Probing, move |state| {
            let client = client.clone();
            let strategies = strategies.clone();
            let country = country.clone();

            async move {
                match state {
                    TrialState::Probing => {
                        for strategy in &strategies {
                            let value = strategy.value_as_param();
                            let params = vec![
                                ("format".to_string(), "json".to_string()),
                                ("country".to_string(), country.clone()),
                                (strategy.param.clone(), value.clone()),
                            ];
                            debug!("Probing search strategy {}={}", strategy.param, value);

                            let mut candidate = client.search_localities(params);
                            match candidate.next().await {
                                Some(Ok(first)) => {
                                    info!(
                                        "Strategy {}={} produced results for {}",
                                        strategy.param, value, country
                                    );
                                    let head: RecordStream =
                                        Box::pin(stream::iter(vec![Ok(first)]));
                                    return Some((head, TrialState::Draining(candidate)));
                                }
                                Some(Err(e)) => {
                                    let head: RecordStream = Box::pin(stream::iter(vec![Err(e)]));
                                    return Some((head, TrialState::Finished));
                                }
                                None => {
                                    debug!(
                                        "Strategy {}={} returned no records, trying next",
                                        strategy.param, value
                                    );
                                }
                            }
                        }

                        warn!("No search strategy produced records for {country}");
                        None
                    }
                    TrialState::Draining(rest) => Some((rest, TrialState::Finished)),
                    TrialState::Finished => None,
                }
            }
        })
        .flatten();

        Box::pin(stream)
    }
}
