//! Debounced autocomplete over a stream of keystrokes.

use std::time::Duration;

use async_stream::stream;
use futures::future::{BoxFuture, OptionFuture};
use futures::{FutureExt, Stream, StreamExt};
use tokio::time::{Instant, sleep};
use tracing::debug;

use super::{AutocompleteSuggestion, ProductSearch};

/// Turn raw query strings into suggestion lists.
///
/// A query is looked up once the input has been quiet for `window`, unless it
/// equals the previously looked-up query. Starting a lookup drops the one
/// still in flight, so a slow answer for an older query is never emitted
/// after a newer one. When `queries` ends, a query still waiting for its
/// window is looked up immediately and the stream ends after its answer.
pub fn debounced_suggestions<S>(
    search: ProductSearch,
    queries: S,
    window: Duration,
) -> impl Stream<Item = Vec<AutocompleteSuggestion>> + Send + 'static
where
    S: Stream<Item = String> + Send + 'static,
{
    stream! {
        let mut queries = std::pin::pin!(queries.fuse());
        let mut deadline = std::pin::pin!(sleep(window));
        let mut pending: Option<String> = None;
        let mut last_fired: Option<String> = None;
        let mut lookup: Option<BoxFuture<'static, Vec<AutocompleteSuggestion>>> = None;
        let mut input_done = false;

        loop {
            if input_done && pending.is_none() && lookup.is_none() {
                break;
            }

            let mut due: Option<String> = None;
            let ready = tokio::select! {
                next = queries.next(), if !input_done => {
                    match next {
                        Some(query) => {
                            pending = Some(query);
                            deadline.as_mut().reset(Instant::now() + window);
                        }
                        None => {
                            input_done = true;
                            due = pending.take();
                        }
                    }
                    None
                }
                () = &mut deadline, if pending.is_some() => {
                    due = pending.take();
                    None
                }
                results = OptionFuture::from(lookup.as_mut()), if lookup.is_some() => {
                    lookup = None;
                    results
                }
            };

            if let Some(query) = due.filter(|query| last_fired.as_ref() != Some(query)) {
                debug!(query = %query, "debounce window elapsed");
                last_fired = Some(query.clone());
                let search = search.clone();
                lookup = Some(async move { search.autocomplete_suggestions(&query).await }.boxed());
            }

            if let Some(suggestions) = ready {
                yield suggestions;
            }
        }
    }
}
