mod progress;

use bytesize::ByteSize;
use elasticsearch::{ClearScrollParts, CountParts, Elasticsearch, ScrollParts, SearchParts};
use log::{debug, info, warn};
use serde_json::{Value, json};
use std::time::{Duration, Instant};
use tokio::io::AsyncWrite;

use crate::config::Settings;
use crate::error::ExtractError;
use crate::output::CsvSink;
use crate::processing;
use crate::query;

/// Documents fetched per scroll page.
pub const PAGE_SIZE: usize = 10_000;

/// Server-side keep-alive window for the scroll cursor. Resets on every use.
pub const SCROLL_KEEP_ALIVE: &str = "5m";

/// Counters mutated by the pagination loop. Process-local; there is exactly
/// one logical thread of control.
#[derive(Debug, Default)]
struct RunState {
    raw_hits: u64,
    emitted: u64,
    excluded: u64,
    failed: u64,
}

/// Final counters for a finished run.
#[derive(Debug)]
pub struct RunStats {
    pub raw_hits: u64,
    pub emitted: u64,
    pub excluded: u64,
    pub failed: u64,
    pub bytes_written: u64,
    pub elapsed: Duration,
}

/// How the pagination loop ended. Hitting the configured limit is a
/// deliberate stop, not a failure, so it gets its own arm instead of an
/// error kind; the binary maps each arm to its own exit code.
#[derive(Debug)]
pub enum RunOutcome {
    Completed(RunStats),
    LimitReached(RunStats),
}

impl RunOutcome {
    pub fn stats(&self) -> &RunStats {
        match self {
            RunOutcome::Completed(stats) | RunOutcome::LimitReached(stats) => stats,
        }
    }
}

/// Whether the raw-hit counter has reached a nonzero result limit.
fn limit_reached(limit: u64, raw_hits: u64) -> bool {
    limit != 0 && raw_hits >= limit
}

/// Remaining raw hits the current page may process under the limit.
fn page_budget(limit: u64, raw_hits: u64) -> Option<u64> {
    if limit == 0 {
        None
    } else {
        Some(limit.saturating_sub(raw_hits))
    }
}

/// Extract an error reported inside an otherwise-successful response body.
fn response_error(body: &Value) -> Option<String> {
    body.get("error").map(|e| {
        e.get("reason")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| e.to_string())
    })
}

/// Count the documents matching the query. Sizes the progress bar and fails
/// fast on an empty result set before any scroll request is issued.
async fn count_matches(
    client: &Elasticsearch,
    index: &str,
    query: &Value,
) -> Result<u64, ExtractError> {
    let response = client
        .count(CountParts::Index(&[index]))
        .body(json!({ "query": query }))
        .send()
        .await?;
    let body: Value = response.json().await?;

    if let Some(reason) = response_error(&body) {
        return Err(ExtractError::Response(reason));
    }
    body.get("count")
        .and_then(Value::as_u64)
        .ok_or_else(|| ExtractError::Response("count response missing count field".into()))
}

/// Drive the scroll cursor to exhaustion, the configured limit, or a
/// mid-scroll failure, writing each page through the sink.
pub async fn run_extraction<W: AsyncWrite + Unpin>(
    client: &Elasticsearch,
    settings: &Settings,
    sink: &mut CsvSink<W>,
) -> Result<RunOutcome, ExtractError> {
    let started = Instant::now();
    let query = query::build_query(&settings.filter);
    debug!("Raw query: {}", query);

    let total = count_matches(client, &settings.index, &query).await?;
    if total == 0 {
        return Err(ExtractError::EmptyResult);
    }
    info!("{} documents match, starting extraction", total);

    let pb = progress::setup_progress_bar(total);
    sink.write_header().await?;

    let search_body = query::search_body(&settings.filter, PAGE_SIZE);
    let mut state = RunState::default();
    let mut scroll_id: Option<String> = None;
    let mut last_fetch = Instant::now();

    let limit_hit = loop {
        let fetch_result = match &scroll_id {
            None => {
                debug!("Initiating scroll search with page size {}", PAGE_SIZE);
                client
                    .search(SearchParts::Index(&[&settings.index]))
                    .scroll(SCROLL_KEEP_ALIVE)
                    .body(&search_body)
                    .send()
                    .await
            }
            Some(id) => {
                debug!("Fetching next page with scroll cursor");
                client
                    .scroll(ScrollParts::None)
                    .body(json!({ "scroll": SCROLL_KEEP_ALIVE, "scroll_id": id }))
                    .send()
                    .await
            }
        };

        // Mid-scroll failures end the run without discarding what was
        // already flushed; the cursor is not retried.
        let page: Value = match fetch_result {
            Ok(response) => match response.json().await {
                Ok(page) => page,
                Err(e) => {
                    warn!("Load err: failed to parse page response: {}", e);
                    break false;
                }
            },
            Err(e) => {
                warn!("Load err: {}", e);
                break false;
            }
        };
        if let Some(reason) = response_error(&page) {
            warn!("Load err: {}", reason);
            break false;
        }

        if settings.verbose {
            let took = page.get("took").and_then(Value::as_u64).unwrap_or_default();
            info!(
                "Query Time: {:?} and TookInMillis in response {}ms",
                last_fetch.elapsed(),
                took
            );
        }
        last_fetch = Instant::now();

        if let Some(id) = page.get("_scroll_id").and_then(Value::as_str) {
            scroll_id = Some(id.to_string());
        }

        if page["hits"]["hits"].as_array().is_none_or(|h| h.is_empty()) {
            info!("Search finished, no more documents.");
            break false;
        }

        let batch = processing::process_page(&page, page_budget(settings.limit, state.raw_hits));
        sink.write_batch(&batch.buffer).await?;
        sink.flush().await?;

        state.raw_hits += batch.raw_hits;
        state.emitted += batch.emitted;
        state.excluded += batch.excluded;
        state.failed += batch.failed;
        pb.inc(batch.raw_hits);

        if limit_reached(settings.limit, state.raw_hits) {
            break true;
        }
    };

    if let Some(id) = &scroll_id {
        clear_scroll(client, id).await;
    }

    let stats = RunStats {
        raw_hits: state.raw_hits,
        emitted: state.emitted,
        excluded: state.excluded,
        failed: state.failed,
        bytes_written: sink.bytes_written(),
        elapsed: started.elapsed(),
    };

    pb.finish_with_message(format!(
        "{} records ({})",
        stats.emitted,
        ByteSize(stats.bytes_written)
    ));
    info!("Total time {:?}", stats.elapsed);
    if stats.failed > 0 {
        warn!("{} malformed hits were skipped", stats.failed);
    }

    if limit_hit {
        warn!("Limit of {} results reached, exiting", settings.limit);
        Ok(RunOutcome::LimitReached(stats))
    } else {
        Ok(RunOutcome::Completed(stats))
    }
}

async fn clear_scroll(client: &Elasticsearch, scroll_id: &str) {
    debug!("Cleaning up scroll context");
    let body = json!({ "scroll_id": [scroll_id] });
    if let Err(e) = client
        .clear_scroll(ClearScrollParts::None)
        .body(body)
        .send()
        .await
    {
        warn!("Failed to clear scroll context: {}", e);
    }
}
