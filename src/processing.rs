use log::{debug, warn};
use serde::Deserialize;
use serde_json::Value;

use crate::error::ExtractError;

/// Fixed prefix stripped from source index names to derive the breach label.
pub const LEAK_INDEX_PREFIX: &str = "leak_";

/// The two fields extracted from each hit's payload. Missing fields decode
/// to empty strings and are then caught by the exclusion rule.
#[derive(Debug, Deserialize)]
pub struct Leak {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// One normalized output record.
#[derive(Debug, PartialEq, Eq)]
pub struct Record {
    pub email: String,
    pub password: String,
    pub breach_name: String,
}

/// One scroll page rendered to CSV lines, plus per-page counters.
#[derive(Debug, Default)]
pub struct PageBatch {
    pub buffer: Vec<u8>,
    /// Hits processed from this page, including excluded and malformed ones.
    pub raw_hits: u64,
    pub emitted: u64,
    pub excluded: u64,
    pub failed: u64,
}

/// Derive the breach label from a source index name. An index without the
/// leak prefix passes through unchanged.
pub fn breach_name(index: &str) -> &str {
    index.strip_prefix(LEAK_INDEX_PREFIX).unwrap_or(index)
}

/// Decode one raw hit into a record. Returns `Ok(None)` for hits excluded by
/// the empty/"null" email rule; decoding failures surface as typed errors so
/// the caller decides the policy.
pub fn extract_record(hit: &Value) -> Result<Option<Record>, ExtractError> {
    let source = hit
        .get("_source")
        .ok_or_else(|| ExtractError::Response("hit missing _source field".into()))?;
    let leak: Leak = serde_json::from_value(source.clone()).map_err(ExtractError::Decode)?;

    // eliminate empty/null results
    if leak.email.is_empty() || leak.email == "null" {
        return Ok(None);
    }

    let index = hit.get("_index").and_then(Value::as_str).unwrap_or_default();
    Ok(Some(Record {
        email: leak.email,
        password: leak.password,
        breach_name: breach_name(index).to_string(),
    }))
}

/// Render one scroll page into a CSV line buffer, processing at most
/// `budget` hits when a result limit is in force. Malformed hits are skipped
/// and counted; the run keeps going.
pub fn process_page(page: &Value, budget: Option<u64>) -> PageBatch {
    let mut batch = PageBatch::default();
    let hits = match page["hits"]["hits"].as_array() {
        Some(hits) => hits,
        None => return batch,
    };

    let take = match budget {
        Some(budget) => hits.len().min(budget as usize),
        None => hits.len(),
    };
    batch.raw_hits = take as u64;
    batch.buffer = Vec::with_capacity(take * 64);

    for hit in &hits[..take] {
        match extract_record(hit) {
            Ok(Some(record)) => {
                batch.buffer.extend_from_slice(
                    format!(
                        "{},{},{}\n",
                        record.email, record.password, record.breach_name
                    )
                    .as_bytes(),
                );
                batch.emitted += 1;
            }
            Ok(None) => {
                batch.excluded += 1;
            }
            Err(e) => {
                warn!("skipping malformed hit: {}", e);
                batch.failed += 1;
            }
        }
    }

    debug!(
        "Processed page: {} hits, {} emitted, {} excluded, {} malformed",
        batch.raw_hits, batch.emitted, batch.excluded, batch.failed
    );
    batch
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn page(hits: Vec<Value>) -> Value {
        json!({ "hits": { "hits": hits } })
    }

    fn hit(index: &str, email: &str, password: &str) -> Value {
        json!({
            "_index": index,
            "_source": { "email": email, "password": password }
        })
    }

    #[test]
    fn test_breach_name_strips_leak_prefix() {
        assert_eq!(breach_name("leak_linkedin"), "linkedin");
    }

    #[test]
    fn test_breach_name_passthrough_without_prefix() {
        assert_eq!(breach_name("dump2019"), "dump2019");
    }

    #[test]
    fn test_breach_name_strips_prefix_once() {
        assert_eq!(breach_name("leak_leak_site"), "leak_site");
    }

    #[test]
    fn test_extract_record_valid_hit() {
        let record = extract_record(&hit("leak_linkedin", "user@example.com", "hunter2"))
            .unwrap()
            .expect("valid hit should yield a record");
        assert_eq!(
            record,
            Record {
                email: "user@example.com".into(),
                password: "hunter2".into(),
                breach_name: "linkedin".into(),
            }
        );
    }

    #[test]
    fn test_extract_record_excludes_empty_and_null_email() {
        let excluded = extract_record(&hit("leak_x", "", "hunter2")).unwrap();
        assert!(excluded.is_none(), "empty email should be excluded");

        let excluded = extract_record(&hit("leak_x", "null", "hunter2")).unwrap();
        assert!(excluded.is_none(), "literal null email should be excluded");
    }

    #[test]
    fn test_extract_record_defaults_missing_password() {
        let record = extract_record(&json!({
            "_index": "leak_x",
            "_source": { "email": "user@example.com" }
        }))
        .unwrap()
        .expect("record with missing password should still be emitted");
        assert_eq!(record.password, "", "missing password defaults to empty");
    }

    #[test]
    fn test_extract_record_malformed_payload_is_decode_error() {
        let err = extract_record(&json!({
            "_index": "leak_x",
            "_source": { "email": 42 }
        }))
        .unwrap_err();
        assert!(matches!(err, ExtractError::Decode(_)));

        let err = extract_record(&json!({ "_index": "leak_x" })).unwrap_err();
        assert!(matches!(err, ExtractError::Response(_)));
    }

    #[test]
    fn test_process_page_renders_csv_lines() {
        let batch = process_page(
            &page(vec![
                hit("leak_linkedin", "a@example.com", "pw1"),
                hit("leak_adobe", "b@example.com", "pw2"),
            ]),
            None,
        );

        assert_eq!(batch.raw_hits, 2);
        assert_eq!(batch.emitted, 2);
        assert_eq!(
            String::from_utf8(batch.buffer).unwrap(),
            "a@example.com,pw1,linkedin\nb@example.com,pw2,adobe\n"
        );
    }

    #[test]
    fn test_process_page_skips_malformed_hits_and_keeps_going() {
        let batch = process_page(
            &page(vec![
                hit("leak_a", "a@example.com", "pw1"),
                json!({ "_index": "leak_b", "_source": { "email": 42 } }),
                hit("leak_c", "c@example.com", "pw3"),
            ]),
            None,
        );

        assert_eq!(batch.raw_hits, 3);
        assert_eq!(batch.emitted, 2, "records around the corrupt one survive");
        assert_eq!(batch.failed, 1, "the corrupt record is counted");
        let text = String::from_utf8(batch.buffer).unwrap();
        assert!(text.contains("a@example.com,pw1,a"));
        assert!(text.contains("c@example.com,pw3,c"));
    }

    #[test]
    fn test_process_page_counts_excluded_hits() {
        let batch = process_page(
            &page(vec![
                hit("leak_a", "a@example.com", "pw1"),
                hit("leak_a", "null", "pw2"),
                hit("leak_a", "", "pw3"),
            ]),
            None,
        );

        assert_eq!(batch.raw_hits, 3, "excluded hits still count as processed");
        assert_eq!(batch.emitted, 1);
        assert_eq!(batch.excluded, 2);
    }

    #[test]
    fn test_process_page_respects_budget() {
        let batch = process_page(
            &page(vec![
                hit("leak_a", "a@example.com", "pw1"),
                hit("leak_a", "b@example.com", "pw2"),
                hit("leak_a", "c@example.com", "pw3"),
            ]),
            Some(2),
        );

        assert_eq!(batch.raw_hits, 2, "budget caps processed hits");
        assert_eq!(batch.emitted, 2);
        assert!(
            !String::from_utf8(batch.buffer)
                .unwrap()
                .contains("c@example.com"),
            "hits past the budget are not emitted"
        );
    }

    #[test]
    fn test_process_page_without_hits_array() {
        let batch = process_page(&json!({ "took": 3 }), None);
        assert_eq!(batch.raw_hits, 0);
        assert!(batch.buffer.is_empty());
    }
}
