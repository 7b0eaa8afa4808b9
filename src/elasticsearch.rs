use base64::prelude::*;
use elasticsearch::{
    Elasticsearch,
    cluster::ClusterHealthParts,
    http::transport::{SingleNodeConnectionPool, TransportBuilder},
};
use http::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use log::{debug, info, warn};
use serde_json::Value;
use std::time::Duration;

use crate::config::Settings;
use crate::error::ExtractError;

/// Total connection attempts before giving up.
pub const CONNECT_ATTEMPTS: u32 = 3;

/// Fixed delay between connection attempts.
pub const CONNECT_RETRY_DELAY: Duration = Duration::from_secs(15);

/// Build a client for the configured endpoint with basic authentication.
pub fn create_client(settings: &Settings) -> Result<Elasticsearch, ExtractError> {
    debug!(
        "Setting up Elasticsearch client connection to {}",
        settings.url.as_str()
    );
    let conn_pool = SingleNodeConnectionPool::new(settings.url.clone());
    let mut transport_builder = TransportBuilder::new(conn_pool);

    info!("Using basic authentication for user: {}", settings.username);
    let auth_str = format!("{}:{}", settings.username, settings.password);
    let auth_val = format!("Basic {}", BASE64_STANDARD.encode(auth_str));

    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&auth_val)
            .map_err(|e| ExtractError::Config(format!("invalid credentials: {}", e)))?,
    );
    transport_builder = transport_builder.headers(headers);

    debug!("Building Elasticsearch transport");
    let transport = transport_builder
        .build()
        .map_err(|e| ExtractError::Config(format!("failed to build transport: {}", e)))?;

    debug!("Elasticsearch client created successfully");
    Ok(Elasticsearch::new(transport))
}

/// Establish a live connection, pinging the endpoint with bounded retry.
/// Exhausting the attempts is fatal for the run.
pub async fn connect_with_retry(settings: &Settings) -> Result<Elasticsearch, ExtractError> {
    let client = create_client(settings)?;

    let mut attempt = 0;
    loop {
        attempt += 1;
        debug!("Connection attempt {}/{}", attempt, CONNECT_ATTEMPTS);
        let ping = client
            .ping()
            .send()
            .await
            .and_then(|response| response.error_for_status_code());
        match ping {
            Ok(_) => {
                debug!("Connected to {} on attempt {}", settings.url, attempt);
                return Ok(client);
            }
            Err(e) if attempt < CONNECT_ATTEMPTS => {
                warn!(
                    "error connecting to elasticsearch: {}, retrying in {:?}",
                    e, CONNECT_RETRY_DELAY
                );
                tokio::time::sleep(CONNECT_RETRY_DELAY).await;
            }
            Err(e) => {
                return Err(ExtractError::Connect {
                    url: settings.url.to_string(),
                    attempts: CONNECT_ATTEMPTS,
                    source: e,
                });
            }
        }
    }
}

/// Query cluster health for the target index pattern. A red status means the
/// data is likely unavailable or inconsistent, so the run stops before any
/// search is issued.
pub async fn check_cluster_health(
    client: &Elasticsearch,
    index: &str,
) -> Result<(), ExtractError> {
    let response = client
        .cluster()
        .health(ClusterHealthParts::Index(&[index]))
        .send()
        .await?;
    let body: Value = response.json().await?;

    let status = body
        .get("status")
        .and_then(Value::as_str)
        .ok_or_else(|| ExtractError::Response("cluster health response missing status".into()))?
        .to_string();
    info!("cluster health: {}", status);

    if status == "red" {
        return Err(ExtractError::ClusterHealth {
            index: index.to_string(),
            status,
        });
    }
    Ok(())
}
