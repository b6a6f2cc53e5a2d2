//! HTTP-backed remote source.
//!
//! The station data API exposes one timestamp-keyed series per station and
//! sensor, queried Firebase-style with `orderBy`/`limitToLast`/`startAt`/
//! `endAt` parameters. Responses are JSON objects mapping unix-second keys
//! to payload values; payload leniency is handled downstream by
//! [`RawSample::decode`](stratus_core::RawSample::decode).

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use stratus_core::{Error, RawSample, RemoteSource, Result};
use stratus_types::SensorKey;

/// Remote source over the station data HTTP API.
pub struct HttpRemoteSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpRemoteSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    fn series_url(&self, station_id: &str, key: SensorKey) -> String {
        format!(
            "{}/{}/{}.json",
            self.base_url.trim_end_matches('/'),
            station_id,
            key.code()
        )
    }

    async fn query(&self, url: &str, params: &[(&str, String)]) -> Result<Vec<RawSample>> {
        let response = self
            .client
            .get(url)
            .query(params)
            .send()
            .await
            .map_err(|e| Error::remote(format!("request to {} failed: {}", url, e)))?
            .error_for_status()
            .map_err(|e| Error::remote(format!("remote returned error: {}", e)))?;

        let body: Value = response
            .json()
            .await
            .map_err(|e| Error::remote(format!("invalid JSON from {}: {}", url, e)))?;

        Ok(parse_series(body))
    }
}

/// Flatten a `{ "<unix-ts>": <payload>, ... }` object into samples, sorted
/// by timestamp ascending. Keys that are not unix seconds are skipped.
fn parse_series(body: Value) -> Vec<RawSample> {
    let Value::Object(map) = body else {
        return Vec::new();
    };

    let mut samples: Vec<RawSample> = map
        .into_iter()
        .filter_map(|(key, value)| match key.parse::<i64>() {
            Ok(ts) => Some(RawSample::new(ts, value)),
            Err(_) => {
                warn!("Skipping series entry with non-numeric key {:?}", key);
                None
            }
        })
        .collect();
    samples.sort_by_key(|s| s.timestamp);
    samples
}

#[async_trait]
impl RemoteSource for HttpRemoteSource {
    async fn fetch_latest(&self, station_id: &str, key: SensorKey) -> Result<Option<RawSample>> {
        let url = self.series_url(station_id, key);
        debug!("Fetching latest {} for {}", key.code(), station_id);

        let params = [
            ("orderBy", "\"$key\"".to_string()),
            ("limitToLast", "1".to_string()),
        ];
        let samples = self.query(&url, &params).await?;
        Ok(samples.into_iter().last())
    }

    async fn fetch_range(
        &self,
        station_id: &str,
        key: SensorKey,
        from_ts: i64,
        to_ts: i64,
    ) -> Result<Vec<RawSample>> {
        let url = self.series_url(station_id, key);
        debug!(
            "Fetching {} range [{}, {}] for {}",
            key.code(),
            from_ts,
            to_ts,
            station_id
        );

        let params = [
            ("orderBy", "\"$key\"".to_string()),
            ("startAt", format!("\"{}\"", from_ts)),
            ("endAt", format!("\"{}\"", to_ts)),
        ];
        self.query(&url, &params).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_series_sorts_by_timestamp() {
        let body = json!({
            "200": {"val": "32.1"},
            "100": {"val": "31.0"},
        });
        let samples = parse_series(body);
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].timestamp, 100);
        assert_eq!(samples[1].timestamp, 200);
    }

    #[test]
    fn test_parse_series_skips_bad_keys() {
        let body = json!({
            "100": 31.0,
            "not-a-ts": 99.0,
        });
        let samples = parse_series(body);
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].timestamp, 100);
    }

    #[test]
    fn test_parse_series_tolerates_non_object() {
        assert!(parse_series(json!(null)).is_empty());
        assert!(parse_series(json!([1, 2, 3])).is_empty());
    }

    #[test]
    fn test_series_url() {
        let source = HttpRemoteSource::new("https://api.example/data/");
        assert_eq!(
            source.series_url("S1", SensorKey::Temperature),
            "https://api.example/data/S1/TEM.json"
        );
    }
}
