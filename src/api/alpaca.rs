//! Alpaca Market Data adapter.
//!
//! Thin REST client for the daily bars and snapshot endpoints, with retry
//! and exponential backoff on transient failures. Credentials come from the
//! environment (a `.env` file is honored by the binary).

use super::MarketData;
use crate::models::{MarketSnapshot, PriceBar};
use crate::Result;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use tokio::time::{sleep, Duration};

const MAX_RETRIES: u32 = 3;
const INITIAL_BACKOFF_MS: u64 = 2000;
const BARS_PAGE_LIMIT: u32 = 10_000;

const ENV_API_KEY: &str = "ALPACA_API_KEY";
const ENV_SECRET_KEY: &str = "ALPACA_SECRET_KEY";
const ENV_BASE_URL: &str = "ALPACA_BASE_URL";

/// Alpaca API credentials and endpoint.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub api_key: String,
    pub secret_key: String,
    pub base_url: String,
}

impl Credentials {
    /// Read credentials from the environment, naming everything that is
    /// missing in one error.
    pub fn from_env() -> Result<Self> {
        let mut missing = Vec::new();
        let mut get = |name: &'static str| match std::env::var(name) {
            Ok(value) if !value.is_empty() => Some(value),
            _ => {
                missing.push(name);
                None
            }
        };

        let credentials = (get(ENV_API_KEY), get(ENV_SECRET_KEY), get(ENV_BASE_URL));

        match credentials {
            (Some(api_key), Some(secret_key), Some(base_url)) => Ok(Self {
                api_key,
                secret_key,
                base_url,
            }),
            _ => Err(format!(
                "Missing required Alpaca credentials: {}. Set them in the environment or your .env file.",
                missing.join(", ")
            )
            .into()),
        }
    }
}

/// Client for the Alpaca Market Data REST API
#[derive(Clone)]
pub struct AlpacaClient {
    client: Client,
    credentials: Credentials,
}

#[derive(Debug, Deserialize)]
struct BarsResponse {
    bars: Option<Vec<AlpacaBar>>,
}

#[derive(Debug, Deserialize)]
struct AlpacaBar {
    t: DateTime<Utc>,
    o: f64,
    h: f64,
    l: f64,
    c: f64,
    v: f64,
}

#[derive(Debug, Deserialize)]
struct SnapshotsResponse {
    #[serde(flatten)]
    snapshots: HashMap<String, SymbolSnapshot>,
}

#[derive(Debug, Deserialize)]
struct SymbolSnapshot {
    #[serde(rename = "dailyBar")]
    daily_bar: Option<AlpacaBar>,
}

impl AlpacaClient {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            client: Client::new(),
            credentials,
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let url = format!("{}{}", self.credentials.base_url, path);

        let mut last_error = None;
        for attempt in 1..=MAX_RETRIES {
            let request = self
                .client
                .get(&url)
                .header("APCA-API-KEY-ID", &self.credentials.api_key)
                .header("APCA-API-SECRET-KEY", &self.credentials.secret_key)
                .query(query);

            match Self::send_once(request).await {
                Ok(parsed) => return Ok(parsed),
                Err(e) => {
                    last_error = Some(e);
                    if attempt < MAX_RETRIES {
                        let backoff_ms = INITIAL_BACKOFF_MS * 2_u64.pow(attempt - 1);
                        tracing::warn!(
                            "Attempt {}/{} failed for {}: {}. Retrying in {}ms...",
                            attempt,
                            MAX_RETRIES,
                            path,
                            last_error.as_ref().unwrap(),
                            backoff_ms
                        );
                        sleep(Duration::from_millis(backoff_ms)).await;
                    }
                }
            }
        }

        Err(last_error.unwrap_or_else(|| "All retry attempts failed".into()))
    }

    async fn send_once<T: serde::de::DeserializeOwned>(
        request: reqwest::RequestBuilder,
    ) -> Result<T> {
        let response = request.send().await?.error_for_status()?;
        Ok(response.json().await?)
    }
}

impl MarketData for AlpacaClient {
    async fn fetch_series(&self, symbol: &str, lookback_days: usize) -> Result<Vec<PriceBar>> {
        // Request double the window in calendar days; markets are closed on
        // weekends and holidays, then trim to the trailing sessions
        let end = Utc::now();
        let start = end - ChronoDuration::days(lookback_days as i64 * 2);

        let response: BarsResponse = self
            .get_json(
                &format!("/v2/stocks/{symbol}/bars"),
                &[
                    ("timeframe", "1Day".to_string()),
                    ("start", start.to_rfc3339()),
                    ("end", end.to_rfc3339()),
                    ("limit", BARS_PAGE_LIMIT.to_string()),
                    ("adjustment", "raw".to_string()),
                ],
            )
            .await?;

        let mut bars: Vec<PriceBar> = response
            .bars
            .unwrap_or_default()
            .into_iter()
            .map(|bar| PriceBar {
                date: bar.t.date_naive(),
                open: bar.o,
                high: bar.h,
                low: bar.l,
                close: bar.c,
                volume: bar.v,
            })
            .collect();

        if bars.len() > lookback_days {
            bars.drain(..bars.len() - lookback_days);
        }

        tracing::debug!("Fetched {} bars for {}", bars.len(), symbol);
        Ok(bars)
    }

    async fn scan_fast_movers(
        &self,
        universe: &[String],
        min_price: f64,
        min_volume: f64,
        top_n: usize,
    ) -> Result<Vec<MarketSnapshot>> {
        if universe.is_empty() {
            return Ok(Vec::new());
        }

        let response: SnapshotsResponse = self
            .get_json(
                "/v2/stocks/snapshots",
                &[("symbols", universe.join(","))],
            )
            .await?;

        let mut movers: Vec<MarketSnapshot> = response
            .snapshots
            .into_iter()
            .filter_map(|(symbol, snapshot)| {
                let bar = snapshot.daily_bar?;
                if bar.o <= 0.0 || bar.c < min_price || bar.v < min_volume {
                    return None;
                }
                Some(MarketSnapshot {
                    symbol,
                    percent_change: (bar.c - bar.o) / bar.o,
                    volume: bar.v,
                    close: bar.c,
                })
            })
            .collect();

        movers.sort_by(|a, b| {
            b.percent_change
                .partial_cmp(&a.percent_change)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.symbol.cmp(&b.symbol))
        });
        movers.truncate(top_n);

        tracing::info!("Fast-mover scan: {} of {} symbols kept", movers.len(), universe.len());
        Ok(movers)
    }
}
