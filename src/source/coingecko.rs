use std::collections::HashMap;
use std::num::NonZeroU32;
use std::sync::Arc;

use chrono::DateTime;
use error_stack::{Report, ResultExt};
use futures::future::BoxFuture;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use serde::Deserialize;
use tracing::debug;

use crate::error::SourceError;
use crate::model::{PricePoint, PriceSeries};
use crate::source::{PriceSource, validate_price};

pub const COINGECKO_BASE_URL: &str = "https://api.coingecko.com/api/v3";
const PROVIDER: &str = "coingecko";

pub struct CoinGeckoSource {
    client: reqwest::Client,
    rate_limiter: Arc<DefaultDirectRateLimiter>,
    base_url: String,
    vs_currency: String,
}

impl CoinGeckoSource {
    pub fn new(base_url: &str, vs_currency: &str, requests_per_minute: u32) -> Self {
        let quota = Quota::per_minute(NonZeroU32::new(requests_per_minute).unwrap_or(NonZeroU32::MIN));
        Self {
            client: reqwest::Client::new(),
            rate_limiter: Arc::new(RateLimiter::direct(quota)),
            base_url: base_url.trim_end_matches('/').to_owned(),
            vs_currency: vs_currency.to_owned(),
        }
    }

    async fn get<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        params: &[(&str, &str)],
    ) -> Result<T, Report<SourceError>> {
        // Wait for rate limiter before making the request
        self.rate_limiter.until_ready().await;

        let response = self
            .client
            .get(url)
            .query(params)
            .send()
            .await
            .change_context(SourceError::Request {
                provider: PROVIDER.into(),
            })
            .attach_with(|| format!("url: {url}"))?;

        if !response.status().is_success() {
            return Err(Report::new(SourceError::Request {
                provider: PROVIDER.into(),
            })
            .attach(format!("HTTP status: {}", response.status())));
        }

        response
            .json()
            .await
            .change_context(SourceError::ResponseParse {
                provider: PROVIDER.into(),
            })
    }
}

impl Default for CoinGeckoSource {
    fn default() -> Self {
        Self::new(COINGECKO_BASE_URL, "usd", 10)
    }
}

impl PriceSource for CoinGeckoSource {
    fn name(&self) -> &str {
        PROVIDER
    }

    fn fetch_history(
        &self,
        asset: &str,
        days: u32,
    ) -> BoxFuture<'_, Result<PriceSeries, Report<SourceError>>> {
        let asset = asset.to_owned();
        Box::pin(async move {
            let url = format!("{}/coins/{}/market_chart", self.base_url, asset);
            let days = days.to_string();
            let params = [
                ("vs_currency", self.vs_currency.as_str()),
                ("days", days.as_str()),
                ("interval", "daily"),
            ];

            let chart: MarketChart = self.get(&url, &params).await?;
            let series = chart.into_series().attach_with(|| format!("asset: {asset}"))?;
            debug!(asset = %asset, len = series.len(), "coingecko history fetched");
            Ok(series)
        })
    }

    fn fetch_current_price(&self, asset: &str) -> BoxFuture<'_, Result<f64, Report<SourceError>>> {
        let asset = asset.to_owned();
        Box::pin(async move {
            let url = format!("{}/simple/price", self.base_url);
            let params = [
                ("ids", asset.as_str()),
                ("vs_currencies", self.vs_currency.as_str()),
            ];

            let quotes: SimplePrice = self.get(&url, &params).await?;
            spot_price(&quotes, &asset, &self.vs_currency)
        })
    }
}

// ── REST response types ───────────────────────────────────────────────────────

/// `GET /coins/{id}/market_chart` body; `prices` is `[[ms_timestamp, price], ...]`.
#[derive(Debug, Deserialize)]
struct MarketChart {
    prices: Vec<(f64, f64)>,
}

impl MarketChart {
    fn into_series(self) -> Result<PriceSeries, Report<SourceError>> {
        let mut points = Vec::with_capacity(self.prices.len());
        for (ms, price) in self.prices {
            let timestamp = DateTime::from_timestamp_millis(ms as i64).ok_or_else(|| {
                Report::new(SourceError::InvalidData {
                    reason: format!("timestamp {ms} out of range"),
                })
            })?;
            points.push(PricePoint {
                timestamp,
                price: validate_price(price)?,
            });
        }

        if points.windows(2).any(|w| w[1].timestamp <= w[0].timestamp) {
            return Err(Report::new(SourceError::InvalidData {
                reason: "timestamps are not strictly ascending".into(),
            }));
        }

        Ok(PriceSeries::new(points))
    }
}

/// `GET /simple/price` body: `{"bitcoin": {"usd": 64000.0}}`.
type SimplePrice = HashMap<String, HashMap<String, f64>>;

fn spot_price(
    quotes: &SimplePrice,
    asset: &str,
    vs_currency: &str,
) -> Result<f64, Report<SourceError>> {
    let price = quotes
        .get(asset)
        .and_then(|q| q.get(vs_currency))
        .copied()
        .ok_or_else(|| {
            Report::new(SourceError::InvalidData {
                reason: format!("no {vs_currency} quote for {asset}"),
            })
        })?;
    validate_price(price)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn market_chart_parses_into_series() {
        let body = r#"{
            "prices": [[1704067200000, 42000.5], [1704153600000, 43010.25], [1704240000000, 42800.0]],
            "market_caps": [],
            "total_volumes": []
        }"#;
        let chart: MarketChart = serde_json::from_str(body).unwrap();
        let series = chart.into_series().unwrap();
        assert_eq!(series.prices(), &[42000.5, 43010.25, 42800.0]);
        assert_eq!(
            series.points()[0].timestamp.to_rfc3339(),
            "2024-01-01T00:00:00+00:00"
        );
    }

    #[test]
    fn market_chart_rejects_negative_price() {
        let chart: MarketChart =
            serde_json::from_str(r#"{"prices": [[1704067200000, -1.0]]}"#).unwrap();
        let err = chart.into_series().unwrap_err();
        assert!(matches!(
            err.current_context(),
            SourceError::InvalidData { .. }
        ));
    }

    #[test]
    fn market_chart_rejects_unordered_timestamps() {
        let chart: MarketChart = serde_json::from_str(
            r#"{"prices": [[1704153600000, 1.0], [1704067200000, 2.0]]}"#,
        )
        .unwrap();
        assert!(chart.into_series().is_err());
    }

    #[test]
    fn market_chart_empty_is_empty_series() {
        let chart: MarketChart = serde_json::from_str(r#"{"prices": []}"#).unwrap();
        assert!(chart.into_series().unwrap().is_empty());
    }

    #[test]
    fn spot_price_reads_currency() {
        let quotes: SimplePrice =
            serde_json::from_str(r#"{"bitcoin": {"usd": 64123.5}}"#).unwrap();
        assert_eq!(spot_price(&quotes, "bitcoin", "usd").unwrap(), 64123.5);
        assert!(spot_price(&quotes, "ethereum", "usd").is_err());
        assert!(spot_price(&quotes, "bitcoin", "eur").is_err());
    }

    /// Integration test: requires network access. Run with `cargo test -- --ignored`
    #[tokio::test]
    #[ignore]
    async fn integration_fetch_history() {
        let source = CoinGeckoSource::default();
        let series = source.fetch_history("bitcoin", 30).await.unwrap();
        assert!(series.len() >= 20);
    }

    /// Integration test: requires network access. Run with `cargo test -- --ignored`
    #[tokio::test]
    #[ignore]
    async fn integration_fetch_current_price() {
        let source = CoinGeckoSource::default();
        let price = source.fetch_current_price("bitcoin").await.unwrap();
        assert!(price > 0.0);
    }
}
