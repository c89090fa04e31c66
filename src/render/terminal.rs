use crate::render::{ChartData, Renderer};
use crate::signal::SignalReport;

pub struct TerminalRenderer;

impl Renderer for TerminalRenderer {
    fn render_chart(&self, asset: &str, chart: &ChartData) {
        let first = chart.prices.first().copied().unwrap_or_default();
        let last = chart.prices.last().copied().unwrap_or_default();
        tracing::info!(
            asset,
            points = chart.labels.len(),
            first = %format!("{first:.2}"),
            last = %format!("{last:.2}"),
            sma = ?chart.bands.map(|b| format!("{:.2}", b.sma)),
            "price chart updated"
        );
    }

    fn render_signal(&self, asset: &str, report: &SignalReport) {
        tracing::info!(
            asset,
            style = %report.style,
            rsi = %format!("{:.2}", report.rsi),
            macd = %format!("{:.2}", report.macd),
            bollinger = %report.bollinger,
            class = report.recommendation.class(),
            "Recommendation: {}",
            report.recommendation,
        );
    }

    fn render_prediction(&self, asset: &str, price: f64) {
        tracing::info!(asset, "Predicted next price: ${price:.2}");
    }

    fn render_quote(&self, asset: &str, price: f64) {
        tracing::info!(asset, "Current price: ${price:.2}");
    }

    fn render_status(&self, status: &str) {
        tracing::info!("{status}");
    }

    fn render_balance(&self, balance: f64) {
        tracing::info!("Balance: ${balance:.2}");
    }

    fn render_error(&self, message: &str) {
        tracing::warn!("{message}");
    }
}
