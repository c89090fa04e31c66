pub mod terminal;

use crate::indicator::bollinger::Bands;
use crate::model::PriceSeries;
use crate::signal::SignalReport;

/// Price line plus band overlay handed to the chart.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartData {
    /// 1-based point labels.
    pub labels: Vec<usize>,
    pub prices: Vec<f64>,
    pub bands: Option<Bands>,
}

impl ChartData {
    pub fn new(series: &PriceSeries, report: &SignalReport) -> Self {
        Self {
            labels: (1..=series.len()).collect(),
            prices: series.prices().to_vec(),
            bands: report.bollinger.value().copied(),
        }
    }
}

/// Sink for everything the user sees.
pub trait Renderer: Send + Sync {
    fn render_chart(&self, asset: &str, chart: &ChartData);
    fn render_signal(&self, asset: &str, report: &SignalReport);
    fn render_prediction(&self, asset: &str, price: f64);
    fn render_quote(&self, asset: &str, price: f64);
    fn render_status(&self, status: &str);
    fn render_balance(&self, balance: f64);
    fn render_error(&self, message: &str);
}
