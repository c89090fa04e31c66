use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;

use error_stack::Report;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::SourceError;
use crate::model::{PriceSeries, TradingStyle};
use crate::portfolio::{Portfolio, parse_amount, rejection_message};
use crate::predictor::Predictor;
use crate::render::{ChartData, Renderer};
use crate::signal::{SignalReport, analyze};
use crate::source::PriceSource;

/// User-initiated events.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Refresh,
    SelectAsset(String),
    SetStyle(TradingStyle),
    Buy(String),
    Sell(String),
    Train,
    Quote,
    Balance,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RefreshTrigger {
    Timer,
    Manual,
}

#[derive(Debug, Clone)]
pub struct DriverSettings {
    pub refresh_interval: Duration,
    pub history_days: u32,
}

/// Everything that changes while the application runs.
///
/// Owned by the driver task alone, so no locking is needed.
pub struct AppState {
    pub asset: String,
    pub style: TradingStyle,
    pub series: Arc<PriceSeries>,
    pub report: Option<SignalReport>,
    pub portfolio: Portfolio,
    /// Bumped on every asset change; fetches started under an older value are stale.
    pub generation: u64,
}

impl AppState {
    pub fn new(asset: &str, style: TradingStyle, portfolio: Portfolio) -> Self {
        Self {
            asset: asset.to_owned(),
            style,
            series: Arc::new(PriceSeries::default()),
            report: None,
            portfolio,
            generation: 0,
        }
    }
}

/// Result of one background history fetch.
struct FetchOutcome {
    generation: u64,
    asset: String,
    result: Result<PriceSeries, Report<SourceError>>,
}

/// Periodically refetches the price series and re-runs the signal engine;
/// also applies user commands.
///
/// At most one fetch runs at a time. A timer tick during a fetch is dropped,
/// a manual refresh or asset change is queued until the fetch completes.
pub struct RefreshDriver {
    source: Arc<dyn PriceSource>,
    renderer: Arc<dyn Renderer>,
    predictor: Box<dyn Predictor>,
    settings: DriverSettings,
    state: AppState,
    in_flight: bool,
    queued: bool,
    fetch_tx: mpsc::Sender<FetchOutcome>,
    fetch_rx: mpsc::Receiver<FetchOutcome>,
}

impl RefreshDriver {
    pub fn new(
        source: Arc<dyn PriceSource>,
        renderer: Arc<dyn Renderer>,
        predictor: Box<dyn Predictor>,
        settings: DriverSettings,
        state: AppState,
    ) -> Self {
        let (fetch_tx, fetch_rx) = mpsc::channel(8);
        Self {
            source,
            renderer,
            predictor,
            settings,
            state,
            in_flight: false,
            queued: false,
            fetch_tx,
            fetch_rx,
        }
    }

    /// Run until `cancel` fires or a `Quit` command arrives.
    ///
    /// The first timer tick fires immediately, which performs the start-up fetch.
    pub async fn run(mut self, mut commands: mpsc::Receiver<Command>, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.settings.refresh_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(
            asset = %self.state.asset,
            style = %self.state.style,
            interval_secs = self.settings.refresh_interval.as_secs(),
            "refresh driver started"
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("refresh driver cancelled");
                    break;
                }
                _ = ticker.tick() => self.request_refresh(RefreshTrigger::Timer),
                Some(outcome) = self.fetch_rx.recv() => self.apply_fetch(outcome),
                Some(command) = commands.recv() => {
                    if self.handle_command(command).is_break() {
                        cancel.cancel();
                        break;
                    }
                }
            }
        }

        info!("refresh driver stopped");
    }

    pub fn handle_command(&mut self, command: Command) -> ControlFlow<()> {
        match command {
            Command::Refresh => self.request_refresh(RefreshTrigger::Manual),
            Command::SelectAsset(asset) => self.select_asset(asset),
            Command::SetStyle(style) => self.set_style(style),
            Command::Buy(input) => self.trade(&input, true),
            Command::Sell(input) => self.trade(&input, false),
            Command::Train => self.train(),
            Command::Quote => self.quote(),
            Command::Balance => self.renderer.render_balance(self.state.portfolio.balance()),
            Command::Quit => return ControlFlow::Break(()),
        }
        ControlFlow::Continue(())
    }

    fn request_refresh(&mut self, trigger: RefreshTrigger) {
        if self.in_flight {
            match trigger {
                RefreshTrigger::Timer => debug!("fetch in flight, skipping timer refresh"),
                RefreshTrigger::Manual => {
                    debug!("fetch in flight, queueing refresh");
                    self.queued = true;
                }
            }
            return;
        }
        self.start_fetch();
    }

    fn start_fetch(&mut self) {
        self.in_flight = true;

        let source = Arc::clone(&self.source);
        let tx = self.fetch_tx.clone();
        let asset = self.state.asset.clone();
        let generation = self.state.generation;
        let days = self.settings.history_days;

        debug!(asset = %asset, generation, days, "starting price fetch");
        tokio::spawn(async move {
            let result = source.fetch_history(&asset, days).await;
            let _ = tx
                .send(FetchOutcome {
                    generation,
                    asset,
                    result,
                })
                .await;
        });
    }

    fn apply_fetch(&mut self, outcome: FetchOutcome) {
        self.in_flight = false;

        if outcome.generation != self.state.generation {
            debug!(
                asset = %outcome.asset,
                generation = outcome.generation,
                current = self.state.generation,
                "discarding stale fetch result"
            );
        } else {
            match outcome.result {
                Ok(series) => self.install_series(series),
                Err(report) => {
                    warn!(
                        error = ?report,
                        provider = self.source.name(),
                        asset = %outcome.asset,
                        "price fetch failed"
                    );
                    self.renderer.render_error(&format!(
                        "Error fetching data for {}: {}",
                        outcome.asset,
                        report.current_context()
                    ));
                }
            }
        }

        if std::mem::take(&mut self.queued) {
            self.start_fetch();
        }
    }

    fn install_series(&mut self, series: PriceSeries) {
        let series = Arc::new(series);
        let report = analyze(&series, self.state.style);
        self.state.series = Arc::clone(&series);
        self.state.report = Some(report.clone());

        info!(
            asset = %self.state.asset,
            len = series.len(),
            recommendation = %report.recommendation,
            "price series updated"
        );

        if !series.is_empty() {
            self.renderer
                .render_chart(&self.state.asset, &ChartData::new(&series, &report));
        }
        self.renderer.render_signal(&self.state.asset, &report);
        self.render_prediction();
    }

    fn select_asset(&mut self, asset: String) {
        info!(from = %self.state.asset, to = %asset, "asset selected");
        self.state.asset = asset;
        self.state.generation += 1;
        self.request_refresh(RefreshTrigger::Manual);
    }

    fn set_style(&mut self, style: TradingStyle) {
        self.state.style = style;
        if self.state.series.is_empty() {
            return;
        }
        let report = analyze(&self.state.series, style);
        self.renderer.render_signal(&self.state.asset, &report);
        self.state.report = Some(report);
    }

    fn trade(&mut self, input: &str, buying: bool) {
        let asset = self.state.asset.clone();
        let last_price = self.state.series.last_price();
        let portfolio = &mut self.state.portfolio;

        let result = parse_amount(input).and_then(|amount| {
            if buying {
                portfolio.buy(amount, &asset, last_price)
            } else {
                portfolio.sell(amount, &asset, last_price)
            }
        });

        match result {
            Ok(confirmation) => {
                self.renderer.render_status(&confirmation.message());
                self.renderer.render_balance(confirmation.balance);
            }
            Err(report) => {
                debug!(error = ?report, "trade rejected");
                self.renderer
                    .render_status(rejection_message(report.current_context()));
            }
        }
    }

    fn train(&mut self) {
        match self.predictor.train(&self.state.series) {
            Ok(()) => {
                info!(model = self.predictor.name(), asset = %self.state.asset, "model trained");
                self.renderer.render_status("Model trained");
                self.render_prediction();
            }
            Err(report) => {
                debug!(error = ?report, "training skipped");
                self.renderer.render_status("Not enough data to train model");
            }
        }
    }

    fn render_prediction(&self) {
        if !self.predictor.is_trained() {
            return;
        }
        if let Some(price) = self.predictor.predict(self.state.series.prices()) {
            self.renderer.render_prediction(&self.state.asset, price);
        }
    }

    fn quote(&self) {
        let source = Arc::clone(&self.source);
        let renderer = Arc::clone(&self.renderer);
        let asset = self.state.asset.clone();
        tokio::spawn(async move {
            match source.fetch_current_price(&asset).await {
                Ok(price) => renderer.render_quote(&asset, price),
                Err(report) => {
                    warn!(error = ?report, asset = %asset, "current price fetch failed");
                    renderer.render_error(&format!("Error fetching current price for {asset}"));
                }
            }
        });
    }
}
