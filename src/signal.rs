use crate::indicator::bollinger::{Bands, BollingerBands};
use crate::indicator::macd::Macd;
use crate::indicator::rsi::Rsi;
use crate::indicator::{Indicator, IndicatorResult};
use crate::model::{PriceSeries, TradingStyle, Vote};

/// Indicator values, per-indicator votes and the combined recommendation for
/// one series snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalReport {
    pub style: TradingStyle,
    pub rsi: IndicatorResult<f64>,
    pub macd: IndicatorResult<f64>,
    pub bollinger: IndicatorResult<Bands>,
    pub rsi_vote: Vote,
    pub macd_vote: Vote,
    pub bollinger_vote: Vote,
    pub recommendation: Vote,
}

impl SignalReport {
    /// Report for an empty series: nothing computed, everything neutral.
    pub fn empty(style: TradingStyle) -> Self {
        Self {
            style,
            rsi: IndicatorResult::Unavailable,
            macd: IndicatorResult::Unavailable,
            bollinger: IndicatorResult::Unavailable,
            rsi_vote: Vote::Hold,
            macd_vote: Vote::Hold,
            bollinger_vote: Vote::Hold,
            recommendation: Vote::Hold,
        }
    }

    #[allow(dead_code)]
    pub fn votes(&self) -> [Vote; 3] {
        [self.rsi_vote, self.macd_vote, self.bollinger_vote]
    }
}

/// Compute all three indicators on the same snapshot and combine their votes.
pub fn analyze(series: &PriceSeries, style: TradingStyle) -> SignalReport {
    if series.is_empty() {
        return SignalReport::empty(style);
    }

    let rsi_indicator = Rsi::default();
    let macd_indicator = Macd::default();
    let bollinger_indicator = BollingerBands::default();

    let rsi = rsi_indicator.calculate(series);
    let macd = macd_indicator.calculate(series);
    let bollinger = bollinger_indicator.calculate(series);

    for (name, available) in [
        (rsi_indicator.name(), rsi.is_available()),
        (macd_indicator.name(), macd.is_available()),
        (bollinger_indicator.name(), bollinger.is_available()),
    ] {
        if !available {
            tracing::debug!(indicator = name, len = series.len(), "insufficient data for indicator");
        }
    }

    let rsi_vote = rsi_vote(&rsi, style);
    let macd_vote = macd_vote(&macd);
    // last_price is present: the series is non-empty
    let bollinger_vote = series
        .last_price()
        .map_or(Vote::Hold, |price| bollinger_vote(&bollinger, price, style));

    SignalReport {
        style,
        rsi,
        macd,
        bollinger,
        rsi_vote,
        macd_vote,
        bollinger_vote,
        recommendation: majority(&[rsi_vote, macd_vote, bollinger_vote]),
    }
}

/// Final recommendation for a series under a trading style.
#[allow(dead_code)]
pub fn evaluate(series: &PriceSeries, style: TradingStyle) -> Vote {
    analyze(series, style).recommendation
}

pub fn rsi_vote(rsi: &IndicatorResult<f64>, style: TradingStyle) -> Vote {
    let Some(&value) = rsi.value() else {
        return Vote::Hold;
    };

    if value < style.rsi_oversold() {
        return Vote::Buy;
    }
    if value > style.rsi_overbought() {
        return Vote::Sell;
    }
    Vote::Hold
}

pub fn macd_vote(macd: &IndicatorResult<f64>) -> Vote {
    match macd.value() {
        Some(&value) if value > 0.0 => Vote::Buy,
        Some(&value) if value < 0.0 => Vote::Sell,
        _ => Vote::Hold,
    }
}

/// Vote on where `price` sits relative to the bands, widened by the style's
/// proximity buffer.
pub fn bollinger_vote(bands: &IndicatorResult<Bands>, price: f64, style: TradingStyle) -> Vote {
    let Some(bands) = bands.value() else {
        return Vote::Hold;
    };

    let buffer = style.band_buffer();
    if price <= bands.lower * buffer {
        return Vote::Buy;
    }
    if price >= bands.upper / buffer {
        return Vote::Sell;
    }
    Vote::Hold
}

/// `Buy` or `Sell` when at least two votes agree, otherwise `Hold`.
pub fn majority(votes: &[Vote]) -> Vote {
    let buys = votes.iter().filter(|v| **v == Vote::Buy).count();
    let sells = votes.iter().filter(|v| **v == Vote::Sell).count();

    if buys >= 2 {
        Vote::Buy
    } else if sells >= 2 {
        Vote::Sell
    } else {
        Vote::Hold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_VOTES: [Vote; 3] = [Vote::Buy, Vote::Sell, Vote::Hold];

    fn bands(sma: f64, upper: f64, lower: f64) -> IndicatorResult<Bands> {
        IndicatorResult::Value(Bands { sma, upper, lower })
    }

    #[test]
    fn majority_over_all_combinations() {
        for a in ALL_VOTES {
            for b in ALL_VOTES {
                for c in ALL_VOTES {
                    let votes = [a, b, c];
                    let buys = votes.iter().filter(|v| **v == Vote::Buy).count();
                    let sells = votes.iter().filter(|v| **v == Vote::Sell).count();
                    let expected = if buys >= 2 {
                        Vote::Buy
                    } else if sells >= 2 {
                        Vote::Sell
                    } else {
                        Vote::Hold
                    };
                    assert_eq!(majority(&votes), expected, "votes: {votes:?}");
                }
            }
        }
    }

    #[test]
    fn split_vote_is_hold() {
        assert_eq!(majority(&[Vote::Buy, Vote::Sell, Vote::Hold]), Vote::Hold);
        assert_eq!(majority(&[Vote::Hold, Vote::Hold, Vote::Buy]), Vote::Hold);
    }

    #[test]
    fn rsi_vote_depends_on_style() {
        let rsi = IndicatorResult::Value(35.0);
        assert_eq!(rsi_vote(&rsi, TradingStyle::DayTrading), Vote::Buy);
        assert_eq!(rsi_vote(&rsi, TradingStyle::SwingTrading), Vote::Hold);

        let rsi = IndicatorResult::Value(65.0);
        assert_eq!(rsi_vote(&rsi, TradingStyle::DayTrading), Vote::Sell);
        assert_eq!(rsi_vote(&rsi, TradingStyle::SwingTrading), Vote::Hold);
    }

    #[test]
    fn same_series_votes_differently_per_style() {
        // seven +1 and seven -2 moves: avg gain 1, avg loss 2, RSI 33.33
        let mut closes = vec![100.0];
        for i in 0..14 {
            let last = closes[i];
            closes.push(if i % 2 == 0 { last + 1.0 } else { last - 2.0 });
        }
        let series = PriceSeries::from_prices(&closes);
        assert_eq!(series.len(), 15);

        let day = analyze(&series, TradingStyle::DayTrading);
        let swing = analyze(&series, TradingStyle::SwingTrading);

        let rsi = *day.rsi.value().unwrap();
        assert!((rsi - 100.0 / 3.0).abs() < 1e-9);
        assert_eq!(swing.rsi, day.rsi);
        assert_eq!(day.rsi_vote, Vote::Buy);
        assert_eq!(swing.rsi_vote, Vote::Hold);
    }

    #[test]
    fn rsi_vote_thresholds_are_strict() {
        assert_eq!(
            rsi_vote(&IndicatorResult::Value(30.0), TradingStyle::SwingTrading),
            Vote::Hold
        );
        assert_eq!(
            rsi_vote(&IndicatorResult::Value(70.0), TradingStyle::SwingTrading),
            Vote::Hold
        );
        assert_eq!(
            rsi_vote(&IndicatorResult::Value(29.9), TradingStyle::SwingTrading),
            Vote::Buy
        );
    }

    #[test]
    fn rsi_vote_unavailable_or_nan_is_hold() {
        assert_eq!(
            rsi_vote(&IndicatorResult::Unavailable, TradingStyle::DayTrading),
            Vote::Hold
        );
        assert_eq!(
            rsi_vote(&IndicatorResult::Value(f64::NAN), TradingStyle::DayTrading),
            Vote::Hold
        );
    }

    #[test]
    fn macd_vote_by_sign() {
        assert_eq!(macd_vote(&IndicatorResult::Value(0.5)), Vote::Buy);
        assert_eq!(macd_vote(&IndicatorResult::Value(-0.5)), Vote::Sell);
        assert_eq!(macd_vote(&IndicatorResult::Value(0.0)), Vote::Hold);
        assert_eq!(macd_vote(&IndicatorResult::Unavailable), Vote::Hold);
    }

    #[test]
    fn bollinger_vote_uses_style_buffer() {
        let b = bands(100.0, 110.0, 90.0);
        // day: buy <= 91.35, sell >= 110 / 1.015 ~ 108.37
        assert_eq!(bollinger_vote(&b, 91.0, TradingStyle::DayTrading), Vote::Buy);
        assert_eq!(bollinger_vote(&b, 91.0, TradingStyle::SwingTrading), Vote::Hold);
        assert_eq!(bollinger_vote(&b, 108.5, TradingStyle::DayTrading), Vote::Sell);
        assert_eq!(bollinger_vote(&b, 108.5, TradingStyle::SwingTrading), Vote::Hold);
        assert_eq!(bollinger_vote(&b, 100.0, TradingStyle::DayTrading), Vote::Hold);
    }

    #[test]
    fn bollinger_vote_unavailable_is_hold() {
        assert_eq!(
            bollinger_vote(&IndicatorResult::Unavailable, 1.0, TradingStyle::DayTrading),
            Vote::Hold
        );
    }

    #[test]
    fn empty_series_is_hold_with_nothing_computed() {
        let report = analyze(&PriceSeries::default(), TradingStyle::DayTrading);
        assert_eq!(report, SignalReport::empty(TradingStyle::DayTrading));
        assert_eq!(
            evaluate(&PriceSeries::default(), TradingStyle::SwingTrading),
            Vote::Hold
        );
    }

    #[test]
    fn short_series_only_rsi_votes() {
        // 15 rising prices: RSI 100 (sell), MACD and Bollinger unavailable
        let closes: Vec<f64> = (0..15).map(|i| 100.0 + i as f64).collect();
        let report = analyze(&PriceSeries::from_prices(&closes), TradingStyle::SwingTrading);
        assert_eq!(report.rsi, IndicatorResult::Value(100.0));
        assert_eq!(report.macd, IndicatorResult::Unavailable);
        assert_eq!(report.bollinger, IndicatorResult::Unavailable);
        assert_eq!(report.votes(), [Vote::Sell, Vote::Hold, Vote::Hold]);
        assert_eq!(report.recommendation, Vote::Hold);
    }

    #[test]
    fn sharp_drop_recommends_buy() {
        // RSI 0 (buy), MACD negative (sell), price below lower band (buy)
        let mut closes = vec![100.0; 29];
        closes.push(90.0);
        let report = analyze(&PriceSeries::from_prices(&closes), TradingStyle::SwingTrading);
        assert_eq!(report.rsi_vote, Vote::Buy);
        assert_eq!(report.macd_vote, Vote::Sell);
        assert_eq!(report.bollinger_vote, Vote::Buy);
        assert_eq!(report.recommendation, Vote::Buy);
    }

    #[test]
    fn sharp_rise_recommends_sell() {
        let mut closes = vec![100.0; 29];
        closes.push(110.0);
        let report = analyze(&PriceSeries::from_prices(&closes), TradingStyle::DayTrading);
        assert_eq!(report.rsi_vote, Vote::Sell);
        assert_eq!(report.macd_vote, Vote::Buy);
        assert_eq!(report.bollinger_vote, Vote::Sell);
        assert_eq!(report.recommendation, Vote::Sell);
    }

    #[test]
    fn same_series_same_vote() {
        let closes: Vec<f64> = (0..30)
            .map(|i| 100.0 + ((i * 13) % 7) as f64)
            .collect();
        let series = PriceSeries::from_prices(&closes);
        let first = analyze(&series, TradingStyle::DayTrading);
        let second = analyze(&series, TradingStyle::DayTrading);
        assert_eq!(first.recommendation, second.recommendation);
        assert_eq!(first.votes(), second.votes());
    }
}
