//! In-memory [`Host`] for replaying recorded market data.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use tracing::{debug, warn};
use volspread_core::{ChainSnapshot, Host, CONTRACT_MULTIPLIER};

use crate::execution::{Fill, Quote, SimulatedExecutionHandler};

/// A host that owns its clock, market data and a cash-plus-holdings book.
///
/// Orders fill immediately against the current quote. Orders for instruments
/// without a quote are dropped, which is how a host "silently" fails a leg.
#[derive(Debug, Clone)]
pub struct ReplayHost {
    clock: NaiveDateTime,
    warming_up: bool,
    closes: BTreeMap<String, BTreeMap<NaiveDate, f64>>,
    chains: BTreeMap<String, ChainSnapshot>,
    quotes: BTreeMap<String, Quote>,
    holdings: BTreeMap<String, i32>,
    cash: Decimal,
    execution: SimulatedExecutionHandler,
    fills: Vec<Fill>,
}

impl ReplayHost {
    #[must_use]
    pub fn new(start: NaiveDateTime, cash: Decimal) -> Self {
        Self {
            clock: start,
            warming_up: false,
            closes: BTreeMap::new(),
            chains: BTreeMap::new(),
            quotes: BTreeMap::new(),
            holdings: BTreeMap::new(),
            cash,
            execution: SimulatedExecutionHandler::default(),
            fills: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_execution(mut self, execution: SimulatedExecutionHandler) -> Self {
        self.execution = execution;
        self
    }

    pub fn set_time(&mut self, now: NaiveDateTime) {
        self.clock = now;
    }

    pub fn set_warming_up(&mut self, warming_up: bool) {
        self.warming_up = warming_up;
    }

    pub fn add_close(&mut self, symbol: &str, date: NaiveDate, close: f64) {
        self.closes
            .entry(symbol.to_string())
            .or_default()
            .insert(date, close);
    }

    /// Adds `closes` on consecutive calendar days, the last one on `last_date`.
    pub fn add_closes(&mut self, symbol: &str, last_date: NaiveDate, closes: &[f64]) {
        let mut date = last_date;
        for &close in closes.iter().rev() {
            self.add_close(symbol, date, close);
            date = date.pred_opt().unwrap_or(date);
        }
    }

    /// Publishes a new chain for its underlying and refreshes the quotes of
    /// every contract in it, plus the underlying's spot.
    pub fn set_chain(&mut self, snapshot: ChainSnapshot) {
        for contract in &snapshot.contracts {
            self.quotes.insert(
                contract.symbol.clone(),
                Quote {
                    bid: contract.bid,
                    ask: contract.ask,
                    multiplier: CONTRACT_MULTIPLIER,
                },
            );
        }
        if let Some(first) = snapshot.contracts.first() {
            self.quotes
                .insert(snapshot.underlying.clone(), Quote::equity(first.underlying_price));
        }
        self.chains.insert(snapshot.underlying.clone(), snapshot);
    }

    /// Drops every published chain. Quotes stay so held contracts keep a mark.
    pub fn clear_chains(&mut self) {
        self.chains.clear();
    }

    /// Sets bid and ask, keeping the multiplier of a known instrument.
    pub fn set_quote(&mut self, instrument: &str, bid: Decimal, ask: Decimal) {
        let multiplier = self.quotes.get(instrument).map_or(1, |q| q.multiplier);
        self.quotes.insert(
            instrument.to_string(),
            Quote {
                bid,
                ask,
                multiplier,
            },
        );
    }

    pub fn set_price(&mut self, instrument: &str, price: Decimal) {
        self.set_quote(instrument, price, price);
    }

    /// Seeds a holding without a fill, e.g. to resume from a saved book.
    pub fn set_holding(&mut self, instrument: &str, quantity: i32) {
        if quantity == 0 {
            self.holdings.remove(instrument);
        } else {
            self.holdings.insert(instrument.to_string(), quantity);
        }
    }

    #[must_use]
    pub fn holding(&self, instrument: &str) -> i32 {
        self.holdings.get(instrument).copied().unwrap_or(0)
    }

    #[must_use]
    pub const fn holdings(&self) -> &BTreeMap<String, i32> {
        &self.holdings
    }

    #[must_use]
    pub fn fills(&self) -> &[Fill] {
        &self.fills
    }

    /// Fills recorded for one instrument.
    pub fn fills_for<'a>(&'a self, instrument: &'a str) -> impl Iterator<Item = &'a Fill> + 'a {
        self.fills.iter().filter(move |f| f.instrument == instrument)
    }

    #[must_use]
    pub const fn cash(&self) -> Decimal {
        self.cash
    }

    fn multiplier(&self, instrument: &str) -> i32 {
        self.quotes.get(instrument).map_or(1, |q| q.multiplier)
    }

    fn latest_close(&self, symbol: &str) -> Option<f64> {
        self.closes
            .get(symbol)?
            .range(..=self.clock.date())
            .next_back()
            .map(|(_, close)| *close)
    }

    /// Buy-back cost of every short holding, used as the margin requirement.
    fn short_exposure(&self) -> Decimal {
        self.holdings
            .iter()
            .filter(|(_, qty)| **qty < 0)
            .filter_map(|(instrument, qty)| {
                let quote = self.quotes.get(instrument)?;
                Some(Decimal::from(qty.unsigned_abs()) * quote.ask * Decimal::from(quote.multiplier))
            })
            .sum()
    }
}

impl Host for ReplayHost {
    fn current_time(&self) -> NaiveDateTime {
        self.clock
    }

    fn is_warming_up(&self) -> bool {
        self.warming_up
    }

    /// Completed days only: today's close is not known until tomorrow.
    fn daily_closes(&self, symbol: &str, lookback_days: usize) -> Vec<f64> {
        let Some(series) = self.closes.get(symbol) else {
            return Vec::new();
        };
        let mut closes: Vec<f64> = series
            .range(..self.clock.date())
            .rev()
            .take(lookback_days)
            .map(|(_, close)| *close)
            .collect();
        closes.reverse();
        closes
    }

    fn chain_snapshot(&self, underlying: &str) -> Option<ChainSnapshot> {
        self.chains.get(underlying).cloned()
    }

    fn current_price(&self, instrument: &str) -> Option<Decimal> {
        self.quotes
            .get(instrument)
            .map(Quote::mid)
            .or_else(|| self.latest_close(instrument).and_then(Decimal::from_f64))
    }

    fn ask_price(&self, contract: &str) -> Option<Decimal> {
        self.quotes.get(contract).map(|q| q.ask)
    }

    fn bid_price(&self, contract: &str) -> Option<Decimal> {
        self.quotes.get(contract).map(|q| q.bid)
    }

    fn margin_remaining(&self) -> Decimal {
        (self.portfolio_value() - self.short_exposure()).max(Decimal::ZERO)
    }

    /// Cash plus every holding marked at its mid.
    fn portfolio_value(&self) -> Decimal {
        let marked: Decimal = self
            .holdings
            .iter()
            .filter_map(|(instrument, qty)| {
                let quote = self.quotes.get(instrument)?;
                Some(Decimal::from(*qty) * quote.mid() * Decimal::from(quote.multiplier))
            })
            .sum();
        self.cash + marked
    }

    fn is_invested(&self, instrument: &str) -> bool {
        self.holding(instrument) != 0
    }

    fn place_order(&mut self, instrument: &str, quantity: i32) {
        if quantity == 0 {
            return;
        }
        let Some(quote) = self.quotes.get(instrument).copied() else {
            warn!(instrument, quantity, "No quote, order dropped");
            return;
        };

        let fill = self.execution.execute(self.clock, instrument, quantity, &quote);
        self.cash += fill.cash_flow(self.multiplier(instrument));
        let held = self.holding(instrument) + quantity;
        self.set_holding(instrument, held);

        debug!(
            order_id = %fill.order_id,
            instrument,
            quantity,
            price = %fill.price,
            "Filled"
        );
        self.fills.push(fill);
    }

    fn liquidate(&mut self, instrument: &str) {
        let held = self.holding(instrument);
        if held != 0 {
            self.place_order(instrument, -held);
        }
    }
}
