//! Drives an [`Engine`] over recorded frames.

use serde::Serialize;
use tracing::info;
use volspread_core::Host;
use volspread_options_manager::{Engine, TickEvent};

use crate::data_provider::HistoricalDataProvider;
use crate::host::ReplayHost;
use crate::metrics::{MetricsCalculator, PerformanceMetrics};

/// Outcome of a replay run.
#[derive(Debug, Clone)]
pub struct ReplayReport {
    pub ticks: usize,
    pub events: Vec<TickEvent>,
    pub metrics: PerformanceMetrics,
}

/// Event counts by kind, for printing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EventSummary {
    pub entries: usize,
    pub exits: usize,
    pub hedges: usize,
    pub pause_countdowns: usize,
    pub skips: usize,
}

impl ReplayReport {
    #[must_use]
    pub fn summary(&self) -> EventSummary {
        let mut summary = EventSummary::default();
        for event in &self.events {
            match event {
                TickEvent::Entry { .. } => summary.entries += 1,
                TickEvent::Exit { .. } => summary.exits += 1,
                TickEvent::Hedge { .. } => summary.hedges += 1,
                TickEvent::PauseCountdown { .. } => summary.pause_countdowns += 1,
                TickEvent::Skip { .. } => summary.skips += 1,
            }
        }
        summary
    }
}

pub struct ReplayRunner {
    engine: Engine,
    host: ReplayHost,
}

impl ReplayRunner {
    #[must_use]
    pub fn new(engine: Engine, host: ReplayHost) -> Self {
        Self { engine, host }
    }

    #[must_use]
    pub const fn engine(&self) -> &Engine {
        &self.engine
    }

    #[must_use]
    pub const fn host(&self) -> &ReplayHost {
        &self.host
    }

    /// Seeds the host with the provider's closes, then ticks the engine once
    /// per chain frame.
    ///
    /// Each frame replaces the published chains, so an underlying missing
    /// from a frame has no chain on that tick.
    pub fn run(&mut self, provider: &mut HistoricalDataProvider) -> ReplayReport {
        for close in provider.closes() {
            self.host.add_close(&close.symbol, close.date, close.close);
        }

        let mut metrics = MetricsCalculator::new(self.host.portfolio_value());
        let mut events = Vec::new();
        let mut ticks = 0;

        while let Some(frame) = provider.next_frame() {
            self.host.set_time(frame.timestamp);
            self.host.clear_chains();
            for chain in frame.chains {
                self.host.set_chain(chain);
            }

            events.extend(self.engine.on_tick(&mut self.host));
            metrics.record_equity(self.host.portfolio_value());
            ticks += 1;
        }

        metrics.set_fill_count(self.host.fills().len());
        let metrics = metrics.calculate();

        info!(
            ticks,
            events = events.len(),
            fills = metrics.num_fills,
            final_equity = %metrics.final_equity,
            "Replay finished"
        );

        ReplayReport {
            ticks,
            events,
            metrics,
        }
    }
}
