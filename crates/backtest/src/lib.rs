pub mod data_provider;
pub mod execution;
pub mod host;
pub mod metrics;
pub mod replay;

pub use data_provider::{ChainFrame, DailyClose, HistoricalDataProvider};
pub use execution::{Fill, Quote, SimulatedExecutionHandler};
pub use host::ReplayHost;
pub use metrics::{MetricsCalculator, PerformanceMetrics};
pub use replay::{EventSummary, ReplayReport, ReplayRunner};
