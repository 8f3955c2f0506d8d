use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;
use volspread_core::{ChainSnapshot, OptionContract, OptionRight};

/// One daily close from `closes.csv`.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyClose {
    pub date: NaiveDate,
    pub symbol: String,
    pub close: f64,
}

/// Every chain snapshot recorded at one timestamp.
#[derive(Debug, Clone)]
pub struct ChainFrame {
    pub timestamp: NaiveDateTime,
    pub chains: Vec<ChainSnapshot>,
}

/// Recorded market data, replayed one chain timestamp at a time.
pub struct HistoricalDataProvider {
    closes: Vec<DailyClose>,
    frames: Vec<ChainFrame>,
    current_index: usize,
}

impl HistoricalDataProvider {
    #[must_use]
    pub const fn new(closes: Vec<DailyClose>, frames: Vec<ChainFrame>) -> Self {
        Self {
            closes,
            frames,
            current_index: 0,
        }
    }

    /// Loads `closes.csv` and `chains.csv`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Either file cannot be opened
    /// - A row has missing columns
    /// - A date, timestamp, decimal or option right fails to parse
    pub fn from_csv(closes_path: impl AsRef<Path>, chains_path: impl AsRef<Path>) -> Result<Self> {
        let closes = load_closes(closes_path.as_ref())?;
        let frames = load_chains(chains_path.as_ref())?;
        Ok(Self::new(closes, frames))
    }

    #[must_use]
    pub fn closes(&self) -> &[DailyClose] {
        &self.closes
    }

    #[must_use]
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn next_frame(&mut self) -> Option<ChainFrame> {
        let frame = self.frames.get(self.current_index).cloned();
        if frame.is_some() {
            self.current_index += 1;
        }
        frame
    }
}

/// Parses `date,symbol,close` rows.
///
/// # Errors
///
/// Fails on unreadable files or malformed rows, naming the line.
pub fn load_closes(path: &Path) -> Result<Vec<DailyClose>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("opening closes file {}", path.display()))?;
    let mut closes = Vec::new();

    for (line, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("reading {} row {}", path.display(), line + 1))?;
        let field = |i: usize| -> Result<&str> {
            record
                .get(i)
                .map(str::trim)
                .with_context(|| format!("{} row {}: missing column {i}", path.display(), line + 1))
        };

        closes.push(DailyClose {
            date: NaiveDate::parse_from_str(field(0)?, "%Y-%m-%d")
                .with_context(|| format!("row {}: bad date", line + 1))?,
            symbol: field(1)?.to_string(),
            close: field(2)?
                .parse()
                .with_context(|| format!("row {}: bad close", line + 1))?,
        });
    }

    closes.sort_by(|a, b| a.date.cmp(&b.date));
    Ok(closes)
}

/// Parses
/// `timestamp,underlying,contract,right,strike,expiry,bid,ask,iv,underlying_price,delta`
/// rows and groups them into frames, oldest first. `delta` may be empty.
///
/// # Errors
///
/// Fails on unreadable files or malformed rows, naming the line.
pub fn load_chains(path: &Path) -> Result<Vec<ChainFrame>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("opening chains file {}", path.display()))?;
    let mut grouped: BTreeMap<NaiveDateTime, BTreeMap<String, Vec<OptionContract>>> = BTreeMap::new();

    for (line, result) in reader.records().enumerate() {
        let row = line + 1;
        let record = result.with_context(|| format!("reading {} row {row}", path.display()))?;
        let field = |i: usize| -> Result<&str> {
            record
                .get(i)
                .map(str::trim)
                .with_context(|| format!("{} row {row}: missing column {i}", path.display()))
        };
        let decimal = |i: usize| -> Result<Decimal> {
            Decimal::from_str(field(i)?).with_context(|| format!("row {row}: bad decimal in column {i}"))
        };

        let timestamp = parse_timestamp(field(0)?).with_context(|| format!("row {row}: bad timestamp"))?;
        let underlying = field(1)?.to_string();
        let delta = match field(10) {
            Ok("") | Err(_) => None,
            Ok(raw) => Some(raw.parse::<f64>().with_context(|| format!("row {row}: bad delta"))?),
        };

        let contract = OptionContract {
            symbol: field(2)?.to_string(),
            underlying: underlying.clone(),
            right: OptionRight::from_str(field(3)?).map_err(anyhow::Error::msg)?,
            strike: decimal(4)?,
            expiry: NaiveDate::parse_from_str(field(5)?, "%Y-%m-%d")
                .with_context(|| format!("row {row}: bad expiry"))?,
            bid: decimal(6)?,
            ask: decimal(7)?,
            implied_volatility: field(8)?
                .parse()
                .with_context(|| format!("row {row}: bad iv"))?,
            underlying_price: decimal(9)?,
            delta,
        };

        grouped
            .entry(timestamp)
            .or_default()
            .entry(underlying)
            .or_default()
            .push(contract);
    }

    Ok(grouped
        .into_iter()
        .map(|(timestamp, by_underlying)| ChainFrame {
            timestamp,
            chains: by_underlying
                .into_iter()
                .map(|(underlying, contracts)| ChainSnapshot::new(underlying, contracts))
                .collect(),
        })
        .collect())
}

fn parse_timestamp(raw: &str) -> Result<NaiveDateTime> {
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .with_context(|| format!("unrecognized timestamp {raw}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::io::Write;

    fn write(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn closes_are_sorted_by_date() {
        let file = write("date,symbol,close\n2024-01-03,SPY,471.2\n2024-01-02,SPY,470.1\n");
        let closes = load_closes(file.path()).unwrap();
        assert_eq!(closes.len(), 2);
        assert_eq!(closes[0].date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(closes[1].close, 471.2);
    }

    #[test]
    fn chain_rows_group_by_timestamp_and_underlying() {
        let file = write(
            "timestamp,underlying,contract,right,strike,expiry,bid,ask,iv,underlying_price,delta\n\
             2024-01-02T11:00:00,SPY,SPY 470C,C,470,2024-02-16,4.9,5.1,0.18,470.3,0.52\n\
             2024-01-02T10:00:00,SPY,SPY 470C,call,470,2024-02-16,5.0,5.2,0.18,470.5,\n\
             2024-01-02T10:00:00,SPY,SPY 470P,P,470,2024-02-16,4.4,4.6,0.19,470.5,-0.48\n\
             2024-01-02 10:00:00,QQQ,QQQ 400C,C,400,2024-02-16,6.0,6.2,0.22,401,\n",
        );
        let frames = load_chains(file.path()).unwrap();
        assert_eq!(frames.len(), 2);

        let first = &frames[0];
        assert_eq!(first.timestamp.format("%H:%M").to_string(), "10:00");
        assert_eq!(first.chains.len(), 2);
        assert_eq!(first.chains[0].underlying, "QQQ");
        let spy = &first.chains[1];
        assert_eq!(spy.contracts.len(), 2);
        assert_eq!(spy.contracts[0].ask, dec!(5.2));
        assert_eq!(spy.contracts[0].delta, None);
        assert_eq!(spy.contracts[1].right, OptionRight::Put);
        assert_eq!(spy.contracts[1].delta, Some(-0.48));
    }

    #[test]
    fn bad_right_is_reported() {
        let file = write(
            "timestamp,underlying,contract,right,strike,expiry,bid,ask,iv,underlying_price,delta\n\
             2024-01-02T10:00:00,SPY,SPY 470X,X,470,2024-02-16,5.0,5.2,0.18,470.5,\n",
        );
        let err = load_chains(file.path()).unwrap_err();
        assert!(err.to_string().contains("invalid option right"));
    }

    #[test]
    fn provider_walks_frames_in_order() {
        let closes = write("date,symbol,close\n2024-01-02,SPY,470\n");
        let chains = write(
            "timestamp,underlying,contract,right,strike,expiry,bid,ask,iv,underlying_price,delta\n\
             2024-01-02T10:00:00,SPY,SPY 470C,C,470,2024-02-16,5.0,5.2,0.18,470.5,\n\
             2024-01-02T10:00:00,SPY,SPY 470P,P,470,2024-02-16,4.4,4.6,0.19,470.5,\n\
             2024-01-02T11:00:00,SPY,SPY 470C,C,470,2024-02-16,5.0,5.2,0.18,470.5,\n",
        );
        let mut provider = HistoricalDataProvider::from_csv(closes.path(), chains.path()).unwrap();
        assert_eq!(provider.closes().len(), 1);
        assert_eq!(provider.frame_count(), 2);
        assert!(provider.next_frame().is_some());
        assert!(provider.next_frame().is_some());
        assert!(provider.next_frame().is_none());
    }
}
