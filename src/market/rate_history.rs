use crate::core::currency::{CurrencyError, CurrencyPair};
use crate::market::risk_model::RiskModelError;
use chrono::NaiveDate;
use log::{debug, warn};
use std::collections::BTreeMap;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// The seven major pairs the trade population is drawn from.
pub const MAJOR_PAIRS: [&str; 7] = [
    "EUR/USD", "USD/JPY", "GBP/USD", "USD/CHF", "USD/CAD", "AUD/USD", "NZD/USD",
];

/// Errors arising from market data retrieval and volatility estimation.
#[derive(Debug, Error)]
pub enum MarketDataError {
    #[error("failed to read rate history {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("malformed rate history CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("rate history header: {0}")]
    Header(#[from] CurrencyError),
    #[error("row {row}: invalid date '{value}', expected YYYY-MM-DD")]
    InvalidDate { row: usize, value: String },
    #[error("none of the requested currency pairs has market data")]
    EmptyBasis,
    #[error("need at least 2 aligned return observations to estimate volatility, got {observations}")]
    InsufficientHistory { observations: usize },
    #[error(transparent)]
    Model(#[from] RiskModelError),
}

/// Whether a quoted spot rate is usable. Zero, negative and non-finite
/// quotes are treated as missing observations.
pub fn is_valid_rate(rate: f64) -> bool {
    rate.is_finite() && rate > 0.0
}

/// Closing spot rates indexed by trading date (ascending) and currency pair.
///
/// Every row holds one slot per known pair; a slot is `None` when the pair
/// has no valid observation on that date.
///
/// # Examples
///
/// ```
/// use fx_pfe_engine::core::currency::CurrencyPair;
/// use fx_pfe_engine::market::rate_history::RateHistory;
/// use chrono::NaiveDate;
///
/// let eurusd = CurrencyPair::new("EUR", "USD");
/// let day = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
///
/// let mut history = RateHistory::new();
/// history.insert(day, &eurusd, 1.0672);
/// history.insert(day.succ_opt().unwrap(), &eurusd, 0.0); // invalid, kept as missing
///
/// assert_eq!(history.rate_on(&eurusd, day), Some(1.0672));
/// assert_eq!(history.rate_on(&eurusd, day.succ_opt().unwrap()), None);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RateHistory {
    pairs: Vec<CurrencyPair>,
    rows: BTreeMap<NaiveDate, Vec<Option<f64>>>,
}

impl RateHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a closing rate. Invalid rates are stored as missing so they
    /// never enter the return series as a numeric zero.
    pub fn insert(&mut self, date: NaiveDate, pair: &CurrencyPair, rate: f64) {
        let idx = self.pair_index_or_insert(pair);
        let width = self.pairs.len();
        let row = self.rows.entry(date).or_insert_with(|| vec![None; width]);
        if is_valid_rate(rate) {
            row[idx] = Some(rate);
        } else {
            debug!("ignoring invalid {} rate {} on {}", pair, rate, date);
            row[idx] = None;
        }
    }

    fn pair_index_or_insert(&mut self, pair: &CurrencyPair) -> usize {
        if let Some(idx) = self.pair_index(pair) {
            return idx;
        }
        self.pairs.push(pair.clone());
        for row in self.rows.values_mut() {
            row.push(None);
        }
        self.pairs.len() - 1
    }

    fn pair_index(&self, pair: &CurrencyPair) -> Option<usize> {
        self.pairs.iter().position(|p| p == pair)
    }

    /// Column labels in insertion order.
    pub fn pairs(&self) -> &[CurrencyPair] {
        &self.pairs
    }

    /// Observation dates, ascending.
    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.rows.keys().copied()
    }

    /// Number of dated rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The rate of `pair` observed on exactly `date`, if valid.
    pub fn rate_on(&self, pair: &CurrencyPair, date: NaiveDate) -> Option<f64> {
        let idx = self.pair_index(pair)?;
        self.rows.get(&date).and_then(|row| row[idx])
    }

    /// The full date-ordered series for one pair.
    pub fn series(&self, pair: &CurrencyPair) -> Option<Vec<Option<f64>>> {
        let idx = self.pair_index(pair)?;
        Some(self.rows.values().map(|row| row[idx]).collect())
    }

    /// Pairs holding at least one valid observation, in column order.
    pub fn observed_pairs(&self) -> Vec<CurrencyPair> {
        self.pairs
            .iter()
            .enumerate()
            .filter(|(idx, _)| self.rows.values().any(|row| row[*idx].is_some()))
            .map(|(_, pair)| pair.clone())
            .collect()
    }

    /// Restrict the table to `pairs` (in the given order) and to dates in
    /// `[start, end]`. Requested pairs with no column are dropped.
    pub fn select(&self, pairs: &[CurrencyPair], start: NaiveDate, end: NaiveDate) -> Self {
        let columns: Vec<(usize, CurrencyPair)> = pairs
            .iter()
            .filter_map(|pair| self.pair_index(pair).map(|idx| (idx, pair.clone())))
            .collect();
        let rows = self
            .rows
            .range(start..=end)
            .map(|(date, row)| (*date, columns.iter().map(|(idx, _)| row[*idx]).collect()))
            .collect();
        Self {
            pairs: columns.into_iter().map(|(_, pair)| pair).collect(),
            rows,
        }
    }

    /// Parse a wide CSV table: a date column followed by one column per
    /// `BASE/QUOTE` pair. Blank, zero, `NaN` and unparsable cells are
    /// treated as missing.
    pub fn from_csv_reader<R: io::Read>(reader: R) -> Result<Self, MarketDataError> {
        let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let pairs: Vec<CurrencyPair> = rdr
            .headers()?
            .iter()
            .skip(1)
            .map(str::parse)
            .collect::<Result<_, _>>()?;

        let mut history = Self::new();
        for pair in &pairs {
            history.pair_index_or_insert(pair);
        }

        for (row, record) in rdr.records().enumerate() {
            let record = record?;
            let date_str = record.get(0).unwrap_or_default();
            let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d").map_err(|_| {
                MarketDataError::InvalidDate {
                    row: row + 1,
                    value: date_str.to_string(),
                }
            })?;
            for (pair, cell) in pairs.iter().zip(record.iter().skip(1)) {
                if cell.is_empty() {
                    history.insert(date, pair, f64::NAN);
                    continue;
                }
                match cell.parse::<f64>() {
                    Ok(rate) => history.insert(date, pair, rate),
                    Err(_) => {
                        warn!("row {}: unparsable {} rate '{}', treated as missing", row + 1, pair, cell);
                        history.insert(date, pair, f64::NAN);
                    }
                }
            }
        }
        Ok(history)
    }

    pub fn from_csv_path(path: impl AsRef<Path>) -> Result<Self, MarketDataError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| MarketDataError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_csv_reader(file)
    }
}

/// A supplier of historical closing rates.
pub trait RateSource {
    /// Fetch closing rates for `pairs` between `start` and `end` inclusive.
    ///
    /// Pairs the source knows nothing about are left out of the returned
    /// table rather than reported as an error.
    fn fetch(
        &self,
        pairs: &[CurrencyPair],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<RateHistory, MarketDataError>;
}

/// A [`RateSource`] backed by a wide CSV file on disk.
#[derive(Debug, Clone)]
pub struct CsvRateSource {
    path: PathBuf,
}

impl CsvRateSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl RateSource for CsvRateSource {
    fn fetch(
        &self,
        pairs: &[CurrencyPair],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<RateHistory, MarketDataError> {
        let history = RateHistory::from_csv_path(&self.path)?.select(pairs, start, end);
        let observed = history.observed_pairs();
        for pair in pairs {
            if !observed.contains(pair) {
                warn!("no market data for {} in {}, excluded from basis", pair, self.path.display());
            }
        }
        Ok(history.select(&observed, start, end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    const SAMPLE: &str = "\
Date,EUR/USD,USD/JPY,GBP/USD
2023-01-03,1.0550,131.10,1.2000
2023-01-02,1.0670,130.80,
2023-01-04,0,130.20,NaN
2023-01-05,1.0600,abc,1.2050
";

    #[test]
    fn test_csv_parse_sorts_dates_and_masks_invalid() {
        let history = RateHistory::from_csv_reader(SAMPLE.as_bytes()).unwrap();
        let eurusd = CurrencyPair::new("EUR", "USD");
        let gbpusd = CurrencyPair::new("GBP", "USD");
        let usdjpy = CurrencyPair::new("USD", "JPY");

        assert_eq!(history.len(), 4);
        assert_eq!(history.pairs().len(), 3);
        assert_eq!(history.dates().next(), Some(date(2023, 1, 2)));
        assert_eq!(
            history.series(&eurusd).unwrap(),
            vec![Some(1.0670), Some(1.0550), None, Some(1.0600)]
        );
        assert_eq!(history.rate_on(&gbpusd, date(2023, 1, 2)), None);
        assert_eq!(history.rate_on(&gbpusd, date(2023, 1, 4)), None);
        assert_eq!(history.rate_on(&usdjpy, date(2023, 1, 5)), None);
    }

    #[test]
    fn test_csv_rejects_bad_date() {
        let err = RateHistory::from_csv_reader("Date,EUR/USD\n02/01/2023,1.05\n".as_bytes())
            .unwrap_err();
        assert!(matches!(err, MarketDataError::InvalidDate { row: 1, .. }));
    }

    #[test]
    fn test_csv_rejects_bad_header() {
        let err = RateHistory::from_csv_reader("Date,EURUSD\n2023-01-02,1.05\n".as_bytes())
            .unwrap_err();
        assert!(matches!(err, MarketDataError::Header(_)));
    }

    #[test]
    fn test_negative_rate_is_missing() {
        let mut history = RateHistory::new();
        let pair = CurrencyPair::new("USD", "CHF");
        history.insert(date(2023, 1, 2), &pair, -0.9);
        assert_eq!(history.rate_on(&pair, date(2023, 1, 2)), None);
        assert!(history.observed_pairs().is_empty());
    }

    #[test]
    fn test_select_window_and_pairs() {
        let history = RateHistory::from_csv_reader(SAMPLE.as_bytes()).unwrap();
        let wanted = vec![CurrencyPair::new("GBP", "USD"), CurrencyPair::new("NZD", "USD")];
        let window = history.select(&wanted, date(2023, 1, 3), date(2023, 1, 4));

        assert_eq!(window.pairs(), &[CurrencyPair::new("GBP", "USD")]);
        assert_eq!(window.len(), 2);
    }

    #[test]
    fn test_late_pair_backfills_missing_slots() {
        let mut history = RateHistory::new();
        let eurusd = CurrencyPair::new("EUR", "USD");
        let audusd = CurrencyPair::new("AUD", "USD");
        history.insert(date(2023, 1, 2), &eurusd, 1.07);
        history.insert(date(2023, 1, 3), &audusd, 0.68);

        assert_eq!(history.series(&audusd).unwrap(), vec![None, Some(0.68)]);
        assert_eq!(history.series(&eurusd).unwrap(), vec![Some(1.07), None]);
    }

    #[test]
    fn test_csv_source_excludes_unknown_pairs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rates.csv");
        std::fs::write(&path, SAMPLE).unwrap();

        let source = CsvRateSource::new(&path);
        let pairs = vec![
            CurrencyPair::new("EUR", "USD"),
            CurrencyPair::new("NZD", "USD"),
        ];
        let history = source
            .fetch(&pairs, date(2023, 1, 1), date(2023, 12, 31))
            .unwrap();
        assert_eq!(history.pairs(), &[CurrencyPair::new("EUR", "USD")]);
        assert_eq!(history.len(), 4);
    }
}
