//! Read-only donation drive table used by the exploratory view.
//!
//! The export is Latin-1 encoded unless it starts with a UTF-8 byte order
//! mark. Columns are renamed to the report's vocabulary on load.

use crate::domain::model::DonationRecord;
use crate::domain::ports::Storage;
use crate::utils::error::{ReportError, Result};
use chrono::NaiveDateTime;
use csv::{ReaderBuilder, StringRecord, Trim};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::OnceCell;

pub const COL_TIMESTAMP: &str = "Timestamp";
pub const COL_LOCATION: &str = "Drop Off Location";
pub const COL_CITY: &str = "City";
pub const COL_STAKE: &str = "Stake";
pub const COL_ROUTE: &str = "Route Number/Name";
pub const COL_ADULTS: &str = "# of Adult Volunteers in this route";
pub const COL_YOUTH: &str = "# of Youth Volunteers in this route";
pub const COL_BAGS: &str = "# of Donation Bags Collected/Route";
pub const COL_TIME_SPENT: &str = "Time Spent Collecting Donations";
pub const COL_MORE_THAN_ONE: &str = "Did you complete more than 1 route?";
pub const COL_ROUTES_COMPLETED: &str = "Number of routes completed";
pub const COL_DOORS: &str = "# of Doors in Route";

/// Columns the charts cannot do without.
const REQUIRED_COLUMNS: [&str; 4] = [COL_ADULTS, COL_YOUTH, COL_BAGS, COL_TIME_SPENT];

const TIMESTAMP_FORMATS: [&str; 4] = [
    "%m/%d/%Y %H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y/%m/%d %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    Latin1,
    Utf8,
}

impl TextEncoding {
    pub fn parse(name: &str) -> Result<Self> {
        match name.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "latin1" | "latin-1" | "iso-8859-1" => Ok(TextEncoding::Latin1),
            "utf8" | "utf-8" => Ok(TextEncoding::Utf8),
            other => Err(ReportError::InvalidConfigValueError {
                field: "dataset.encoding".to_string(),
                value: other.to_string(),
                reason: "Supported encodings: latin1, utf-8".to_string(),
            }),
        }
    }

    pub fn decode(self, bytes: &[u8]) -> Result<String> {
        const BOM: &[u8] = b"\xEF\xBB\xBF";
        if let Some(rest) = bytes.strip_prefix(BOM) {
            return String::from_utf8(rest.to_vec()).map_err(|e| ReportError::DatasetError {
                message: format!("file has a UTF-8 BOM but invalid UTF-8: {}", e),
            });
        }
        match self {
            // Every Latin-1 byte maps to the code point of the same value.
            TextEncoding::Latin1 => Ok(bytes.iter().map(|&b| b as char).collect()),
            TextEncoding::Utf8 => {
                String::from_utf8(bytes.to_vec()).map_err(|e| ReportError::DatasetError {
                    message: format!("dataset is not valid UTF-8: {}", e),
                })
            }
        }
    }
}

/// Numeric columns that can be charted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetColumn {
    AdultVolunteers,
    YouthVolunteers,
    DonationBagsCollected,
    TimeToComplete,
    RoutesCompleted,
    DoorsInRoute,
}

impl DatasetColumn {
    /// Columns the exploratory view charts, in display order.
    pub const EXPLORED: [DatasetColumn; 4] = [
        DatasetColumn::AdultVolunteers,
        DatasetColumn::YouthVolunteers,
        DatasetColumn::DonationBagsCollected,
        DatasetColumn::TimeToComplete,
    ];

    pub fn label(self) -> &'static str {
        match self {
            DatasetColumn::AdultVolunteers => "Adult Volunteers",
            DatasetColumn::YouthVolunteers => "Youth Volunteers",
            DatasetColumn::DonationBagsCollected => "Donation Bags Collected",
            DatasetColumn::TimeToComplete => "Time to Complete",
            DatasetColumn::RoutesCompleted => "Routes Completed",
            DatasetColumn::DoorsInRoute => "Doors in Route",
        }
    }

    fn value(self, record: &DonationRecord) -> Option<f64> {
        match self {
            DatasetColumn::AdultVolunteers => record.adult_volunteers,
            DatasetColumn::YouthVolunteers => record.youth_volunteers,
            DatasetColumn::DonationBagsCollected => record.donation_bags_collected,
            DatasetColumn::TimeToComplete => record.time_to_complete_minutes,
            DatasetColumn::RoutesCompleted => record.routes_completed,
            DatasetColumn::DoorsInRoute => record.doors_in_route,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DonationTable {
    records: Vec<DonationRecord>,
}

fn parse_number(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    raw.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "yes" | "y" | "true" | "1" => Some(true),
        "no" | "n" | "false" | "0" => Some(false),
        _ => None,
    }
}

fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
}

impl DonationTable {
    pub fn new(records: Vec<DonationRecord>) -> Self {
        Self { records }
    }

    pub fn from_csv_str(content: &str) -> Result<Self> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(content.as_bytes());

        let headers = reader.headers()?.clone();
        let index: HashMap<&str, usize> = headers
            .iter()
            .enumerate()
            .map(|(i, name)| (name, i))
            .collect();

        let missing: Vec<&str> = REQUIRED_COLUMNS
            .iter()
            .copied()
            .filter(|c| !index.contains_key(c))
            .collect();
        if !missing.is_empty() {
            return Err(ReportError::DatasetError {
                message: format!("missing columns: {}", missing.join(", ")),
            });
        }

        let cell = |row: &StringRecord, column: &str| -> String {
            index
                .get(column)
                .and_then(|&i| row.get(i))
                .unwrap_or("")
                .to_string()
        };

        let mut records = Vec::new();
        for row in reader.records() {
            let row = row?;
            if row.iter().all(|c| c.is_empty()) {
                continue;
            }
            records.push(DonationRecord {
                date: parse_timestamp(&cell(&row, COL_TIMESTAMP)),
                location: cell(&row, COL_LOCATION),
                city: cell(&row, COL_CITY),
                stake: cell(&row, COL_STAKE),
                route: cell(&row, COL_ROUTE),
                adult_volunteers: parse_number(&cell(&row, COL_ADULTS)),
                youth_volunteers: parse_number(&cell(&row, COL_YOUTH)),
                donation_bags_collected: parse_number(&cell(&row, COL_BAGS)),
                time_to_complete_minutes: parse_number(&cell(&row, COL_TIME_SPENT)),
                completed_more_than_one_route: parse_flag(&cell(&row, COL_MORE_THAN_ONE)),
                routes_completed: parse_number(&cell(&row, COL_ROUTES_COMPLETED)),
                doors_in_route: parse_number(&cell(&row, COL_DOORS)),
            });
        }

        Ok(Self { records })
    }

    pub fn records(&self) -> &[DonationRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Non-missing values of one column, in row order.
    pub fn column(&self, column: DatasetColumn) -> Vec<f64> {
        self.records.iter().filter_map(|r| column.value(r)).collect()
    }

    pub fn date_range(&self) -> Option<(NaiveDateTime, NaiveDateTime)> {
        let mut dates = self.records.iter().filter_map(|r| r.date);
        let first = dates.next()?;
        Some(dates.fold((first, first), |(lo, hi), d| (lo.min(d), hi.max(d))))
    }
}

/// Lazily loaded, shared, read-only dataset.
///
/// The file is read on the first call to [`DatasetHandle::init`]; concurrent
/// first callers wait on the same load.
/// A failed load leaves the handle uninitialized.
pub struct DatasetHandle<S: Storage> {
    storage: S,
    path: String,
    encoding: TextEncoding,
    table: OnceCell<Arc<DonationTable>>,
}

impl<S: Storage> DatasetHandle<S> {
    pub fn new(storage: S, path: impl Into<String>, encoding: TextEncoding) -> Self {
        Self {
            storage,
            path: path.into(),
            encoding,
            table: OnceCell::new(),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn is_loaded(&self) -> bool {
        self.table.initialized()
    }

    pub async fn init(&self) -> Result<Arc<DonationTable>> {
        let table = self
            .table
            .get_or_try_init(|| async {
                tracing::info!("Loading dataset from {}", self.path);
                let bytes = self.storage.read_file(&self.path).await?;
                let text = self.encoding.decode(&bytes)?;
                let table = DonationTable::from_csv_str(&text)?;
                tracing::info!("Loaded {} donation records", table.len());
                Ok::<_, ReportError>(Arc::new(table))
            })
            .await?;
        Ok(table.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "\
Timestamp,Drop Off Location,City,Stake,Route Number/Name,# of Adult Volunteers in this route,# of Youth Volunteers in this route,# of Donation Bags Collected/Route,Time Spent Collecting Donations,Did you complete more than 1 route?,Number of routes completed,# of Doors in Route
9/21/2024 10:15:00,Gateway Stake Centre,Edmonton,Gateway,Route 1,3,2,25,60,No,1,120
9/21/2024 11:40:00,Riverbend Chapel,Edmonton,Riverbend,Route 7,,4,40,90,Yes,2,210
";

    #[test]
    fn test_parse_and_rename_columns() {
        let table = DonationTable::from_csv_str(CSV).unwrap();
        assert_eq!(table.len(), 2);

        let first = &table.records()[0];
        assert_eq!(first.location, "Gateway Stake Centre");
        assert_eq!(first.route, "Route 1");
        assert_eq!(first.donation_bags_collected, Some(25.0));
        assert_eq!(first.completed_more_than_one_route, Some(false));

        assert_eq!(table.column(DatasetColumn::AdultVolunteers), vec![3.0]);
        assert_eq!(table.column(DatasetColumn::TimeToComplete), vec![60.0, 90.0]);

        let (lo, hi) = table.date_range().unwrap();
        assert!(lo < hi);
    }

    #[test]
    fn test_missing_required_column() {
        let err = DonationTable::from_csv_str("Timestamp,City\n1/1/2024 00:00:00,Edmonton\n")
            .unwrap_err();
        assert!(err.to_string().contains(COL_ADULTS));
    }

    #[test]
    fn test_latin1_decoding() {
        let bytes = b"Caf\xE9";
        assert_eq!(TextEncoding::Latin1.decode(bytes).unwrap(), "Café");
        assert!(TextEncoding::Utf8.decode(bytes).is_err());

        let with_bom = b"\xEF\xBB\xBFCaf\xC3\xA9";
        assert_eq!(TextEncoding::Latin1.decode(with_bom).unwrap(), "Café");
    }

    #[test]
    fn test_encoding_names() {
        assert_eq!(TextEncoding::parse("latin1").unwrap(), TextEncoding::Latin1);
        assert_eq!(TextEncoding::parse("ISO-8859-1").unwrap(), TextEncoding::Latin1);
        assert_eq!(TextEncoding::parse("UTF_8").unwrap(), TextEncoding::Utf8);
        assert!(TextEncoding::parse("cp1252").is_err());
    }
}
