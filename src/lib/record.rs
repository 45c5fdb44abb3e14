use crate::error::{EngineError, IngestionError};
use crate::filter::TrialSet;
use crate::{arm::Arm, weekday::Weekday};
use ahash::AHashMap as HashMap;
use atoi::FromRadix10Checked;
use csv::{ByteRecord, ReaderBuilder};
use log::{debug, info, warn};
use serde::Serialize;
use std::fs::File;
use std::io::Read as IoRead;
use std::path::Path;
use strum::IntoEnumIterator;
use strum_macros::EnumIter;

/// Columns of the marketing export that the engine consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
pub enum TrialField {
    Arm,
    Converted,
    Day,
    Hour,
    TotalAds,
}

impl TrialField {
    pub fn column_name(&self) -> &'static str {
        match self {
            TrialField::Arm => "test group",
            TrialField::Converted => "converted",
            TrialField::Day => "most ads day",
            TrialField::Hour => "most ads hour",
            TrialField::TotalAds => "total ads",
        }
    }
}

#[derive(Debug, Clone)]
pub struct FieldMapping {
    pub mapping: HashMap<TrialField, usize>,
}

impl FieldMapping {
    pub fn new() -> Self {
        Self {
            mapping: HashMap::new(),
        }
    }

    pub fn with_field(mut self, field: TrialField, idx: usize) -> Self {
        self.mapping.insert(field, idx);
        self
    }

    pub fn idx(&self, field: TrialField) -> Option<usize> {
        self.mapping.get(&field).copied()
    }

    /// Locate every required column by header name. Extra columns are ignored.
    pub fn from_headers(headers: &ByteRecord) -> Result<Self, IngestionError> {
        let names: Vec<String> = headers
            .iter()
            .map(|h| {
                String::from_utf8_lossy(h)
                    .trim_start_matches('\u{feff}')
                    .trim()
                    .to_ascii_lowercase()
            })
            .collect();
        let mut mapping = Self::new();
        for field in TrialField::iter() {
            let idx = names
                .iter()
                .position(|name| name == field.column_name())
                .ok_or(IngestionError::MissingColumn(field.column_name()))?;
            mapping = mapping.with_field(field, idx);
        }
        Ok(mapping)
    }
}

/// One user's exposure and outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TrialRecord {
    pub arm: Arm,
    pub day: Weekday,
    pub hour: u8,
    pub converted: bool,
    pub ad_exposures: u32,
}

impl TrialRecord {
    pub fn new(arm: Arm, day: Weekday, hour: u8, converted: bool, ad_exposures: u32) -> Self {
        Self {
            arm,
            day,
            hour,
            converted,
            ad_exposures,
        }
    }
}

fn parse_uint<T: FromRadix10Checked>(field: &[u8]) -> Option<T> {
    let field = field.trim_ascii();
    if field.is_empty() {
        return None;
    }
    match T::from_radix_10_checked(field) {
        (Some(n), used) if used == field.len() => Some(n),
        _ => None,
    }
}

fn parse_converted(field: &[u8]) -> Option<bool> {
    let field = field.trim_ascii();
    if field.eq_ignore_ascii_case(b"true") {
        Some(true)
    } else if field.eq_ignore_ascii_case(b"false") {
        Some(false)
    } else {
        None
    }
}

fn get_field<'a>(
    record: &'a ByteRecord,
    mapping: &FieldMapping,
    field: TrialField,
    row: u64,
) -> Result<&'a [u8], EngineError> {
    mapping
        .idx(field)
        .and_then(|idx| record.get(idx))
        .ok_or_else(|| EngineError::MalformedRecord {
            row,
            reason: format!("missing '{}'", field.column_name()),
        })
}

pub fn parse_trial_record(
    record: &ByteRecord,
    row: u64,
    mapping: &FieldMapping,
) -> Result<TrialRecord, EngineError> {
    let malformed = |reason: String| EngineError::MalformedRecord { row, reason };

    let arm = String::from_utf8_lossy(get_field(record, mapping, TrialField::Arm, row)?)
        .parse::<Arm>()
        .map_err(|e| malformed(e.to_string()))?;

    let converted_field = get_field(record, mapping, TrialField::Converted, row)?;
    let converted = parse_converted(converted_field).ok_or_else(|| {
        malformed(format!(
            "could not parse converted value '{}'",
            String::from_utf8_lossy(converted_field)
        ))
    })?;

    let day = String::from_utf8_lossy(get_field(record, mapping, TrialField::Day, row)?)
        .parse::<Weekday>()
        .map_err(|e| malformed(e.to_string()))?;

    let hour = parse_uint::<u8>(get_field(record, mapping, TrialField::Hour, row)?)
        .filter(|h| *h < 24)
        .ok_or_else(|| malformed("invalid most ads hour".to_string()))?;

    let ad_exposures = parse_uint::<u32>(get_field(record, mapping, TrialField::TotalAds, row)?)
        .ok_or_else(|| malformed("invalid total ads".to_string()))?;

    Ok(TrialRecord {
        arm,
        day,
        hour,
        converted,
        ad_exposures,
    })
}

/// Records accepted from a load, plus the number of rows that were dropped.
#[derive(Debug, Clone)]
pub struct IngestionReport {
    pub records: TrialSet,
    pub n_skipped: usize,
}

pub struct TrialRecordReader<R: IoRead> {
    reader: csv::Reader<R>,
    mapping: FieldMapping,
    row: u64,
    pub n_skipped: usize,
}

impl<R: IoRead> TrialRecordReader<R> {
    pub fn new(inner: R) -> Result<Self, IngestionError> {
        let mut reader = ReaderBuilder::new()
            .delimiter(b',')
            .has_headers(true)
            .flexible(true)
            .from_reader(inner);
        let mapping = FieldMapping::from_headers(reader.byte_headers()?)?;
        Ok(Self {
            reader,
            mapping,
            row: 0,
            n_skipped: 0,
        })
    }

    /// Next well-formed record; malformed rows are logged and skipped.
    pub fn next_record(&mut self) -> Result<Option<TrialRecord>, IngestionError> {
        let mut record = ByteRecord::new();
        while self.reader.read_byte_record(&mut record)? {
            self.row += 1;
            match parse_trial_record(&record, self.row, &self.mapping) {
                Ok(parsed) => return Ok(Some(parsed)),
                Err(e) => {
                    debug!("{}", e);
                    self.n_skipped += 1;
                }
            }
        }
        Ok(None)
    }

    pub fn read_all(mut self) -> Result<IngestionReport, IngestionError> {
        let mut records = Vec::new();
        while let Some(record) = self.next_record()? {
            records.push(record);
        }
        if self.n_skipped > 0 {
            warn!(
                "Skipped {} malformed rows out of {}",
                self.n_skipped, self.row
            );
        }
        Ok(IngestionReport {
            records: TrialSet::new(records),
            n_skipped: self.n_skipped,
        })
    }
}

pub fn load_trial_records(path: &Path) -> Result<IngestionReport, IngestionError> {
    let file = File::open(path).map_err(|source| IngestionError::Unavailable {
        path: path.display().to_string(),
        source,
    })?;
    let report = TrialRecordReader::new(file)?.read_all()?;
    info!(
        "Loaded {} trial records from {}",
        report.records.len(),
        path.display()
    );
    Ok(report)
}
