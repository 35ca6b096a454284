// In: src/report.rs

//! The report aggregator.
//!
//! A `Report` is constructed once by the caller, handed to the driver, filled
//! with one `MeasurementRow` per file in processing order, and handed back.
//! Rendering never mutates it. Every rendered row carries exactly one cell per
//! column: the filename followed by the seven pipelines in `Pipeline::ALL`
//! order. A missing measurement is an empty CSV field or a JSON `null`, never 0.

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::config::ReportFormat;
use crate::error::AssetRatioError;
use crate::pipeline::{MeasurementRow, Pipeline};

/// Name of the leading column.
pub const FILENAME_COLUMN: &str = "filename";

/// Ordered table of per-file measurements.
#[derive(Debug, Default)]
pub struct Report {
    rows: Vec<MeasurementRow>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a row. Rows keep insertion order.
    pub fn push(&mut self, row: MeasurementRow) {
        self.rows.push(row);
    }

    pub fn rows(&self) -> &[MeasurementRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// `filename` followed by every pipeline name.
    pub fn header() -> Vec<&'static str> {
        std::iter::once(FILENAME_COLUMN)
            .chain(Pipeline::ALL.iter().map(|p| p.name()))
            .collect()
    }

    /// The rendered cells of one row. Always `header().len()` long.
    pub fn cells(row: &MeasurementRow) -> Vec<String> {
        std::iter::once(row.filename().to_string())
            .chain(
                Pipeline::ALL
                    .iter()
                    .map(|p| row.get(*p).map(|size| size.to_string()).unwrap_or_default()),
            )
            .collect()
    }

    pub fn render(&self, format: ReportFormat) -> Result<String, AssetRatioError> {
        match format {
            ReportFormat::Csv => self.render_csv(),
            ReportFormat::Json => self.render_json(),
        }
    }

    /// Comma-delimited table with a header line; each line ends in `\n`.
    pub fn render_csv(&self) -> Result<String, AssetRatioError> {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(b',')
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(Vec::new());

        writer.write_record(Self::header())?;
        for row in &self.rows {
            writer.write_record(Self::cells(row))?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| AssetRatioError::Report(e.to_string()))?;
        String::from_utf8(bytes).map_err(|e| AssetRatioError::Report(e.to_string()))
    }

    /// Pretty-printed JSON array, one object per file, keys in column order.
    pub fn render_json(&self) -> Result<String, AssetRatioError> {
        let rows: Vec<JsonRow<'_>> = self.rows.iter().map(JsonRow).collect();
        let mut text = serde_json::to_string_pretty(&rows)?;
        text.push('\n');
        Ok(text)
    }
}

struct JsonRow<'a>(&'a MeasurementRow);

impl Serialize for JsonRow<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(Pipeline::ALL.len() + 1))?;
        map.serialize_entry(FILENAME_COLUMN, self.0.filename())?;
        for pipeline in Pipeline::ALL {
            map.serialize_entry(pipeline.name(), &self.0.get(pipeline))?;
        }
        map.end()
    }
}
