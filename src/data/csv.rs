//! CSV format dataset implementation
//!
//! Supports loading datasets from CSV files where:
//! - The last column is the integer class label
//! - All other columns are features
//! - First row can be headers (automatically detected)
//! - Blank lines and lines starting with `#` are skipped

use crate::core::{ClassLabel, Dataset, Result, SVMError};
use crate::data::DenseDataset;
use ndarray::{Array2, ArrayView2};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Dense dataset loaded from a CSV file
#[derive(Debug, Clone)]
pub struct CSVDataset {
    features: Array2<f64>,
    labels: Vec<ClassLabel>,
}

impl CSVDataset {
    /// Load a labelled dataset from a CSV file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path).map_err(SVMError::IoError)?;
        Self::from_reader(BufReader::new(file))
    }

    /// Load a labelled dataset, detecting a header row
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        Self::from_reader_with_options(reader, true)
    }

    /// Load a labelled dataset with explicit header detection option
    pub fn from_reader_with_options<R: BufRead>(reader: R, auto_detect_header: bool) -> Result<Self> {
        let rows = read_rows(reader, auto_detect_header, true)?;
        let mut labels = Vec::with_capacity(rows.len());
        let mut features = Vec::with_capacity(rows.len());
        for (line_no, mut fields) in rows {
            let label = fields.pop().unwrap_or_default();
            labels.push(parse_label(&label, line_no)?);
            features.push(parse_features(&fields, line_no)?);
        }
        Ok(Self {
            features: stack_rows(features)?,
            labels,
        })
    }

    /// Load an unlabeled feature matrix; every column is a feature
    pub fn features_from_file<P: AsRef<Path>>(path: P) -> Result<Array2<f64>> {
        let file = File::open(path).map_err(SVMError::IoError)?;
        Self::features_from_reader(BufReader::new(file))
    }

    pub fn features_from_reader<R: BufRead>(reader: R) -> Result<Array2<f64>> {
        let rows = read_rows(reader, true, false)?;
        let features = rows
            .iter()
            .map(|(line_no, fields)| parse_features(fields, *line_no))
            .collect::<Result<Vec<_>>>()?;
        stack_rows(features)
    }

    /// Convert into an owned dense dataset
    pub fn into_dense(self) -> DenseDataset {
        DenseDataset::from_parts_unchecked(self.features, self.labels)
    }

    /// Check if a line appears to be a header
    fn is_header_line(line: &str, labelled: bool) -> bool {
        let fields: Vec<&str> = line.split(',').collect();
        let feature_count = if labelled {
            fields.len().saturating_sub(1)
        } else {
            fields.len()
        };
        if feature_count == 0 {
            return false;
        }

        let non_numeric_count = fields
            .iter()
            .take(feature_count)
            .filter(|field| field.trim().parse::<f64>().is_err())
            .count();

        non_numeric_count * 2 > feature_count
    }
}

impl Dataset for CSVDataset {
    fn features(&self) -> ArrayView2<'_, f64> {
        self.features.view()
    }

    fn labels(&self) -> &[ClassLabel] {
        &self.labels
    }
}

/// Non-empty, non-comment lines split into trimmed fields, with line numbers
fn read_rows<R: BufRead>(
    reader: R,
    auto_detect_header: bool,
    labelled: bool,
) -> Result<Vec<(usize, Vec<String>)>> {
    let min_fields = if labelled { 2 } else { 1 };
    let mut rows = Vec::new();
    let mut seen_data = false;

    for (i, line) in reader.lines().enumerate() {
        let line = line.map_err(SVMError::IoError)?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if !seen_data {
            seen_data = true;
            if auto_detect_header && CSVDataset::is_header_line(line, labelled) {
                continue;
            }
        }

        let fields: Vec<String> = line.split(',').map(|f| f.trim().to_string()).collect();
        if fields.len() < min_fields {
            return Err(SVMError::ParseError(format!(
                "Line {} has too few fields: {line}",
                i + 1
            )));
        }
        rows.push((i + 1, fields));
    }

    if rows.is_empty() {
        return Err(SVMError::EmptyDataset);
    }
    Ok(rows)
}

fn parse_label(field: &str, line_no: usize) -> Result<ClassLabel> {
    if let Ok(label) = field.parse::<ClassLabel>() {
        return Ok(label);
    }
    // Accept integral floats such as "2.0"
    match field.parse::<f64>() {
        Ok(value) if value.fract() == 0.0 && value.abs() < i64::MAX as f64 => Ok(value as ClassLabel),
        _ => Err(SVMError::ParseError(format!(
            "Invalid label on line {line_no}: {field}"
        ))),
    }
}

fn parse_features(fields: &[String], line_no: usize) -> Result<Vec<f64>> {
    fields
        .iter()
        .enumerate()
        .map(|(col, field)| {
            field.parse::<f64>().map_err(|_| {
                SVMError::ParseError(format!(
                    "Invalid feature value on line {line_no}, column {}: {field}",
                    col + 1
                ))
            })
        })
        .collect()
}

fn stack_rows(rows: Vec<Vec<f64>>) -> Result<Array2<f64>> {
    let n = rows.len();
    let d = rows.first().map_or(0, Vec::len);
    if let Some((i, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != d) {
        return Err(SVMError::ParseError(format!(
            "Row {} has {} features, expected {d}",
            i + 1,
            row.len()
        )));
    }
    let flat: Vec<f64> = rows.into_iter().flatten().collect();
    Array2::from_shape_vec((n, d), flat).map_err(|e| SVMError::ParseError(e.to_string()))
}
