use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde_json::Value;
use tracing::info;
use unicode_normalization::UnicodeNormalization;

use crate::error::LoadError;
use crate::record::RecordStore;

/// Loads the recipe dataset from a `.csv` or `.json` file.
pub fn load_records(path: impl AsRef<Path>) -> Result<RecordStore, LoadError> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    let rows = match extension.as_deref() {
        Some("csv") => read_csv(path)?,
        Some("json") => read_json(path)?,
        _ => return Err(LoadError::UnsupportedFormat(path.to_path_buf())),
    };

    info!("Loaded {} recipes from {:?}", rows.len(), path);
    Ok(RecordStore::from_rows(rows))
}

fn read_csv(path: &Path) -> Result<Vec<BTreeMap<String, Value>>, LoadError> {
    let csv_err = |source| LoadError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = csv::Reader::from_path(path).map_err(csv_err)?;
    let headers: Vec<String> = reader
        .headers()
        .map_err(csv_err)?
        .iter()
        .map(normalize_field_name)
        .collect();

    let mut rows = Vec::new();
    for row in reader.records() {
        let row = row.map_err(csv_err)?;
        let fields = headers
            .iter()
            .zip(row.iter())
            .map(|(name, cell)| (name.clone(), Value::String(cell.to_string())))
            .collect();
        rows.push(fields);
    }
    Ok(rows)
}

fn read_json(path: &Path) -> Result<Vec<BTreeMap<String, Value>>, LoadError> {
    let file = File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let rows: Vec<BTreeMap<String, Value>> = serde_json::from_reader(BufReader::new(file))
        .map_err(|source| LoadError::Json {
            path: path.to_path_buf(),
            source,
        })?;

    Ok(rows
        .into_iter()
        .map(|row| {
            row.into_iter()
                .map(|(name, value)| (normalize_field_name(&name), value))
                .collect()
        })
        .collect())
}

/// Column names are compared byte-wise, so accented headers are brought to NFC.
fn normalize_field_name(name: &str) -> String {
    name.trim_start_matches('\u{feff}').trim().nfc().collect()
}

/// Parses a `FIELD=WEIGHT` boost argument.
pub fn parse_boost(arg: &str) -> Result<(String, f32), String> {
    let (field, weight) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected FIELD=WEIGHT, got {arg:?}"))?;

    let weight: f32 = weight
        .trim()
        .parse()
        .map_err(|_| format!("invalid boost weight {weight:?}"))?;
    if !weight.is_finite() || weight < 0.0 {
        return Err(format!("boost weight must be a non-negative number, got {weight}"));
    }

    Ok((normalize_field_name(field), weight))
}
