//! Codec CSV de tablas: cabecera + filas de `f64`.
//!
//! Los valores se escriben con `Display` de `f64` (representación más corta
//! que recupera el mismo valor), de modo que leer y reescribir una tabla
//! produce exactamente los mismos bytes.

use csv::{ReaderBuilder, WriterBuilder};

use crate::dataset::Table;
use crate::errors::DomainError;

pub fn write_table(table: &Table) -> Result<Vec<u8>, DomainError> {
    let mut wtr = WriterBuilder::new().from_writer(Vec::new());
    wtr.write_record(table.columns())?;
    for row in table.rows() {
        wtr.write_record(row.iter().map(|v| v.to_string()))?;
    }
    wtr.into_inner().map_err(|e| DomainError::Codec(e.to_string()))
}

/// Lee una tabla numérica. Celdas vacías, no numéricas o no finitas son
/// `Schema`.
pub fn read_table(bytes: &[u8]) -> Result<Table, DomainError> {
    let mut rdr = ReaderBuilder::new().has_headers(true).from_reader(bytes);
    let columns: Vec<String> = rdr.headers()?.iter().map(|h| h.trim().to_string()).collect();
    if columns.is_empty() || columns.iter().all(String::is_empty) {
        return Err(DomainError::Schema("missing header row".into()));
    }
    let mut rows = Vec::new();
    for (r, record) in rdr.records().enumerate() {
        let record = record.map_err(|e| DomainError::Schema(format!("row {r}: {e}")))?;
        let row = record.iter()
                        .enumerate()
                        .map(|(c, cell)| parse_cell(cell, r, &columns[c.min(columns.len() - 1)]))
                        .collect::<Result<Vec<f64>, _>>()?;
        rows.push(row);
    }
    Table::new(columns, rows)
}

fn parse_cell(cell: &str, row: usize, column: &str) -> Result<f64, DomainError> {
    let v: f64 = cell.trim()
                     .parse()
                     .map_err(|_| DomainError::Schema(format!("row {row}, column '{column}': '{cell}' is not a number")))?;
    if !v.is_finite() {
        return Err(DomainError::Schema(format!("row {row}, column '{column}': non-finite value")));
    }
    Ok(v)
}
