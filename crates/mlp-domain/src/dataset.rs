//! Tablas numéricas y dataset etiquetado.

use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

/// Nombre de la columna de etiqueta en el dataset crudo.
pub const LABEL_COLUMN: &str = "target";

/// Tabla densa de `f64` con nombres de columna. Filas de ancho uniforme.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<f64>>,
}

impl Table {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<f64>>) -> Result<Self, DomainError> {
        if let Some((i, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != columns.len()) {
            return Err(DomainError::Schema(format!("row {i} has {} cells, header has {} columns",
                                                   row.len(),
                                                   columns.len())));
        }
        Ok(Self { columns, rows })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Sub-tabla con las filas indicadas, en ese orden.
    pub fn select_rows(&self, indices: &[usize]) -> Self {
        Self { columns: self.columns.clone(),
               rows: indices.iter().filter_map(|&i| self.rows.get(i).cloned()).collect() }
    }

    /// Copia con filas reemplazadas (mismas columnas).
    pub(crate) fn with_rows(&self, rows: Vec<Vec<f64>>) -> Self {
        Self { columns: self.columns.clone(),
               rows }
    }
}

/// Features + etiqueta binaria alineadas por fila.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledDataset {
    pub features: Table,
    pub labels: Vec<u8>,
}

impl LabeledDataset {
    pub fn new(features: Table, labels: Vec<u8>) -> Result<Self, DomainError> {
        if features.n_rows() != labels.len() {
            return Err(DomainError::Schema(format!("{} feature rows but {} labels",
                                                   features.n_rows(),
                                                   labels.len())));
        }
        if let Some(bad) = labels.iter().find(|&&l| l > 1) {
            return Err(DomainError::Schema(format!("label {bad} is not binary")));
        }
        Ok(Self { features, labels })
    }

    /// Separa la columna `label` del resto. Falla si falta, si hay valores
    /// distintos de 0/1 o si la tabla no tiene filas.
    pub fn from_table(table: &Table, label: &str) -> Result<Self, DomainError> {
        let idx = table.column_index(label)
                       .ok_or_else(|| DomainError::Schema(format!("label column '{label}' not found")))?;
        if table.n_rows() == 0 {
            return Err(DomainError::Schema("dataset has no rows".into()));
        }
        if table.n_cols() < 2 {
            return Err(DomainError::Schema("dataset has no feature columns".into()));
        }
        let columns: Vec<String> = table.columns()
                                        .iter()
                                        .enumerate()
                                        .filter(|(i, _)| *i != idx)
                                        .map(|(_, c)| c.clone())
                                        .collect();
        let mut rows = Vec::with_capacity(table.n_rows());
        let mut labels = Vec::with_capacity(table.n_rows());
        for (r, row) in table.rows().iter().enumerate() {
            labels.push(binary_label(row[idx], r)?);
            rows.push(row.iter()
                         .enumerate()
                         .filter(|(i, _)| *i != idx)
                         .map(|(_, v)| *v)
                         .collect());
        }
        Ok(Self { features: Table::new(columns, rows)?,
                  labels })
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn n_features(&self) -> usize {
        self.features.n_cols()
    }

    /// Tabla completa con la etiqueta como última columna.
    pub fn to_table(&self) -> Table {
        let mut columns = self.features.columns().to_vec();
        columns.push(LABEL_COLUMN.to_string());
        let rows = self.features
                       .rows()
                       .iter()
                       .zip(&self.labels)
                       .map(|(r, &l)| {
                           let mut row = r.clone();
                           row.push(f64::from(l));
                           row
                       })
                       .collect();
        Table { columns, rows }
    }

    pub fn select(&self, indices: &[usize]) -> Self {
        Self { features: self.features.select_rows(indices),
               labels: indices.iter().filter_map(|&i| self.labels.get(i).copied()).collect() }
    }
}

/// Tabla de una columna `target` con las etiquetas.
pub fn labels_table(labels: &[u8]) -> Table {
    Table { columns: vec![LABEL_COLUMN.to_string()],
            rows: labels.iter().map(|&l| vec![f64::from(l)]).collect() }
}

/// Etiquetas desde una tabla de una sola columna.
pub fn labels_from_table(table: &Table) -> Result<Vec<u8>, DomainError> {
    if table.n_cols() != 1 {
        return Err(DomainError::Schema(format!("label table must have one column, found {}", table.n_cols())));
    }
    table.rows().iter().enumerate().map(|(r, row)| binary_label(row[0], r)).collect()
}

fn binary_label(v: f64, row: usize) -> Result<u8, DomainError> {
    if v == 0.0 {
        Ok(0)
    } else if v == 1.0 {
        Ok(1)
    } else {
        Err(DomainError::Schema(format!("row {row}: label {v} is not binary (0/1)")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(cols: &[&str], rows: Vec<Vec<f64>>) -> Table {
        Table::new(cols.iter().map(|c| c.to_string()).collect(), rows).unwrap()
    }

    #[test]
    fn label_column_is_split_off() {
        let t = table(&["a", "target", "b"], vec![vec![1.0, 0.0, 2.0], vec![3.0, 1.0, 4.0]]);
        let ds = LabeledDataset::from_table(&t, LABEL_COLUMN).unwrap();
        assert_eq!(ds.features.columns(), &["a".to_string(), "b".to_string()]);
        assert_eq!(ds.features.rows()[1], vec![3.0, 4.0]);
        assert_eq!(ds.labels, vec![0, 1]);
    }

    #[test]
    fn missing_label_is_schema_error() {
        let t = table(&["a", "b"], vec![vec![1.0, 2.0]]);
        assert!(matches!(LabeledDataset::from_table(&t, LABEL_COLUMN), Err(DomainError::Schema(_))));
    }

    #[test]
    fn non_binary_label_is_schema_error() {
        let t = table(&["a", "target"], vec![vec![1.0, 2.0]]);
        assert!(matches!(LabeledDataset::from_table(&t, LABEL_COLUMN), Err(DomainError::Schema(_))));
    }

    #[test]
    fn ragged_rows_are_rejected() {
        assert!(Table::new(vec!["a".into(), "b".into()], vec![vec![1.0]]).is_err());
    }
}
