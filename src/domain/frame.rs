//! A minimal column-oriented table.
//!
//! Named, row-aligned columns with a handful of cell types. There is no
//! missing-value representation; absent cells must be handled upstream.

use std::cmp::Ordering;
use std::fmt;

use chrono::NaiveDate;

use crate::error::{Result, WeightError};

/// A single typed column.
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    Int(Vec<i64>),
    Float(Vec<f64>),
    Bool(Vec<bool>),
    Str(Vec<String>),
    Date(Vec<NaiveDate>),
}

impl Column {
    pub fn len(&self) -> usize {
        match self {
            Column::Int(v) => v.len(),
            Column::Float(v) => v.len(),
            Column::Bool(v) => v.len(),
            Column::Str(v) => v.len(),
            Column::Date(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Short type label used in error messages.
    pub fn dtype(&self) -> &'static str {
        match self {
            Column::Int(_) => "int",
            Column::Float(_) => "float",
            Column::Bool(_) => "bool",
            Column::Str(_) => "str",
            Column::Date(_) => "date",
        }
    }

    /// Numeric view of a cell (`Int`, `Float` and `Bool` only).
    pub fn as_f64(&self, row: usize) -> Option<f64> {
        match self {
            Column::Int(v) => v.get(row).map(|&x| x as f64),
            Column::Float(v) => v.get(row).copied(),
            Column::Bool(v) => v.get(row).map(|&b| if b { 1.0 } else { 0.0 }),
            Column::Str(_) | Column::Date(_) => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Column::Int(_) | Column::Float(_) | Column::Bool(_))
    }

    /// Whole column as `f64`, or `None` for non-numeric columns.
    pub fn to_f64_vec(&self) -> Option<Vec<f64>> {
        match self {
            Column::Int(v) => Some(v.iter().map(|&x| x as f64).collect()),
            Column::Float(v) => Some(v.clone()),
            Column::Bool(v) => Some(v.iter().map(|&b| if b { 1.0 } else { 0.0 }).collect()),
            Column::Str(_) | Column::Date(_) => None,
        }
    }

    /// Orderable key for one cell.
    ///
    /// # Panics
    /// Panics if `row` is out of bounds.
    pub fn key(&self, row: usize) -> CellKey {
        match self {
            Column::Int(v) => CellKey::Int(v[row]),
            Column::Float(v) => CellKey::Float(v[row]),
            Column::Bool(v) => CellKey::Bool(v[row]),
            Column::Str(v) => CellKey::Str(v[row].clone()),
            Column::Date(v) => CellKey::Date(v[row]),
        }
    }

    /// Gather rows by index (indices may repeat or reorder).
    ///
    /// # Panics
    /// Panics if any index is out of bounds.
    pub fn take(&self, rows: &[usize]) -> Column {
        match self {
            Column::Int(v) => Column::Int(rows.iter().map(|&i| v[i]).collect()),
            Column::Float(v) => Column::Float(rows.iter().map(|&i| v[i]).collect()),
            Column::Bool(v) => Column::Bool(rows.iter().map(|&i| v[i]).collect()),
            Column::Str(v) => Column::Str(rows.iter().map(|&i| v[i].clone()).collect()),
            Column::Date(v) => Column::Date(rows.iter().map(|&i| v[i]).collect()),
        }
    }
}

/// One cell, usable as a grouping / sort key.
///
/// Floats compare with `total_cmp`, so keys are totally ordered even with NaN.
/// Keys of different variants order by variant (bool < int < float < str < date).
#[derive(Debug, Clone)]
pub enum CellKey {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Date(NaiveDate),
}

impl CellKey {
    fn rank(&self) -> u8 {
        match self {
            CellKey::Bool(_) => 0,
            CellKey::Int(_) => 1,
            CellKey::Float(_) => 2,
            CellKey::Str(_) => 3,
            CellKey::Date(_) => 4,
        }
    }
}

impl Ord for CellKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (CellKey::Bool(a), CellKey::Bool(b)) => a.cmp(b),
            (CellKey::Int(a), CellKey::Int(b)) => a.cmp(b),
            (CellKey::Float(a), CellKey::Float(b)) => a.total_cmp(b),
            (CellKey::Str(a), CellKey::Str(b)) => a.cmp(b),
            (CellKey::Date(a), CellKey::Date(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for CellKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for CellKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for CellKey {}

impl fmt::Display for CellKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellKey::Bool(b) => write!(f, "{b}"),
            CellKey::Int(i) => write!(f, "{i}"),
            CellKey::Float(x) => write!(f, "{x}"),
            CellKey::Str(s) => write!(f, "{s}"),
            CellKey::Date(d) => write!(f, "{d}"),
        }
    }
}

/// Ordered set of equally long, named columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frame {
    n_rows: usize,
    columns: Vec<(String, Column)>,
}

impl Frame {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style `insert`.
    pub fn with_column(mut self, name: impl Into<String>, column: Column) -> Result<Self> {
        self.insert(name, column)?;
        Ok(self)
    }

    /// Add a column, or replace an existing one with the same name in place.
    ///
    /// The first column fixes the row count; later columns must match it.
    pub fn insert(&mut self, name: impl Into<String>, column: Column) -> Result<()> {
        let name = name.into();
        if name.is_empty() {
            return Err(WeightError::data("Column names must be non-empty."));
        }

        let only_replacing = self.columns.len() == 1 && self.columns[0].0 == name;
        if !self.columns.is_empty() && !only_replacing && column.len() != self.n_rows {
            return Err(WeightError::data(format!(
                "Column '{name}' has {} rows, table has {}.",
                column.len(),
                self.n_rows
            )));
        }

        self.n_rows = column.len();
        match self.columns.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = column,
            None => self.columns.push((name, column)),
        }
        Ok(())
    }

    pub fn remove(&mut self, name: &str) -> Option<Column> {
        let idx = self.columns.iter().position(|(n, _)| n == name)?;
        let (_, column) = self.columns.remove(idx);
        if self.columns.is_empty() {
            self.n_rows = 0;
        }
        Some(column)
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|(n, _)| n == name).map(|(_, c)| c)
    }

    /// Like `column`, but a missing column is a data error.
    pub fn require(&self, name: &str) -> Result<&Column> {
        self.column(name)
            .ok_or_else(|| WeightError::data(format!("Required column '{name}' is missing.")))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(n, _)| n.as_str())
    }

    pub fn columns(&self) -> impl Iterator<Item = (&str, &Column)> {
        self.columns.iter().map(|(n, c)| (n.as_str(), c))
    }

    /// New frame made of the given rows, in the given order.
    ///
    /// # Panics
    /// Panics if any index is `>= n_rows()`.
    pub fn take_rows(&self, rows: &[usize]) -> Frame {
        Frame {
            n_rows: rows.len(),
            columns: self
                .columns
                .iter()
                .map(|(n, c)| (n.clone(), c.take(rows)))
                .collect(),
        }
    }

    /// Move the named columns to the front (in the given order); the rest keep
    /// their relative order. Names not present are ignored.
    pub fn reorder_columns(mut self, front: &[&str]) -> Frame {
        let mut ordered = Vec::with_capacity(self.columns.len());
        for name in front {
            if let Some(idx) = self.columns.iter().position(|(n, _)| n == name) {
                ordered.push(self.columns.remove(idx));
            }
        }
        ordered.append(&mut self.columns);
        self.columns = ordered;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Frame {
        Frame::new()
            .with_column("vint", Column::Int(vec![202401, 202402, 202403]))
            .unwrap()
            .with_column("bad", Column::Bool(vec![true, false, false]))
            .unwrap()
    }

    #[test]
    fn rejects_misaligned_columns() {
        let err = sample()
            .with_column("ead", Column::Float(vec![1.0, 2.0]))
            .unwrap_err();
        assert!(matches!(err, WeightError::Data(_)));
        assert!(err.to_string().contains("ead"));
    }

    #[test]
    fn insert_replaces_in_place() {
        let mut frame = sample();
        frame.insert("vint", Column::Int(vec![1, 2, 3])).unwrap();
        assert_eq!(frame.column_names().collect::<Vec<_>>(), vec!["vint", "bad"]);
        assert_eq!(frame.column("vint"), Some(&Column::Int(vec![1, 2, 3])));
    }

    #[test]
    fn take_rows_reorders_every_column() {
        let frame = sample().take_rows(&[2, 0]);
        assert_eq!(frame.n_rows(), 2);
        assert_eq!(frame.column("vint"), Some(&Column::Int(vec![202403, 202401])));
        assert_eq!(frame.column("bad"), Some(&Column::Bool(vec![false, true])));
    }

    #[test]
    fn require_reports_missing_column() {
        let err = sample().require("lgd").unwrap_err();
        assert_eq!(err, WeightError::data("Required column 'lgd' is missing."));
    }

    #[test]
    fn reorder_moves_named_columns_first() {
        let frame = sample()
            .with_column("id", Column::Str(vec!["a".into(), "b".into(), "c".into()]))
            .unwrap()
            .reorder_columns(&["id", "missing", "bad"]);
        assert_eq!(frame.column_names().collect::<Vec<_>>(), vec!["id", "bad", "vint"]);
    }

    #[test]
    fn cell_keys_sort_numerically() {
        let col = Column::Int(vec![10, 2, 33]);
        let mut keys: Vec<CellKey> = (0..3).map(|i| col.key(i)).collect();
        keys.sort();
        assert_eq!(keys.iter().map(|k| k.to_string()).collect::<Vec<_>>(), vec!["2", "10", "33"]);
    }
}
