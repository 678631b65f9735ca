//! Table cleaning steps.
//!
//! Every step takes the table by reference and returns a new table, so steps
//! compose in any order and the input is never touched.

use crate::config::EmptyColumnPolicy;
use crate::error::{Result, TableError};
use crate::types::{Column, ColumnData, Table};
use std::collections::HashSet;

/// Hashable view of one cell, used to compare whole rows
#[derive(Debug, PartialEq, Eq, Hash)]
enum CellKey<'a> {
    Missing,
    Number(u64),
    Text(&'a str),
}

fn cell_key(data: &ColumnData, row: usize) -> CellKey<'_> {
    match data {
        ColumnData::Numeric(v) => match v[row] {
            // -0.0 and 0.0 are the same value
            Some(n) if n == 0.0 => CellKey::Number(0),
            Some(n) => CellKey::Number(n.to_bits()),
            None => CellKey::Missing,
        },
        ColumnData::Text(v) => match &v[row] {
            Some(s) => CellKey::Text(s),
            None => CellKey::Missing,
        },
    }
}

/// Drop every row equal to an earlier row, keeping the first occurrence.
pub fn deduplicate(table: &Table) -> Table {
    let mut seen: HashSet<Vec<CellKey<'_>>> = HashSet::new();
    let keep: Vec<usize> = (0..table.row_count())
        .filter(|&row| {
            let key: Vec<CellKey<'_>> = table
                .columns()
                .iter()
                .map(|c| cell_key(c.data(), row))
                .collect();
            seen.insert(key)
        })
        .collect();

    let dropped = table.row_count() - keep.len();
    if dropped > 0 {
        log::debug!("removed {} duplicate rows", dropped);
    }
    table.take_rows(&keep)
}

/// Replace missing values in numeric columns with the mean of the present values.
///
/// Text columns are returned unchanged. A numeric column with no present values
/// has no mean: it is left missing or rejected depending on `policy`.
pub fn impute_mean(table: &Table, policy: EmptyColumnPolicy) -> Result<Table> {
    let mut columns = Vec::with_capacity(table.column_count());

    for column in table.columns() {
        let data = match column.data() {
            ColumnData::Numeric(values) => match column_mean(values) {
                Some(mean) => ColumnData::Numeric(
                    values.iter().map(|v| Some(v.unwrap_or(mean))).collect(),
                ),
                None if values.is_empty() => column.data().clone(),
                None => match policy {
                    EmptyColumnPolicy::LeaveMissing => {
                        log::warn!(
                            "column {:?} has no values, leaving it missing",
                            column.name()
                        );
                        column.data().clone()
                    }
                    EmptyColumnPolicy::Fail => {
                        return Err(TableError::Imputation(format!(
                            "column \"{}\" has no values to average",
                            column.name()
                        )))
                    }
                },
            },
            ColumnData::Text(_) => column.data().clone(),
        };
        columns.push(Column::new(column.name(), data));
    }

    Ok(Table::from_columns_unchecked(columns))
}

/// Arithmetic mean of the present values, `None` if there are none
fn column_mean(values: &[Option<f64>]) -> Option<f64> {
    let (sum, count) = values
        .iter()
        .flatten()
        .fold((0.0_f64, 0_usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}

/// Project the table onto `names`, in that order.
pub fn select_columns<S: AsRef<str>>(table: &Table, names: &[S]) -> Result<Table> {
    let mut requested: HashSet<&str> = HashSet::new();
    let mut columns = Vec::with_capacity(names.len());

    for name in names {
        let name = name.as_ref();
        if !requested.insert(name) {
            return Err(TableError::DuplicateColumn(name.to_string()));
        }
        let column = table
            .column(name)
            .ok_or_else(|| TableError::UnknownColumn(name.to_string()))?;
        columns.push(column.clone());
    }

    Ok(Table::from_columns_unchecked(columns))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::load;

    fn sample() -> Table {
        load(b"a,b\n1,\n,4\n1,\n", "csv").unwrap()
    }

    #[test]
    fn test_deduplicate_keeps_first() {
        let table = deduplicate(&sample());
        assert_eq!(table.row_count(), 2);
        assert_eq!(
            table.column("a").unwrap().data(),
            &ColumnData::Numeric(vec![Some(1.0), None])
        );
        assert_eq!(
            table.column("b").unwrap().data(),
            &ColumnData::Numeric(vec![None, Some(4.0)])
        );
    }

    #[test]
    fn test_deduplicate_idempotent() {
        let once = deduplicate(&sample());
        assert_eq!(deduplicate(&once), once);
    }

    #[test]
    fn test_deduplicate_no_duplicates() {
        let table = load(b"a,b\n1,x\n2,x\n1,y\n", "csv").unwrap();
        assert_eq!(deduplicate(&table), table);
    }

    #[test]
    fn test_deduplicate_without_columns() {
        assert_eq!(deduplicate(&Table::default()), Table::default());
    }

    #[test]
    fn test_impute_after_deduplicate() {
        let table = impute_mean(&deduplicate(&sample()), EmptyColumnPolicy::Fail).unwrap();
        assert_eq!(
            table.column("a").unwrap().data(),
            &ColumnData::Numeric(vec![Some(1.0), Some(1.0)])
        );
        assert_eq!(
            table.column("b").unwrap().data(),
            &ColumnData::Numeric(vec![Some(4.0), Some(4.0)])
        );
    }

    #[test]
    fn test_impute_uses_mean() {
        let table = load(b"x\n1\n\n4\nNA\n", "csv").unwrap();
        let filled = impute_mean(&table, EmptyColumnPolicy::LeaveMissing).unwrap();
        assert_eq!(
            filled.column("x").unwrap().data(),
            &ColumnData::Numeric(vec![Some(1.0), Some(4.0), Some(2.5)])
        );
        assert_eq!(filled.column("x").unwrap().data().missing_count(), 0);
    }

    #[test]
    fn test_impute_leaves_text_untouched() {
        let table = load(b"n,t\n1,\n,x\n", "csv").unwrap();
        let filled = impute_mean(&table, EmptyColumnPolicy::LeaveMissing).unwrap();
        assert_eq!(filled.column("t"), table.column("t"));
        assert_eq!(filled.column("t").unwrap().data().missing_count(), 1);
    }

    #[test]
    fn test_impute_all_missing_column() {
        let table = Table::new(vec![
            Column::numeric("empty", vec![None, None]),
            Column::numeric("full", vec![Some(2.0), None]),
        ])
        .unwrap();

        let filled = impute_mean(&table, EmptyColumnPolicy::LeaveMissing).unwrap();
        assert_eq!(
            filled.column("empty").unwrap().data(),
            &ColumnData::Numeric(vec![None, None])
        );
        assert_eq!(
            filled.column("full").unwrap().data(),
            &ColumnData::Numeric(vec![Some(2.0), Some(2.0)])
        );

        let result = impute_mean(&table, EmptyColumnPolicy::Fail);
        assert!(matches!(result, Err(TableError::Imputation(_))));
    }

    #[test]
    fn test_impute_empty_table_never_fails() {
        let table = load(b"a,b\n", "csv").unwrap();
        let filled = impute_mean(&table, EmptyColumnPolicy::Fail).unwrap();
        assert_eq!(filled, table);
    }

    #[test]
    fn test_select_columns() {
        let table = load(b"a,b,c\n1,x,3\n2,y,4\n", "csv").unwrap();
        let selected = select_columns(&table, &["b"]).unwrap();
        assert_eq!(selected.column_names(), vec!["b"]);
        assert_eq!(selected.row_count(), 2);
        assert_eq!(selected.column("b"), table.column("b"));
    }

    #[test]
    fn test_select_columns_reorders_and_is_idempotent() {
        let table = load(b"a,b,c\n1,2,3\n", "csv").unwrap();
        let names = ["c", "a"];
        let once = select_columns(&table, &names).unwrap();
        assert_eq!(once.column_names(), vec!["c", "a"]);
        assert_eq!(select_columns(&once, &names).unwrap(), once);
    }

    #[test]
    fn test_select_unknown_column() {
        let table = load(b"a,b\n1,2\n", "csv").unwrap();
        let before = table.clone();
        let result = select_columns(&table, &["a", "z"]);
        assert!(matches!(result, Err(TableError::UnknownColumn(ref n)) if n == "z"));
        assert_eq!(table, before);
    }

    #[test]
    fn test_select_duplicate_name() {
        let table = load(b"a,b\n1,2\n", "csv").unwrap();
        let result = select_columns(&table, &["a", "a"]);
        assert!(matches!(result, Err(TableError::DuplicateColumn(_))));
    }
}
