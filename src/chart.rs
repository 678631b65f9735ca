use crate::types::constants::CHART_MAX_COLUMNS;
use crate::types::Table;

/// Numeric columns to plot: the first two in column order.
/// Returns an empty table when there is nothing numeric to show.
pub fn chartable_columns(table: &Table) -> Table {
    Table::from_columns_unchecked(
        table
            .columns()
            .iter()
            .filter(|c| c.is_numeric())
            .take(CHART_MAX_COLUMNS)
            .cloned()
            .collect(),
    )
}
