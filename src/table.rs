/// In-memory table for subset results.
///
/// Yearly tables are appended to a running combined table in the order they
/// are extracted. No sorting, no deduplication.

use crate::model::Cell;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubsetTable {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl SubsetTable {
    pub fn new(columns: Vec<String>) -> Self {
        Self { columns, rows: Vec::new() }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Adds a row, padding with `Null` or truncating to the column count.
    pub fn push_row(&mut self, mut row: Vec<Cell>) {
        row.resize(self.columns.len(), Cell::Null);
        self.rows.push(row);
    }

    /// Iterates the values of one column, if present.
    pub fn column_values<'a>(&'a self, name: &str) -> Option<impl Iterator<Item = &'a Cell> + 'a> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(move |row| &row[idx]))
    }

    /// Appends `other` below `self`.
    ///
    /// Columns are matched by name. Columns only present in `other` are added
    /// at the end and back-filled with `Null`; columns missing from `other`
    /// are `Null` in its rows.
    pub fn append(&mut self, other: SubsetTable) {
        if self.columns.is_empty() && self.rows.is_empty() {
            *self = other;
            return;
        }

        for col in &other.columns {
            if self.column_index(col).is_none() {
                self.columns.push(col.clone());
                for row in &mut self.rows {
                    row.push(Cell::Null);
                }
            }
        }

        let mapping: Vec<usize> = other
            .columns
            .iter()
            .filter_map(|c| self.column_index(c))
            .collect();

        let width = self.columns.len();
        for other_row in other.rows {
            let mut row = vec![Cell::Null; width];
            for (src, cell) in other_row.into_iter().enumerate() {
                if let Some(&dst) = mapping.get(src) {
                    row[dst] = cell;
                }
            }
            self.rows.push(row);
        }
    }

    /// Concatenates tables in iteration order.
    pub fn concat<I: IntoIterator<Item = SubsetTable>>(tables: I) -> SubsetTable {
        let mut combined = SubsetTable::default();
        for table in tables {
            combined.append(table);
        }
        combined
    }
}
