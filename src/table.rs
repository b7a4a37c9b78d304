//! Q-table storage and columnar text persistence.
//!
//! Rows are keyed by canonical state and created lazily with zeroed values.
//! The on-disk format matches the legacy layout: a header of action indices,
//! then one row per state keyed by its canonical text rendering. Loading
//! always reindexes against the full canonical state space so a fresh load
//! exposes the complete `grid_num² + 1`-row table regardless of which subset
//! was persisted.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::state::{Canonicalizer, GridCell, StateKey};

/// Errors from reading or writing a persisted table.
///
/// Partial corruption inside the file is recovered by reindexing, never
/// reported; only real file I/O surfaces here.
#[derive(Debug, Error)]
pub enum TableError {
    #[error("Q-table file I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Mapping from canonical state to per-action values.
#[derive(Debug, Clone, PartialEq)]
pub struct QTable {
    rows: HashMap<StateKey, Vec<f64>>,
    actions: usize,
}

impl QTable {
    /// Creates an empty table with the given action count.
    pub fn new(actions: usize) -> Self {
        Self {
            rows: HashMap::new(),
            actions,
        }
    }

    /// Creates a table pre-populated with every canonical state zeroed:
    /// one row per grid cell plus the terminal row.
    pub fn full(grid_num: i32, actions: usize) -> Self {
        let mut table = Self::new(actions);
        for col in 0..grid_num {
            for row in 0..grid_num {
                table
                    .rows
                    .insert(StateKey::Cell(GridCell::new(col, row)), vec![0.0; actions]);
            }
        }
        table.rows.insert(StateKey::Finished, vec![0.0; actions]);
        table
    }

    /// Number of actions (columns) per row.
    pub fn actions(&self) -> usize {
        self.actions
    }

    /// Number of rows currently present.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if no row has been inserted yet.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Inserts a zeroed row for the key if absent.
    pub fn ensure_row(&mut self, key: &StateKey) {
        if !self.rows.contains_key(key) {
            self.rows.insert(key.clone(), vec![0.0; self.actions]);
        }
    }

    /// Returns the row for a key, if present.
    pub fn row(&self, key: &StateKey) -> Option<&[f64]> {
        self.rows.get(key).map(Vec::as_slice)
    }

    /// Value for one (state, action) pair; 0.0 when the row is absent.
    pub fn get(&self, key: &StateKey, action: usize) -> f64 {
        self.rows
            .get(key)
            .and_then(|r| r.get(action))
            .copied()
            .unwrap_or(0.0)
    }

    /// Sets one (state, action) value, inserting the row if absent.
    pub fn set(&mut self, key: &StateKey, action: usize, value: f64) {
        self.ensure_row(key);
        if let Some(row) = self.rows.get_mut(key) {
            if let Some(slot) = row.get_mut(action) {
                *slot = value;
            }
        }
    }

    /// Maximum value in a row; 0.0 when the row is absent or empty.
    pub fn row_max(&self, key: &StateKey) -> f64 {
        self.rows
            .get(key)
            .map(|r| r.iter().copied().fold(f64::NEG_INFINITY, f64::max))
            .filter(|m| m.is_finite())
            .unwrap_or(0.0)
    }

    /// Iterates over all rows in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&StateKey, &[f64])> {
        self.rows.iter().map(|(k, v)| (k, v.as_slice()))
    }

    /// Serializes the table to the columnar text format.
    ///
    /// Rows are ordered cells first (by column, then row), then the terminal
    /// row, then any opaque rows, so output is deterministic.
    pub fn to_text(&self, canon: &Canonicalizer) -> String {
        let mut keys: Vec<&StateKey> = self.rows.keys().collect();
        keys.sort_by_key(|k| match k {
            StateKey::Cell(c) => (0, c.col, c.row, String::new()),
            StateKey::Finished => (1, 0, 0, String::new()),
            StateKey::Opaque(s) => (2, 0, 0, s.clone()),
        });

        let mut out = String::new();
        for a in 0..self.actions {
            out.push(',');
            out.push_str(&a.to_string());
        }
        out.push('\n');
        for key in keys {
            let rendered = canon.render(key);
            if rendered.contains(',') {
                out.push('"');
                out.push_str(&rendered);
                out.push('"');
            } else {
                out.push_str(&rendered);
            }
            for v in &self.rows[key] {
                out.push(',');
                out.push_str(&v.to_string());
            }
            out.push('\n');
        }
        out
    }

    /// Deserializes a table, reindexing against the full canonical space.
    ///
    /// Starts from [`QTable::full`] and overlays every parseable row whose
    /// key normalizes into the canonical set. Missing values zero-fill,
    /// extra columns are dropped, unparseable lines are skipped. Never
    /// fails: partial corruption degrades to zeroed entries.
    pub fn from_text(text: &str, canon: &Canonicalizer, grid_num: i32, actions: usize) -> Self {
        let mut table = Self::full(grid_num, actions);
        for line in text.lines().skip(1) {
            let line = line.trim_end();
            if line.is_empty() {
                continue;
            }
            let Some((raw_key, raw_values)) = split_row(line) else {
                continue;
            };
            let key = canon.parse(raw_key);
            if !table.rows.contains_key(&key) {
                continue; // out-of-grid or opaque key from a corrupt file
            }
            let mut values = vec![0.0; actions];
            for (i, field) in raw_values.split(',').take(actions).enumerate() {
                values[i] = field.trim().parse().unwrap_or(0.0);
            }
            table.rows.insert(key, values);
        }
        table
    }

    /// Writes the table to a file.
    pub fn save(&self, path: &Path, canon: &Canonicalizer) -> Result<(), TableError> {
        fs::write(path, self.to_text(canon))?;
        Ok(())
    }

    /// Loads a table from a file, reindexing as in [`QTable::from_text`].
    ///
    /// A missing file yields the full zeroed table.
    pub fn load(
        path: &Path,
        canon: &Canonicalizer,
        grid_num: i32,
        actions: usize,
    ) -> Result<Self, TableError> {
        if !path.exists() {
            return Ok(Self::full(grid_num, actions));
        }
        let text = fs::read_to_string(path)?;
        Ok(Self::from_text(&text, canon, grid_num, actions))
    }
}

/// Splits one data line into (key, value fields), honoring a quoted key.
fn split_row(line: &str) -> Option<(&str, &str)> {
    if let Some(rest) = line.strip_prefix('"') {
        let end = rest.find('"')?;
        let key = &rest[..end];
        let values = rest[end + 1..].strip_prefix(',')?;
        Some((key, values))
    } else {
        let idx = line.find(',')?;
        Some((&line[..idx], &line[idx + 1..]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canon() -> Canonicalizer {
        Canonicalizer::new(80.0)
    }

    #[test]
    fn full_table_has_every_canonical_state() {
        let table = QTable::full(12, 4);
        assert_eq!(table.len(), 145);
        assert!(table.row(&StateKey::Finished).is_some());
        assert!(table.row(&StateKey::Cell(GridCell::new(11, 11))).is_some());
    }

    #[test]
    fn ensure_row_inserts_once() {
        let mut table = QTable::new(4);
        let key = StateKey::Cell(GridCell::new(1, 2));
        table.ensure_row(&key);
        table.set(&key, 0, 3.5);
        table.ensure_row(&key); // must not reset the row
        assert_eq!(table.get(&key, 0), 3.5);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn missing_row_reads_as_zero() {
        let table = QTable::new(4);
        let key = StateKey::Cell(GridCell::new(0, 0));
        assert_eq!(table.get(&key, 2), 0.0);
        assert_eq!(table.row_max(&key), 0.0);
    }

    #[test]
    fn row_max_picks_largest() {
        let mut table = QTable::new(4);
        let key = StateKey::Cell(GridCell::new(0, 0));
        table.set(&key, 0, -2.0);
        table.set(&key, 3, 1.25);
        assert_eq!(table.row_max(&key), 1.25);
    }

    #[test]
    fn round_trip_preserves_written_rows_and_zero_fills_the_rest() {
        let c = canon();
        let mut table = QTable::full(12, 4);
        let a = StateKey::Cell(GridCell::new(0, 0));
        let b = StateKey::Cell(GridCell::new(9, 9));
        table.set(&a, 1, -4.5);
        table.set(&b, 3, 12.0);
        table.set(&StateKey::Finished, 0, 0.7);

        let text = table.to_text(&c);
        let loaded = QTable::from_text(&text, &c, 12, 4);
        assert_eq!(loaded.len(), 145);
        assert_eq!(loaded.get(&a, 1), -4.5);
        assert_eq!(loaded.get(&b, 3), 12.0);
        assert_eq!(loaded.get(&StateKey::Finished, 0), 0.7);
        assert_eq!(loaded.get(&StateKey::Cell(GridCell::new(5, 5)), 2), 0.0);
    }

    #[test]
    fn partial_persisted_subset_loads_as_full_table() {
        let c = canon();
        let text = ",0,1,2,3\n\"[0.0, 0.0, 80.0, 80.0]\",1,2,3,4\n";
        let loaded = QTable::from_text(text, &c, 12, 4);
        assert_eq!(loaded.len(), 145);
        let key = StateKey::Cell(GridCell::new(0, 0));
        assert_eq!(loaded.row(&key), Some(&[1.0, 2.0, 3.0, 4.0][..]));
    }

    #[test]
    fn corrupt_lines_are_skipped_not_fatal() {
        let c = canon();
        let text = ",0,1,2,3\n\
                    garbage line without structure\n\
                    \"[0.0, 0.0, 80.0, 80.0]\",1,2,3,4\n\
                    \"[not, a, real, key]\",9,9,9,9\n\
                    \"[1600.0, 1600.0, 1680.0, 1680.0]\",9,9,9,9\n\
                    finished,5,5,5,5\n";
        let loaded = QTable::from_text(text, &c, 12, 4);
        assert_eq!(loaded.len(), 145);
        assert_eq!(loaded.get(&StateKey::Cell(GridCell::new(0, 0)), 0), 1.0);
        assert_eq!(loaded.get(&StateKey::Finished, 0), 5.0);
    }

    #[test]
    fn wrong_column_count_truncates_and_zero_fills() {
        let c = canon();
        // Too many columns on the first row, too few on the second.
        let text = ",0,1,2,3\n\
                    \"[0.0, 0.0, 80.0, 80.0]\",1,2,3,4,5,6\n\
                    \"[80.0, 0.0, 160.0, 80.0]\",7\n";
        let loaded = QTable::from_text(text, &c, 12, 4);
        assert_eq!(
            loaded.row(&StateKey::Cell(GridCell::new(0, 0))),
            Some(&[1.0, 2.0, 3.0, 4.0][..])
        );
        assert_eq!(
            loaded.row(&StateKey::Cell(GridCell::new(1, 0))),
            Some(&[7.0, 0.0, 0.0, 0.0][..])
        );
    }

    #[test]
    fn non_canonical_key_text_lands_on_its_cell() {
        let c = canon();
        // A key rendered with an off-center box still normalizes to cell (0,0).
        let text = ",0,1,2,3\n\"[10.0, 10.0, 60.0, 60.0]\",1,1,1,1\n";
        let loaded = QTable::from_text(text, &c, 12, 4);
        assert_eq!(
            loaded.row(&StateKey::Cell(GridCell::new(0, 0))),
            Some(&[1.0, 1.0, 1.0, 1.0][..])
        );
    }

    #[test]
    fn save_and_load_files() {
        let c = canon();
        let dir = std::env::temp_dir().join("skyroute_table_test");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("qtable.csv");

        let mut table = QTable::full(12, 4);
        table.set(&StateKey::Cell(GridCell::new(2, 3)), 1, 8.5);
        table.save(&path, &c).unwrap();

        let loaded = QTable::load(&path, &c, 12, 4).unwrap();
        assert_eq!(loaded, table);
        fs::remove_file(&path).unwrap();

        // Missing file loads as the full zero table.
        let fresh = QTable::load(&path, &c, 12, 4).unwrap();
        assert_eq!(fresh.len(), 145);
        assert_eq!(fresh.get(&StateKey::Cell(GridCell::new(2, 3)), 1), 0.0);
    }
}
