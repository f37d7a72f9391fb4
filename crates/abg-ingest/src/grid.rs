//! Grid model shared by every reader.

/// One row of string cells. Missing trailing cells are simply absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GridRow {
    pub cells: Vec<String>,
}

impl GridRow {
    pub fn new(cells: Vec<String>) -> Self {
        Self { cells }
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Index of the last cell, or `None` for an empty row.
    pub fn last_index(&self) -> Option<usize> {
        self.cells.len().checked_sub(1)
    }

    pub fn cell(&self, index: usize) -> Option<&str> {
        self.cells.get(index).map(String::as_str)
    }

    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(|cell| cell.trim().is_empty())
    }
}

impl<S: Into<String>> FromIterator<S> for GridRow {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter.into_iter().map(Into::into).collect())
    }
}

/// One named sheet. The first row, when present, is the header row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sheet {
    pub name: String,
    pub rows: Vec<GridRow>,
    /// Why the sheet's cells could not be read. Such a sheet has no rows.
    pub read_error: Option<String>,
}

impl Sheet {
    pub fn new(name: impl Into<String>, rows: Vec<GridRow>) -> Self {
        Self {
            name: name.into(),
            rows,
            read_error: None,
        }
    }

    /// A sheet listed by its file whose cells could not be decoded.
    pub fn unreadable(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rows: Vec::new(),
            read_error: Some(message.into()),
        }
    }

    pub fn header(&self) -> Option<&GridRow> {
        self.rows.first()
    }

    /// Rows after the header.
    pub fn data_rows(&self) -> &[GridRow] {
        self.rows.get(1..).unwrap_or(&[])
    }
}
