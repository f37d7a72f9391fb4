//! Header row resolution and row projection.

use std::collections::BTreeMap;

use abg_model::CanonicalColumn;

use crate::resolver::LabelResolver;

/// Cell values of one data row, keyed by the canonical column they sit under.
pub type RowValues = BTreeMap<CanonicalColumn, String>;

/// Column index → canonical column for one sheet. Unresolved headers are
/// left out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderMap {
    columns: BTreeMap<usize, CanonicalColumn>,
}

impl HeaderMap {
    pub fn resolve<S: AsRef<str>>(resolver: &LabelResolver, headers: &[S]) -> Self {
        let columns = headers
            .iter()
            .enumerate()
            .filter_map(|(idx, header)| {
                resolver
                    .resolve_column(header.as_ref())
                    .map(|column| (idx, column))
            })
            .collect();
        Self { columns }
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn contains(&self, column: CanonicalColumn) -> bool {
        self.columns.values().any(|c| *c == column)
    }

    pub fn column_at(&self, index: usize) -> Option<CanonicalColumn> {
        self.columns.get(&index).copied()
    }

    /// Required columns the header failed to resolve, in canonical order.
    pub fn missing_required(&self) -> Vec<CanonicalColumn> {
        CanonicalColumn::REQUIRED
            .into_iter()
            .filter(|column| !self.contains(*column))
            .collect()
    }

    /// Values of a data row under recognised columns.
    ///
    /// Only cells the row actually has are included. When two headers resolve
    /// to the same column, the rightmost one wins.
    pub fn project<S: AsRef<str>>(&self, cells: &[S]) -> RowValues {
        let mut values = RowValues::new();
        for (idx, cell) in cells.iter().enumerate() {
            if let Some(column) = self.column_at(idx) {
                values.insert(column, cell.as_ref().trim().to_string());
            }
        }
        values
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(cells: &[&str]) -> HeaderMap {
        HeaderMap::resolve(&LabelResolver::default(), cells)
    }

    #[test]
    fn ignores_unrecognised_columns() {
        let map = header(&["Sıra", "barkod no", "antibiyotik adı", "sonuç şablon"]);
        assert_eq!(map.len(), 3);
        assert_eq!(map.column_at(0), None);
        assert_eq!(map.column_at(1), Some(CanonicalColumn::SpecimenId));
        assert!(map.missing_required().is_empty());
    }

    #[test]
    fn reports_missing_required_columns() {
        let map = header(&["barkod no", "birim"]);
        assert_eq!(
            map.missing_required(),
            vec![CanonicalColumn::AntibioticName, CanonicalColumn::Result]
        );
    }

    #[test]
    fn projection_stops_at_row_length() {
        let map = header(&["barkod no", "antibiyotik adı", "sonuç şablon"]);
        let values = map.project(&["B1", " Ampicillin "][..]);
        assert_eq!(values.len(), 2);
        assert_eq!(
            values.get(&CanonicalColumn::AntibioticName).map(String::as_str),
            Some("Ampicillin")
        );
        assert!(!values.contains_key(&CanonicalColumn::Result));
    }
}
