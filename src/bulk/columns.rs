//! Bidirectional mapping between spreadsheet headers and member columns.

use crate::models::MemberField;

/// Header of the member id column.
pub const ID_HEADER: &str = "Α/Α";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Id,
    Field(MemberField),
}

impl Column {
    pub fn header(self) -> &'static str {
        match self {
            Column::Id => ID_HEADER,
            Column::Field(field) => field.header(),
        }
    }

    /// Exact lookup after trimming surrounding whitespace.
    pub fn from_header(header: &str) -> Option<Self> {
        let header = header.trim();
        if header == ID_HEADER {
            return Some(Column::Id);
        }
        MemberField::ALL
            .iter()
            .find(|field| field.header() == header)
            .map(|field| Column::Field(*field))
    }
}

/// Columns in export order: the id first, then every member field.
pub fn export_columns() -> impl Iterator<Item = Column> {
    std::iter::once(Column::Id).chain(MemberField::ALL.iter().copied().map(Column::Field))
}
