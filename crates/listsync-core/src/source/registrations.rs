//! Registration spreadsheet parsing.

use std::path::Path;

use calamine::{open_workbook, Reader, Xlsx, XlsxError};
use indexmap::IndexMap;

use crate::api::Contact;
use crate::error::SourceError;

pub const EMAIL_COLUMN: &str = "Email";
pub const FIRST_NAME_COLUMN: &str = "FirstName";
pub const LAST_NAME_COLUMN: &str = "LastName";

/// Registrants keyed by email, in spreadsheet order.
///
/// The first row for an email wins; later rows for the same address are
/// dropped and counted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegistrationSet {
    records: IndexMap<String, Contact>,
    duplicates: usize,
}

impl RegistrationSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a registrant. Returns false when it has no email or the email is
    /// already present.
    pub fn insert(&mut self, contact: Contact) -> bool {
        let Some(email) = contact.primary_email().map(str::to_string) else {
            return false;
        };
        if self.records.contains_key(&email) {
            self.duplicates += 1;
            tracing::warn!(%email, "email has already been used, skipping");
            return false;
        }
        self.records.insert(email, contact);
        true
    }

    /// Build from rows of cells. The first row is the header; only the
    /// `Email` column is required.
    pub fn from_rows<I, R, S>(rows: I) -> Result<Self, SourceError>
    where
        I: IntoIterator<Item = R>,
        R: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut rows = rows.into_iter();
        let header: Vec<String> = rows
            .next()
            .map(|h| h.into_iter().map(|c| c.into().trim().to_string()).collect())
            .unwrap_or_default();

        let column = |name: &str| header.iter().position(|h| h == name);
        let email_col =
            column(EMAIL_COLUMN).ok_or_else(|| SourceError::MissingColumn(EMAIL_COLUMN.into()))?;
        let first_col = column(FIRST_NAME_COLUMN);
        let last_col = column(LAST_NAME_COLUMN);

        let mut set = Self::new();
        for (idx, row) in rows.enumerate() {
            let cells: Vec<String> = row.into_iter().map(Into::into).collect();
            let cell = |col: Option<usize>| {
                col.and_then(|c| cells.get(c))
                    .map(|v| v.trim())
                    .filter(|v| !v.is_empty())
                    .map(str::to_string)
            };

            let Some(email) = cell(Some(email_col)) else {
                // header is row 1
                tracing::debug!(row = idx + 2, "row without email, skipping");
                continue;
            };
            let mut contact = Contact::with_email(email);
            contact.first_name = cell(first_col);
            contact.last_name = cell(last_col);
            set.insert(contact);
        }

        tracing::info!(
            registrants = set.len(),
            duplicates = set.duplicates,
            "registrations loaded"
        );
        Ok(set)
    }

    /// Read a worksheet of an `.xlsx` export. `None` reads the first sheet.
    pub fn load_xlsx(path: &Path, sheet: Option<&str>) -> Result<Self, SourceError> {
        let spreadsheet_error = |message: String| SourceError::Spreadsheet {
            path: path.to_path_buf(),
            message,
        };

        let mut workbook: Xlsx<_> =
            open_workbook(path).map_err(|e: XlsxError| spreadsheet_error(e.to_string()))?;
        let range = match sheet {
            Some(name) => workbook.worksheet_range(name),
            None => workbook
                .worksheet_range_at(0)
                .ok_or_else(|| spreadsheet_error("workbook has no worksheets".into()))?,
        }
        .map_err(|e| spreadsheet_error(e.to_string()))?;

        Self::from_rows(range.rows().map(|row| row.iter().map(|cell| cell.to_string())))
    }

    pub fn get(&self, email: &str) -> Option<&Contact> {
        self.records.get(email)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Contact)> {
        self.records.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Rows dropped because their email was already present.
    pub fn duplicates(&self) -> usize {
        self.duplicates
    }
}

impl FromIterator<Contact> for RegistrationSet {
    fn from_iter<T: IntoIterator<Item = Contact>>(iter: T) -> Self {
        let mut set = Self::new();
        for contact in iter {
            set.insert(contact);
        }
        set
    }
}
