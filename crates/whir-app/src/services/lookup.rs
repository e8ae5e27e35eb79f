// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Book lookup collaborators.
//
// The scanner only hands out codes; resolving an ISBN to a book is the
// consumer's job. The driver ships a catalogue backed by a JSON file.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use whir_core::error::Result;
use whir_core::isbn::Isbn;

/// A resolved catalogue entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookRecord {
    pub isbn: String,
    pub title: String,
}

/// Resolves scanned ISBNs to books.
pub trait BookLookup: Send + Sync {
    /// `Ok(None)` means the ISBN is valid but unknown.
    fn find(&self, isbn: &Isbn) -> Result<Option<BookRecord>>;
}

/// In-memory catalogue loaded from a JSON object of ISBN to title.
#[derive(Debug, Default)]
pub struct CatalogueLookup {
    titles: HashMap<String, String>,
}

impl CatalogueLookup {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load `{"9783161484100": "Title", ...}`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read_to_string(path.as_ref())?;
        let titles: HashMap<String, String> = serde_json::from_str(&data)?;
        tracing::info!(books = titles.len(), "catalogue loaded");
        Ok(Self { titles })
    }
}

impl FromIterator<(String, String)> for CatalogueLookup {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self {
            titles: iter.into_iter().collect(),
        }
    }
}

impl BookLookup for CatalogueLookup {
    fn find(&self, isbn: &Isbn) -> Result<Option<BookRecord>> {
        Ok(self.titles.get(isbn.as_str()).map(|title| BookRecord {
            isbn: isbn.to_string(),
            title: title.clone(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use whir_core::error::WhirError;

    use super::*;

    #[test]
    fn finds_known_isbn() {
        let catalogue: CatalogueLookup = [(
            "9783161484100".to_string(),
            "Handbook of Examples".to_string(),
        )]
        .into_iter()
        .collect();

        let isbn = Isbn::parse("9783161484100").expect("valid isbn");
        let record = catalogue.find(&isbn).expect("lookup").expect("known");
        assert_eq!(record.title, "Handbook of Examples");

        let other = Isbn::parse("9780306406157").expect("valid isbn");
        assert_eq!(catalogue.find(&other).expect("lookup"), None);
    }

    #[test]
    fn loads_catalogue_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("catalogue.json");
        std::fs::write(&path, r#"{"9781942878537": "Some Book"}"#).expect("write");

        let catalogue = CatalogueLookup::load(&path).expect("load");
        let isbn = Isbn::parse("9781942878537").expect("valid isbn");
        let record = catalogue.find(&isbn).expect("lookup").expect("known");
        assert_eq!(record.isbn, "9781942878537");
    }

    #[test]
    fn malformed_catalogue_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("catalogue.json");
        std::fs::write(&path, "[1, 2, 3]").expect("write");

        assert!(matches!(
            CatalogueLookup::load(&path),
            Err(WhirError::Serialization(_))
        ));
    }
}
