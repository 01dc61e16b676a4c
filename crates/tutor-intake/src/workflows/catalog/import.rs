use serde::{Deserialize, Deserializer};
use std::io::Read;
use std::path::Path;

use super::tree::{CategoryError, CategoryId, CategoryTree, NewCategory};

#[derive(Debug)]
pub enum CategoryImportError {
    Io(std::io::Error),
    Csv(csv::Error),
    Row { line: u64, source: CategoryError },
}

impl std::fmt::Display for CategoryImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CategoryImportError::Io(err) => write!(f, "failed to read category export: {}", err),
            CategoryImportError::Csv(err) => write!(f, "invalid category CSV data: {}", err),
            CategoryImportError::Row { line, source } => {
                write!(f, "category on line {} rejected: {}", line, source)
            }
        }
    }
}

impl std::error::Error for CategoryImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CategoryImportError::Io(err) => Some(err),
            CategoryImportError::Csv(err) => Some(err),
            CategoryImportError::Row { source, .. } => Some(source),
        }
    }
}

impl From<std::io::Error> for CategoryImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for CategoryImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

/// Builds a `CategoryTree` from an `id,label,description,parent_id` export.
///
/// Parents must appear before their children.
pub struct CategoryImporter;

impl CategoryImporter {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<CategoryTree, CategoryImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<CategoryTree, CategoryImportError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let headers = csv_reader.headers()?.clone();
        let mut tree = CategoryTree::new();

        for record in csv_reader.records() {
            let record = record?;
            let line = record.position().map(|pos| pos.line()).unwrap_or_default();
            let row: CategoryRow = record.deserialize(Some(&headers))?;
            tree.insert(row.into_request())
                .map_err(|source| CategoryImportError::Row { line, source })?;
        }

        Ok(tree)
    }
}

#[derive(Debug, Deserialize)]
struct CategoryRow {
    id: String,
    label: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    description: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    parent_id: Option<String>,
}

impl CategoryRow {
    fn into_request(self) -> NewCategory {
        NewCategory {
            id: Some(CategoryId(self.id)),
            label: self.label,
            description: self.description,
            parent_id: self.parent_id.map(CategoryId),
        }
    }
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}
