use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::RwLock;

use crate::error::{Error, Result};
use crate::repo::write_atomic;

/// the external store of live workbook cell values
///
/// the version-control core reads current values when staging and writes
/// values back during hard resets; workbook persistence itself is outside
/// its concern
pub trait WorkbookStore {
    /// current value of a cell; a missing sheet or cell reads as ""
    fn read_cell(
        &self,
        workbook_id: &str,
        sheet_number: u32,
        row_letters: &str,
        col_number: u32,
    ) -> Result<String>;

    /// overwrite a cell value, creating the sheet on demand
    fn write_cell(
        &self,
        workbook_id: &str,
        sheet_number: u32,
        row_letters: &str,
        col_number: u32,
        value: &str,
    ) -> Result<()>;
}

fn cell_address(row_letters: &str, col_number: u32) -> String {
    format!("{}{}", row_letters.to_ascii_uppercase(), col_number)
}

type Sheets = BTreeMap<String, BTreeMap<String, String>>;
type Documents = BTreeMap<String, Sheets>;

/// in-memory workbook store
#[derive(Default)]
pub struct MemoryWorkbookStore {
    workbooks: RwLock<Documents>,
}

impl MemoryWorkbookStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// create an empty workbook
    pub fn create_workbook(&self, workbook_id: &str) {
        self.workbooks
            .write()
            .expect("workbook lock poisoned")
            .entry(workbook_id.to_string())
            .or_default();
    }
}

impl WorkbookStore for MemoryWorkbookStore {
    fn read_cell(
        &self,
        workbook_id: &str,
        sheet_number: u32,
        row_letters: &str,
        col_number: u32,
    ) -> Result<String> {
        let workbooks = self.workbooks.read().expect("workbook lock poisoned");
        let sheets = workbooks
            .get(workbook_id)
            .ok_or_else(|| Error::WorkbookNotFound(workbook_id.to_string()))?;
        Ok(sheets
            .get(&sheet_number.to_string())
            .and_then(|cells| cells.get(&cell_address(row_letters, col_number)))
            .cloned()
            .unwrap_or_default())
    }

    fn write_cell(
        &self,
        workbook_id: &str,
        sheet_number: u32,
        row_letters: &str,
        col_number: u32,
        value: &str,
    ) -> Result<()> {
        let mut workbooks = self.workbooks.write().expect("workbook lock poisoned");
        workbooks
            .entry(workbook_id.to_string())
            .or_default()
            .entry(sheet_number.to_string())
            .or_default()
            .insert(cell_address(row_letters, col_number), value.to_string());
        Ok(())
    }
}

/// file-backed workbook store used by the CLI
///
/// the whole document collection lives in one JSON file:
/// `{ "<workbook>": { "<sheet>": { "A1": "value" } } }`
pub struct JsonWorkbookStore {
    path: PathBuf,
    lock: RwLock<()>,
}

impl JsonWorkbookStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: RwLock::new(()),
        }
    }

    /// create an empty workbook document
    pub fn create_workbook(&self, workbook_id: &str) -> Result<()> {
        let _guard = self.lock.write().expect("workbook lock poisoned");
        let mut docs = self.load()?;
        docs.entry(workbook_id.to_string()).or_default();
        self.save(&docs)
    }

    fn load(&self) -> Result<Documents> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) if content.trim().is_empty() => Ok(Documents::default()),
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Documents::default()),
            Err(source) => Err(Error::Io {
                path: self.path.clone(),
                source,
            }),
        }
    }

    fn save(&self, docs: &Documents) -> Result<()> {
        let json = serde_json::to_string_pretty(docs)?;
        write_atomic(&self.path, json.as_bytes())
    }
}

impl WorkbookStore for JsonWorkbookStore {
    fn read_cell(
        &self,
        workbook_id: &str,
        sheet_number: u32,
        row_letters: &str,
        col_number: u32,
    ) -> Result<String> {
        let _guard = self.lock.read().expect("workbook lock poisoned");
        let docs = self.load()?;
        let sheets = docs
            .get(workbook_id)
            .ok_or_else(|| Error::WorkbookNotFound(workbook_id.to_string()))?;
        Ok(sheets
            .get(&sheet_number.to_string())
            .and_then(|cells| cells.get(&cell_address(row_letters, col_number)))
            .cloned()
            .unwrap_or_default())
    }

    fn write_cell(
        &self,
        workbook_id: &str,
        sheet_number: u32,
        row_letters: &str,
        col_number: u32,
        value: &str,
    ) -> Result<()> {
        let _guard = self.lock.write().expect("workbook lock poisoned");
        let mut docs = self.load()?;
        docs.entry(workbook_id.to_string())
            .or_default()
            .entry(sheet_number.to_string())
            .or_default()
            .insert(cell_address(row_letters, col_number), value.to_string());
        self.save(&docs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_memory_store_roundtrip() {
        let store = MemoryWorkbookStore::new();
        store.write_cell("wb1", 1, "A", 1, "Hello").unwrap();

        assert_eq!(store.read_cell("wb1", 1, "A", 1).unwrap(), "Hello");
    }

    #[test]
    fn test_memory_store_missing_workbook() {
        let store = MemoryWorkbookStore::new();
        assert!(matches!(
            store.read_cell("nope", 1, "A", 1),
            Err(Error::WorkbookNotFound(_))
        ));
    }

    #[test]
    fn test_memory_store_missing_cell_reads_empty() {
        let store = MemoryWorkbookStore::new();
        store.create_workbook("wb1");

        assert_eq!(store.read_cell("wb1", 1, "A", 1).unwrap(), "");
        assert_eq!(store.read_cell("wb1", 9, "ZZ", 702).unwrap(), "");
    }

    #[test]
    fn test_memory_store_case_insensitive_letters() {
        let store = MemoryWorkbookStore::new();
        store.write_cell("wb1", 1, "a", 1, "v").unwrap();
        assert_eq!(store.read_cell("wb1", 1, "A", 1).unwrap(), "v");
    }

    #[test]
    fn test_json_store_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("workbooks.json");

        let store = JsonWorkbookStore::open(&path);
        store.write_cell("wb1", 1, "A", 1, "Hello").unwrap();
        store.write_cell("wb1", 2, "B", 3, "World").unwrap();

        // values survive a fresh handle
        let reopened = JsonWorkbookStore::open(&path);
        assert_eq!(reopened.read_cell("wb1", 1, "A", 1).unwrap(), "Hello");
        assert_eq!(reopened.read_cell("wb1", 2, "B", 3).unwrap(), "World");
    }

    #[test]
    fn test_json_store_missing_workbook() {
        let dir = tempdir().unwrap();
        let store = JsonWorkbookStore::open(dir.path().join("workbooks.json"));
        assert!(matches!(
            store.read_cell("nope", 1, "A", 1),
            Err(Error::WorkbookNotFound(_))
        ));
    }

    #[test]
    fn test_json_store_create_workbook() {
        let dir = tempdir().unwrap();
        let store = JsonWorkbookStore::open(dir.path().join("workbooks.json"));
        store.create_workbook("wb1").unwrap();
        assert_eq!(store.read_cell("wb1", 1, "A", 1).unwrap(), "");
    }
}
