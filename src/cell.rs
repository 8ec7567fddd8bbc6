use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// convert a letter run to its 1-based numeric index (A=1, Z=26, AA=27)
pub fn letters_to_number(letters: &str) -> Result<u32> {
    if letters.is_empty() {
        return Err(Error::InvalidCell("letter run cannot be empty".to_string()));
    }
    let mut result: u32 = 0;
    for c in letters.chars() {
        let c = c.to_ascii_uppercase();
        if !c.is_ascii_uppercase() {
            return Err(Error::InvalidCell(format!(
                "invalid letter '{}' in {}",
                c, letters
            )));
        }
        result = result
            .checked_mul(26)
            .and_then(|r| r.checked_add(c as u32 - 'A' as u32 + 1))
            .ok_or_else(|| Error::InvalidCell(format!("letter run too long: {}", letters)))?;
    }
    Ok(result)
}

/// convert a 1-based numeric index to a letter run (1=A, 26=Z, 27=AA)
pub fn number_to_letters(mut number: u32) -> Result<String> {
    if number == 0 {
        return Err(Error::InvalidCell("index must be positive".to_string()));
    }
    let mut out = String::new();
    while number > 0 {
        number -= 1;
        out.insert(0, (b'A' + (number % 26) as u8) as char);
        number /= 26;
    }
    Ok(out)
}

/// split a cell address like "A1" into its letter run and numeric part
pub fn split_address(address: &str) -> Result<(String, u32)> {
    let letters: String = address
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .collect();
    let digits = &address[letters.len()..];
    if letters.is_empty() || digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::InvalidCell(format!(
            "malformed cell address: {}",
            address
        )));
    }
    let number: u32 = digits
        .parse()
        .map_err(|_| Error::InvalidCell(format!("cell number out of range: {}", address)))?;
    if number == 0 {
        return Err(Error::InvalidCell(format!(
            "cell number must be >= 1: {}",
            address
        )));
    }
    Ok((letters.to_ascii_uppercase(), number))
}

/// coordinates of a single spreadsheet cell
///
/// the letter run is stored as `row_letters` and the numeric part as
/// `col_number`, matching the address and key formats of existing stores
/// ("A1" is row_letters "A", col_number 1)
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellRef {
    pub workbook_id: String,
    pub sheet_number: u32,
    pub row_letters: String,
    pub col_number: u32,
}

impl CellRef {
    /// create a validated cell reference; letters are uppercased on entry
    pub fn new(
        workbook_id: impl Into<String>,
        sheet_number: u32,
        row_letters: &str,
        col_number: u32,
    ) -> Result<Self> {
        let workbook_id = workbook_id.into();
        validate_workbook_id(&workbook_id)?;
        let row_letters = row_letters.trim().to_ascii_uppercase();
        if row_letters.is_empty() || !row_letters.bytes().all(|b| b.is_ascii_uppercase()) {
            return Err(Error::InvalidCell(format!(
                "invalid row letters: {:?}",
                row_letters
            )));
        }
        if col_number == 0 {
            return Err(Error::InvalidCell(
                "column number must be >= 1".to_string(),
            ));
        }
        Ok(Self {
            workbook_id,
            sheet_number,
            row_letters,
            col_number,
        })
    }

    /// cell address as written into tree paths, e.g. "A1"
    pub fn address(&self) -> String {
        format!("{}{}", self.row_letters, self.col_number)
    }

    /// staging index key, e.g. "wb1:1:A:1"
    pub fn key(&self) -> String {
        format!(
            "{}:{}:{}:{}",
            self.workbook_id, self.sheet_number, self.row_letters, self.col_number
        )
    }

    /// hierarchical object path, e.g. "wb1/1/A1"
    pub fn tree_path(&self) -> String {
        format!(
            "{}/{}/{}",
            self.workbook_id,
            self.sheet_number,
            self.address()
        )
    }

    /// reconstruct a cell reference from a tree path `"<workbook>/<sheet>/<cell>"`
    pub fn from_tree_path(path: &str) -> Result<Self> {
        let mut parts = path.splitn(3, '/');
        let (Some(workbook), Some(sheet), Some(address)) =
            (parts.next(), parts.next(), parts.next())
        else {
            return Err(Error::InvalidCell(format!("malformed cell path: {}", path)));
        };
        let sheet_number: u32 = sheet
            .parse()
            .map_err(|_| Error::InvalidCell(format!("malformed sheet number in {}", path)))?;
        let (letters, number) = split_address(address)?;
        Self::new(workbook, sheet_number, &letters, number)
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}!{}",
            self.workbook_id,
            self.sheet_number,
            self.address()
        )
    }
}

/// workbook ids become path and key components, so the separators are reserved
fn validate_workbook_id(id: &str) -> Result<()> {
    if id.trim().is_empty() {
        return Err(Error::InvalidCell("workbook id cannot be empty".to_string()));
    }
    if id.contains('/') || id.contains(':') || id.contains('\0') {
        return Err(Error::InvalidCell(format!(
            "workbook id contains reserved characters: {}",
            id
        )));
    }
    Ok(())
}
