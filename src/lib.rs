//! cellar - cell-granular version control for spreadsheet workbooks
//!
//! a content-addressed store that versions individual cell values with
//! git-like semantics: values become zlib-compressed blobs, blobs hang off
//! tree objects along workbook/sheet/cell paths, and trees are chained into
//! commits reachable from branch refs under `.VCS/`.
//!
//! # Core concepts
//!
//! - **Blob**: one cell's value, addressed by the SHA-1 of its framed form
//!   (`"blob <len>\0<value>"`, stored zlib-compressed)
//! - **Tree**: a directory object whose entries name subtrees or blobs,
//!   mirroring the `workbook/sheet/cell` hierarchy
//! - **Commit**: a snapshot of a root tree with parent and authorship
//! - **Index**: the durable staging area of pending cell changes
//! - **Branch / HEAD**: movable refs selecting the current commit
//!
//! # Example usage
//!
//! ```no_run
//! use std::path::Path;
//! use cellar::{ops, CellRef, MemoryWorkbookStore, Repo, WorkbookStore};
//!
//! // initialize a repository and a workbook store
//! let repo = Repo::init(Path::new("/path/to/project")).unwrap();
//! let store = MemoryWorkbookStore::new();
//! store.write_cell("budget", 1, "A", 1, "1200").unwrap();
//!
//! // stage a cell and commit it
//! let cell = CellRef::new("budget", 1, "A", 1).unwrap();
//! ops::stage(&repo, &store, &cell).unwrap();
//! ops::commit(&repo, "initial import", "Alice", "alice@example.com").unwrap();
//! ```

mod cell;
mod compress;
mod config;
mod error;
mod hash;
mod index;
mod repo;
mod workbook;

pub mod object;
pub mod ops;

pub use cell::{letters_to_number, number_to_letters, split_address, CellRef};
pub use compress::{deflate, inflate};
pub use config::Config;
pub use error::{Error, Result};
pub use hash::{frame, frame_and_hash, Hash};
pub use index::{Index, IndexEntry, IndexStats, StageOutcome};
pub use object::{Commit, CommitInfo, ObjectKind, StoredObject};
pub use repo::Repo;
pub use workbook::{JsonWorkbookStore, MemoryWorkbookStore, WorkbookStore};
