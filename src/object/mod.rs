pub mod commit;
pub mod store;
pub mod tree;

pub use commit::{read_commit, Commit, CommitInfo};
pub use store::{exists, get, object_path, put, sizes, ObjectKind, StoredObject};
pub use tree::{read_tree, walk, TreeEntry, MODE_BLOB, MODE_TREE};
