use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::error::{Error, IoResultExt, Result};
use crate::hash::Hash;
use crate::index::Index;

/// a cellar repository
///
/// the single handle to the `.VCS/` directory; all object, ref, and index
/// paths are derived from it rather than rebuilt at call sites
pub struct Repo {
    root: PathBuf,
    config: Config,
    index: Index,
}

impl Repo {
    /// initialize a new repository at the given path
    pub fn init(path: &Path) -> Result<Self> {
        let vcs_dir = path.join(".VCS");
        if vcs_dir.exists() {
            return Err(Error::RepoExists(path.to_path_buf()));
        }

        fs::create_dir_all(vcs_dir.join("objects")).with_path(&vcs_dir)?;
        fs::create_dir_all(vcs_dir.join("refs/heads")).with_path(&vcs_dir)?;

        let config = Config::default();
        config.save(&vcs_dir.join("config.toml"))?;

        // HEAD starts attached to the default branch; the branch file itself
        // only appears with the first commit
        let head_path = vcs_dir.join("HEAD");
        fs::write(
            &head_path,
            format!("ref: refs/heads/{}\n", config.default_branch),
        )
        .with_path(&head_path)?;

        let index = Index::create(vcs_dir.join("index"))?;

        Ok(Self {
            root: path.to_path_buf(),
            config,
            index,
        })
    }

    /// open an existing repository
    pub fn open(path: &Path) -> Result<Self> {
        let vcs_dir = path.join(".VCS");
        if !vcs_dir.join("HEAD").exists() {
            return Err(Error::NoRepo(path.to_path_buf()));
        }

        let config_path = vcs_dir.join("config.toml");
        let config = if config_path.exists() {
            Config::load(&config_path)?
        } else {
            Config::default()
        };

        let index = Index::open(vcs_dir.join("index"));

        Ok(Self {
            root: path.to_path_buf(),
            config,
            index,
        })
    }

    /// repository root path (the directory containing `.VCS/`)
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// repository configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// the staging index
    pub fn index(&self) -> &Index {
        &self.index
    }

    /// path to the `.VCS` directory
    pub fn vcs_dir(&self) -> PathBuf {
        self.root.join(".VCS")
    }

    /// path to the objects directory
    pub fn objects_path(&self) -> PathBuf {
        self.vcs_dir().join("objects")
    }

    /// path to the branch heads directory
    pub fn heads_path(&self) -> PathBuf {
        self.vcs_dir().join("refs/heads")
    }

    /// path to the HEAD file
    pub fn head_path(&self) -> PathBuf {
        self.vcs_dir().join("HEAD")
    }

    /// the commit HEAD currently resolves to, if any
    ///
    /// attached HEAD follows the branch file (absent branch file means no
    /// commits yet); detached HEAD holds the hash directly
    pub fn read_head(&self) -> Result<Option<Hash>> {
        let head_path = self.head_path();
        let content = match fs::read_to_string(&head_path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(Error::Io {
                    path: head_path,
                    source,
                })
            }
        };
        let content = content.trim();

        if let Some(ref_path) = content.strip_prefix("ref: ") {
            let branch_file = self.vcs_dir().join(ref_path);
            match fs::read_to_string(&branch_file) {
                Ok(hex) => Ok(Some(Hash::from_hex(hex.trim())?)),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
                Err(source) => Err(Error::Io {
                    path: branch_file,
                    source,
                }),
            }
        } else if content.is_empty() {
            Ok(None)
        } else {
            Ok(Some(Hash::from_hex(content)?))
        }
    }

    /// name of the branch HEAD is attached to, or None when detached
    pub fn current_branch(&self) -> Result<Option<String>> {
        let head_path = self.head_path();
        let content = match fs::read_to_string(&head_path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(Error::Io {
                    path: head_path,
                    source,
                })
            }
        };
        Ok(content
            .trim()
            .strip_prefix("ref: refs/heads/")
            .map(|name| name.to_string()))
    }

    /// read a branch ref
    pub fn read_branch(&self, name: &str) -> Result<Option<Hash>> {
        let branch_path = self.heads_path().join(name);
        match fs::read_to_string(&branch_path) {
            Ok(hex) => Ok(Some(Hash::from_hex(hex.trim())?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(Error::Io {
                path: branch_path,
                source,
            }),
        }
    }

    /// write a branch ref (create or update)
    pub fn write_branch(&self, name: &str, hash: &Hash) -> Result<()> {
        let branch_path = self.heads_path().join(name);
        if let Some(parent) = branch_path.parent() {
            fs::create_dir_all(parent).with_path(parent)?;
        }
        write_atomic(&branch_path, format!("{}\n", hash.to_hex()).as_bytes())
    }

    /// move the current head: through the attached branch, or directly into
    /// HEAD when detached
    pub fn advance_head(&self, hash: &Hash) -> Result<()> {
        match self.current_branch()? {
            Some(branch) => self.write_branch(&branch, hash),
            None => write_atomic(&self.head_path(), format!("{}\n", hash.to_hex()).as_bytes()),
        }
    }
}

/// write a small file atomically: uuid-suffixed sibling, fsync, rename
pub(crate) fn write_atomic(path: &Path, content: &[u8]) -> Result<()> {
    let tmp_path = path.with_extension(format!("tmp.{}", uuid::Uuid::new_v4()));
    {
        let mut tmp_file = File::create(&tmp_path).with_path(&tmp_path)?;
        tmp_file.write_all(content).with_path(&tmp_path)?;
        tmp_file.sync_all().with_path(&tmp_path)?;
    }
    fs::rename(&tmp_path, path).with_path(path)?;
    Ok(())
}
