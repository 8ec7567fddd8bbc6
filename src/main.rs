//! cellar CLI - cell-granular version control for spreadsheet workbooks

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use cellar::{
    ops, CellRef, Hash, JsonWorkbookStore, ObjectKind, Repo, WorkbookStore,
};

#[derive(Parser)]
#[command(name = "cellar")]
#[command(about = "cell-granular version control store for spreadsheet workbooks")]
#[command(version)]
struct Cli {
    /// repository path
    #[arg(short, long, default_value = ".")]
    repo: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// initialize a new repository
    Init {
        /// path to create the repository at
        #[arg(default_value = ".")]
        path: PathBuf,
    },

    /// write a cell value into the workbook store
    SetCell {
        workbook: String,
        sheet: u32,
        row: String,
        col: u32,
        value: String,
    },

    /// print a cell value from the workbook store
    GetCell {
        workbook: String,
        sheet: u32,
        row: String,
        col: u32,
    },

    /// stage the current value of a cell
    Stage {
        workbook: String,
        sheet: u32,
        row: String,
        col: u32,
    },

    /// remove a cell from the staging area
    Unstage {
        workbook: String,
        sheet: u32,
        row: String,
        col: u32,
    },

    /// record the staged changes as a new commit
    Commit {
        /// commit message
        #[arg(short, long)]
        message: String,

        /// author name
        #[arg(short, long)]
        author: String,

        /// author email
        #[arg(short, long)]
        email: String,
    },

    /// show the staging area and the current head
    Status,

    /// show commit history
    Log {
        /// maximum number of commits to show
        #[arg(short = 'n', long, default_value_t = 10)]
        max_count: usize,
    },

    /// move the current branch to an earlier commit
    Reset {
        /// target commit hash
        commit: String,

        /// also rewrite the staging area and workbook store
        #[arg(long)]
        hard: bool,
    },

    /// create a commit undoing an earlier commit
    Revert {
        /// commit to revert
        commit: String,

        /// author name
        #[arg(short, long)]
        author: String,

        /// author email
        #[arg(short, long)]
        email: String,
    },

    /// replay an earlier commit's snapshot on top of HEAD
    CherryPick {
        /// commit to pick
        commit: String,

        /// author name
        #[arg(short, long)]
        author: String,

        /// author email
        #[arg(short, long)]
        email: String,
    },

    /// describe what a rollback would touch without performing it
    Preview {
        /// target commit hash
        commit: String,

        /// rollback kind: hard_reset, soft_reset, revert, cherry_pick
        kind: String,
    },

    /// show contents of an object
    CatFile {
        /// object type (blob, tree, commit)
        object_type: String,

        /// object hash
        object: String,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("error: {}", e);
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn run(cli: Cli) -> cellar::Result<()> {
    let workbooks = JsonWorkbookStore::open(cli.repo.join("workbooks.json"));

    match cli.command {
        Commands::Init { path } => {
            Repo::init(&path)?;
            println!("initialized cellar repository at {}", path.display());
        }

        Commands::SetCell {
            workbook,
            sheet,
            row,
            col,
            value,
        } => {
            let cell = CellRef::new(workbook, sheet, &row, col)?;
            workbooks.write_cell(
                &cell.workbook_id,
                cell.sheet_number,
                &cell.row_letters,
                cell.col_number,
                &value,
            )?;
            println!("{} = {}", cell, value);
        }

        Commands::GetCell {
            workbook,
            sheet,
            row,
            col,
        } => {
            let cell = CellRef::new(workbook, sheet, &row, col)?;
            let value = workbooks.read_cell(
                &cell.workbook_id,
                cell.sheet_number,
                &cell.row_letters,
                cell.col_number,
            )?;
            println!("{}", value);
        }

        Commands::Stage {
            workbook,
            sheet,
            row,
            col,
        } => {
            let repo = Repo::open(&cli.repo)?;
            let cell = CellRef::new(workbook, sheet, &row, col)?;
            let result = ops::stage(&repo, &workbooks, &cell)?;
            println!(
                "{} {} (blob {}, {} -> {} bytes)",
                result.outcome.as_str(),
                result.cell_address,
                result.blob_hash,
                result.original_size,
                result.compressed_size
            );
        }

        Commands::Unstage {
            workbook,
            sheet,
            row,
            col,
        } => {
            let repo = Repo::open(&cli.repo)?;
            let cell = CellRef::new(workbook, sheet, &row, col)?;
            if ops::unstage(&repo, &cell)? {
                println!("unstaged {}", cell);
            } else {
                println!("{} was not staged", cell);
            }
        }

        Commands::Commit {
            message,
            author,
            email,
        } => {
            let repo = Repo::open(&cli.repo)?;
            let outcome = ops::commit(&repo, &message, &author, &email)?;
            let branch = outcome.branch.unwrap_or_else(|| "HEAD".to_string());
            println!(
                "[{}] {} ({} cells)",
                branch, outcome.commit_hash, outcome.staged_files
            );
        }

        Commands::Status => {
            let repo = Repo::open(&cli.repo)?;
            let status = ops::status(&repo)?;

            match &status.last_commit {
                Some(last) => println!("HEAD: {} ({})", last.hash, first_line(&last.message)),
                None => println!("HEAD: (no commits yet)"),
            }

            if status.clean {
                println!("nothing staged, working tree clean");
            } else {
                println!("staged changes ({}):", status.staged);
                for entry in &status.staged_files {
                    println!("  {}  {}", entry.blob_hash, entry.tree_path());
                }
                let stats = repo.index().stats();
                println!(
                    "{} -> {} bytes staged ({:.0}% of original)",
                    stats.total_original_size,
                    stats.total_compressed_size,
                    stats.compression_ratio() * 100.0
                );
            }
        }

        Commands::Log { max_count } => {
            let repo = Repo::open(&cli.repo)?;
            for entry in ops::history(&repo, max_count)? {
                println!("{}", entry);
            }
        }

        Commands::Reset { commit, hard } => {
            let repo = Repo::open(&cli.repo)?;
            let target = Hash::from_hex(&commit)?;
            let outcome = if hard {
                ops::hard_reset(&repo, &workbooks, &target)?
            } else {
                ops::soft_reset(&repo, &target)?
            };
            println!(
                "{} to {} ({} paths affected)",
                outcome.operation,
                outcome.target,
                outcome.affected_paths.len()
            );
        }

        Commands::Revert {
            commit,
            author,
            email,
        } => {
            let repo = Repo::open(&cli.repo)?;
            let target = Hash::from_hex(&commit)?;
            let outcome = ops::revert(&repo, &target, &author, &email)?;
            println!("created revert commit {}", outcome.target);
        }

        Commands::CherryPick {
            commit,
            author,
            email,
        } => {
            let repo = Repo::open(&cli.repo)?;
            let target = Hash::from_hex(&commit)?;
            let outcome = ops::cherry_pick(&repo, &target, &author, &email)?;
            println!("created cherry-pick commit {}", outcome.target);
        }

        Commands::Preview { commit, kind } => {
            let repo = Repo::open(&cli.repo)?;
            let target = Hash::from_hex(&commit)?;
            let kind = kind.parse()?;
            let preview = ops::preview_rollback(&repo, &target, kind)?;

            match &preview.current {
                Some(current) => println!("current: {}", current.hash),
                None => println!("current: (none)"),
            }
            println!("target:  {}", preview.target.hash);
            println!(
                "{} paths affected{}",
                preview.affected_paths.len(),
                if preview.destructive {
                    " (destructive)"
                } else {
                    ""
                }
            );
            for path in &preview.affected_paths {
                println!("  {}", path);
            }
        }

        Commands::CatFile {
            object_type,
            object,
        } => {
            let repo = Repo::open(&cli.repo)?;
            let hash = Hash::from_hex(&object)?;
            let (kind, payload) = cellar::object::get(&repo, &hash)?;

            if ObjectKind::try_from(object_type.as_str())? != kind {
                return Err(cellar::Error::InvalidObjectType(format!(
                    "object {} is a {}",
                    hash,
                    kind.as_str()
                )));
            }

            match kind {
                ObjectKind::Blob => {
                    io::stdout()
                        .write_all(&payload)
                        .map_err(|source| cellar::Error::Io {
                            path: "<stdout>".into(),
                            source,
                        })?;
                }
                ObjectKind::Tree => {
                    for entry in cellar::object::tree::parse(&payload, &hash)? {
                        println!("{} {} {}", entry.mode, entry.hash, entry.name);
                    }
                }
                ObjectKind::Commit => {
                    let commit = cellar::object::commit::parse(&payload, &hash)?;
                    println!("tree {}", commit.tree);
                    if let Some(parent) = commit.parent {
                        println!("parent {}", parent);
                    }
                    println!("author {}", commit.author);
                    println!("committer {}", commit.committer);
                    println!();
                    println!("{}", commit.message);
                }
            }
        }
    }

    Ok(())
}

fn first_line(message: &str) -> &str {
    message.lines().next().unwrap_or("")
}
