pub mod cherry_pick;
pub mod commit;
pub mod log;
pub mod preview;
pub mod reset;
pub mod revert;
pub mod stage;
pub mod status;

mod rollback;

pub use cherry_pick::cherry_pick;
pub use commit::{commit, CommitOutcome};
pub use log::{history, MAX_HISTORY_LIMIT};
pub use preview::{preview_rollback, RollbackKind, RollbackPreview};
pub use reset::{hard_reset, soft_reset, RollbackOutcome};
pub use revert::revert;
pub use stage::{batch_stage, stage, unstage, StageResult};
pub use status::{status, Status};
