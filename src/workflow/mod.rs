pub mod reveal_board;
pub mod run_ctx;
pub mod stage_tracker;

pub use reveal_board::{group_by_category, RevealBoard};
pub use run_ctx::RunCtx;
pub use stage_tracker::{PipelineStage, StageStatus, StageTracker, TransitionError};
