pub mod run;
pub mod timeline;

pub use run::{Scheduler, TimelineOp};
