//! Local tool handlers.

pub mod quiz;
pub mod spam;
pub mod sweep;

pub use quiz::{QuizHandler, QUIZ_TOOL};
pub use spam::{AllowMessage, SpamMessageFilter};
pub use sweep::{MailboxSweep, SweepOutcome, SweepPlan, SweepReport};
