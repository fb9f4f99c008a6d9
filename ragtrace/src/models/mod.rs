mod check;
mod job;
mod submission;
mod trace;

pub use check::*;
pub use job::*;
pub use submission::*;
pub use trace::*;
