pub mod error;
pub mod gradebook;
pub mod parallel;

pub use crate::error::{GradeBookError, SCORE_SENTINEL};
pub use crate::gradebook::{GradeBook, Task};
pub use crate::parallel::WorkerPool;
