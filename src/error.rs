use thiserror::Error;

/// Value printed by the console report in place of a failed score lookup.
pub const SCORE_SENTINEL: i32 = -1;

#[derive(Debug, Error)]
pub enum GradeBookError {
    #[error("negative score {value} at position {index} for {student}; batch rejected")]
    NegativeScore {
        student: String,
        index: usize,
        value: i32,
    },

    #[error("task not found: {0}")]
    TaskNotFound(String),

    #[error("student not found: {0}")]
    StudentNotFound(String),

    #[error("{student} has not completed {task}")]
    ScoreMissing { student: String, task: String },

    #[error("worker count must be at least 1")]
    InvalidWorkerCount,

    #[error("failed to build worker pool")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

pub type Result<T> = std::result::Result<T, GradeBookError>;
