use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::error::{GradeBookError, Result};
use crate::parallel::WorkerPool;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub name: String,
    pub max_score: i32,
}

/// Ordered task list plus raw scores per student.
///
/// A student's score at position `i` belongs to task `i`. Results are
/// aggregated on a fixed worker pool that lives as long as the grade-book.
#[derive(Debug)]
pub struct GradeBook {
    tasks: Vec<Task>,
    scores: BTreeMap<String, Vec<i32>>,
    workers: WorkerPool,
}

impl GradeBook {
    pub fn new(num_workers: usize) -> Result<Self> {
        Ok(Self {
            tasks: Vec::new(),
            scores: BTreeMap::new(),
            workers: WorkerPool::new(num_workers)?,
        })
    }

    pub fn with_default_workers() -> Result<Self> {
        Self::new(WorkerPool::default_workers())
    }

    pub fn add_task(&mut self, name: impl Into<String>, max_score: i32) {
        self.tasks.push(Task {
            name: name.into(),
            max_score,
        });
    }

    /// Stores `scores` for `student`, replacing any previous record. A batch
    /// holding a negative score is rejected as a whole.
    pub fn add_scores(&mut self, student: impl Into<String>, scores: Vec<i32>) -> Result<()> {
        let student = student.into();

        if let Some((index, &value)) = scores.iter().enumerate().find(|(_, s)| **s < 0) {
            warn!(%student, index, value, "rejecting score batch");
            return Err(GradeBookError::NegativeScore {
                student,
                index,
                value,
            });
        }

        self.scores.insert(student, scores);
        Ok(())
    }

    /// Average of the student's clamped scores over *all* tasks.
    ///
    /// Only the first `min(scores, tasks)` positions are summed, but the
    /// divisor is the total task count, so a partial record is diluted by
    /// the tasks it is missing.
    pub fn calculate_result(&self, student: &str) -> Result<f64> {
        let scores = self
            .scores
            .get(student)
            .ok_or_else(|| GradeBookError::StudentNotFound(student.to_string()))?;

        if self.tasks.is_empty() {
            return Ok(0.0);
        }

        let tasks = &self.tasks;
        let len = scores.len().min(tasks.len());

        let partials = self.workers.sum_chunks(len, |range| {
            range
                .map(|j| i64::from(clamp_score(scores[j], tasks[j].max_score)))
                .sum()
        });

        let total: i64 = partials.iter().sum();
        debug!(student, total, tasks = tasks.len(), "aggregated result");

        Ok(total as f64 / tasks.len() as f64)
    }

    pub fn calculate_all_results(&self) -> Result<BTreeMap<String, f64>> {
        self.scores
            .keys()
            .map(|student| Ok((student.clone(), self.calculate_result(student)?)))
            .collect()
    }

    pub fn get_scores(&self) -> BTreeMap<String, Vec<i32>> {
        self.scores.clone()
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn num_tasks(&self) -> usize {
        self.tasks.len()
    }

    pub fn num_workers(&self) -> usize {
        self.workers.num_workers()
    }

    pub fn get_task_names(&self) -> Vec<String> {
        self.tasks.iter().map(|task| task.name.clone()).collect()
    }

    pub fn get_max_scores(&self) -> Vec<i32> {
        self.tasks.iter().map(|task| task.max_score).collect()
    }

    pub fn get_student_names(&self) -> Vec<String> {
        self.scores.keys().cloned().collect()
    }

    /// Raw stored score of `student` for the first task named `task`.
    pub fn get_score(&self, student: &str, task: &str) -> Result<i32> {
        let task_index = self
            .tasks
            .iter()
            .position(|t| t.name == task)
            .ok_or_else(|| GradeBookError::TaskNotFound(task.to_string()))?;

        let scores = self
            .scores
            .get(student)
            .ok_or_else(|| GradeBookError::StudentNotFound(student.to_string()))?;

        scores
            .get(task_index)
            .copied()
            .ok_or_else(|| GradeBookError::ScoreMissing {
                student: student.to_string(),
                task: task.to_string(),
            })
    }
}

// Negative is checked first, so a negative `max_score` caps positive scores
// at that negative value.
fn clamp_score(score: i32, max_score: i32) -> i32 {
    if score < 0 {
        0
    } else if score > max_score {
        max_score
    } else {
        score
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_book(workers: usize) -> GradeBook {
        let mut book = GradeBook::new(workers).unwrap();
        book.add_task("Task 1", 10);
        book.add_task("Task 2", 8);
        book.add_task("Task 3", 6);
        book.add_scores("Student 1", vec![8, 7, 6]).unwrap();
        book
    }

    #[test]
    fn test_clamp_score() {
        assert_eq!(clamp_score(-3, 10), 0);
        assert_eq!(clamp_score(12, 10), 10);
        assert_eq!(clamp_score(7, 10), 7);
        assert_eq!(clamp_score(5, -2), -2);
        assert_eq!(clamp_score(0, 0), 0);
    }

    #[test]
    fn test_accessors_follow_insertion_order() {
        let book = sample_book(2);

        assert_eq!(book.num_tasks(), 3);
        assert_eq!(book.get_task_names(), vec!["Task 1", "Task 2", "Task 3"]);
        assert_eq!(book.get_max_scores(), vec![10, 8, 6]);
        assert_eq!(book.get_student_names(), vec!["Student 1"]);
        assert_eq!(book.num_workers(), 2);
    }

    #[test]
    fn test_add_scores_overwrites() {
        let mut book = sample_book(1);
        book.add_scores("Student 1", vec![1]).unwrap();

        assert_eq!(book.get_scores()["Student 1"], vec![1]);
    }

    #[test]
    fn test_negative_batch_reports_first_offender() {
        let mut book = sample_book(1);
        let err = book.add_scores("Student 1", vec![3, -1, -5]).unwrap_err();

        match err {
            GradeBookError::NegativeScore {
                student,
                index,
                value,
            } => {
                assert_eq!(student, "Student 1");
                assert_eq!(index, 1);
                assert_eq!(value, -1);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(book.get_scores()["Student 1"], vec![8, 7, 6]);
    }

    #[test]
    fn test_calculate_result_example() {
        let book = sample_book(4);
        assert_eq!(book.calculate_result("Student 1").unwrap(), 7.0);
    }

    #[test]
    fn test_scores_above_max_are_clamped() {
        let mut book = sample_book(2);
        book.add_scores("Student 3", vec![10, 9, 6]).unwrap();

        // 10 + 8 + 6
        assert_eq!(book.calculate_result("Student 3").unwrap(), 8.0);
    }

    #[test]
    fn test_unknown_student_result() {
        let book = sample_book(2);
        assert!(matches!(
            book.calculate_result("Nobody"),
            Err(GradeBookError::StudentNotFound(_))
        ));
        assert_eq!(book.get_student_names().len(), 1);
    }

    #[test]
    fn test_no_tasks_yields_zero() {
        let mut book = GradeBook::new(3).unwrap();
        book.add_scores("Student 1", vec![4, 5]).unwrap();

        assert_eq!(book.calculate_result("Student 1").unwrap(), 0.0);
    }

    #[test]
    fn test_get_score_errors_are_distinct() {
        let mut book = sample_book(1);
        book.add_scores("Student 2", vec![9]).unwrap();

        assert!(matches!(
            book.get_score("Student 1", "Task 9"),
            Err(GradeBookError::TaskNotFound(_))
        ));
        assert!(matches!(
            book.get_score("Nobody", "Task 1"),
            Err(GradeBookError::StudentNotFound(_))
        ));
        assert!(matches!(
            book.get_score("Student 2", "Task 2"),
            Err(GradeBookError::ScoreMissing { .. })
        ));
        assert_eq!(book.get_score("Student 2", "Task 1").unwrap(), 9);
    }

    #[test]
    fn test_get_score_returns_raw_value() {
        let mut book = sample_book(1);
        book.add_scores("Student 3", vec![15]).unwrap();

        assert_eq!(book.get_score("Student 3", "Task 1").unwrap(), 15);
    }

    #[test]
    fn test_duplicate_task_name_uses_first() {
        let mut book = sample_book(1);
        book.add_task("Task 1", 4);
        book.add_scores("Student 2", vec![1, 2, 3, 4]).unwrap();

        assert_eq!(book.get_score("Student 2", "Task 1").unwrap(), 1);
    }

    #[test]
    fn test_calculate_all_results() {
        let mut book = sample_book(3);
        book.add_scores("Student 2", vec![9, 5, 4]).unwrap();

        let results = book.calculate_all_results().unwrap();
        let names: Vec<_> = results.keys().cloned().collect();

        assert_eq!(names, vec!["Student 1", "Student 2"]);
        assert_eq!(results["Student 1"], 7.0);
        assert_eq!(results["Student 2"], 6.0);
    }
}
