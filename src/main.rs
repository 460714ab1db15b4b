use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use gradebook::{GradeBook, SCORE_SENTINEL};

const DEMO_TASKS: [(&str, i32); 3] = [("Task 1", 10), ("Task 2", 8), ("Task 3", 6)];

const DEMO_SCORES: [(&str, [i32; 3]); 4] = [
    ("Student 1", [8, 7, 6]),
    ("Student 2", [9, 5, 4]),
    ("Student 3", [10, 9, 6]),
    ("Student 4", [7, 5, 6]),
];

#[derive(Parser, Debug)]
#[command(name = "gradebook")]
#[command(about = "Record task scores and compute per-student averages in parallel", long_about = None)]
struct Args {
    /// Number of worker threads used to aggregate results
    #[arg(short = 'j', long, default_value_t = 4)]
    threads: usize,

    /// Also print the overall result of every student
    #[arg(short, long)]
    all: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut book = GradeBook::new(args.threads)
        .with_context(|| format!("Failed to create grade-book with {} workers", args.threads))?;
    info!(workers = book.num_workers(), "grade-book ready");

    for (name, max_score) in DEMO_TASKS {
        book.add_task(name, max_score);
    }
    for (student, scores) in DEMO_SCORES {
        if let Err(e) = book.add_scores(student, scores.to_vec()) {
            error!("{e}");
        }
    }

    println!("Number of tasks: {}", book.num_tasks());
    println!("Task names: {}", spaced(book.get_task_names()));
    println!("Maximum scores: {}", spaced(book.get_max_scores()));
    println!("Number of students: {}", book.get_student_names().len());

    for (task, _) in DEMO_TASKS {
        println!(
            "Score for Student 1, {task}: {}",
            score_or_sentinel(&book, "Student 1", task)
        );
    }

    for student in ["Student 1", "Student 2", "Student 3"] {
        print_result(&book, student);
    }

    if args.all {
        let results = book
            .calculate_all_results()
            .context("Failed to aggregate results")?;
        for (student, result) in results {
            println!("Overall result for {student}: {}", format_result(result));
        }
    }

    Ok(())
}

fn score_or_sentinel(book: &GradeBook, student: &str, task: &str) -> i32 {
    book.get_score(student, task).unwrap_or_else(|e| {
        error!("{e}");
        SCORE_SENTINEL
    })
}

fn print_result(book: &GradeBook, student: &str) {
    match book.calculate_result(student) {
        Ok(result) => println!("Overall result for {student}: {}", format_result(result)),
        Err(e) => {
            error!("{e}");
            println!("Overall result for {student}: {SCORE_SENTINEL}");
        }
    }
}

// Each item is followed by a space, trailing one included.
fn spaced<T: ToString>(items: Vec<T>) -> String {
    items.iter().map(|item| item.to_string() + " ").collect()
}

/// Six significant digits with trailing zeros dropped, e.g. `7`, `6.33333`.
fn format_result(value: f64) -> String {
    if value == 0.0 || !value.is_finite() {
        return value.to_string();
    }

    let magnitude = value.abs().log10().floor() as i32;
    let decimals = (5 - magnitude).max(0) as usize;
    let text = format!("{value:.decimals$}");

    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        text
    }
}
