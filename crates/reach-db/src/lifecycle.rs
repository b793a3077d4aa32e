//! Job completion and goal crediting.
//!
//! Completing a job and crediting its linked goal commit in a single SQLite
//! transaction: either the status flip, the goal increment, and the ledger
//! row all land, or none of them do. The status write is conditional on the
//! job not already being completed, so a duplicate request (client retry,
//! double click) never credits the goal twice. A `goal_contributions` row
//! keyed by job id backs that guard structurally and doubles as an audit
//! trail for recomputing goal totals by aggregation.

use anyhow::Result;
use thiserror::Error;
use tracing::info;

use crate::Database;
use crate::models::JobRow;
use crate::queries::jobs::query_job;

pub enum CompletionOutcome {
    Completed {
        job: JobRow,
        /// Amount credited to the linked goal. Zero when the job has no
        /// goal or no contribution percent.
        credited: f64,
    },
    /// The job was already completed; nothing was written.
    AlreadyCompleted { job: JobRow },
}

#[derive(Debug, Error)]
pub enum CompleteJobError {
    #[error("job {0} not found")]
    JobNotFound(String),
    /// The job references a goal that no longer exists. The whole
    /// transaction rolls back; the job stays un-completed.
    #[error("goal {goal_id} referenced by job {job_id} does not exist")]
    MissingGoal { job_id: String, goal_id: String },
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

impl Database {
    pub fn complete_job(&self, job_id: &str) -> Result<CompletionOutcome, CompleteJobError> {
        let result: Result<Result<CompletionOutcome, CompleteJobError>> =
            self.with_conn_mut(|conn| {
                let tx = conn.unchecked_transaction()?;

                let Some(job) = query_job(&tx, job_id)? else {
                    return Ok(Err(CompleteJobError::JobNotFound(job_id.to_string())));
                };

                // Idempotency guard: the transition happens at most once.
                let changed = tx.execute(
                    "UPDATE jobs SET status = 'completed', status_in_percent = 100
                     WHERE id = ?1 AND status != 'completed'",
                    [job_id],
                )?;
                if changed == 0 {
                    return Ok(Ok(CompletionOutcome::AlreadyCompleted { job }));
                }

                let mut credited = 0.0;
                if let Some(goal_id) = &job.goal_id {
                    // A dangling goal reference aborts the completion; the
                    // caller hears about it instead of a silent half-write.
                    let goal_exists: bool = tx.query_row(
                        "SELECT COUNT(*) FROM goals WHERE id = ?1",
                        [goal_id],
                        |r| r.get::<_, i64>(0).map(|n| n > 0),
                    )?;
                    if !goal_exists {
                        return Ok(Err(CompleteJobError::MissingGoal {
                            job_id: job.id.clone(),
                            goal_id: goal_id.clone(),
                        }));
                    }

                    // An absent percent contributes nothing; completion
                    // still succeeds.
                    let percent = job.goal_contribution_percent.unwrap_or(0.0);
                    let contribution = job.price * percent / 100.0;
                    if contribution > 0.0 {
                        tx.execute(
                            "UPDATE goals SET current_value = current_value + ?1 WHERE id = ?2",
                            rusqlite::params![contribution, goal_id],
                        )?;
                        tx.execute(
                            "INSERT INTO goal_contributions (job_id, goal_id, amount) VALUES (?1, ?2, ?3)",
                            rusqlite::params![&job.id, goal_id, contribution],
                        )?;
                        credited = contribution;
                    }
                }

                tx.commit()?;

                info!(job_id = %job.id, credited, "job completed");
                Ok(Ok(CompletionOutcome::Completed {
                    job: JobRow {
                        status: "completed".to_string(),
                        status_in_percent: 100.0,
                        ..job
                    },
                    credited,
                }))
            });

        match result {
            Ok(inner) => inner,
            Err(e) => Err(CompleteJobError::Store(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::{CompleteJobError, CompletionOutcome};
    use crate::Database;
    use crate::testutil::{insert_goal, insert_job_with, register_user};

    fn completed(outcome: CompletionOutcome) -> (String, f64) {
        match outcome {
            CompletionOutcome::Completed { job, credited } => (job.status, credited),
            CompletionOutcome::AlreadyCompleted { .. } => panic!("expected a fresh completion"),
        }
    }

    #[test]
    fn completion_without_goal_touches_only_status() {
        let db = Database::open_in_memory().unwrap();
        let business = register_user(&db, "acme", "business");
        let goal = insert_goal(&db, &business, "q3 revenue", 1000.0);
        let job = insert_job_with(&db, &business, "gig", 100.0, None, None);

        let (status, credited) = completed(db.complete_job(&job).unwrap());
        assert_eq!(status, "completed");
        assert_eq!(credited, 0.0);

        // The unrelated goal is untouched.
        assert_eq!(db.get_goal(&goal).unwrap().unwrap().current_value, 0.0);
        let row = db.get_job(&job).unwrap().unwrap();
        assert_eq!(row.status, "completed");
        assert_eq!(row.status_in_percent, 100.0);
    }

    #[test]
    fn completion_credits_price_times_percent() {
        let db = Database::open_in_memory().unwrap();
        let business = register_user(&db, "acme", "business");
        let goal = insert_goal(&db, &business, "q3 revenue", 1000.0);
        let job = insert_job_with(&db, &business, "gig", 80.0, Some(&goal), Some(25.0));

        let (_, credited) = completed(db.complete_job(&job).unwrap());
        assert!((credited - 20.0).abs() < 1e-9);
        let current = db.get_goal(&goal).unwrap().unwrap().current_value;
        assert!((current - 20.0).abs() < 1e-9);
    }

    #[test]
    fn second_completion_does_not_double_credit() {
        let db = Database::open_in_memory().unwrap();
        let business = register_user(&db, "acme", "business");
        let goal = insert_goal(&db, &business, "q3 revenue", 1000.0);
        let job = insert_job_with(&db, &business, "gig", 100.0, Some(&goal), Some(50.0));

        let (_, credited) = completed(db.complete_job(&job).unwrap());
        assert_eq!(credited, 50.0);
        assert_eq!(db.get_goal(&goal).unwrap().unwrap().current_value, 50.0);

        match db.complete_job(&job).unwrap() {
            CompletionOutcome::AlreadyCompleted { job } => assert_eq!(job.status, "completed"),
            CompletionOutcome::Completed { .. } => panic!("completion must be idempotent"),
        }
        assert_eq!(db.get_goal(&goal).unwrap().unwrap().current_value, 50.0);
    }

    #[test]
    fn unknown_job_fails_without_side_effects() {
        let db = Database::open_in_memory().unwrap();
        let business = register_user(&db, "acme", "business");
        let goal = insert_goal(&db, &business, "q3 revenue", 1000.0);

        assert!(matches!(
            db.complete_job("missing"),
            Err(CompleteJobError::JobNotFound(_))
        ));
        assert_eq!(db.get_goal(&goal).unwrap().unwrap().current_value, 0.0);
    }

    #[test]
    fn dangling_goal_rolls_back_the_status_write() {
        let db = Database::open_in_memory().unwrap();
        let business = register_user(&db, "acme", "business");
        let job = insert_job_with(&db, &business, "gig", 100.0, Some("ghost-goal"), Some(50.0));

        assert!(matches!(
            db.complete_job(&job),
            Err(CompleteJobError::MissingGoal { .. })
        ));
        // The job is still open: the status flip rolled back with the rest.
        assert_eq!(db.get_job(&job).unwrap().unwrap().status, "open");
    }

    #[test]
    fn absent_percent_contributes_zero_but_completes() {
        let db = Database::open_in_memory().unwrap();
        let business = register_user(&db, "acme", "business");
        let goal = insert_goal(&db, &business, "q3 revenue", 1000.0);
        let job = insert_job_with(&db, &business, "gig", 100.0, Some(&goal), None);

        let (status, credited) = completed(db.complete_job(&job).unwrap());
        assert_eq!(status, "completed");
        assert_eq!(credited, 0.0);
        assert_eq!(db.get_goal(&goal).unwrap().unwrap().current_value, 0.0);
    }

    #[test]
    fn concurrent_completions_of_distinct_jobs_sum_on_shared_goal() {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let business = register_user(&db, "acme", "business");
        let goal = insert_goal(&db, &business, "q3 revenue", 1000.0);
        let job_a = insert_job_with(&db, &business, "gig a", 100.0, Some(&goal), Some(50.0));
        let job_b = insert_job_with(&db, &business, "gig b", 200.0, Some(&goal), Some(25.0));

        let handles: Vec<_> = [job_a, job_b]
            .into_iter()
            .map(|job| {
                let db = db.clone();
                std::thread::spawn(move || {
                    completed(db.complete_job(&job).unwrap());
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        // 100 * 50% + 200 * 25%
        let current = db.get_goal(&goal).unwrap().unwrap().current_value;
        assert!((current - 100.0).abs() < 1e-9);
    }
}
