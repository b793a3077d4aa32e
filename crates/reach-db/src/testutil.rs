//! Shared helpers for the query and lifecycle tests.

use crate::Database;
use uuid::Uuid;

pub fn register_user(db: &Database, username: &str, role: &str) -> String {
    let id = Uuid::new_v4().to_string();
    assert!(
        db.create_user(&id, username, "not-a-real-hash", role, "{}")
            .unwrap()
    );
    id
}

pub fn insert_job_with(
    db: &Database,
    owner_id: &str,
    title: &str,
    price: f64,
    goal_id: Option<&str>,
    percent: Option<f64>,
) -> String {
    let id = Uuid::new_v4().to_string();
    db.insert_job(&id, owner_id, title, "test job", price, goal_id, percent)
        .unwrap();
    id
}

pub fn insert_goal(db: &Database, owner_id: &str, name: &str, target: f64) -> String {
    let id = Uuid::new_v4().to_string();
    db.insert_goal(&id, owner_id, name, target).unwrap();
    id
}
