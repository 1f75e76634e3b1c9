use chrono::{Duration, Utc};
use konvite::{
    domain::models::job::{Job, JOB_REMINDER_1DAY, JOB_REMINDER_7DAY},
    domain::ports::JobRepository,
    infra::repositories::{postgres_job_repo::PostgresJobRepo, sqlite_job_repo::SqliteJobRepo},
};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::ConnectOptions;
use std::collections::HashSet;
use std::str::FromStr;
use std::sync::Arc;
use tokio::task::JoinSet;
use uuid::Uuid;

/// Several workers polling the same Postgres queue must never claim a job twice.
/// Runs only when DATABASE_URL points at Postgres.
#[tokio::test]
async fn test_reminder_queue_claims_each_job_once() {
    let Ok(db_url) = std::env::var("DATABASE_URL") else {
        println!("Skipping concurrency test (DATABASE_URL not set)");
        return;
    };
    if !db_url.starts_with("postgres") {
        println!("Skipping concurrency test (not targeting Postgres)");
        return;
    }

    let opts = PgConnectOptions::from_str(&db_url)
        .unwrap()
        .log_statements(tracing::log::LevelFilter::Debug);
    let pool = PgPoolOptions::new()
        .max_connections(20)
        .connect_with(opts)
        .await
        .unwrap();
    sqlx::migrate!("./migrations/postgres").run(&pool).await.unwrap();

    let repo = Arc::new(PostgresJobRepo::new(pool.clone()));
    // jobs from this run share an event id so cleanup leaves other data alone
    let event_id = format!("concurrency-{}", Uuid::new_v4());

    let total_jobs = 100;
    let now = Utc::now();
    for i in 0..total_jobs {
        let job_type = if i % 2 == 0 { JOB_REMINDER_1DAY } else { JOB_REMINDER_7DAY };
        let execute_at = now - Duration::minutes(1) + Duration::milliseconds(i as i64);
        repo.create(&Job::new(job_type, Uuid::new_v4().to_string(), event_id.clone(), execute_at))
            .await
            .unwrap();
    }

    let worker_count = 10;
    let mut set = JoinSet::new();
    for worker in 0..worker_count {
        let repo = repo.clone();
        let event_id = event_id.clone();
        set.spawn(async move {
            let mut claimed = Vec::new();
            let mut empty_streaks = 0;

            while empty_streaks < 10 {
                let batch = repo.find_pending(5).await.unwrap();
                let ours: Vec<Job> = batch.into_iter().filter(|job| job.payload.event_id == event_id).collect();
                if ours.is_empty() {
                    empty_streaks += 1;
                    tokio::time::sleep(std::time::Duration::from_millis(100)).await;
                } else {
                    empty_streaks = 0;
                    claimed.extend(ours.into_iter().map(|job| job.id));
                }
            }
            println!("Worker {} claimed {} jobs", worker, claimed.len());
            claimed
        });
    }

    let mut all_claimed = Vec::new();
    while let Some(result) = set.join_next().await {
        all_claimed.extend(result.unwrap());
    }
    let unique: HashSet<&String> = all_claimed.iter().collect();

    assert_eq!(unique.len(), all_claimed.len(), "A job was claimed by more than one worker");
    assert_eq!(all_claimed.len(), total_jobs, "Not every job was claimed");

    sqlx::query("DELETE FROM jobs WHERE payload->>'event_id' = $1")
        .bind(&event_id)
        .execute(&pool)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_sqlite_queue_claims_due_jobs_and_honours_cancellation() {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    sqlx::migrate!("./migrations/sqlite").run(&pool).await.unwrap();
    let repo = SqliteJobRepo::new(pool);

    let now = Utc::now();
    let due = Job::new(JOB_REMINDER_1DAY, "rsvp-a".into(), "event-1".into(), now - Duration::minutes(5));
    let cancelled = Job::new(JOB_REMINDER_1DAY, "rsvp-b".into(), "event-1".into(), now - Duration::minutes(5));
    let later = Job::new(JOB_REMINDER_7DAY, "rsvp-a".into(), "event-1".into(), now + Duration::days(3));
    for job in [&due, &cancelled, &later] {
        repo.create(job).await.unwrap();
    }

    assert_eq!(repo.cancel_jobs_for_rsvp("rsvp-b").await.unwrap(), 1);

    let claimed = repo.find_pending(10).await.unwrap();
    assert_eq!(claimed.len(), 1);
    assert_eq!(claimed[0].id, due.id);
    assert_eq!(claimed[0].status, "PROCESSING");

    // a claimed job is not handed out again
    assert!(repo.find_pending(10).await.unwrap().is_empty());

    let for_a = repo.list_for_rsvp("rsvp-a").await.unwrap();
    let statuses: Vec<&str> = for_a.iter().map(|job| job.status.as_str()).collect();
    assert_eq!(statuses, vec!["PROCESSING", "PENDING"]);
}
