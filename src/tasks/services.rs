use time::OffsetDateTime;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::dto::{ClientTimestamp, CreateTaskRequest, SyncTaskRecord};
use super::repo_types::{NewTask, Task};
use crate::{error::AppError, state::AppState};

fn checked_title(raw: &str) -> Result<String, AppError> {
    let title = raw.trim();
    if title.is_empty() {
        return Err(AppError::InvalidInput("Title must not be empty".into()));
    }
    Ok(title.to_string())
}

fn timestamp(ts: &ClientTimestamp, field: &str) -> Result<OffsetDateTime, AppError> {
    ts.normalize()
        .ok_or_else(|| AppError::InvalidInput(format!("Invalid {field}")))
}

fn note_foreign_owner(user_id: Uuid, supplied: Option<&str>) {
    if let Some(uid) = supplied.filter(|uid| *uid != user_id.to_string()) {
        warn!(%user_id, supplied = %uid, "ignoring client-supplied task owner");
    }
}

pub async fn create_task(
    st: &AppState,
    user_id: Uuid,
    req: CreateTaskRequest,
) -> Result<Task, AppError> {
    note_foreign_owner(user_id, req.uid.as_deref());
    let now = OffsetDateTime::now_utc();
    let task = NewTask {
        title: checked_title(&req.title)?,
        description: req.description,
        due_at: timestamp(&req.due_at, "dueAt")?,
        completed: req.completed,
        created_at: now,
        updated_at: now,
    };
    let task = st.tasks.insert(user_id, task).await?;
    info!(%user_id, task_id = %task.id, "task created");
    Ok(task)
}

pub async fn list_tasks(st: &AppState, user_id: Uuid) -> Result<Vec<Task>, AppError> {
    let tasks = st.tasks.list_by_owner(user_id).await?;
    debug!(%user_id, count = tasks.len(), "tasks listed");
    Ok(tasks)
}

/// Deletes a task only if it belongs to `user_id`.
pub async fn delete_task(st: &AppState, user_id: Uuid, task_id: Uuid) -> Result<(), AppError> {
    if !st.tasks.delete_owned(user_id, task_id).await? {
        warn!(%user_id, %task_id, "delete of missing or foreign task");
        return Err(AppError::NotFound("task"));
    }
    info!(%user_id, %task_id, "task deleted");
    Ok(())
}

fn normalize_record(
    idx: usize,
    rec: SyncTaskRecord,
    now: OffsetDateTime,
) -> Result<NewTask, AppError> {
    let at = |e: AppError| match e {
        AppError::InvalidInput(msg) => AppError::InvalidInput(format!("record {idx}: {msg}")),
        other => other,
    };
    let created_at = match &rec.created_at {
        Some(ts) => timestamp(ts, "createdAt").map_err(at)?,
        None => now,
    };
    let updated_at = match &rec.updated_at {
        Some(ts) => timestamp(ts, "updatedAt").map_err(at)?,
        None => created_at,
    };
    Ok(NewTask {
        title: checked_title(&rec.title).map_err(at)?,
        description: rec.description,
        due_at: timestamp(&rec.due_at, "dueAt").map_err(at)?,
        completed: rec.completed,
        created_at,
        updated_at,
    })
}

/// Commits a client batch under `user_id` as new rows, all or nothing.
///
/// Every record is inserted; client ids are not used for matching, so a
/// repeated sync of the same task produces another row.
pub async fn sync_tasks(
    st: &AppState,
    user_id: Uuid,
    records: Vec<SyncTaskRecord>,
) -> Result<Vec<Task>, AppError> {
    if records.is_empty() {
        debug!(%user_id, "empty sync batch");
        return Ok(Vec::new());
    }

    let now = OffsetDateTime::now_utc();
    let mut batch = Vec::with_capacity(records.len());
    for (idx, rec) in records.into_iter().enumerate() {
        note_foreign_owner(user_id, rec.uid.as_deref());
        batch.push(normalize_record(idx, rec, now)?);
    }

    let committed = st.tasks.insert_batch(user_id, batch).await?;
    info!(%user_id, count = committed.len(), "tasks synced");
    Ok(committed)
}
