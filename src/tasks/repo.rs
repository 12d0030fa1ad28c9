use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::error::StoreError;
use crate::tasks::repo_types::{NewTask, Task};

const TASK_COLUMNS: &str =
    "id, uid, title, description, due_at, completed, created_at, updated_at";

// 8 binds per row keeps each statement well below the 65535 parameter cap.
const INSERT_CHUNK: usize = 1000;

/// Task store. Every query is scoped by owner.
#[async_trait]
pub trait TaskRepo: Send + Sync {
    async fn insert(&self, owner: Uuid, task: NewTask) -> Result<Task, StoreError>;
    async fn list_by_owner(&self, owner: Uuid) -> Result<Vec<Task>, StoreError>;
    /// `Ok(false)` when no task with this id belongs to `owner`.
    async fn delete_owned(&self, owner: Uuid, id: Uuid) -> Result<bool, StoreError>;
    /// All rows are committed or none are.
    async fn insert_batch(&self, owner: Uuid, tasks: Vec<NewTask>)
        -> Result<Vec<Task>, StoreError>;
}

pub struct PgTaskRepo {
    db: PgPool,
}

impl PgTaskRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl TaskRepo for PgTaskRepo {
    async fn insert(&self, owner: Uuid, task: NewTask) -> Result<Task, StoreError> {
        let row = sqlx::query_as::<_, Task>(&format!(
            r#"
            INSERT INTO tasks (id, uid, title, description, due_at, completed, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {TASK_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(owner)
        .bind(task.title)
        .bind(task.description)
        .bind(task.due_at)
        .bind(task.completed)
        .bind(task.created_at)
        .bind(task.updated_at)
        .fetch_one(&self.db)
        .await?;
        Ok(row)
    }

    async fn list_by_owner(&self, owner: Uuid) -> Result<Vec<Task>, StoreError> {
        let rows = sqlx::query_as::<_, Task>(&format!(
            r#"
            SELECT {TASK_COLUMNS}
            FROM tasks
            WHERE uid = $1
            ORDER BY created_at ASC, id ASC
            "#
        ))
        .bind(owner)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn delete_owned(&self, owner: Uuid, id: Uuid) -> Result<bool, StoreError> {
        let res = sqlx::query("DELETE FROM tasks WHERE id = $1 AND uid = $2")
            .bind(id)
            .bind(owner)
            .execute(&self.db)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    async fn insert_batch(
        &self,
        owner: Uuid,
        tasks: Vec<NewTask>,
    ) -> Result<Vec<Task>, StoreError> {
        let mut tx = self.db.begin().await?;
        let mut out = Vec::with_capacity(tasks.len());
        for chunk in tasks.chunks(INSERT_CHUNK) {
            let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
                "INSERT INTO tasks (id, uid, title, description, due_at, completed, created_at, updated_at) ",
            );
            qb.push_values(chunk, |mut row, t| {
                row.push_bind(Uuid::new_v4())
                    .push_bind(owner)
                    .push_bind(t.title.as_str())
                    .push_bind(t.description.as_str())
                    .push_bind(t.due_at)
                    .push_bind(t.completed)
                    .push_bind(t.created_at)
                    .push_bind(t.updated_at);
            });
            qb.push(" RETURNING ");
            qb.push(TASK_COLUMNS);
            let rows = qb.build_query_as::<Task>().fetch_all(&mut *tx).await?;
            out.extend(rows);
        }
        tx.commit().await?;
        Ok(out)
    }
}
