use chrono::Utc;
use rusqlite::OptionalExtension;

use crate::db::Database;
use crate::error::ServerError;
use crate::models::{AgentSpec, UseCase};

#[derive(Clone)]
pub struct UseCaseStore {
    db: Database,
}

impl UseCaseStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn save(&self, use_case: &UseCase) -> Result<(), ServerError> {
        let uc = use_case.clone();
        self.db
            .with_conn_async(move |conn| {
                conn.execute(
                    "INSERT INTO use_cases (id, description, created_at, updated_at)
                     VALUES (?1, ?2, ?3, ?4)
                     ON CONFLICT(id) DO UPDATE SET
                       description = excluded.description,
                       updated_at = excluded.updated_at",
                    rusqlite::params![
                        uc.id,
                        uc.description,
                        uc.created_at.timestamp_millis(),
                        uc.updated_at.timestamp_millis(),
                    ],
                )?;
                Ok(())
            })
            .await
    }

    pub async fn get(&self, id: &str) -> Result<Option<UseCase>, ServerError> {
        let id = id.to_string();
        self.db
            .with_conn_async(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, description, created_at, updated_at
                     FROM use_cases WHERE id = ?1",
                )?;
                stmt.query_row(rusqlite::params![id], |row| Ok(row_to_use_case(row)))
                    .optional()
            })
            .await
    }

    pub async fn list(&self) -> Result<Vec<UseCase>, ServerError> {
        self.db
            .with_conn_async(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, description, created_at, updated_at
                     FROM use_cases ORDER BY created_at DESC",
                )?;
                let rows = stmt
                    .query_map([], |row| Ok(row_to_use_case(row)))?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await
    }

    pub async fn delete(&self, id: &str) -> Result<(), ServerError> {
        let id = id.to_string();
        self.db
            .with_conn_async(move |conn| {
                conn.execute("DELETE FROM use_cases WHERE id = ?1", rusqlite::params![id])?;
                Ok(())
            })
            .await
    }

    /// Persist a use case's roster, in order. The roster is immutable once
    /// fixed, so any previous rows for the use case are replaced wholesale.
    pub async fn save_roster(
        &self,
        use_case_id: &str,
        roster: &[AgentSpec],
    ) -> Result<(), ServerError> {
        let uc_id = use_case_id.to_string();
        let specs = roster.to_vec();
        let now = Utc::now().timestamp_millis();
        self.db
            .with_conn_async(move |conn| {
                conn.execute(
                    "DELETE FROM agent_specs WHERE use_case_id = ?1",
                    rusqlite::params![uc_id],
                )?;
                let mut stmt = conn.prepare(
                    "INSERT INTO agent_specs (id, use_case_id, role, responsibilities, position, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                )?;
                for (position, spec) in specs.iter().enumerate() {
                    stmt.execute(rusqlite::params![
                        uuid::Uuid::new_v4().to_string(),
                        uc_id,
                        spec.role,
                        spec.responsibilities,
                        position as i64,
                        now,
                    ])?;
                }
                Ok(())
            })
            .await
    }

    /// Load a use case's roster in its original order.
    pub async fn load_roster(&self, use_case_id: &str) -> Result<Vec<AgentSpec>, ServerError> {
        let uc_id = use_case_id.to_string();
        self.db
            .with_conn_async(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT role, responsibilities FROM agent_specs
                     WHERE use_case_id = ?1 ORDER BY position ASC",
                )?;
                let rows = stmt
                    .query_map(rusqlite::params![uc_id], |row| {
                        Ok(AgentSpec {
                            role: row.get(0)?,
                            responsibilities: row.get(1)?,
                        })
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await
    }
}

use rusqlite::Row;

fn row_to_use_case(row: &Row<'_>) -> UseCase {
    let created_ms: i64 = row.get(2).unwrap_or(0);
    let updated_ms: i64 = row.get(3).unwrap_or(0);

    UseCase {
        id: row.get(0).unwrap_or_default(),
        description: row.get(1).unwrap_or_default(),
        created_at: chrono::DateTime::from_timestamp_millis(created_ms)
            .unwrap_or_else(Utc::now),
        updated_at: chrono::DateTime::from_timestamp_millis(updated_ms)
            .unwrap_or_else(Utc::now),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store() -> UseCaseStore {
        UseCaseStore::new(Database::open_in_memory().unwrap())
    }

    #[tokio::test]
    async fn test_save_get_delete_round_trip() {
        let store = store().await;
        let uc = UseCase::new("uc-1".to_string(), "barbershop scheduling bot".to_string());

        store.save(&uc).await.unwrap();
        let loaded = store.get("uc-1").await.unwrap().unwrap();
        assert_eq!(loaded.description, "barbershop scheduling bot");

        store.delete("uc-1").await.unwrap();
        assert!(store.get("uc-1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_roster_round_trip_preserves_order() {
        let store = store().await;
        let uc = UseCase::new("uc-1".to_string(), "demo".to_string());
        store.save(&uc).await.unwrap();

        let roster = vec![
            AgentSpec::new("Intake", "collect details"),
            AgentSpec::new("Scheduler", "propose slots"),
            AgentSpec::new("Closer", "confirm and wrap up"),
        ];
        store.save_roster("uc-1", &roster).await.unwrap();

        let loaded = store.load_roster("uc-1").await.unwrap();
        assert_eq!(loaded, roster);
    }

    #[tokio::test]
    async fn test_deleting_a_use_case_cascades_to_its_roster() {
        let store = store().await;
        let uc = UseCase::new("uc-1".to_string(), "demo".to_string());
        store.save(&uc).await.unwrap();
        store
            .save_roster("uc-1", &[AgentSpec::new("Solo", "everything")])
            .await
            .unwrap();

        store.delete("uc-1").await.unwrap();
        assert!(store.load_roster("uc-1").await.unwrap().is_empty());
    }
}
