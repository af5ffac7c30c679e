use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    application::pagination::OffsetPage,
    application::repos::{FlagsRepo, FlagsWriteRepo, RepoError},
    domain::entities::{FeatureFlag, NewFeatureFlag},
};

use super::{PostgresRepositories, map_sqlx_error};

#[derive(sqlx::FromRow)]
struct FlagRow {
    id: Uuid,
    code: String,
    name: String,
    description: Option<String>,
    enabled: bool,
}

impl From<FlagRow> for FeatureFlag {
    fn from(row: FlagRow) -> Self {
        Self {
            id: row.id,
            code: row.code,
            name: row.name,
            description: row.description,
            enabled: row.enabled,
        }
    }
}

#[async_trait]
impl FlagsRepo for PostgresRepositories {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<FeatureFlag>, RepoError> {
        let row = sqlx::query_as::<_, FlagRow>(
            r#"
            SELECT id, code, name, description, enabled
            FROM feature_flags
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(FeatureFlag::from))
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<FeatureFlag>, RepoError> {
        let row = sqlx::query_as::<_, FlagRow>(
            r#"
            SELECT id, code, name, description, enabled
            FROM feature_flags
            WHERE code = $1
            "#,
        )
        .bind(code)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(FeatureFlag::from))
    }

    async fn list(&self, page: OffsetPage) -> Result<Vec<FeatureFlag>, RepoError> {
        let skip = i64::try_from(page.skip)
            .map_err(|_| RepoError::InvalidInput {
                message: "skip exceeds supported range".to_string(),
            })?;

        let rows = sqlx::query_as::<_, FlagRow>(
            r#"
            SELECT id, code, name, description, enabled
            FROM feature_flags
            ORDER BY created_at, id
            OFFSET $1
            LIMIT $2
            "#,
        )
        .bind(skip)
        .bind(i64::from(page.limit))
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(FeatureFlag::from).collect())
    }
}

#[async_trait]
impl FlagsWriteRepo for PostgresRepositories {
    async fn insert(&self, flag: NewFeatureFlag) -> Result<Uuid, RepoError> {
        let id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO feature_flags (code, name, description, enabled)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(&flag.code)
        .bind(&flag.name)
        .bind(&flag.description)
        .bind(flag.enabled)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(id)
    }

    async fn update(&self, flag: &FeatureFlag) -> Result<(), RepoError> {
        let result = sqlx::query(
            r#"
            UPDATE feature_flags
            SET code = $2,
                name = $3,
                description = $4,
                enabled = $5,
                updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(flag.id)
        .bind(&flag.code)
        .bind(&flag.name)
        .bind(&flag.description)
        .bind(flag.enabled)
        .execute(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let result = sqlx::query("DELETE FROM feature_flags WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}
