use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{Template, TemplateVersion};
use crate::storage::StoredFile;

const TEMPLATE_FILTER: &str = "WHERE ($1::TEXT IS NULL OR name ILIKE $1 OR description ILIKE $1)
      AND ($2::TEXT IS NULL OR category = $2)";

pub struct TemplateMeta<'a> {
    pub name: &'a str,
    pub description: Option<&'a str>,
    pub category: &'a str,
}

/// Creates the template and its first version row together.
pub async fn create(
    pool: &PgPool,
    meta: &TemplateMeta<'_>,
    file: &StoredFile,
    created_by: Uuid,
) -> Result<Template, sqlx::Error> {
    let mut tx = pool.begin().await?;
    let template = sqlx::query_as::<_, Template>(
        "INSERT INTO templates
            (name, description, category, file_name, file_path, file_type, file_size, created_by, updated_by)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8) RETURNING *",
    )
    .bind(meta.name)
    .bind(meta.description)
    .bind(meta.category)
    .bind(&file.file_name)
    .bind(&file.file_path)
    .bind(&file.mime_type)
    .bind(file.file_size)
    .bind(created_by)
    .fetch_one(&mut *tx)
    .await?;
    insert_version(&mut *tx, template.id, 1, file, created_by).await?;
    tx.commit().await?;
    Ok(template)
}

async fn insert_version(
    tx: &mut sqlx::PgConnection,
    template_id: Uuid,
    version: i32,
    file: &StoredFile,
    created_by: Uuid,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO template_versions (template_id, version, file_name, file_path, file_size, created_by)
         VALUES ($1, $2, $3, $4, $5, $6)",
    )
    .bind(template_id)
    .bind(version)
    .bind(&file.file_name)
    .bind(&file.file_path)
    .bind(file.file_size)
    .bind(created_by)
    .execute(&mut *tx)
    .await?;
    Ok(())
}

/// Points the template at a new file and records it as the next version.
pub async fn add_version(
    pool: &PgPool,
    id: Uuid,
    file: &StoredFile,
    updated_by: Uuid,
) -> Result<Option<Template>, sqlx::Error> {
    let mut tx = pool.begin().await?;
    let template = sqlx::query_as::<_, Template>(
        "UPDATE templates SET file_name = $2, file_path = $3, file_type = $4, file_size = $5,
            version = version + 1, updated_by = $6, updated_at = now()
         WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(&file.file_name)
    .bind(&file.file_path)
    .bind(&file.mime_type)
    .bind(file.file_size)
    .bind(updated_by)
    .fetch_optional(&mut *tx)
    .await?;

    let Some(template) = template else {
        tx.rollback().await?;
        return Ok(None);
    };
    insert_version(&mut *tx, id, template.version, file, updated_by).await?;
    tx.commit().await?;
    Ok(Some(template))
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Template>, sqlx::Error> {
    sqlx::query_as::<_, Template>("SELECT * FROM templates WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn list(
    pool: &PgPool,
    search: Option<&str>,
    category: Option<&str>,
    limit: i64,
    offset: i64,
) -> Result<Vec<Template>, sqlx::Error> {
    sqlx::query_as::<_, Template>(&format!(
        "SELECT * FROM templates {TEMPLATE_FILTER} ORDER BY updated_at DESC LIMIT $3 OFFSET $4"
    ))
    .bind(search)
    .bind(category)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
}

pub async fn count(
    pool: &PgPool,
    search: Option<&str>,
    category: Option<&str>,
) -> Result<i64, sqlx::Error> {
    let row: (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM templates {TEMPLATE_FILTER}"))
        .bind(search)
        .bind(category)
        .fetch_one(pool)
        .await?;
    Ok(row.0)
}

pub async fn update_meta(
    pool: &PgPool,
    id: Uuid,
    meta: &TemplateMeta<'_>,
    updated_by: Uuid,
) -> Result<Template, sqlx::Error> {
    sqlx::query_as::<_, Template>(
        "UPDATE templates SET name = $2, description = $3, category = $4, updated_by = $5,
            updated_at = now()
         WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(meta.name)
    .bind(meta.description)
    .bind(meta.category)
    .bind(updated_by)
    .fetch_one(pool)
    .await
}

pub async fn versions(pool: &PgPool, id: Uuid) -> Result<Vec<TemplateVersion>, sqlx::Error> {
    sqlx::query_as::<_, TemplateVersion>(
        "SELECT * FROM template_versions WHERE template_id = $1 ORDER BY version DESC",
    )
    .bind(id)
    .fetch_all(pool)
    .await
}

/// Deletes the template and returns the file paths of every version for cleanup.
pub async fn delete(pool: &PgPool, id: Uuid) -> Result<Option<Vec<String>>, sqlx::Error> {
    let mut tx = pool.begin().await?;
    let paths: Vec<String> =
        sqlx::query_scalar("SELECT file_path FROM template_versions WHERE template_id = $1")
            .bind(id)
            .fetch_all(&mut *tx)
            .await?;
    let result = sqlx::query("DELETE FROM templates WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    if result.rows_affected() == 0 {
        tx.rollback().await?;
        return Ok(None);
    }
    tx.commit().await?;
    Ok(Some(paths))
}
