use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::RepositoryError;
use crate::models::category::Category;

const DUPLICATE_NAME: &str = "Category with this name already exists for user";

/// Trait defining category repository operations
#[async_trait]
pub trait CategoryRepository: Send + Sync {
    /// Create a new category
    async fn create(&self, category: Category) -> Result<Category, RepositoryError>;

    /// Find a category by ID
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Category>, RepositoryError>;

    /// Find all categories owned by a user, ordered by name
    async fn find_by_user(&self, user_id: Uuid) -> Result<Vec<Category>, RepositoryError>;

    /// Overwrite name and color of an existing category
    async fn update(&self, category: Category) -> Result<Category, RepositoryError>;

    /// Delete a category by ID; expenses referencing it are left untouched
    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError>;

    /// Insert `defaults` for a user that owns no categories, then return the
    /// user's categories. Does nothing for a user that already has some.
    async fn insert_defaults_if_empty(
        &self,
        user_id: Uuid,
        defaults: &[(&str, &str)],
    ) -> Result<Vec<Category>, RepositoryError>;
}

/// PostgreSQL implementation of CategoryRepository
pub struct PostgresCategoryRepository {
    pool: PgPool,
}

impl PostgresCategoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CategoryRepository for PostgresCategoryRepository {
    async fn create(&self, category: Category) -> Result<Category, RepositoryError> {
        sqlx::query_as::<_, Category>(
            r#"
            INSERT INTO categories (id, user_id, name, color, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, user_id, name, color, created_at, updated_at
            "#,
        )
        .bind(category.id)
        .bind(category.user_id)
        .bind(&category.name)
        .bind(&category.color)
        .bind(category.created_at)
        .bind(category.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| RepositoryError::from_write(e, DUPLICATE_NAME))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Category>, RepositoryError> {
        let category = sqlx::query_as::<_, Category>(
            r#"
            SELECT id, user_id, name, color, created_at, updated_at
            FROM categories
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(category)
    }

    async fn find_by_user(&self, user_id: Uuid) -> Result<Vec<Category>, RepositoryError> {
        let categories = sqlx::query_as::<_, Category>(
            r#"
            SELECT id, user_id, name, color, created_at, updated_at
            FROM categories
            WHERE user_id = $1
            ORDER BY name ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(categories)
    }

    async fn update(&self, category: Category) -> Result<Category, RepositoryError> {
        sqlx::query_as::<_, Category>(
            r#"
            UPDATE categories
            SET name = $2,
                color = $3,
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, user_id, name, color, created_at, updated_at
            "#,
        )
        .bind(category.id)
        .bind(&category.name)
        .bind(&category.color)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepositoryError::from_write(e, DUPLICATE_NAME))?
        .ok_or(RepositoryError::NotFound)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn insert_defaults_if_empty(
        &self,
        user_id: Uuid,
        defaults: &[(&str, &str)],
    ) -> Result<Vec<Category>, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let (existing,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM categories WHERE user_id = $1")
                .bind(user_id)
                .fetch_one(&mut *tx)
                .await?;

        if existing == 0 {
            for (name, color) in defaults {
                // Two concurrent seeds collide on (user_id, name); the loser skips
                sqlx::query(
                    r#"
                    INSERT INTO categories (id, user_id, name, color)
                    VALUES ($1, $2, $3, $4)
                    ON CONFLICT (user_id, name) DO NOTHING
                    "#,
                )
                .bind(Uuid::new_v4())
                .bind(user_id)
                .bind(*name)
                .bind(*color)
                .execute(&mut *tx)
                .await?;
            }
        }

        let categories = sqlx::query_as::<_, Category>(
            r#"
            SELECT id, user_id, name, color, created_at, updated_at
            FROM categories
            WHERE user_id = $1
            ORDER BY name ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(categories)
    }
}
