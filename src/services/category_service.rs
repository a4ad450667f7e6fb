use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use crate::models::category::{
    Category, CreateCategoryRequest, UpdateCategoryRequest, DEFAULT_CATEGORIES,
    DEFAULT_CATEGORY_COLOR,
};
use crate::repositories::category_repository::CategoryRepository;
use crate::repositories::RepositoryError;

/// Category service errors
#[derive(Debug, thiserror::Error)]
pub enum CategoryError {
    #[error("Category with this name already exists")]
    DuplicateName,

    #[error("Category not found")]
    CategoryNotFound,

    #[error("Unauthorized to access this category")]
    Unauthorized,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<RepositoryError> for CategoryError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::NotFound => CategoryError::CategoryNotFound,
            RepositoryError::ConstraintViolation(_) => CategoryError::DuplicateName,
            RepositoryError::DatabaseError(msg) => CategoryError::DatabaseError(msg),
        }
    }
}

/// Trait defining category service operations
#[async_trait]
pub trait CategoryService: Send + Sync {
    /// List a user's categories ordered by name. Never creates anything.
    async fn list(&self, user_id: Uuid) -> Result<Vec<Category>, CategoryError>;

    /// Create a category for a user
    async fn create(
        &self,
        user_id: Uuid,
        request: CreateCategoryRequest,
    ) -> Result<Category, CategoryError>;

    /// Rename and/or recolor a category the user owns
    async fn update(
        &self,
        user_id: Uuid,
        category_id: Uuid,
        request: UpdateCategoryRequest,
    ) -> Result<Category, CategoryError>;

    /// Delete a category the user owns; its expenses become uncategorized
    async fn delete(&self, user_id: Uuid, category_id: Uuid) -> Result<(), CategoryError>;

    /// Seed the default categories for a user that has none, then list.
    /// Calling it again is a no-op.
    async fn ensure_defaults(&self, user_id: Uuid) -> Result<Vec<Category>, CategoryError>;
}

/// Implementation of CategoryService
pub struct CategoryServiceImpl {
    category_repository: Arc<dyn CategoryRepository>,
}

impl CategoryServiceImpl {
    pub fn new(category_repository: Arc<dyn CategoryRepository>) -> Self {
        Self {
            category_repository,
        }
    }

    /// Fetch a category and check it belongs to `user_id`
    async fn find_owned(
        &self,
        user_id: Uuid,
        category_id: Uuid,
    ) -> Result<Category, CategoryError> {
        let category = self
            .category_repository
            .find_by_id(category_id)
            .await?
            .ok_or(CategoryError::CategoryNotFound)?;

        if category.user_id != user_id {
            tracing::warn!(%user_id, %category_id, "category access denied");
            return Err(CategoryError::Unauthorized);
        }
        Ok(category)
    }
}

/// Trimmed name, rejecting blanks the validator could not see
fn normalized_name(name: &str) -> Result<String, CategoryError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(CategoryError::Validation(
            "name: Name must not be empty".to_string(),
        ));
    }
    Ok(trimmed.to_string())
}

#[async_trait]
impl CategoryService for CategoryServiceImpl {
    async fn list(&self, user_id: Uuid) -> Result<Vec<Category>, CategoryError> {
        Ok(self.category_repository.find_by_user(user_id).await?)
    }

    async fn create(
        &self,
        user_id: Uuid,
        request: CreateCategoryRequest,
    ) -> Result<Category, CategoryError> {
        let now = Utc::now();
        let category = Category {
            id: Uuid::new_v4(),
            user_id,
            name: normalized_name(&request.name)?,
            color: request
                .color
                .unwrap_or_else(|| DEFAULT_CATEGORY_COLOR.to_string()),
            created_at: now,
            updated_at: now,
        };

        let created = self.category_repository.create(category).await?;
        tracing::info!(
            %user_id,
            category_id = %created.id,
            name = %created.name,
            "category created"
        );
        Ok(created)
    }

    async fn update(
        &self,
        user_id: Uuid,
        category_id: Uuid,
        request: UpdateCategoryRequest,
    ) -> Result<Category, CategoryError> {
        let existing = self.find_owned(user_id, category_id).await?;

        let name = match request.name {
            Some(name) => normalized_name(&name)?,
            None => existing.name.clone(),
        };

        let updated = Category {
            name,
            color: request.color.unwrap_or(existing.color.clone()),
            updated_at: Utc::now(),
            ..existing
        };

        let saved = self.category_repository.update(updated).await?;
        tracing::info!(%user_id, %category_id, "category updated");
        Ok(saved)
    }

    async fn delete(&self, user_id: Uuid, category_id: Uuid) -> Result<(), CategoryError> {
        self.find_owned(user_id, category_id).await?;
        self.category_repository.delete(category_id).await?;
        tracing::info!(%user_id, %category_id, "category deleted");
        Ok(())
    }

    async fn ensure_defaults(&self, user_id: Uuid) -> Result<Vec<Category>, CategoryError> {
        let categories = self
            .category_repository
            .insert_defaults_if_empty(user_id, DEFAULT_CATEGORIES)
            .await?;
        tracing::info!(%user_id, count = categories.len(), "default categories ensured");
        Ok(categories)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    // Mock CategoryRepository for testing
    struct MockCategoryRepository {
        categories: Mutex<HashMap<Uuid, Category>>,
        should_fail: bool,
    }

    impl MockCategoryRepository {
        fn new() -> Self {
            Self {
                categories: Mutex::new(HashMap::new()),
                should_fail: false,
            }
        }

        fn with_failure() -> Self {
            Self {
                categories: Mutex::new(HashMap::new()),
                should_fail: true,
            }
        }

        fn name_taken(categories: &HashMap<Uuid, Category>, category: &Category) -> bool {
            categories.values().any(|c| {
                c.id != category.id && c.user_id == category.user_id && c.name == category.name
            })
        }
    }

    #[async_trait]
    impl CategoryRepository for MockCategoryRepository {
        async fn create(&self, category: Category) -> Result<Category, RepositoryError> {
            if self.should_fail {
                return Err(RepositoryError::DatabaseError("Database error".to_string()));
            }

            let mut categories = self.categories.lock().unwrap();
            if Self::name_taken(&categories, &category) {
                return Err(RepositoryError::ConstraintViolation(
                    "Category already exists".to_string(),
                ));
            }

            categories.insert(category.id, category.clone());
            Ok(category)
        }

        async fn find_by_id(&self, id: Uuid) -> Result<Option<Category>, RepositoryError> {
            let categories = self.categories.lock().unwrap();
            Ok(categories.get(&id).cloned())
        }

        async fn find_by_user(&self, user_id: Uuid) -> Result<Vec<Category>, RepositoryError> {
            if self.should_fail {
                return Err(RepositoryError::DatabaseError("Database error".to_string()));
            }

            let categories = self.categories.lock().unwrap();
            let mut owned: Vec<Category> = categories
                .values()
                .filter(|c| c.user_id == user_id)
                .cloned()
                .collect();
            owned.sort_by(|a, b| a.name.cmp(&b.name));
            Ok(owned)
        }

        async fn update(&self, category: Category) -> Result<Category, RepositoryError> {
            let mut categories = self.categories.lock().unwrap();
            if !categories.contains_key(&category.id) {
                return Err(RepositoryError::NotFound);
            }
            if Self::name_taken(&categories, &category) {
                return Err(RepositoryError::ConstraintViolation(
                    "Category already exists".to_string(),
                ));
            }

            categories.insert(category.id, category.clone());
            Ok(category)
        }

        async fn delete(&self, id: Uuid) -> Result<(), RepositoryError> {
            let mut categories = self.categories.lock().unwrap();
            categories
                .remove(&id)
                .map(|_| ())
                .ok_or(RepositoryError::NotFound)
        }

        async fn insert_defaults_if_empty(
            &self,
            user_id: Uuid,
            defaults: &[(&str, &str)],
        ) -> Result<Vec<Category>, RepositoryError> {
            {
                let mut categories = self.categories.lock().unwrap();
                if !categories.values().any(|c| c.user_id == user_id) {
                    for (name, color) in defaults {
                        let category = Category {
                            id: Uuid::new_v4(),
                            user_id,
                            name: name.to_string(),
                            color: color.to_string(),
                            created_at: Utc::now(),
                            updated_at: Utc::now(),
                        };
                        categories.insert(category.id, category);
                    }
                }
            }
            self.find_by_user(user_id).await
        }
    }

    fn create_request(name: &str) -> CreateCategoryRequest {
        CreateCategoryRequest {
            name: name.to_string(),
            color: None,
        }
    }

    #[tokio::test]
    async fn test_create_uses_default_color_and_trims_name() {
        let service = CategoryServiceImpl::new(Arc::new(MockCategoryRepository::new()));
        let user_id = Uuid::new_v4();

        let category = service
            .create(user_id, create_request("  Coffee "))
            .await
            .unwrap();

        assert_eq!(category.name, "Coffee");
        assert_eq!(category.color, DEFAULT_CATEGORY_COLOR);
        assert_eq!(category.user_id, user_id);
    }

    #[tokio::test]
    async fn test_create_duplicate_name_for_same_user() {
        let service = CategoryServiceImpl::new(Arc::new(MockCategoryRepository::new()));
        let user_id = Uuid::new_v4();

        service.create(user_id, create_request("Coffee")).await.unwrap();
        let result = service.create(user_id, create_request("Coffee")).await;
        assert!(matches!(result, Err(CategoryError::DuplicateName)));

        // Another user may reuse the name
        let other = service.create(Uuid::new_v4(), create_request("Coffee")).await;
        assert!(other.is_ok());
    }

    #[tokio::test]
    async fn test_create_blank_name_is_rejected() {
        let service = CategoryServiceImpl::new(Arc::new(MockCategoryRepository::new()));

        let result = service.create(Uuid::new_v4(), create_request("   ")).await;
        assert!(matches!(result, Err(CategoryError::Validation(_))));
    }

    #[tokio::test]
    async fn test_list_has_no_side_effects() {
        let service = CategoryServiceImpl::new(Arc::new(MockCategoryRepository::new()));
        let user_id = Uuid::new_v4();

        let categories = service.list(user_id).await.unwrap();
        assert!(categories.is_empty());
        assert!(service.list(user_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_ensure_defaults_is_idempotent() {
        let service = CategoryServiceImpl::new(Arc::new(MockCategoryRepository::new()));
        let user_id = Uuid::new_v4();

        let first = service.ensure_defaults(user_id).await.unwrap();
        assert_eq!(first.len(), DEFAULT_CATEGORIES.len());
        assert!(first.iter().any(|c| c.name == "Food" && c.color == "#ef4444"));

        let second = service.ensure_defaults(user_id).await.unwrap();
        assert_eq!(second.len(), DEFAULT_CATEGORIES.len());
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_ensure_defaults_skips_user_with_categories() {
        let service = CategoryServiceImpl::new(Arc::new(MockCategoryRepository::new()));
        let user_id = Uuid::new_v4();

        service.create(user_id, create_request("Coffee")).await.unwrap();
        let categories = service.ensure_defaults(user_id).await.unwrap();

        assert_eq!(categories.len(), 1);
        assert_eq!(categories[0].name, "Coffee");
    }

    #[tokio::test]
    async fn test_update_partial_fields() {
        let service = CategoryServiceImpl::new(Arc::new(MockCategoryRepository::new()));
        let user_id = Uuid::new_v4();
        let created = service.create(user_id, create_request("Coffee")).await.unwrap();

        let updated = service
            .update(
                user_id,
                created.id,
                UpdateCategoryRequest {
                    color: Some("#000".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.name, "Coffee");
        assert_eq!(updated.color, "#000");
    }

    #[tokio::test]
    async fn test_update_to_existing_name_is_duplicate() {
        let service = CategoryServiceImpl::new(Arc::new(MockCategoryRepository::new()));
        let user_id = Uuid::new_v4();
        service.create(user_id, create_request("Coffee")).await.unwrap();
        let tea = service.create(user_id, create_request("Tea")).await.unwrap();

        let result = service
            .update(
                user_id,
                tea.id,
                UpdateCategoryRequest {
                    name: Some("Coffee".to_string()),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(result, Err(CategoryError::DuplicateName)));
    }

    #[tokio::test]
    async fn test_update_and_delete_require_ownership() {
        let service = CategoryServiceImpl::new(Arc::new(MockCategoryRepository::new()));
        let owner = Uuid::new_v4();
        let intruder = Uuid::new_v4();
        let created = service.create(owner, create_request("Coffee")).await.unwrap();

        let update = service
            .update(intruder, created.id, UpdateCategoryRequest::default())
            .await;
        assert!(matches!(update, Err(CategoryError::Unauthorized)));

        let delete = service.delete(intruder, created.id).await;
        assert!(matches!(delete, Err(CategoryError::Unauthorized)));

        // Still there for its owner
        assert_eq!(service.list(owner).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_unknown_category() {
        let service = CategoryServiceImpl::new(Arc::new(MockCategoryRepository::new()));

        let result = service.delete(Uuid::new_v4(), Uuid::new_v4()).await;
        assert!(matches!(result, Err(CategoryError::CategoryNotFound)));
    }

    #[tokio::test]
    async fn test_repository_failure_is_database_error() {
        let service = CategoryServiceImpl::new(Arc::new(MockCategoryRepository::with_failure()));

        let result = service.list(Uuid::new_v4()).await;
        assert!(matches!(result, Err(CategoryError::DatabaseError(_))));
    }
}
