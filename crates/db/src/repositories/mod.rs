use async_trait::async_trait;
use thiserror::Error;

use teetime_core::domain::course::{Course, CourseId};
use teetime_core::pipeline::StoreError;

pub mod booking;
pub mod course;
pub mod memory;
pub mod secret;

pub use booking::SqlBookingRepository;
pub use course::SqlCourseRepository;
pub use memory::{InMemoryBookingRepository, InMemoryCourseRepository};
pub use secret::SqlSecretStore;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

impl From<RepositoryError> for StoreError {
    fn from(error: RepositoryError) -> Self {
        StoreError::Backend(error.to_string())
    }
}

/// Read-mostly course catalog, queried by postal code.
#[async_trait]
pub trait CourseRepository: Send + Sync {
    async fn find_by_zip(&self, zip: &str) -> Result<Vec<Course>, RepositoryError>;
    async fn find_by_id(&self, id: &CourseId) -> Result<Option<Course>, RepositoryError>;
    async fn save(&self, course: Course) -> Result<(), RepositoryError>;
}
