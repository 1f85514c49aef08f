use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use teetime_core::domain::course::{Course, CourseId};

use super::{CourseRepository, RepositoryError};
use crate::DbPool;

pub struct SqlCourseRepository {
    pool: DbPool,
}

impl SqlCourseRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CourseRepository for SqlCourseRepository {
    async fn find_by_zip(&self, zip: &str) -> Result<Vec<Course>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, name, zip, rating, tags_json, available_times_json
             FROM course INDEXED BY idx_course_zip
             WHERE zip = ?
             ORDER BY name",
        )
        .bind(zip.trim())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(course_from_row).collect()
    }

    async fn find_by_id(&self, id: &CourseId) -> Result<Option<Course>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, name, zip, rating, tags_json, available_times_json FROM course WHERE id = ?",
        )
        .bind(&id.0)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(course_from_row).transpose()
    }

    async fn save(&self, course: Course) -> Result<(), RepositoryError> {
        let tags_json = serde_json::to_string(&course.tags)
            .map_err(|error| RepositoryError::Decode(format!("course.tags: {error}")))?;
        let available_times_json = serde_json::to_string(&course.available_times)
            .map_err(|error| RepositoryError::Decode(format!("course.available_times: {error}")))?;

        sqlx::query(
            "INSERT INTO course (id, name, zip, rating, tags_json, available_times_json)
             VALUES (?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                zip = excluded.zip,
                rating = excluded.rating,
                tags_json = excluded.tags_json,
                available_times_json = excluded.available_times_json",
        )
        .bind(&course.id.0)
        .bind(&course.name)
        .bind(&course.zip)
        .bind(course.rating.map(f64::from))
        .bind(tags_json)
        .bind(available_times_json)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

fn course_from_row(row: &SqliteRow) -> Result<Course, RepositoryError> {
    let tags_json: String = row.try_get("tags_json")?;
    let available_times_json: String = row.try_get("available_times_json")?;
    let rating: Option<f64> = row.try_get("rating")?;

    Ok(Course {
        id: CourseId(row.try_get("id")?),
        name: row.try_get("name")?,
        zip: row.try_get("zip")?,
        rating: rating.map(|value| value as f32),
        tags: serde_json::from_str(&tags_json)
            .map_err(|error| RepositoryError::Decode(format!("course.tags_json: {error}")))?,
        available_times: serde_json::from_str(&available_times_json).map_err(|error| {
            RepositoryError::Decode(format!("course.available_times_json: {error}"))
        })?,
    })
}

#[cfg(test)]
mod tests {
    use teetime_core::domain::course::{Course, CourseId};

    use super::SqlCourseRepository;
    use crate::repositories::CourseRepository;
    use crate::{connect_with_settings, migrations};

    fn course(id: &str, name: &str, zip: &str) -> Course {
        Course {
            id: CourseId(id.to_string()),
            name: name.to_string(),
            zip: zip.to_string(),
            rating: Some(4.5),
            tags: vec!["walking".to_string()],
            available_times: vec!["07:30".to_string(), "08:10".to_string()],
        }
    }

    #[tokio::test]
    async fn find_by_zip_returns_only_matching_courses() {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        let repo = SqlCourseRepository::new(pool.clone());

        repo.save(course("c1", "Pacific Links", "97201")).await.expect("save c1");
        repo.save(course("c2", "Oak Hills", "97201")).await.expect("save c2");
        repo.save(course("c3", "Desert Pines", "85001")).await.expect("save c3");

        let found = repo.find_by_zip("97201").await.expect("find");
        let names: Vec<_> = found.iter().map(|course| course.name.as_str()).collect();
        assert_eq!(names, vec!["Oak Hills", "Pacific Links"]);
        assert_eq!(found[0].available_times, vec!["07:30".to_string(), "08:10".to_string()]);

        assert!(repo.find_by_zip("00000").await.expect("find empty").is_empty());
        pool.close().await;
    }

    #[tokio::test]
    async fn save_replaces_existing_catalog_entry() {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        let repo = SqlCourseRepository::new(pool.clone());

        repo.save(course("c1", "Pacific Links", "97201")).await.expect("save");
        let mut renamed = course("c1", "Pacific Dunes", "97201");
        renamed.rating = None;
        repo.save(renamed.clone()).await.expect("resave");

        let found = repo.find_by_id(&CourseId("c1".to_string())).await.expect("find");
        assert_eq!(found, Some(renamed));
        pool.close().await;
    }
}
