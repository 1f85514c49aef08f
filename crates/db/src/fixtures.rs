use teetime_core::domain::course::{Course, CourseId};

use crate::connection::DbPool;
use crate::repositories::{CourseRepository, RepositoryError, SqlCourseRepository};

struct SeedCourse {
    id: &'static str,
    name: &'static str,
    zip: &'static str,
    rating: Option<f32>,
    tags: &'static [&'static str],
    available_times: &'static [&'static str],
}

/// Deterministic demo catalog covering two postal codes.
const SEED_COURSES: &[SeedCourse] = &[
    SeedCourse {
        id: "course-pacific-links",
        name: "Pacific Links",
        zip: "97201",
        rating: Some(4.6),
        tags: &["links", "walking", "ocean"],
        available_times: &["06:40", "07:30", "09:00", "13:20"],
    },
    SeedCourse {
        id: "course-oak-hills",
        name: "Oak Hills Municipal",
        zip: "97201",
        rating: Some(3.9),
        tags: &["municipal", "cart", "beginner"],
        available_times: &["08:00", "08:50", "10:10"],
    },
    SeedCourse {
        id: "course-desert-pines",
        name: "Desert Pines",
        zip: "85001",
        rating: Some(4.2),
        tags: &["desert", "cart", "twilight"],
        available_times: &["05:50", "06:30", "17:45"],
    },
];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SeedResult {
    pub courses_seeded: Vec<&'static str>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerificationResult {
    pub all_present: bool,
    pub checks: Vec<(&'static str, bool)>,
}

pub struct CourseSeedDataset;

impl CourseSeedDataset {
    pub fn courses() -> Vec<Course> {
        SEED_COURSES
            .iter()
            .map(|seed| Course {
                id: CourseId(seed.id.to_string()),
                name: seed.name.to_string(),
                zip: seed.zip.to_string(),
                rating: seed.rating,
                tags: seed.tags.iter().map(|tag| tag.to_string()).collect(),
                available_times: seed.available_times.iter().map(|time| time.to_string()).collect(),
            })
            .collect()
    }

    /// Upserts the demo catalog; running it twice leaves the same rows.
    pub async fn load(pool: &DbPool) -> Result<SeedResult, RepositoryError> {
        let repo = SqlCourseRepository::new(pool.clone());
        for course in Self::courses() {
            repo.save(course).await?;
        }

        Ok(SeedResult { courses_seeded: SEED_COURSES.iter().map(|seed| seed.id).collect() })
    }

    pub async fn verify(pool: &DbPool) -> Result<VerificationResult, RepositoryError> {
        let repo = SqlCourseRepository::new(pool.clone());
        let mut checks = Vec::with_capacity(SEED_COURSES.len());

        for seed in SEED_COURSES {
            let found = repo.find_by_id(&CourseId(seed.id.to_string())).await?;
            let matches = found
                .map(|course| course.zip == seed.zip && course.name == seed.name)
                .unwrap_or(false);
            checks.push((seed.id, matches));
        }

        let all_present = checks.iter().all(|(_, present)| *present);
        Ok(VerificationResult { all_present, checks })
    }
}

#[cfg(test)]
mod tests {
    use super::CourseSeedDataset;
    use crate::repositories::{CourseRepository, SqlCourseRepository};
    use crate::{connect_with_settings, migrations};

    #[tokio::test]
    async fn seed_load_is_repeatable_and_verifiable() {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");

        let verification = CourseSeedDataset::verify(&pool).await.expect("verify before seed");
        assert!(!verification.all_present);

        CourseSeedDataset::load(&pool).await.expect("first load");
        let result = CourseSeedDataset::load(&pool).await.expect("second load");
        assert_eq!(result.courses_seeded.len(), 3);

        let verification = CourseSeedDataset::verify(&pool).await.expect("verify after seed");
        assert!(verification.all_present, "checks: {:?}", verification.checks);

        let portland = SqlCourseRepository::new(pool.clone())
            .find_by_zip("97201")
            .await
            .expect("find by zip");
        assert_eq!(portland.len(), 2);

        pool.close().await;
    }
}
