use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use teetime_core::domain::booking::{Booking, BookingId};
use teetime_core::domain::course::{Course, CourseId};
use teetime_core::pipeline::{BookingStore, StoreError};

use super::{CourseRepository, RepositoryError};

#[derive(Default)]
pub struct InMemoryBookingRepository {
    bookings: RwLock<HashMap<String, Booking>>,
}

impl InMemoryBookingRepository {
    pub async fn len(&self) -> usize {
        self.bookings.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.bookings.read().await.is_empty()
    }
}

#[async_trait]
impl BookingStore for InMemoryBookingRepository {
    async fn create(&self, booking: &Booking) -> Result<(), StoreError> {
        let mut bookings = self.bookings.write().await;
        if bookings.contains_key(booking.id.as_str()) {
            return Err(StoreError::DuplicateKey(booking.id.clone()));
        }
        bookings.insert(booking.id.0.clone(), booking.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &BookingId) -> Result<Option<Booking>, StoreError> {
        let bookings = self.bookings.read().await;
        Ok(bookings.get(id.as_str()).cloned())
    }
}

#[derive(Default)]
pub struct InMemoryCourseRepository {
    courses: RwLock<HashMap<String, Course>>,
}

#[async_trait]
impl CourseRepository for InMemoryCourseRepository {
    async fn find_by_zip(&self, zip: &str) -> Result<Vec<Course>, RepositoryError> {
        let courses = self.courses.read().await;
        let mut matching: Vec<Course> =
            courses.values().filter(|course| course.zip == zip.trim()).cloned().collect();
        matching.sort_by(|left, right| left.name.cmp(&right.name));
        Ok(matching)
    }

    async fn find_by_id(&self, id: &CourseId) -> Result<Option<Course>, RepositoryError> {
        let courses = self.courses.read().await;
        Ok(courses.get(&id.0).cloned())
    }

    async fn save(&self, course: Course) -> Result<(), RepositoryError> {
        let mut courses = self.courses.write().await;
        courses.insert(course.id.0.clone(), course);
        Ok(())
    }
}
