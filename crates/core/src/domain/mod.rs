pub mod booking;
pub mod course;
