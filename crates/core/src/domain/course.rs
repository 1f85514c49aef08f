use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CourseId(pub String);

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub id: CourseId,
    pub name: String,
    pub zip: String,
    pub rating: Option<f32>,
    pub tags: Vec<String>,
    pub available_times: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseQuery {
    pub zip: String,
    pub date: Option<String>,
    pub criteria: Option<String>,
}

impl Course {
    /// Best-effort keyword filter: every whitespace-separated term must appear in the
    /// name or one of the tags, case-insensitively. Blank criteria match everything.
    pub fn matches_criteria(&self, criteria: &str) -> bool {
        let name = self.name.to_lowercase();
        let tags: Vec<String> = self.tags.iter().map(|tag| tag.to_lowercase()).collect();

        criteria.split_whitespace().map(str::to_lowercase).all(|term| {
            name.contains(&term) || tags.iter().any(|tag| tag.contains(&term))
        })
    }
}

impl CourseQuery {
    pub fn filter(&self, courses: Vec<Course>) -> Vec<Course> {
        match self.criteria.as_deref().map(str::trim).filter(|value| !value.is_empty()) {
            Some(criteria) => {
                courses.into_iter().filter(|course| course.matches_criteria(criteria)).collect()
            }
            None => courses,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Course, CourseId, CourseQuery};

    fn course(name: &str, tags: &[&str]) -> Course {
        Course {
            id: CourseId(name.to_lowercase().replace(' ', "-")),
            name: name.to_string(),
            zip: "97201".to_string(),
            rating: Some(4.2),
            tags: tags.iter().map(|tag| tag.to_string()).collect(),
            available_times: vec!["07:30".to_string(), "09:00".to_string()],
        }
    }

    #[test]
    fn criteria_matches_name_or_tags_case_insensitively() {
        let links = course("Pacific Links", &["walking", "ocean"]);

        assert!(links.matches_criteria("links"));
        assert!(links.matches_criteria("OCEAN walking"));
        assert!(!links.matches_criteria("desert"));
    }

    #[test]
    fn blank_criteria_keeps_every_course() {
        let query = CourseQuery {
            zip: "97201".to_string(),
            date: Some("2024-07-01".to_string()),
            criteria: Some("  ".to_string()),
        };

        let filtered = query.filter(vec![course("Pacific Links", &[]), course("Oak Hills", &[])]);
        assert_eq!(filtered.len(), 2);
    }

    #[test]
    fn criteria_narrows_results() {
        let query = CourseQuery {
            zip: "97201".to_string(),
            date: None,
            criteria: Some("hills".to_string()),
        };

        let filtered = query.filter(vec![course("Pacific Links", &[]), course("Oak Hills", &[])]);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].name, "Oak Hills");
    }
}
