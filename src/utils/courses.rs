use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::models::Course;

static SUBJECT_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\d]+").expect("subject pattern is valid"));

/// A filter value picked from a dropdown: either everything or one value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Selection {
    #[default]
    All,
    Only(String),
}

impl Selection {
    pub fn parse(raw: &str) -> Self {
        if raw.is_empty() || raw == "all" {
            Selection::All
        } else {
            Selection::Only(raw.to_string())
        }
    }

    pub fn matches(&self, value: &str) -> bool {
        match self {
            Selection::All => true,
            Selection::Only(wanted) => wanted == value,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Selection::All => "all",
            Selection::Only(value) => value,
        }
    }
}

impl Serialize for Selection {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Selection {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Selection::parse(&raw))
    }
}

/// Subject part of a course name: the leading run of non-digits, trimmed.
/// `"Svenska 1"` becomes `"Svenska"`; a name without that run is returned
/// whole.
pub fn extract_base_subject(course_name: &str) -> String {
    SUBJECT_PREFIX
        .find(course_name)
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_else(|| course_name.to_string())
}

pub fn group_courses_by_subject(courses: &[Course]) -> BTreeMap<String, Vec<Course>> {
    let mut groups: BTreeMap<String, Vec<Course>> = BTreeMap::new();
    for course in courses {
        groups
            .entry(extract_base_subject(&course.name))
            .or_default()
            .push(course.clone());
    }
    groups
}

pub fn unique_subjects(courses: &[Course]) -> Vec<String> {
    courses
        .iter()
        .map(|c| extract_base_subject(&c.name))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

pub fn filter_courses(courses: &[Course], year: &Selection, subject: &Selection) -> Vec<Course> {
    courses
        .iter()
        .filter(|c| year.matches(&c.year.as_key()))
        .filter(|c| subject.matches(&extract_base_subject(&c.name)))
        .cloned()
        .collect()
}

/// Stable ascending sort on the numeric year. Years that are not numbers go
/// last.
pub fn sort_courses_by_year(courses: &[Course]) -> Vec<Course> {
    let mut sorted = courses.to_vec();
    sorted.sort_by_key(|c| c.year.as_number().unwrap_or(i64::MAX));
    sorted
}
