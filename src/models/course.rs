use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub id: String,
    pub name: String,
    pub year: CourseYear,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCourse {
    pub name: String,
    pub year: CourseYear,
}

/// Study year of a course. The backend stores it either as a number or as a
/// string, so both shapes are accepted and compared through [`as_key`] and
/// [`as_number`].
///
/// [`as_key`]: CourseYear::as_key
/// [`as_number`]: CourseYear::as_number
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CourseYear {
    Number(i64),
    Text(String),
}

impl CourseYear {
    /// String form used by year filters.
    pub fn as_key(&self) -> String {
        match self {
            CourseYear::Number(n) => n.to_string(),
            CourseYear::Text(s) => s.clone(),
        }
    }

    /// Numeric form used for ordering; `None` when the text is not a number.
    pub fn as_number(&self) -> Option<i64> {
        match self {
            CourseYear::Number(n) => Some(*n),
            CourseYear::Text(s) => s.trim().parse().ok(),
        }
    }
}

impl fmt::Display for CourseYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_key())
    }
}

impl From<i64> for CourseYear {
    fn from(n: i64) -> Self {
        CourseYear::Number(n)
    }
}

impl From<&str> for CourseYear {
    fn from(s: &str) -> Self {
        CourseYear::Text(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn year_accepts_number_and_string() {
        let a: Course = serde_json::from_str(r#"{"id":"c1","name":"Svenska 1","year":1}"#).unwrap();
        let b: Course = serde_json::from_str(r#"{"id":"c2","name":"Svenska 2","year":"2"}"#).unwrap();

        assert_eq!(a.year.as_key(), "1");
        assert_eq!(b.year.as_key(), "2");
        assert_eq!(a.year.as_number(), Some(1));
        assert_eq!(b.year.as_number(), Some(2));
    }

    #[test]
    fn non_numeric_year_has_no_number() {
        assert_eq!(CourseYear::from("first").as_number(), None);
    }
}
