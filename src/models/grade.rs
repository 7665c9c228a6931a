use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grade {
    pub id: String,
    pub user_id: String,
    pub course_id: String,
    #[serde(default)]
    pub grade: String,
    #[serde(default)]
    pub graded_by: String,
    #[serde(default)]
    pub created_at: Option<GradeTimestamp>,
    #[serde(default)]
    pub course: Option<CourseSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseSnapshot {
    pub name: String,
    pub year: crate::models::CourseYear,
}

/// When a grade was recorded. The backend sends either an ISO-8601 string or
/// a `{ _seconds, _nanoseconds }` object depending on how the row was written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GradeTimestamp {
    Iso(String),
    Structured {
        #[serde(rename = "_seconds", alias = "seconds")]
        seconds: i64,
        #[serde(rename = "_nanoseconds", alias = "nanoseconds", default)]
        nanoseconds: u32,
    },
}

impl GradeTimestamp {
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            GradeTimestamp::Iso(raw) => DateTime::parse_from_rfc3339(raw)
                .map(|dt| dt.with_timezone(&Utc))
                .ok()
                .or_else(|| {
                    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                        .ok()
                        .and_then(|d| d.and_hms_opt(0, 0, 0))
                        .map(|dt| dt.and_utc())
                }),
            GradeTimestamp::Structured { seconds, nanoseconds } => {
                DateTime::from_timestamp(*seconds, *nanoseconds)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewGrade {
    pub user_id: String,
    pub course_id: String,
    pub grade: String,
    pub graded_by: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GradeUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grade: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub graded_by: Option<String>,
}

impl From<NewGrade> for GradeUpdate {
    fn from(grade: NewGrade) -> Self {
        Self {
            user_id: Some(grade.user_id),
            course_id: Some(grade.course_id),
            grade: Some(grade.grade),
            graded_by: Some(grade.graded_by),
        }
    }
}

/// Result counts reported by the backend after a CSV import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSummary {
    pub imported: u64,
    pub failed: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GradeValue {
    A,
    B,
    C,
    D,
    E,
    F,
    #[serde(rename = "")]
    Ungraded,
}

impl GradeValue {
    pub const ALL: [GradeValue; 7] = [
        GradeValue::A,
        GradeValue::B,
        GradeValue::C,
        GradeValue::D,
        GradeValue::E,
        GradeValue::F,
        GradeValue::Ungraded,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GradeValue::A => "A",
            GradeValue::B => "B",
            GradeValue::C => "C",
            GradeValue::D => "D",
            GradeValue::E => "E",
            GradeValue::F => "F",
            GradeValue::Ungraded => "",
        }
    }

    /// Text shown in grade pickers.
    pub fn label(&self) -> &'static str {
        match self {
            GradeValue::Ungraded => "N/A",
            other => other.as_str(),
        }
    }
}

impl FromStr for GradeValue {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GradeValue::ALL
            .into_iter()
            .find(|g| g.as_str() == s)
            .ok_or_else(|| format!("invalid grade: {:?}", s))
    }
}

impl fmt::Display for GradeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn created_at_accepts_both_shapes() {
        let iso: Grade = serde_json::from_str(
            r#"{"id":"g1","user_id":"u1","course_id":"c1","grade":"B","graded_by":"a1",
                "created_at":"2024-05-02T10:00:00Z"}"#,
        )
        .unwrap();
        let structured: Grade = serde_json::from_str(
            r#"{"id":"g2","user_id":"u1","course_id":"c2","grade":"A","graded_by":"a1",
                "created_at":{"_seconds":1714644000,"_nanoseconds":0}}"#,
        )
        .unwrap();

        let a = iso.created_at.unwrap().to_datetime().unwrap();
        let b = structured.created_at.unwrap().to_datetime().unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn missing_created_at_is_none() {
        let grade: Grade =
            serde_json::from_str(r#"{"id":"g1","user_id":"u1","course_id":"c1"}"#).unwrap();
        assert!(grade.created_at.is_none());
        assert_eq!(grade.grade, "");
    }

    #[test]
    fn unparsable_iso_string_has_no_datetime() {
        assert!(GradeTimestamp::Iso("yesterday".into()).to_datetime().is_none());
    }

    #[test]
    fn grade_value_parsing_is_strict() {
        assert_eq!("A".parse::<GradeValue>(), Ok(GradeValue::A));
        assert_eq!("".parse::<GradeValue>(), Ok(GradeValue::Ungraded));
        assert!("a".parse::<GradeValue>().is_err());
        assert!("N/A".parse::<GradeValue>().is_err());
    }

    #[test]
    fn partial_update_omits_unset_fields() {
        let update = GradeUpdate {
            grade: Some("C".into()),
            ..Default::default()
        };
        assert_eq!(serde_json::to_string(&update).unwrap(), r#"{"grade":"C"}"#);
    }
}
