use serde::Serialize;

use crate::models::{GradeTimestamp, GradeValue};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GradeTone {
    Good,
    Fair,
    Weak,
    Failing,
    Neutral,
}

impl GradeTone {
    pub fn css_class(&self) -> &'static str {
        match self {
            GradeTone::Good => "text-green-600 font-semibold",
            GradeTone::Fair => "text-yellow-600 font-semibold",
            GradeTone::Weak => "text-orange-600 font-semibold",
            GradeTone::Failing => "text-red-600 font-semibold",
            GradeTone::Neutral => "text-gray-600",
        }
    }
}

pub fn grade_tone(grade: &str) -> GradeTone {
    match grade {
        "A" | "B" => GradeTone::Good,
        "C" | "D" => GradeTone::Fair,
        "E" => GradeTone::Weak,
        "F" => GradeTone::Failing,
        _ => GradeTone::Neutral,
    }
}

/// Accepts exactly `A`..`F` and the empty string.
pub fn is_valid_grade(grade: &str) -> bool {
    grade.parse::<GradeValue>().is_ok()
}

pub fn format_grade_date(timestamp: Option<&GradeTimestamp>) -> String {
    timestamp
        .and_then(GradeTimestamp::to_datetime)
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "N/A".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_grades_are_exactly_the_enumerated_set() {
        for ok in ["A", "B", "C", "D", "E", "F", ""] {
            assert!(is_valid_grade(ok), "{ok:?} should be valid");
        }
        for bad in ["Z", "a", "N/A", "AB", " A", "G"] {
            assert!(!is_valid_grade(bad), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn tones_follow_grade_bands() {
        assert_eq!(grade_tone("A"), GradeTone::Good);
        assert_eq!(grade_tone("D"), GradeTone::Fair);
        assert_eq!(grade_tone("E"), GradeTone::Weak);
        assert_eq!(grade_tone("F"), GradeTone::Failing);
        assert_eq!(grade_tone(""), GradeTone::Neutral);
        assert_eq!(grade_tone("F").css_class(), "text-red-600 font-semibold");
    }

    #[test]
    fn dates_format_from_both_timestamp_shapes() {
        let iso = GradeTimestamp::Iso("2024-05-02T10:00:00Z".into());
        let structured = GradeTimestamp::Structured {
            seconds: 1_714_644_000,
            nanoseconds: 0,
        };
        assert_eq!(format_grade_date(Some(&iso)), "2024-05-02");
        assert_eq!(format_grade_date(Some(&structured)), "2024-05-02");
        assert_eq!(format_grade_date(None), "N/A");
        assert_eq!(format_grade_date(Some(&GradeTimestamp::Iso("soon".into()))), "N/A");
    }
}
