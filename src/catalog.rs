//! Joining the course catalog with grade records for display, and deciding how
//! a grade edit is written back.

use serde::Serialize;
use tracing::warn;

use crate::error::AppError;
use crate::models::{Course, CourseYear, Grade};
use crate::utils::{Selection, extract_base_subject, filter_courses, sort_courses_by_year};

/// A course row with the viewer's grade attached (`""` when ungraded).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergedCourse {
    pub id: String,
    pub name: String,
    pub year: CourseYear,
    pub subject: String,
    pub grade: String,
}

pub fn merge_courses(
    courses: &[Course],
    grades: &[Grade],
    year: &Selection,
    subject: &Selection,
) -> Vec<MergedCourse> {
    let filtered = filter_courses(courses, year, subject);

    sort_courses_by_year(&filtered)
        .into_iter()
        .map(|course| {
            let grade = grades
                .iter()
                .find(|g| g.course_id == course.id)
                .map(|g| g.grade.clone())
                .unwrap_or_default();
            MergedCourse {
                subject: extract_base_subject(&course.name),
                id: course.id,
                name: course.name,
                year: course.year,
                grade,
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GradeOperation {
    Create,
    Update(String),
}

/// Create when the student has no grade for the course yet, otherwise update
/// the existing record in place.
pub fn choose_operation(existing: Option<&Grade>) -> GradeOperation {
    match existing {
        Some(grade) => GradeOperation::Update(grade.id.clone()),
        None => GradeOperation::Create,
    }
}

/// The single grade recorded for `(user_id, course_id)`.
///
/// More than one matching row is refused: writing would silently pick one of
/// them.
pub fn find_grade<'a>(
    grades: &'a [Grade],
    user_id: &str,
    course_id: &str,
) -> Result<Option<&'a Grade>, AppError> {
    let mut matches = grades
        .iter()
        .filter(|g| g.user_id == user_id && g.course_id == course_id);
    let first = matches.next();
    if matches.next().is_some() {
        return Err(AppError::Validation(format!(
            "Multiple grades are registered for this student in course {}",
            course_id
        )));
    }
    Ok(first)
}

/// First grade for `(user_id, course_id)`, for read-only views.
pub fn first_grade_for<'a>(grades: &'a [Grade], user_id: &str, course_id: &str) -> Option<&'a Grade> {
    let mut matches = grades
        .iter()
        .filter(|g| g.user_id == user_id && g.course_id == course_id);
    let first = matches.next();
    let extra = matches.count();
    if extra > 0 {
        warn!(
            "{} duplicate grade rows for user {} in course {}",
            extra, user_id, course_id
        );
    }
    first
}
