use std::sync::Arc;

use serde::Serialize;

use crate::backend::BackendApi;
use crate::identity::TokenSource;
use crate::models::CourseYear;
use crate::services::StudentGradesHook;
use crate::utils::{Selection, grade_tone};

pub const YEAR_CHOICES: [&str; 4] = ["all", "1", "2", "3"];

#[derive(Debug, Clone, Serialize)]
pub struct StudentGradeRow {
    pub course_id: String,
    pub course: String,
    pub year: CourseYear,
    pub grade: String,
    pub grade_class: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct StudentGradesView {
    pub year: Selection,
    pub subject: Selection,
    pub years: Vec<&'static str>,
    pub subjects: Vec<String>,
    pub rows: Vec<StudentGradeRow>,
    pub loading: bool,
    pub error: Option<String>,
    pub empty_message: Option<&'static str>,
}

/// A student's own grades, filterable by year and subject.
pub struct StudentGradesPage {
    hook: StudentGradesHook,
    pub year: Selection,
    pub subject: Selection,
}

impl StudentGradesPage {
    pub async fn open(backend: Arc<dyn BackendApi>, tokens: Arc<dyn TokenSource>) -> Self {
        Self {
            hook: StudentGradesHook::mount(backend, tokens).await,
            year: Selection::All,
            subject: Selection::All,
        }
    }

    pub fn select_year(&mut self, year: Selection) {
        self.year = year;
    }

    pub fn select_subject(&mut self, subject: Selection) {
        self.subject = subject;
    }

    pub async fn refresh(&self) -> bool {
        self.hook.refetch().await
    }

    pub fn view(&self) -> StudentGradesView {
        let state = self.hook.state();
        let rows: Vec<StudentGradeRow> = self
            .hook
            .merged(&self.year, &self.subject)
            .into_iter()
            .map(|course| StudentGradeRow {
                course_id: course.id,
                course: if course.name.is_empty() {
                    "Unknown Course".to_string()
                } else {
                    course.name
                },
                year: course.year,
                grade_class: grade_tone(&course.grade).css_class(),
                grade: course.grade,
            })
            .collect();

        let empty_message = (rows.is_empty() && !state.loading && state.error.is_none())
            .then_some("No courses found for the selected filters.");

        StudentGradesView {
            year: self.year.clone(),
            subject: self.subject.clone(),
            years: YEAR_CHOICES.to_vec(),
            subjects: state.data.subjects,
            rows,
            loading: state.loading,
            error: state.error,
            empty_message,
        }
    }
}
