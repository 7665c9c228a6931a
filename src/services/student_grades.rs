use std::sync::Arc;

use serde::Serialize;

use crate::backend::BackendApi;
use crate::catalog::{MergedCourse, merge_courses};
use crate::error::AppError;
use crate::identity::TokenSource;
use crate::models::{Course, Grade};
use crate::services::{LoadCell, LoadState};
use crate::utils::{Selection, unique_subjects};

#[derive(Debug, Clone, Default, Serialize)]
pub struct StudentGrades {
    pub courses: Vec<Course>,
    pub grades: Vec<Grade>,
    pub subjects: Vec<String>,
}

/// The course catalog joined with the signed-in student's own grades.
pub struct StudentGradesHook {
    backend: Arc<dyn BackendApi>,
    tokens: Arc<dyn TokenSource>,
    data: LoadCell<StudentGrades>,
}

impl StudentGradesHook {
    pub fn new(backend: Arc<dyn BackendApi>, tokens: Arc<dyn TokenSource>) -> Self {
        Self {
            backend,
            tokens,
            data: LoadCell::new(StudentGrades::default(), true),
        }
    }

    pub async fn mount(backend: Arc<dyn BackendApi>, tokens: Arc<dyn TokenSource>) -> Self {
        let hook = Self::new(backend, tokens);
        hook.refetch().await;
        hook
    }

    pub async fn refetch(&self) -> bool {
        self.data
            .load(async {
                let uid = self.tokens.current_uid().ok_or(AppError::Unauthenticated)?;
                let (courses, grades) = tokio::try_join!(
                    self.backend.list_courses(),
                    self.backend.list_grades_by_user(&uid),
                )?;
                let subjects = unique_subjects(&courses);
                Ok(StudentGrades {
                    courses,
                    grades,
                    subjects,
                })
            })
            .await
    }

    pub fn state(&self) -> LoadState<StudentGrades> {
        self.data.get()
    }

    pub fn merged(&self, year: &Selection, subject: &Selection) -> Vec<MergedCourse> {
        let data = self.data.get().data;
        merge_courses(&data.courses, &data.grades, year, subject)
    }

    pub fn unmount(&self) {
        self.data.unmount();
    }
}
