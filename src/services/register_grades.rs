use std::sync::Arc;

use serde::Serialize;

use crate::backend::BackendApi;
use crate::models::{Course, Grade, Profile};
use crate::services::LoadCell;
use crate::utils::{filter_non_admin_profiles, sort_profiles_by_last_name};

#[derive(Debug, Clone, Default, Serialize)]
pub struct RegisterData {
    pub profiles: Vec<Profile>,
    pub grades: Vec<Grade>,
}

/// Data behind the grade registration table: every profile and grade, plus
/// the courses of the selected year.
pub struct RegisterGradesHook {
    backend: Arc<dyn BackendApi>,
    year: String,
    data: LoadCell<RegisterData>,
    courses: LoadCell<Vec<Course>>,
}

impl RegisterGradesHook {
    pub fn new(backend: Arc<dyn BackendApi>, year: impl Into<String>) -> Self {
        Self {
            backend,
            year: year.into(),
            data: LoadCell::new(RegisterData::default(), false),
            courses: LoadCell::new(Vec::new(), false),
        }
    }

    pub async fn mount(backend: Arc<dyn BackendApi>, year: impl Into<String>) -> Self {
        let hook = Self::new(backend, year);
        tokio::join!(hook.refetch(), hook.load_courses());
        hook
    }

    pub async fn refetch(&self) -> bool {
        self.data
            .load(async {
                let (profiles, grades) = tokio::try_join!(
                    self.backend.list_profiles(),
                    self.backend.list_grades(),
                )?;
                Ok(RegisterData { profiles, grades })
            })
            .await
    }

    async fn load_courses(&self) -> bool {
        self.courses
            .load(self.backend.list_courses_by_year(&self.year))
            .await
    }

    /// Switches the year and reloads its courses.
    pub async fn set_year(&mut self, year: impl Into<String>) -> bool {
        self.year = year.into();
        self.load_courses().await
    }

    pub fn year(&self) -> &str {
        &self.year
    }

    /// Non-admin profiles sorted by last name.
    pub fn students(&self) -> Vec<Profile> {
        sort_profiles_by_last_name(&filter_non_admin_profiles(&self.data.get().data.profiles))
    }

    pub fn all_students(&self) -> Vec<Profile> {
        self.data.get().data.profiles
    }

    pub fn grades(&self) -> Vec<Grade> {
        self.data.get().data.grades
    }

    pub fn courses(&self) -> Vec<Course> {
        self.courses.get().data
    }

    pub fn loading(&self) -> bool {
        self.data.get().loading || self.courses.get().loading
    }

    pub fn error(&self) -> Option<String> {
        self.data.get().error.or(self.courses.get().error)
    }

    pub fn unmount(&self) {
        self.data.unmount();
        self.courses.unmount();
    }
}
