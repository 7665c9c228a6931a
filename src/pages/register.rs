use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use crate::backend::BackendApi;
use crate::catalog::{GradeOperation, choose_operation, find_grade, first_grade_for};
use crate::error::AppError;
use crate::identity::TokenSource;
use crate::models::{Course, GradeUpdate, GradeValue, NewGrade};
use crate::services::RegisterGradesHook;
use crate::utils::{format_grade_date, full_name, is_valid_grade};

pub const REGISTER_YEARS: [&str; 3] = ["1", "2", "3"];

/// The grade cell currently being edited.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InlineEdit {
    pub student_user_id: String,
    pub candidate: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterRow {
    pub student_user_id: String,
    pub student: String,
    pub grade: Option<String>,
    pub display: String,
    pub date: String,
    pub graded_by: String,
    pub editing: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterGradesView {
    pub years: Vec<&'static str>,
    pub selected_year: String,
    pub courses: Vec<Course>,
    pub selected_course: Option<String>,
    pub course_name: String,
    pub grade_options: Vec<GradeOption>,
    pub rows: Vec<RegisterRow>,
    pub inline_edit: Option<InlineEdit>,
    pub loading: bool,
    pub saving: bool,
    pub error: Option<String>,
    pub success: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GradeOption {
    pub value: &'static str,
    pub label: &'static str,
}

/// Admin table for entering grades one student at a time.
///
/// The selected course is not cleared when the year changes, so a course
/// from another year can stay selected until a new one is picked.
pub struct RegisterGradesWorkspace {
    backend: Arc<dyn BackendApi>,
    tokens: Arc<dyn TokenSource>,
    hook: RegisterGradesHook,
    selected_course: Option<String>,
    inline_edit: Option<InlineEdit>,
    saving: bool,
    error: Option<String>,
    success: Option<String>,
}

impl RegisterGradesWorkspace {
    pub async fn open(
        backend: Arc<dyn BackendApi>,
        tokens: Arc<dyn TokenSource>,
        year: impl Into<String>,
    ) -> Self {
        let hook = RegisterGradesHook::mount(backend.clone(), year).await;
        Self {
            backend,
            tokens,
            hook,
            selected_course: None,
            inline_edit: None,
            saving: false,
            error: None,
            success: None,
        }
    }

    pub async fn select_year(&mut self, year: impl Into<String>) {
        self.hook.set_year(year).await;
    }

    pub fn select_course(&mut self, course_id: impl Into<String>) {
        self.selected_course = Some(course_id.into());
    }

    pub fn selected_course(&self) -> Option<&str> {
        self.selected_course.as_deref()
    }

    pub fn course_name(&self) -> String {
        self.selected_course
            .as_deref()
            .and_then(|id| {
                self.hook
                    .courses()
                    .into_iter()
                    .find(|c| c.id == id)
                    .map(|c| c.name)
            })
            .unwrap_or_else(|| "Selected Course".to_string())
    }

    /// Opens the inline editor for a student, prefilled with their current
    /// grade in the selected course.
    pub fn begin_edit(&mut self, student_user_id: &str) {
        let current = self
            .selected_course
            .as_deref()
            .and_then(|course| {
                first_grade_for(&self.hook.grades(), student_user_id, course).map(|g| g.grade.clone())
            })
            .unwrap_or_default();

        self.inline_edit = Some(InlineEdit {
            student_user_id: student_user_id.to_string(),
            candidate: current,
        });
    }

    pub fn set_candidate(&mut self, grade: impl Into<String>) {
        if let Some(edit) = self.inline_edit.as_mut() {
            edit.candidate = grade.into();
        }
    }

    pub fn cancel_edit(&mut self) {
        self.inline_edit = None;
    }

    pub fn inline_edit(&self) -> Option<&InlineEdit> {
        self.inline_edit.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn success(&self) -> Option<&str> {
        self.success.as_deref()
    }

    /// Writes the inline edit back: create when the student has no grade in
    /// the course yet, update otherwise. Invalid grades are rejected before
    /// any request is made.
    pub async fn save(&mut self) -> Result<GradeOperation, AppError> {
        let edit = self
            .inline_edit
            .clone()
            .ok_or_else(|| AppError::Validation("No grade is being edited".to_string()))?;

        if !is_valid_grade(&edit.candidate) {
            return Err(self.fail(AppError::Validation("Please select a valid grade".to_string())));
        }
        let Some(course_id) = self.selected_course.clone() else {
            return Err(self.fail(AppError::Validation("Please select a course".to_string())));
        };

        self.saving = true;
        self.error = None;
        self.success = None;

        let result = self.commit(&edit, &course_id).await;
        self.saving = false;

        match result {
            Ok(operation) => {
                info!(
                    "saved grade {:?} for {} in {} ({:?})",
                    edit.candidate, edit.student_user_id, course_id, operation
                );
                self.success = Some("Grade saved!".to_string());
                self.inline_edit = None;
                self.hook.refetch().await;
                Ok(operation)
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    async fn commit(&self, edit: &InlineEdit, course_id: &str) -> Result<GradeOperation, AppError> {
        let admin_uid = self.tokens.current_uid().ok_or(AppError::Unauthenticated)?;
        // Without the current grades a create could duplicate an existing row.
        if let Some(error) = self.hook.error() {
            return Err(AppError::Load(error));
        }
        let grades = self.hook.grades();
        let operation = choose_operation(find_grade(&grades, &edit.student_user_id, course_id)?);

        let grade = NewGrade {
            user_id: edit.student_user_id.clone(),
            course_id: course_id.to_string(),
            grade: edit.candidate.clone(),
            graded_by: admin_uid,
        };

        match &operation {
            GradeOperation::Create => {
                self.backend.create_grade(&grade).await?;
            }
            GradeOperation::Update(grade_id) => {
                self.backend
                    .update_grade(grade_id, &GradeUpdate::from(grade))
                    .await?;
            }
        }
        Ok(operation)
    }

    fn fail(&mut self, error: AppError) -> AppError {
        self.error = Some(error.to_string());
        error
    }

    pub fn rows(&self) -> Vec<RegisterRow> {
        let grades = self.hook.grades();
        let all_students = self.hook.all_students();
        let course = self.selected_course.as_deref().unwrap_or_default();

        self.hook
            .students()
            .into_iter()
            .map(|student| {
                let grade = first_grade_for(&grades, &student.user_id, course);
                let graded_by = grade
                    .map(|g| {
                        all_students
                            .iter()
                            .find(|s| s.user_id == g.graded_by)
                            .map(full_name)
                            .unwrap_or_else(|| g.graded_by.clone())
                    })
                    .unwrap_or_default();
                let editing = self
                    .inline_edit
                    .as_ref()
                    .is_some_and(|e| e.student_user_id == student.user_id);

                RegisterRow {
                    student: full_name(&student),
                    grade: grade.map(|g| g.grade.clone()),
                    display: grade
                        .map(|g| g.grade.clone())
                        .unwrap_or_else(|| "Add".to_string()),
                    date: grade
                        .map(|g| format_grade_date(g.created_at.as_ref()))
                        .unwrap_or_default(),
                    graded_by,
                    editing,
                    student_user_id: student.user_id,
                }
            })
            .collect()
    }

    pub fn view(&self) -> RegisterGradesView {
        RegisterGradesView {
            years: REGISTER_YEARS.to_vec(),
            selected_year: self.hook.year().to_string(),
            courses: self.hook.courses(),
            selected_course: self.selected_course.clone(),
            course_name: self.course_name(),
            grade_options: GradeValue::ALL
                .iter()
                .map(|g| GradeOption {
                    value: g.as_str(),
                    label: g.label(),
                })
                .collect(),
            rows: self.rows(),
            inline_edit: self.inline_edit.clone(),
            loading: self.hook.loading(),
            saving: self.saving,
            error: self.error.clone().or_else(|| self.hook.error()),
            success: self.success.clone(),
        }
    }

    pub fn unmount(&self) {
        self.hook.unmount();
    }
}
