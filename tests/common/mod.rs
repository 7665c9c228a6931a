#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use axum::response::Response;
use http_body_util::BodyExt;
use portal::api::router;
use portal::auth::AuthContext;
use portal::backend::{BackendApi, CsvFile};
use portal::config::GuardConfig;
use portal::error::AppError;
use portal::identity::{IdentityProvider, IdentityUser, TokenSource};
use portal::models::{
    Course, CourseYear, Grade, GradeUpdate, ImportSummary, NewCourse, NewGrade, NewProfile,
    Profile, ProfileUpdate,
};
use portal::state::AppState;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    CreateGrade(NewGrade),
    UpdateGrade(String, String),
    UpdateProfile(String, ProfileUpdate),
    DeleteProfile(String),
    ImportCsv(String, usize),
    CreateCourse(String),
}

#[derive(Default)]
struct Data {
    profiles: Vec<Profile>,
    courses: Vec<Course>,
    grades: Vec<Grade>,
    calls: Vec<Call>,
    fail_with: Option<String>,
    import_result: Option<ImportSummary>,
}

/// In-memory backend that records every write.
#[derive(Default)]
pub struct FakeBackend {
    data: Mutex<Data>,
}

impl FakeBackend {
    pub fn new(profiles: Vec<Profile>, courses: Vec<Course>, grades: Vec<Grade>) -> Arc<Self> {
        Arc::new(Self {
            data: Mutex::new(Data {
                profiles,
                courses,
                grades,
                ..Data::default()
            }),
        })
    }

    pub fn calls(&self) -> Vec<Call> {
        self.data.lock().unwrap().calls.clone()
    }

    pub fn fail_with(&self, message: &str) {
        self.data.lock().unwrap().fail_with = Some(message.to_string());
    }

    pub fn recover(&self) {
        self.data.lock().unwrap().fail_with = None;
    }

    pub fn set_import_result(&self, summary: ImportSummary) {
        self.data.lock().unwrap().import_result = Some(summary);
    }

    pub fn grades(&self) -> Vec<Grade> {
        self.data.lock().unwrap().grades.clone()
    }

    fn check(&self) -> Result<(), AppError> {
        match &self.data.lock().unwrap().fail_with {
            Some(message) => Err(AppError::Api {
                status: 500,
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl BackendApi for FakeBackend {
    async fn list_profiles(&self) -> Result<Vec<Profile>, AppError> {
        self.check()?;
        Ok(self.data.lock().unwrap().profiles.clone())
    }

    async fn get_profile(&self, profile_id: &str) -> Result<Profile, AppError> {
        self.check()?;
        self.data
            .lock()
            .unwrap()
            .profiles
            .iter()
            .find(|p| p.id == profile_id)
            .cloned()
            .ok_or(AppError::NotFound)
    }

    async fn get_profile_by_user(&self, user_id: &str) -> Result<Profile, AppError> {
        self.check()?;
        self.data
            .lock()
            .unwrap()
            .profiles
            .iter()
            .find(|p| p.user_id == user_id)
            .cloned()
            .ok_or_else(|| AppError::Api {
                status: 404,
                message: "Profile not found".into(),
            })
    }

    async fn create_profile(&self, profile: &NewProfile) -> Result<Profile, AppError> {
        self.check()?;
        let mut data = self.data.lock().unwrap();
        let created = Profile {
            id: format!("p{}", data.profiles.len() + 1),
            user_id: profile.user_id.clone(),
            first_name: profile.first_name.clone(),
            last_name: profile.last_name.clone(),
            phone: profile.phone.clone(),
            person_number: profile.person_number.clone(),
            is_admin: profile.is_admin,
            address: profile.address.clone(),
            email: profile.email.clone(),
        };
        data.profiles.push(created.clone());
        Ok(created)
    }

    async fn update_profile(&self, profile_id: &str, update: &ProfileUpdate) -> Result<Profile, AppError> {
        self.check()?;
        let mut data = self.data.lock().unwrap();
        data.calls
            .push(Call::UpdateProfile(profile_id.to_string(), update.clone()));
        let profile = data
            .profiles
            .iter_mut()
            .find(|p| p.id == profile_id)
            .ok_or(AppError::NotFound)?;
        profile.first_name = update.first_name.clone();
        profile.last_name = update.last_name.clone();
        profile.phone = update.phone.clone();
        profile.person_number = update.person_number.clone();
        profile.address = update.address.clone();
        Ok(profile.clone())
    }

    async fn delete_profile(&self, profile_id: &str) -> Result<(), AppError> {
        self.check()?;
        let mut data = self.data.lock().unwrap();
        data.calls.push(Call::DeleteProfile(profile_id.to_string()));
        data.profiles.retain(|p| p.id != profile_id);
        Ok(())
    }

    async fn import_profiles_csv(&self, file: CsvFile) -> Result<ImportSummary, AppError> {
        self.check()?;
        let mut data = self.data.lock().unwrap();
        data.calls
            .push(Call::ImportCsv(file.file_name.clone(), file.bytes.len()));
        Ok(data.import_result.unwrap_or(ImportSummary {
            imported: 0,
            failed: 0,
        }))
    }

    async fn list_courses(&self) -> Result<Vec<Course>, AppError> {
        self.check()?;
        Ok(self.data.lock().unwrap().courses.clone())
    }

    async fn create_course(&self, course: &NewCourse) -> Result<Course, AppError> {
        self.check()?;
        let mut data = self.data.lock().unwrap();
        data.calls.push(Call::CreateCourse(course.name.clone()));
        let created = Course {
            id: format!("c{}", data.courses.len() + 1),
            name: course.name.clone(),
            year: course.year.clone(),
        };
        data.courses.push(created.clone());
        Ok(created)
    }

    async fn list_grades(&self) -> Result<Vec<Grade>, AppError> {
        self.check()?;
        Ok(self.data.lock().unwrap().grades.clone())
    }

    async fn list_grades_by_user(&self, user_id: &str) -> Result<Vec<Grade>, AppError> {
        self.check()?;
        Ok(self
            .data
            .lock()
            .unwrap()
            .grades
            .iter()
            .filter(|g| g.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn create_grade(&self, grade: &NewGrade) -> Result<Grade, AppError> {
        self.check()?;
        let mut data = self.data.lock().unwrap();
        data.calls.push(Call::CreateGrade(grade.clone()));
        let created = Grade {
            id: format!("g{}", data.grades.len() + 1),
            user_id: grade.user_id.clone(),
            course_id: grade.course_id.clone(),
            grade: grade.grade.clone(),
            graded_by: grade.graded_by.clone(),
            created_at: None,
            course: None,
        };
        data.grades.push(created.clone());
        Ok(created)
    }

    async fn update_grade(&self, grade_id: &str, update: &GradeUpdate) -> Result<Grade, AppError> {
        self.check()?;
        let mut data = self.data.lock().unwrap();
        let value = update.grade.clone().unwrap_or_default();
        data.calls
            .push(Call::UpdateGrade(grade_id.to_string(), value.clone()));
        let grade = data
            .grades
            .iter_mut()
            .find(|g| g.id == grade_id)
            .ok_or(AppError::NotFound)?;
        grade.grade = value;
        if let Some(graded_by) = &update.graded_by {
            grade.graded_by = graded_by.clone();
        }
        Ok(grade.clone())
    }

    async fn delete_grade(&self, grade_id: &str) -> Result<(), AppError> {
        self.check()?;
        self.data.lock().unwrap().grades.retain(|g| g.id != grade_id);
        Ok(())
    }
}

/// Identity provider with a scripted sign-in state.
pub struct FakeIdentity {
    user: watch::Sender<Option<IdentityUser>>,
}

impl FakeIdentity {
    pub fn signed_out() -> Arc<Self> {
        let (user, _) = watch::channel(None);
        Arc::new(Self { user })
    }

    pub fn signed_in(uid: &str) -> Arc<Self> {
        let identity = Self::signed_out();
        identity.set_user(Some(uid));
        identity
    }

    pub fn set_user(&self, uid: Option<&str>) {
        self.user.send_replace(uid.map(|uid| IdentityUser {
            uid: uid.to_string(),
            email: Some(format!("{}@school.test", uid)),
        }));
    }
}

#[async_trait]
impl TokenSource for FakeIdentity {
    async fn bearer_token(&self) -> Result<String, AppError> {
        self.current_uid()
            .map(|uid| format!("token-{}", uid))
            .ok_or(AppError::Unauthenticated)
    }

    fn current_uid(&self) -> Option<String> {
        self.user.borrow().as_ref().map(|u| u.uid.clone())
    }
}

#[async_trait]
impl IdentityProvider for FakeIdentity {
    async fn sign_in_with_email(&self, email: &str, password: &str) -> Result<IdentityUser, AppError> {
        if password != "secret" {
            return Err(AppError::Identity("INVALID_PASSWORD".into()));
        }
        let uid = email.split('@').next().unwrap_or(email);
        self.set_user(Some(uid));
        Ok(self.user.borrow().clone().unwrap())
    }

    async fn sign_up_with_email(&self, email: &str, password: &str) -> Result<IdentityUser, AppError> {
        self.sign_in_with_email(email, password).await
    }

    async fn sign_out(&self) -> Result<(), AppError> {
        self.set_user(None);
        Ok(())
    }

    fn subscribe(&self) -> watch::Receiver<Option<IdentityUser>> {
        self.user.subscribe()
    }
}

pub fn profile(id: &str, user_id: &str, first: &str, last: &str, is_admin: bool) -> Profile {
    Profile {
        id: id.into(),
        user_id: user_id.into(),
        first_name: first.into(),
        last_name: last.into(),
        phone: "070-000 00 00".into(),
        person_number: "20050101-0000".into(),
        is_admin,
        address: "Skolgatan 1".into(),
        email: Some(format!("{}@school.test", user_id)),
    }
}

pub fn course(id: &str, name: &str, year: i64) -> Course {
    Course {
        id: id.into(),
        name: name.into(),
        year: CourseYear::Number(year),
    }
}

pub fn grade(id: &str, user_id: &str, course_id: &str, value: &str) -> Grade {
    Grade {
        id: id.into(),
        user_id: user_id.into(),
        course_id: course_id.into(),
        grade: value.into(),
        graded_by: "admin-1".into(),
        created_at: None,
        course: None,
    }
}

/// A small school: one admin, three students, courses over two years.
pub fn school() -> Arc<FakeBackend> {
    FakeBackend::new(
        vec![
            profile("p1", "admin-1", "Ada", "Admin", true),
            profile("p2", "stu-1", "Bo", "Svensson", false),
            profile("p3", "stu-2", "Cecilia", "Andersson", false),
            profile("p4", "stu-3", "david", "berg", false),
        ],
        vec![
            course("c1", "Svenska 1", 1),
            course("c2", "Matematik 1c", 1),
            course("c3", "Svenska 2", 2),
            course("c4", "Engelska 5", 1),
        ],
        vec![grade("g1", "stu-1", "c1", "B"), grade("g2", "stu-1", "c3", "A")],
    )
}

/// Router wired to the fakes, with the auth context already following
/// `identity`. Cancel the returned token to stop it.
pub fn build_test_app(backend: Arc<FakeBackend>, identity: Arc<FakeIdentity>) -> (Router, CancellationToken) {
    let auth = Arc::new(AuthContext::new(identity.clone(), backend.clone()));
    let shutdown = CancellationToken::new();
    auth.spawn(shutdown.clone());

    let state = AppState {
        backend,
        identity: identity.clone(),
        tokens: identity,
        auth,
        guard: GuardConfig::default(),
    };
    (router(state), shutdown)
}

pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
