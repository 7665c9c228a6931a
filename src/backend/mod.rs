pub mod dto;

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::config::BackendConfig;
use crate::error::AppError;
use crate::identity::TokenSource;
use crate::models::{
    Course, Grade, GradeUpdate, ImportSummary, NewCourse, NewGrade, NewProfile, Profile,
    ProfileUpdate,
};

/// A CSV file picked for upload. Its content is forwarded untouched; the
/// backend validates the rows.
#[derive(Debug, Clone)]
pub struct CsvFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

#[async_trait]
pub trait BackendApi: Send + Sync {
    async fn list_profiles(&self) -> Result<Vec<Profile>, AppError>;
    async fn get_profile(&self, profile_id: &str) -> Result<Profile, AppError>;
    async fn get_profile_by_user(&self, user_id: &str) -> Result<Profile, AppError>;
    async fn create_profile(&self, profile: &NewProfile) -> Result<Profile, AppError>;
    async fn update_profile(&self, profile_id: &str, update: &ProfileUpdate) -> Result<Profile, AppError>;
    async fn delete_profile(&self, profile_id: &str) -> Result<(), AppError>;
    async fn import_profiles_csv(&self, file: CsvFile) -> Result<ImportSummary, AppError>;

    async fn list_courses(&self) -> Result<Vec<Course>, AppError>;
    async fn create_course(&self, course: &NewCourse) -> Result<Course, AppError>;

    /// Courses whose year key equals `year`. The backend has no year filter,
    /// so the full catalog is fetched and filtered here.
    async fn list_courses_by_year(&self, year: &str) -> Result<Vec<Course>, AppError> {
        let courses = self.list_courses().await?;
        Ok(courses
            .into_iter()
            .filter(|c| c.year.as_key() == year)
            .collect())
    }

    async fn list_grades(&self) -> Result<Vec<Grade>, AppError>;
    async fn list_grades_by_user(&self, user_id: &str) -> Result<Vec<Grade>, AppError>;
    async fn create_grade(&self, grade: &NewGrade) -> Result<Grade, AppError>;
    async fn update_grade(&self, grade_id: &str, update: &GradeUpdate) -> Result<Grade, AppError>;
    async fn delete_grade(&self, grade_id: &str) -> Result<(), AppError>;
}

pub struct HttpBackendClient {
    client: Client,
    config: BackendConfig,
    tokens: Arc<dyn TokenSource>,
}

impl HttpBackendClient {
    pub fn new(config: BackendConfig, tokens: Arc<dyn TokenSource>) -> Result<Self, AppError> {
        let client = Client::builder()
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build http client: {}", e)))?;
        Ok(Self {
            client,
            config,
            tokens,
        })
    }

    async fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, AppError> {
        let token = self.tokens.bearer_token().await?;
        let url = format!("{}{}", self.config.base_url, path);
        debug!("{} {}", method, url);
        Ok(self
            .client
            .request(method, url)
            .header("Authorization", format!("Bearer {}", token)))
    }

    /// Sends once. Non-2xx responses become [`AppError::Api`] carrying the
    /// backend's `error` (or `message`) text, else `fallback`.
    async fn send(&self, request: RequestBuilder, fallback: &str) -> Result<Response, AppError> {
        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let message = error_message(&body).unwrap_or_else(|| fallback.to_string());
            warn!("backend error {}: {}", status, message);
            return Err(AppError::api(status, message));
        }

        Ok(response)
    }

    async fn data<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        fallback: &str,
    ) -> Result<Option<T>, AppError> {
        let response = self.send(request, fallback).await?;
        let body_text = response.text().await?;
        let envelope: dto::Envelope<T> = serde_json::from_str(&body_text)
            .map_err(|e| AppError::Decode(format!("{}: {}", fallback, e)))?;
        Ok(envelope.data)
    }

    async fn list<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        fallback: &str,
    ) -> Result<Vec<T>, AppError> {
        Ok(self.data(request, fallback).await?.unwrap_or_default())
    }

    async fn one<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        fallback: &str,
    ) -> Result<T, AppError> {
        self.data(request, fallback)
            .await?
            .ok_or_else(|| AppError::Decode(format!("{}: response has no data", fallback)))
    }
}

fn error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    ["error", "message"]
        .iter()
        .find_map(|key| value.get(key).and_then(|v| v.as_str()))
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[async_trait]
impl BackendApi for HttpBackendClient {
    async fn list_profiles(&self) -> Result<Vec<Profile>, AppError> {
        let request = self.request(Method::GET, "/profiles").await?;
        self.list(request, "Failed to fetch profiles").await
    }

    async fn get_profile(&self, profile_id: &str) -> Result<Profile, AppError> {
        let request = self
            .request(Method::GET, &format!("/profiles/{}", profile_id))
            .await?;
        self.one(request, "Failed to fetch profile").await
    }

    async fn get_profile_by_user(&self, user_id: &str) -> Result<Profile, AppError> {
        let request = self
            .request(Method::GET, &format!("/profiles/user/{}", user_id))
            .await?;
        self.one(request, "Profile not found").await
    }

    async fn create_profile(&self, profile: &NewProfile) -> Result<Profile, AppError> {
        let request = self.request(Method::POST, "/profiles").await?.json(profile);
        self.one(request, "Failed to create profile").await
    }

    async fn update_profile(&self, profile_id: &str, update: &ProfileUpdate) -> Result<Profile, AppError> {
        let request = self
            .request(Method::PUT, &format!("/profiles/{}", profile_id))
            .await?
            .json(update);
        self.one(request, "Failed to update profile").await
    }

    async fn delete_profile(&self, profile_id: &str) -> Result<(), AppError> {
        let request = self
            .request(Method::DELETE, &format!("/profiles/{}", profile_id))
            .await?;
        self.send(request, "Failed to delete profile").await?;
        Ok(())
    }

    async fn import_profiles_csv(&self, file: CsvFile) -> Result<ImportSummary, AppError> {
        let part = reqwest::multipart::Part::bytes(file.bytes)
            .file_name(file.file_name)
            .mime_str("text/csv")?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let request = self
            .request(Method::POST, "/profiles/import-csv")
            .await?
            .multipart(form);
        let response = self.send(request, "Failed to import CSV").await?;
        let body_text = response.text().await?;
        let parsed: dto::ImportResponse = serde_json::from_str(&body_text)
            .map_err(|e| AppError::Decode(format!("Failed to import CSV: {}", e)))?;

        Ok(ImportSummary {
            imported: parsed.imported,
            failed: parsed.failed,
        })
    }

    async fn list_courses(&self) -> Result<Vec<Course>, AppError> {
        let request = self.request(Method::GET, "/courses").await?;
        self.list(request, "Failed to fetch courses").await
    }

    async fn create_course(&self, course: &NewCourse) -> Result<Course, AppError> {
        let request = self.request(Method::POST, "/courses").await?.json(course);
        self.one(request, "Failed to create course").await
    }

    async fn list_grades(&self) -> Result<Vec<Grade>, AppError> {
        let request = self.request(Method::GET, "/grades").await?;
        self.list(request, "Failed to fetch grades").await
    }

    async fn list_grades_by_user(&self, user_id: &str) -> Result<Vec<Grade>, AppError> {
        let request = self
            .request(Method::GET, &format!("/grades/user/{}", user_id))
            .await?;
        self.list(request, "Failed to fetch grades").await
    }

    async fn create_grade(&self, grade: &NewGrade) -> Result<Grade, AppError> {
        let request = self.request(Method::POST, "/grades").await?.json(grade);
        self.one(request, "Failed to create grade").await
    }

    async fn update_grade(&self, grade_id: &str, update: &GradeUpdate) -> Result<Grade, AppError> {
        let request = self
            .request(Method::PUT, &format!("/grades/{}", grade_id))
            .await?
            .json(update);
        self.one(request, "Failed to update grade").await
    }

    async fn delete_grade(&self, grade_id: &str) -> Result<(), AppError> {
        let request = self
            .request(Method::DELETE, &format!("/grades/{}", grade_id))
            .await?;
        self.send(request, "Failed to delete grade").await?;
        Ok(())
    }
}
