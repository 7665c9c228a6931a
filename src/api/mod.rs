use axum::Json;
use axum::extract::{Multipart, Path, Query};
use axum::http::{HeaderName, header};
use axum::middleware;
use axum::response::IntoResponse;
use axum::routing::{post, put};
use axum::{Router, extract::State, http::StatusCode, routing::get};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::auth::{clear_session_cookie, session_cookie};
use crate::backend::CsvFile;
use crate::catalog::GradeOperation;
use crate::error::AppError;
use crate::guard::require_session;
use crate::identity::IdentityUser;
use crate::models::{Course, ImportSummary, NewCourse, Profile, ProfileUpdate};
use crate::pages::{
    AccountsView, HomeView, RegisterGradesView, RegisterGradesWorkspace, StudentAccountsWorkspace,
    StudentGradesPage, StudentGradesView, load_home,
};
use crate::state::AppState;
use crate::utils::Selection;

const DEFAULT_AFTER_LOGIN: &str = "/home";

#[derive(Deserialize)]
struct LoginPageParams {
    redirect: Option<String>,
}

#[derive(Serialize)]
struct LoginPage {
    redirect: String,
}

#[derive(Deserialize)]
struct Credentials {
    email: String,
    password: String,
    redirect: Option<String>,
}

#[derive(Serialize)]
struct SessionResponse {
    user: IdentityUser,
    redirect: String,
}

#[derive(Deserialize)]
struct StudentGradesParams {
    #[serde(default)]
    year: Selection,
    #[serde(default)]
    subject: Selection,
}

#[derive(Deserialize)]
struct RegisterGradesParams {
    year: Option<String>,
    course: Option<String>,
}

#[derive(Deserialize)]
struct SaveGradeRequest {
    year: Option<String>,
    course_id: String,
    student_user_id: String,
    grade: String,
}

#[derive(Serialize)]
struct SaveGradeResponse {
    operation: &'static str,
    message: String,
}

#[derive(Deserialize)]
struct AccountsParams {
    search: Option<String>,
    hover: Option<String>,
}

#[derive(Deserialize)]
struct DeleteParams {
    #[serde(default)]
    confirm: bool,
}

#[derive(Serialize)]
struct ImportResponse {
    #[serde(flatten)]
    summary: ImportSummary,
    message: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/auth/login", get(login_page).post(login))
        .route("/auth/signup", post(signup))
        .route("/auth/logout", post(logout))
        .route("/home", get(home))
        .route("/student/grades", get(student_grades))
        .route(
            "/admin/register-grades",
            get(register_grades).post(save_grade),
        )
        .route("/admin/student-accounts", get(student_accounts))
        .route(
            "/admin/student-accounts/{id}",
            put(update_profile).delete(delete_profile),
        )
        .route("/admin/student-accounts/import", post(import_csv))
        .route("/admin/courses", get(list_courses).post(create_course))
        .layer(middleware::from_fn_with_state(
            state.guard.clone(),
            require_session,
        ))
        .with_state(state)
}

/// Only same-site paths are followed after sign-in.
fn safe_redirect(redirect: Option<String>) -> String {
    redirect
        .filter(|r| r.starts_with('/') && !r.starts_with("//"))
        .unwrap_or_else(|| DEFAULT_AFTER_LOGIN.to_string())
}

async fn health() -> StatusCode {
    StatusCode::OK
}

async fn login_page(Query(params): Query<LoginPageParams>) -> Json<LoginPage> {
    Json(LoginPage {
        redirect: safe_redirect(params.redirect),
    })
}

async fn login(
    State(state): State<AppState>,
    Json(req): Json<Credentials>,
) -> Result<impl IntoResponse, AppError> {
    let user = state.identity.sign_in_with_email(&req.email, &req.password).await?;
    start_session(&state, user, req.redirect).await
}

async fn signup(
    State(state): State<AppState>,
    Json(req): Json<Credentials>,
) -> Result<impl IntoResponse, AppError> {
    let user = state.identity.sign_up_with_email(&req.email, &req.password).await?;
    start_session(&state, user, req.redirect).await
}

async fn start_session(
    state: &AppState,
    user: IdentityUser,
    redirect: Option<String>,
) -> Result<([(HeaderName, String); 1], Json<SessionResponse>), AppError> {
    let token = state.tokens.bearer_token().await?;
    Ok((
        [(header::SET_COOKIE, session_cookie(&token))],
        Json(SessionResponse {
            user,
            redirect: safe_redirect(redirect),
        }),
    ))
}

async fn logout(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    state.identity.sign_out().await?;
    Ok((
        StatusCode::NO_CONTENT,
        [(header::SET_COOKIE, clear_session_cookie())],
    ))
}

async fn home(State(state): State<AppState>) -> Result<Json<HomeView>, AppError> {
    let auth = state.auth.loaded().await;
    let view = load_home(state.backend.clone(), &auth).await?;
    Ok(Json(view))
}

async fn student_grades(
    State(state): State<AppState>,
    Query(params): Query<StudentGradesParams>,
) -> Result<Json<StudentGradesView>, AppError> {
    let mut page = StudentGradesPage::open(state.backend.clone(), state.tokens.clone()).await;
    page.select_year(params.year);
    page.select_subject(params.subject);
    Ok(Json(page.view()))
}

async fn register_grades(
    State(state): State<AppState>,
    Query(params): Query<RegisterGradesParams>,
) -> Result<Json<RegisterGradesView>, AppError> {
    let year = params.year.unwrap_or_else(|| "1".to_string());
    let mut workspace =
        RegisterGradesWorkspace::open(state.backend.clone(), state.tokens.clone(), year).await;
    if let Some(course) = params.course {
        workspace.select_course(course);
    }
    Ok(Json(workspace.view()))
}

async fn save_grade(
    State(state): State<AppState>,
    Json(req): Json<SaveGradeRequest>,
) -> Result<Json<SaveGradeResponse>, AppError> {
    let year = req.year.unwrap_or_else(|| "1".to_string());
    let mut workspace =
        RegisterGradesWorkspace::open(state.backend.clone(), state.tokens.clone(), year).await;
    workspace.select_course(req.course_id);
    workspace.begin_edit(&req.student_user_id);
    workspace.set_candidate(req.grade);

    let operation = workspace.save().await?;
    let message = workspace.success().unwrap_or_default().to_string();
    Ok(Json(SaveGradeResponse {
        operation: match operation {
            GradeOperation::Create => "create",
            GradeOperation::Update(_) => "update",
        },
        message,
    }))
}

async fn student_accounts(
    State(state): State<AppState>,
    Query(params): Query<AccountsParams>,
) -> Result<Json<AccountsView>, AppError> {
    let mut workspace = StudentAccountsWorkspace::open(state.backend.clone()).await;
    if let Some(search) = params.search {
        workspace.set_search(search);
    }
    if let Some(id) = params.hover {
        workspace.hover_row(&id);
    }
    Ok(Json(workspace.view()))
}

async fn update_profile(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<ProfileUpdate>,
) -> Result<Json<Profile>, AppError> {
    let mut workspace = StudentAccountsWorkspace::open(state.backend.clone()).await;
    workspace.begin_edit(&id)?;
    workspace.set_form(req);
    let profile = workspace.submit_edit().await?;
    Ok(Json(profile))
}

async fn delete_profile(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<DeleteParams>,
) -> Result<StatusCode, AppError> {
    let mut workspace = StudentAccountsWorkspace::open(state.backend.clone()).await;
    workspace.ensure_loaded()?;
    if workspace.delete(&id, || params.confirm).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::BadRequest("Deletion must be confirmed".to_string()))
    }
}

async fn import_csv(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ImportResponse>, AppError> {
    let mut file = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or("upload.csv").to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?;
        file = Some(CsvFile {
            file_name,
            bytes: bytes.to_vec(),
        });
    }
    let file = file.ok_or_else(|| AppError::BadRequest("Missing file field".to_string()))?;
    info!("importing {} ({} bytes)", file.file_name, file.bytes.len());

    let mut workspace = StudentAccountsWorkspace::open(state.backend.clone()).await;
    workspace.ensure_loaded()?;
    workspace.choose_csv(file);
    let summary = workspace.upload_csv().await?;
    Ok(Json(ImportResponse {
        summary,
        message: workspace.success().unwrap_or_default().to_string(),
    }))
}

async fn list_courses(State(state): State<AppState>) -> Result<Json<Vec<Course>>, AppError> {
    let courses = state.backend.list_courses().await?;
    Ok(Json(courses))
}

async fn create_course(
    State(state): State<AppState>,
    Json(req): Json<NewCourse>,
) -> Result<Json<Course>, AppError> {
    let course = state.backend.create_course(&req).await?;
    Ok(Json(course))
}
