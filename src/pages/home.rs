use std::sync::Arc;

use serde::Serialize;
use tracing::warn;

use crate::auth::AuthSnapshot;
use crate::backend::BackendApi;
use crate::error::AppError;
use crate::identity::IdentityUser;

#[derive(Debug, Clone, Serialize)]
pub struct NavLink {
    pub title: &'static str,
    pub href: &'static str,
    pub description: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct HomeView {
    pub user: IdentityUser,
    pub is_admin: bool,
    pub links: Vec<NavLink>,
}

const ADMIN_LINKS: [NavLink; 2] = [
    NavLink {
        title: "Register Grades",
        href: "/admin/register-grades",
        description: "Add, edit, or delete student grades for courses.",
    },
    NavLink {
        title: "Admin Student Accounts",
        href: "/admin/student-accounts",
        description: "View, edit, delete student profiles or import CSV.",
    },
];

const STUDENT_LINKS: [NavLink; 1] = [NavLink {
    title: "My Grades",
    href: "/student/grades",
    description: "See your grades by year and subject.",
}];

/// Landing page after sign-in. Admin status comes from the user's profile;
/// a missing profile means a student view.
pub async fn load_home(backend: Arc<dyn BackendApi>, auth: &AuthSnapshot) -> Result<HomeView, AppError> {
    let user = auth.user.clone().ok_or(AppError::Unauthenticated)?;

    let is_admin = match backend.get_profile_by_user(&user.uid).await {
        Ok(profile) => profile.is_admin,
        Err(e) => {
            warn!("no profile for {}: {}", user.uid, e);
            false
        }
    };

    let links = if is_admin {
        ADMIN_LINKS.to_vec()
    } else {
        STUDENT_LINKS.to_vec()
    };

    Ok(HomeView {
        user,
        is_admin,
        links,
    })
}
