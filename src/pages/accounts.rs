use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use crate::backend::{BackendApi, CsvFile};
use crate::error::AppError;
use crate::models::{ImportSummary, Profile, ProfileUpdate};
use crate::pages::HoverPopup;
use crate::services::ProfilesHook;
use crate::utils::search_profiles;

pub const CSV_COLUMNS: &str = "user_id, first_name, last_name, phone, person_number, is_admin, address";

#[derive(Debug, Clone, Serialize)]
pub struct AccountsView {
    pub profiles: Vec<Profile>,
    pub count: usize,
    pub search: String,
    pub csv_columns: &'static str,
    pub csv_file: Option<String>,
    pub uploading: bool,
    pub editing: Option<Profile>,
    pub form: ProfileUpdate,
    pub dialog_open: bool,
    pub hovered: Option<Profile>,
    pub loading: bool,
    pub error: Option<String>,
    pub success: Option<String>,
}

/// Admin page for student profiles: CSV import, edit dialog, delete, and a
/// hover preview of the row under the pointer.
pub struct StudentAccountsWorkspace {
    backend: Arc<dyn BackendApi>,
    hook: ProfilesHook,
    search: String,
    editing: Option<Profile>,
    form: ProfileUpdate,
    dialog_open: bool,
    csv_file: Option<CsvFile>,
    uploading: bool,
    hover: HoverPopup,
    error: Option<String>,
    success: Option<String>,
}

impl StudentAccountsWorkspace {
    pub async fn open(backend: Arc<dyn BackendApi>) -> Self {
        let hook = ProfilesHook::mount(backend.clone()).await;
        Self {
            backend,
            hook,
            search: String::new(),
            editing: None,
            form: ProfileUpdate::default(),
            dialog_open: false,
            csv_file: None,
            uploading: false,
            hover: HoverPopup::new(),
            error: None,
            success: None,
        }
    }

    pub fn set_search(&mut self, term: impl Into<String>) {
        self.search = term.into();
    }

    pub fn profiles(&self) -> Vec<Profile> {
        let profiles = self.hook.profiles();
        if self.search.trim().is_empty() {
            profiles
        } else {
            search_profiles(&profiles, self.search.trim())
        }
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn success(&self) -> Option<&str> {
        self.success.as_deref()
    }

    /// Fails with the load error when the profile list could not be fetched.
    pub fn ensure_loaded(&self) -> Result<(), AppError> {
        match self.hook.state().error {
            Some(error) => Err(AppError::Load(error)),
            None => Ok(()),
        }
    }

    pub fn begin_edit(&mut self, profile_id: &str) -> Result<(), AppError> {
        self.ensure_loaded()?;
        let profile = self
            .hook
            .profiles()
            .into_iter()
            .find(|p| p.id == profile_id)
            .ok_or(AppError::NotFound)?;

        self.form = ProfileUpdate::from(&profile);
        self.editing = Some(profile);
        self.dialog_open = true;
        self.error = None;
        self.success = None;
        Ok(())
    }

    pub fn set_form(&mut self, form: ProfileUpdate) {
        self.form = form;
    }

    pub fn close_dialog(&mut self) {
        self.dialog_open = false;
    }

    /// Sends the whole edit form for the profile being edited.
    pub async fn submit_edit(&mut self) -> Result<Profile, AppError> {
        let Some(profile) = self.editing.clone() else {
            return Err(AppError::Validation("No profile is being edited".to_string()));
        };
        self.error = None;

        match self.backend.update_profile(&profile.id, &self.form).await {
            Ok(updated) => {
                info!("updated profile {}", profile.id);
                self.success = Some("Profile updated successfully!".to_string());
                self.dialog_open = false;
                self.hook.refetch().await;
                Ok(updated)
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Deletes a profile once `confirm` agrees. Returns `false` when the
    /// user backed out and nothing was sent.
    pub async fn delete(
        &mut self,
        profile_id: &str,
        confirm: impl FnOnce() -> bool,
    ) -> Result<bool, AppError> {
        if !confirm() {
            return Ok(false);
        }

        match self.backend.delete_profile(profile_id).await {
            Ok(()) => {
                info!("deleted profile {}", profile_id);
                self.success = Some("Profile deleted successfully!".to_string());
                self.hook.refetch().await;
                Ok(true)
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    pub fn choose_csv(&mut self, file: CsvFile) {
        self.csv_file = Some(file);
    }

    /// Uploads the chosen file as-is and reports the backend's counts.
    pub async fn upload_csv(&mut self) -> Result<ImportSummary, AppError> {
        let Some(file) = self.csv_file.clone() else {
            return Err(self.fail(AppError::Validation("Please choose a CSV file".to_string())));
        };

        self.uploading = true;
        self.error = None;
        self.success = None;

        let result = self.backend.import_profiles_csv(file).await;
        self.uploading = false;

        match result {
            Ok(summary) => {
                info!(
                    "csv import finished: {} imported, {} failed",
                    summary.imported, summary.failed
                );
                self.success = Some(import_message(&summary));
                self.csv_file = None;
                self.hook.refetch().await;
                Ok(summary)
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    pub fn hover_row(&mut self, profile_id: &str) {
        self.hover.enter_item(profile_id);
    }

    pub fn leave_row(&mut self) {
        self.hover.leave_item();
    }

    pub fn hover_popup(&mut self) {
        self.hover.enter_popup();
    }

    pub fn leave_popup(&mut self) {
        self.hover.leave_popup();
    }

    pub fn hovered_profile(&self) -> Option<Profile> {
        self.hover.hovered(&self.hook.profiles()).cloned()
    }

    fn fail(&mut self, error: AppError) -> AppError {
        self.error = Some(error.to_string());
        error
    }

    pub fn view(&self) -> AccountsView {
        let state = self.hook.state();
        let profiles = self.profiles();
        AccountsView {
            count: profiles.len(),
            profiles,
            search: self.search.clone(),
            csv_columns: CSV_COLUMNS,
            csv_file: self.csv_file.as_ref().map(|f| f.file_name.clone()),
            uploading: self.uploading,
            editing: self.editing.clone(),
            form: self.form.clone(),
            dialog_open: self.dialog_open,
            hovered: self.hovered_profile(),
            loading: state.loading,
            error: self.error.clone().or(state.error),
            success: self.success.clone(),
        }
    }

    pub fn unmount(&self) {
        self.hook.unmount();
    }
}

pub fn import_message(summary: &ImportSummary) -> String {
    let mut message = format!(
        "CSV imported successfully! {} profiles added.",
        summary.imported
    );
    if summary.failed > 0 {
        message.push_str(&format!(" {} rows failed.", summary.failed));
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn import_message_mentions_failures_only_when_present() {
        assert_eq!(
            import_message(&ImportSummary { imported: 4, failed: 0 }),
            "CSV imported successfully! 4 profiles added."
        );
        assert_eq!(
            import_message(&ImportSummary { imported: 3, failed: 2 }),
            "CSV imported successfully! 3 profiles added. 2 rows failed."
        );
    }
}
