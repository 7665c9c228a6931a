use std::sync::Arc;

use crate::backend::BackendApi;
use crate::models::Profile;
use crate::services::{LoadCell, LoadState};
use crate::utils::{filter_non_admin_profiles, sort_profiles_by_last_name};

/// Student profiles (admins excluded), sorted by last name.
pub struct ProfilesHook {
    backend: Arc<dyn BackendApi>,
    profiles: LoadCell<Vec<Profile>>,
}

impl ProfilesHook {
    pub fn new(backend: Arc<dyn BackendApi>) -> Self {
        Self {
            backend,
            profiles: LoadCell::new(Vec::new(), true),
        }
    }

    pub async fn mount(backend: Arc<dyn BackendApi>) -> Self {
        let hook = Self::new(backend);
        hook.refetch().await;
        hook
    }

    pub async fn refetch(&self) -> bool {
        self.profiles
            .load(async {
                let all = self.backend.list_profiles().await?;
                Ok(sort_profiles_by_last_name(&filter_non_admin_profiles(&all)))
            })
            .await
    }

    pub fn state(&self) -> LoadState<Vec<Profile>> {
        self.profiles.get()
    }

    pub fn profiles(&self) -> Vec<Profile> {
        self.profiles.get().data
    }

    pub fn unmount(&self) {
        self.profiles.unmount();
    }
}
