use crate::models::Profile;

pub fn sort_profiles_by_last_name(profiles: &[Profile]) -> Vec<Profile> {
    let mut sorted = profiles.to_vec();
    sorted.sort_by(|a, b| {
        a.last_name
            .to_lowercase()
            .cmp(&b.last_name.to_lowercase())
            .then_with(|| a.last_name.cmp(&b.last_name))
    });
    sorted
}

pub fn filter_non_admin_profiles(profiles: &[Profile]) -> Vec<Profile> {
    profiles.iter().filter(|p| !p.is_admin).cloned().collect()
}

pub fn full_name(profile: &Profile) -> String {
    format!("{} {}", profile.first_name, profile.last_name)
}

/// Case-insensitive match on first name, last name or email.
pub fn search_profiles(profiles: &[Profile], term: &str) -> Vec<Profile> {
    let term = term.to_lowercase();
    profiles
        .iter()
        .filter(|p| {
            p.first_name.to_lowercase().contains(&term)
                || p.last_name.to_lowercase().contains(&term)
                || p
                    .email
                    .as_deref()
                    .is_some_and(|e| e.to_lowercase().contains(&term))
        })
        .cloned()
        .collect()
}
