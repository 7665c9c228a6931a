pub mod courses;
pub mod grades;
pub mod profiles;

pub use courses::{
    Selection, extract_base_subject, filter_courses, group_courses_by_subject,
    sort_courses_by_year, unique_subjects,
};
pub use grades::{GradeTone, format_grade_date, grade_tone, is_valid_grade};
pub use profiles::{filter_non_admin_profiles, full_name, search_profiles, sort_profiles_by_last_name};
