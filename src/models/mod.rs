pub mod course;
pub mod grade;
pub mod profile;

pub use course::{Course, CourseYear, NewCourse};
pub use grade::{CourseSnapshot, Grade, GradeTimestamp, GradeUpdate, GradeValue, ImportSummary, NewGrade};
pub use profile::{NewProfile, Profile, ProfileUpdate};
