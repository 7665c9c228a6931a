pub mod load;
pub mod profiles;
pub mod register_grades;
pub mod student_grades;

pub use load::{LoadCell, LoadState};
pub use profiles::ProfilesHook;
pub use register_grades::{RegisterData, RegisterGradesHook};
pub use student_grades::{StudentGrades, StudentGradesHook};
