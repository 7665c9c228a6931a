pub mod accounts;
pub mod home;
pub mod hover;
pub mod register;
pub mod student;

pub use accounts::{AccountsView, StudentAccountsWorkspace};
pub use home::{HomeView, NavLink, load_home};
pub use hover::{HOVER_CLOSE_DELAY, HasId, HoverPopup};
pub use register::{InlineEdit, RegisterGradesView, RegisterGradesWorkspace, RegisterRow};
pub use student::{StudentGradeRow, StudentGradesPage, StudentGradesView};
