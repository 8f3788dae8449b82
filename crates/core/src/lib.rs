pub mod config;
pub mod domain;
pub mod errors;
pub mod formula;
pub mod page;

pub use domain::{
    BusinessUnit, EmployeeFields, Objective, Priority, ProjectFields, Status, BUSINESS_UNITS,
    OBJECTIVES,
};
pub use errors::{ApplicationError, InterfaceError};
pub use formula::{Formula, Predicate};
pub use page::{page_window, PageCursor, PageWindow, PAGE_SIZE};
