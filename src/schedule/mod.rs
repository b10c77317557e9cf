//! Effective work-schedule resolution and check-in classification.
//!
//! A schedule for one employee on one date comes from exactly one tier:
//! a per-date override, the weekly template, or the built-in default.

pub mod classify;
pub mod model;
pub mod policy;
pub mod resolver;
pub mod store;
pub mod time;
pub mod validate;

pub use classify::classify_check_in;
pub use model::{
    AttendanceStatus, ResolvedSchedule, ScheduleOverride, WeeklyEntry, WeeklyTemplate,
};
pub use policy::SchedulePolicy;
pub use resolver::resolve_schedule;
pub use store::{MySqlScheduleStore, ScheduleStore};
