pub mod absence;
pub mod attendance;
pub mod device;
pub mod office;
pub mod schedule;
