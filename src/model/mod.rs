pub mod absence_request;
pub mod attendance;
pub mod device;
pub mod office_location;
pub mod role;
