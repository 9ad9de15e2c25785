pub mod attendance;
pub mod bonus;
pub mod catalog;
pub mod client;
pub mod employee;
pub mod financial;
pub mod job_title;
pub mod role;
pub mod user;
pub mod wash;
