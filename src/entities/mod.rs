pub mod device_authorization;
pub mod job_execution;

pub use device_authorization::Entity as DeviceAuthorization;
pub use job_execution::Entity as JobExecution;
