pub mod builders;
pub mod db;

pub use builders::{DeviceRequestBuilder, FlowConfigBuilder};
pub use db::TestDb;
