//! Re-exports

pub use super::calib::CalibOpt;
pub use super::inputoutput::InputOutputOpt;
pub use super::lib::Config;
pub use super::params::CalibParams;
pub use super::test_util::MockConfig;
pub use super::util::UtilOpt;
