pub mod config;
pub mod controller;
pub mod errors;
pub mod html;
pub mod http_client;
pub mod output;
pub mod platform;
pub mod scope;

pub use crate::config::{RunConfig, ScopeMode};
pub use crate::errors::{ScanError, ScanResult};
pub use crate::output::{StdoutSink, TargetSink, VecSink};
