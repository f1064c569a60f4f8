#![forbid(unsafe_code)]

pub mod analytics;
pub mod config;
pub mod datamodel;
pub mod exporters;
pub mod http;
pub mod live;
pub mod scoring;
pub mod telemetry;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
