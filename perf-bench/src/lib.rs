//! Benchmark matrix and acceptance criteria for trained model performance.

mod common;

pub mod benchmark;
pub mod config;
pub mod criterion;
pub mod filter;
pub mod plan;
pub mod report;
pub mod result;
pub mod suite;

pub use benchmark::*;
pub use config::*;
pub use criterion::*;
pub use filter::*;
pub use plan::*;
pub use report::*;
pub use result::*;
pub use suite::*;
