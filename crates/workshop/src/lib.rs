//! Replays repair order command scripts.
//!
//! A script opens one order and runs a list of commands against it through
//! an in-memory `OrderService`. The resulting order and every rejected
//! command are reported back.

pub mod config;
pub mod script;

pub use config::Config;
pub use script::{Failure, Report, Script, run};
