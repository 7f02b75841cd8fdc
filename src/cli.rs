//! CLI domain: parse, route and presentation only.
//! Generation behavior lives in the service and scheduler; the CLI wires them up.

mod parse;
mod presentation;
mod route;

pub use parse::{Cli, Commands};
pub use route::RunContext;
