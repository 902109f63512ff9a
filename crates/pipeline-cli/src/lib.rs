//! Command-line front end for the pipeline route search engine.
//!
//! The `pipeline-route` binary parses endpoints, pipe specification and
//! criterion weights, plans the primary route and its alternatives with
//! [`pipeline_core::RoutePlanner`] and prints a JSON [`RouteReport`].

pub mod config;
pub mod parse;
pub mod report;

pub use config::{load_search_config, load_terrain, Config};
pub use parse::{parse_position, parse_weights};
pub use report::RouteReport;
