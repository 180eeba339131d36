pub mod query;
pub mod tables;

pub use query::{Router, RouteResult};
pub use tables::RoutingTables;
