pub mod types;
pub mod filter;
pub mod filter_where;
pub mod error;

pub use types::*;
pub use filter::Filter;
pub use filter_where::{build_remote_filter, FilterWhere};
pub use error::FilterError;
