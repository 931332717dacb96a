mod params;
mod row;
mod sql_value;

pub use params::Params;
pub use row::{RawQueryResult, Record};
pub use sql_value::SqlValue;
