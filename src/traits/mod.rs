mod driver;

pub use driver::{DatabaseDriver, DriverConnection};
