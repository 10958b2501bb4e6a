pub mod populate;

pub use populate::{run_populate, PopulateArgs};
