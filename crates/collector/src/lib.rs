mod dataset;
mod domains;
mod error;
mod loader;
mod locations;
mod rows;
#[cfg(test)]
mod test_utils;
mod utils;

pub use dataset::*;
pub use domains::*;
pub use error::*;
pub use loader::*;
pub use locations::*;
pub use rows::*;
pub use utils::*;
