pub mod forecasts;
pub mod observations;

pub use forecasts::*;
pub use observations::*;
