pub mod weather;
pub mod ws;

pub use weather::*;
pub use ws::*;
