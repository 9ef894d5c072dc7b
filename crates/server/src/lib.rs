mod routes;
mod scheduler;
mod startup;
mod utils;

pub use routes::*;
pub use scheduler::*;
pub use startup::*;
pub use utils::*;
