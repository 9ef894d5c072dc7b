mod fetch_forecast;

pub use fetch_forecast::*;
