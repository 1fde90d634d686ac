mod forecasts;
mod places;

pub use forecasts::*;
pub use places::*;
