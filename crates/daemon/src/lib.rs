mod domains;
mod reports;
mod utils;

pub use domains::*;
pub use reports::*;
pub use utils::*;
