mod dataset;
mod directory;
mod resolver;

pub use dataset::*;
pub use directory::*;
pub use resolver::*;
