mod assistant;
mod delivery;
mod render;
mod scheduler;
mod subscriptions;

pub use assistant::*;
pub use delivery::*;
pub use render::*;
pub use scheduler::*;
pub use subscriptions::*;
