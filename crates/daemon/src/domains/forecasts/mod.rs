mod aemet_xml;
mod normalize;
mod service;
mod sky_state;
mod source;

pub use aemet_xml::*;
pub use normalize::*;
pub use service::*;
pub use sky_state::*;
pub use source::*;
