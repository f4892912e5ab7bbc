pub use error::*;
pub use model::*;
pub use properties::*;

mod error;
mod model;
mod properties;
