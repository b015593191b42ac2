pub mod errors;
pub mod objective;
pub mod tags;

pub use errors::*;
pub use objective::*;
pub use tags::*;
