pub mod categories;
pub mod insight;
pub mod observation;
pub mod prediction;

pub use categories::*;
pub use insight::*;
pub use observation::*;
pub use prediction::*;
