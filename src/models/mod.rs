pub mod facts;
pub mod inference;
pub mod rule;
pub mod value;

pub use facts::*;
pub use inference::*;
pub use rule::*;
pub use value::*;
