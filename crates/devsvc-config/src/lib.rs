mod defaults;
mod load;
mod types;

pub use load::*;
pub use types::*;
