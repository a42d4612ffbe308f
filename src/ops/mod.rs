mod clip;
mod contains;
mod split;

pub use clip::*;
