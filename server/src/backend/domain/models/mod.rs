pub mod expense;
pub mod goal;

pub use expense::*;
pub use goal::*;
