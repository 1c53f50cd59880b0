pub mod hydration;
pub mod price;

pub use hydration::*;
pub use price::*;
