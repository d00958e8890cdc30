pub mod bar;
pub mod features;
pub mod forecast;
pub mod market;

pub use bar::*;
pub use features::*;
pub use forecast::*;
pub use market::*;
