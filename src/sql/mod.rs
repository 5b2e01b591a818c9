//! SQL templates: named placeholders compiled to positional parameters, values bound by type.

mod template;
pub mod params;
pub use template::*;
pub use params::*;
