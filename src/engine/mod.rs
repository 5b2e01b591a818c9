//! Request binding: callers, query templates, endpoints and the registry that holds them.

mod credentials;
mod endpoint;
mod params;
mod registry;
mod template;
mod verb;

pub use credentials::*;
pub use endpoint::*;
pub use params::*;
pub use registry::*;
pub use template::*;
pub use verb::*;
