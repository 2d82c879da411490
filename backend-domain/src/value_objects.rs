// Domain value objects
pub mod change_type;
pub mod external_source;
pub mod principal;
pub mod status;

pub use change_type::*;
pub use external_source::*;
pub use principal::*;
pub use status::*;
