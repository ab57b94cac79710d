pub mod actor;
pub mod context;
pub mod error;
pub mod roles;

pub use actor::{actor_from_headers, Actor};
pub use context::{SecurityContext, SecurityCtxExtractor};
pub use error::SecurityError;
pub use roles::{ensure_any_role, Role};
