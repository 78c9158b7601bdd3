//! Command implementations.

mod apply;
mod inspect;
mod offset;
mod validate;

pub use apply::run_apply;
pub use inspect::run_inspect;
pub use offset::run_offset;
pub use validate::run_validate;
