//! The host-facing embedding surface for SL programs (spec §4.10),
//! grounded on `original_source/Source/Library/h/Module.hpp`.

mod host_fn;
mod module;

pub use host_fn::{host_fn0, host_fn1, host_fn2, host_fn3, HostValue};
pub use module::Module;
pub use sl_compiler::ExternalFunction;
