// Resolution engines
//
// `PyDriverEngine` drives a provisioned package through an out-of-process
// Python interpreter; `NullEngine` is the passthrough used when the
// runtime is unavailable or resolution is disabled.

mod null;
mod python;
mod traits;

pub use null::NullEngine;
pub use python::{DriverKind, PyDriverEngine, PyRuntime};
pub use traits::ResolverEngine;
