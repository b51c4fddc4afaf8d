//! Fault boundary for host calls
//!
//! The host occasionally throws a null reference while tearing down
//! animation or camera state. That one class is skipped with a warning;
//! every other fault goes back to the caller untouched.

use crate::world::HostFault;

/// Absorb a transient fault as `Ok(None)`. Other faults propagate.
pub fn guard<T>(operation: &str, result: Result<T, HostFault>) -> Result<Option<T>, HostFault> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(HostFault::TransientNullReference(detail)) => {
            tracing::warn!("Suppressed transient null reference in {}: {}", operation, detail);
            Ok(None)
        }
        Err(fault) => Err(fault),
    }
}

/// Run a host hook under the same policy
pub fn guard_with<T, F>(operation: &str, call: F) -> Result<Option<T>, HostFault>
where
    F: FnOnce() -> Result<T, HostFault>,
{
    guard(operation, call())
}
