//! Application-level rules that sit above the store.
//!
//! The store keeps no "at least one script" invariant so that bulk and
//! administrative callers can empty a project; the HTTP layer applies these
//! rules for interactive callers.

use crate::error::CoreError;

/// Refuse to remove a script when it is the only one left in its project.
pub fn ensure_script_removable(script_count: usize) -> Result<(), CoreError> {
    if script_count <= 1 {
        return Err(CoreError::Policy(
            "A project must keep at least one script; the last script cannot be deleted"
                .to_string(),
        ));
    }
    Ok(())
}
