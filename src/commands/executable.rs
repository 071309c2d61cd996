use crate::frame::Frame;
use crate::store::InnerStoreLocked;

/// Runs a command against the in-memory store while its lock is held.
///
/// Failures are reported the way a server reports them: as an error frame, not as `Err`.
pub trait Executable {
    fn exec(self, store: &mut InnerStoreLocked<'_>) -> Frame;
}
