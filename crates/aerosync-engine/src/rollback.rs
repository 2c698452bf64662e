//! Resolution of pending settings without device confirmation.
//!
//! Two paths end an update cycle without hearing from the device: a deadline
//! firing rolls a single setting back to its confirmed value, and the
//! rollback coordinator force-confirms every pending setting of a component
//! at once (link loss, session teardown). Rolling back to a possibly stale
//! confirmed value at that point would be more surprising to the application
//! than keeping its last request, so the coordinator promotes instead.

use crate::component::Component;
use crate::session::ChangeSession;
use crate::timer::TimerHandle;

/// Promote every pending setting of `component`, including keyed entries.
///
/// The session is marked dirty once if anything was promoted, so a commit
/// afterwards yields at most one notification for the whole batch.
/// Returns the number of settings promoted.
pub fn cancel_all_pending(component: &mut dyn Component, session: &mut ChangeSession<'_>) -> usize {
    let mut promoted = 0usize;
    component.for_each_setting(&mut |setting| {
        if setting.promote(session) {
            promoted = promoted.saturating_add(1);
        }
    });

    if promoted > 0 {
        tracing::debug!(kind = %session.kind(), promoted, "Pending settings promoted");
        session.mark_dirty();
    }
    promoted
}

/// Deliver a deadline firing to the setting that armed it.
///
/// Returns `true` when a setting rolled back. A handle no setting owns any
/// more (confirmed, promoted, superseded or pruned in the meantime) is a no-op.
pub fn route_timeout(
    component: &mut dyn Component,
    handle: TimerHandle,
    session: &mut ChangeSession<'_>,
) -> bool {
    let mut rolled_back = false;
    component.for_each_setting(&mut |setting| {
        if !rolled_back && setting.on_timeout(handle, session) {
            rolled_back = true;
        }
    });
    if !rolled_back {
        tracing::trace!(kind = %session.kind(), %handle, "Stale deadline ignored");
    }
    rolled_back
}
