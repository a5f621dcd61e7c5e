//! Entity lifecycle notifications
//!
//! The presentation layer registers a [`GameArenaListener`] with the arena
//! and mirrors simulation state from the callbacks: create a scene node when
//! an entity appears, drop it when the entity goes away. Callbacks are
//! synchronous and fire exactly once per logical creation or destruction.

use crate::pool::Handle;
use crate::sim::constraint::Constraint;
use crate::sim::entity::ArenaItem;

/// Observer interface for arena lifecycle events.
///
/// All methods default to no-ops so a listener only implements what it
/// needs. Destruction callbacks run after the entity has left the arena's
/// collections and pool, but the final state is still readable through the
/// reference - the slot is never reused before the callback returns.
pub trait GameArenaListener {
    /// A ship, projectile or celestial body entered the arena.
    fn object_created(&mut self, id: Handle, object: &ArenaItem) {
        let _ = (id, object);
    }

    /// An entity left the arena. `object` is its final state.
    fn object_destroyed(&mut self, id: Handle, object: &ArenaItem) {
        let _ = (id, object);
    }

    /// A constraint was attached between two entities.
    fn constraint_created(&mut self, id: Handle, constraint: &Constraint) {
        let _ = (id, constraint);
    }

    /// A constraint was removed, either directly or by cascade.
    fn constraint_destroyed(&mut self, id: Handle, constraint: &Constraint) {
        let _ = (id, constraint);
    }
}
