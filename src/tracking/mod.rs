//! Clock-in/out and asset custody state machines. These sit between the
//! handlers and the repositories: they read the current state, decide the
//! transition, and hand the guarded write to the store.

pub mod attendance;
pub mod custody;
