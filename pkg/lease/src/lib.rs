//! Soft record-lock lease protocol.
//!
//! A lease is a client-observed, advisory claim of exclusive editing intent
//! over a record. While the user stays active the claim is renewed by
//! periodic heartbeats; meanwhile a grace-period countdown runs toward a
//! deadline, and when it reaches zero the user is signaled exactly once to
//! renew or release.
//!
//! The crate is split along the decision/effect boundary:
//!
//! - [`time`]: finite-number coercion and millisecond arithmetic.
//! - [`planner`]: pure per-tick decisions, i.e. should a heartbeat fire and
//!   the expiry modal open.
//! - [`session`]: lifecycle operations over a [`pkg_state::store::StateBackend`].
//! - [`feed`]: interval task publishing the virtual clock.
//! - [`driver`]: the tick loop wiring feed → planner → collaborators.
//!
//! All timing runs on an externally injected virtual clock, never the
//! system clock, so every path here is deterministic under test.

pub mod driver;
pub mod feed;
pub mod planner;
pub mod session;
pub mod time;
