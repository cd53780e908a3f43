//! State store boundary for the lock lease record.
//!
//! The lease core never talks to a database directly; it is handed a
//! [`store::StateBackend`] and commits every mutation through it.

pub mod client;
pub mod memory;
pub mod store;
