//! # lars-state: Asset Lifecycle Transition Tables
//!
//! The lifecycle is expressed as two pieces of static data:
//!
//! - the **transition table** `(state, action) -> state`, mirroring the
//!   rules the repository backend enforces, used to fail fast before a
//!   backend call is made;
//! - the **next-action table** `(current, target) -> action`, used to drive
//!   multi-step moves such as DRAFT → PUBLISHED (PUBLISH, then APPROVE).
//!
//! Both are `const` arrays, so there is no lazy initialisation and no
//! locking. The [`TransitionTable`] trait lets callers substitute a
//! different table; the driver in `lars-resources` bounds the number of
//! steps it will take, so a cyclic table cannot loop forever.

pub mod table;

pub use table::{StandardLifecycle, TransitionTable, NEXT_ACTIONS, TRANSITIONS};
