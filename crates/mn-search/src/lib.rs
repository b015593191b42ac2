//! # mn-search
//!
//! Trial orchestration for moenas experiments: observer assembly, agent
//! construction, and the single/batch launch modes with all-or-nothing batch
//! failure containment.

pub mod launch;
pub mod setup;
