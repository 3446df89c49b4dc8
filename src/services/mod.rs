//! Service layer: the event dispatch boundary and the derived-statistics
//! queries it relies on.

/// Event dispatch and registration flow orchestration.
pub mod flow;
/// Standings and top-scorer aggregation.
pub mod stats;
