//! Clipbin Core Type Definitions
//!
//! Defines fundamental types used throughout the crate.

// =============================================================================
// ID Types
// =============================================================================

/// Media bin item unique identifier (ULID)
pub type ItemId = String;

// =============================================================================
// Time Types
// =============================================================================

/// Time in seconds (floating point)
pub type TimeSec = f64;
