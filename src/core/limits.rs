/*!
 * Guard Limits and Constants
 *
 * Centralized location for guard-layer limits and magic values.
 * Security-critical constants are marked with [SECURITY].
 */

// =============================================================================
// AUDIT
// =============================================================================

/// Maximum audit events kept in the global ring buffer
pub const MAX_AUDIT_EVENTS: usize = 10_000;

/// Maximum audit events kept per execution context
pub const MAX_AUDIT_EVENTS_PER_CONTEXT: usize = 100;

/// Maximum execution contexts with per-context audit state
/// [SECURITY] The oldest context is forgotten first, so a long-running host
/// minting a context per unit of work stays bounded
pub const MAX_AUDITED_CONTEXTS: usize = 4_096;

// =============================================================================
// ATTRIBUTE ACCESS
// =============================================================================

/// Attribute names with this prefix are never reachable from restricted code
/// [SECURITY]
pub const PRIVATE_ATTR_PREFIX: &str = "_";

// =============================================================================
// BUILT-INS
// =============================================================================

/// Largest list `range()` will materialize
/// [SECURITY] Bounds memory a single restricted call can allocate
pub const MAX_RANGE_LEN: usize = 1_000_000;
