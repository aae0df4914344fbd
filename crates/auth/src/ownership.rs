//! Single-owner authorization predicate.

use uuid::Uuid;

/// Whether `identity` may mutate a resource owned by `owner`.
///
/// Kept as a standalone predicate (rather than inline comparisons at each
/// call site) so mutation handlers share one testable rule.
pub fn can_modify(owner: Uuid, identity: Uuid) -> bool {
    owner == identity
}
