//! Health score.

/// Points deducted per issue.
pub const ISSUE_PENALTY: u32 = 20;

/// Points deducted per warning.
pub const WARNING_PENALTY: u32 = 5;

/// Map issue and warning counts to a 0-100 score.
///
/// `100 - 20 * issues - 5 * warnings`, clamped to `[0, 100]`. The weights
/// are kept for report compatibility and have not been calibrated against
/// real meshes.
///
/// # Example
///
/// ```
/// use mesh_repair::health_score;
///
/// assert_eq!(health_score(0, 0), 100);
/// assert_eq!(health_score(1, 0), 80);
/// assert_eq!(health_score(3, 4), 20);
/// assert_eq!(health_score(10, 0), 0);
/// ```
#[must_use]
pub fn health_score(issues: usize, warnings: usize) -> u8 {
    let penalty = u32::try_from(issues)
        .unwrap_or(u32::MAX)
        .saturating_mul(ISSUE_PENALTY)
        .saturating_add(
            u32::try_from(warnings)
                .unwrap_or(u32::MAX)
                .saturating_mul(WARNING_PENALTY),
        );
    let score = 100_u32.saturating_sub(penalty);
    u8::try_from(score).unwrap_or(100)
}
