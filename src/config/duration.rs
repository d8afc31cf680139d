//! Duration parsing utilities.

use anyhow::Context;

/// Parse a duration string like "7d", "1h", "30m", "300s", "300" into seconds.
/// Supports:
/// - Plain numbers (interpreted as seconds): "300"
/// - Seconds suffix: "300s"
/// - Minutes suffix: "30m"
/// - Hours suffix: "1h"
/// - Days suffix: "7d"
pub fn parse_duration_to_secs(s: &str) -> anyhow::Result<i64> {
    let s = s.trim();
    if s.is_empty() {
        anyhow::bail!("Empty duration string");
    }

    for (suffix, unit, secs_per_unit) in [
        ('d', "days", 86_400_i64),
        ('h', "hours", 3600),
        ('m', "minutes", 60),
        ('s', "seconds", 1),
    ] {
        if let Some(num_str) = s.strip_suffix(suffix) {
            let value: i64 = num_str
                .parse()
                .with_context(|| format!("Invalid {unit} value: {num_str}"))?;
            return value
                .checked_mul(secs_per_unit)
                .with_context(|| format!("Duration too large: {s}"));
        }
    }

    // No suffix - treat as seconds
    s.parse::<i64>()
        .with_context(|| format!("Invalid duration value: {s}"))
}
