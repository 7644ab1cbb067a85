//! Snapshot retention window

/// Fallback when neither `--retention-days` nor the environment is usable
pub const DEFAULT_RETENTION_DAYS: u32 = 14;

/// Upper bound accepted from the command line or environment (100 years)
pub const MAX_RETENTION_DAYS: u32 = 36_500;

/// Environment variable providing the default retention
pub const RETENTION_DAYS_ENV: &str = "DEFAULT_RETENTION_DAYS";

/// Number of days a snapshot is kept before cleanup deletes it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionDays(u32);

impl RetentionDays {
    /// Parse a day count in `1..=MAX_RETENTION_DAYS`
    pub fn parse(raw: &str) -> Option<Self> {
        raw.trim()
            .parse::<i64>()
            .ok()
            .filter(|days| (1..=i64::from(MAX_RETENTION_DAYS)).contains(days))
            .and_then(|days| u32::try_from(days).ok())
            .map(Self)
    }

    /// Parse `raw`, falling back to `default` on anything invalid
    ///
    /// The second element carries a warning when `raw` was rejected.
    pub fn parse_or_default(raw: Option<&str>, default: u32) -> (Self, Option<String>) {
        let default = Self(default.clamp(1, MAX_RETENTION_DAYS));
        match raw {
            None => (default, None),
            Some(value) => match Self::parse(value) {
                Some(days) => (days, None),
                None => (
                    default,
                    Some(format!(
                        "Invalid retention days {:?}. Reset to default: {}",
                        value, default.0
                    )),
                ),
            },
        }
    }

    pub fn days(&self) -> u32 {
        self.0
    }
}

impl Default for RetentionDays {
    fn default() -> Self {
        Self(DEFAULT_RETENTION_DAYS)
    }
}

impl std::fmt::Display for RetentionDays {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} days", self.0)
    }
}
