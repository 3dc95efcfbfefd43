//! Registry health status and aggregation.
//!
//! # States
//! - Passing: instance receives traffic
//! - Warning / Critical / Maintenance: excluded from discovery
//!
//! # Aggregation
//! ```text
//! any unknown status        → Unknown (checked first, per check)
//! any maintenance check     → Maintenance
//! any critical              → Critical
//! any warning               → Warning
//! otherwise (incl. no checks) → Passing
//! ```

use std::fmt;

const NODE_MAINTENANCE_CHECK: &str = "_node_maintenance";
const SERVICE_MAINTENANCE_PREFIX: &str = "_service_maintenance:";

/// Health verdict reported by the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckStatus {
    Passing,
    Warning,
    Critical,
    Maintenance,
    Unknown,
}

impl CheckStatus {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "passing" => CheckStatus::Passing,
            "warning" => CheckStatus::Warning,
            "critical" => CheckStatus::Critical,
            "maintenance" => CheckStatus::Maintenance,
            _ => CheckStatus::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CheckStatus::Passing => "passing",
            CheckStatus::Warning => "warning",
            CheckStatus::Critical => "critical",
            CheckStatus::Maintenance => "maintenance",
            CheckStatus::Unknown => "unknown",
        }
    }

    pub fn is_passing(&self) -> bool {
        *self == CheckStatus::Passing
    }

    /// Combine `(check_id, status)` pairs into one verdict.
    pub fn aggregate<'a, I>(checks: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let (mut maintenance, mut critical, mut warning) = (false, false, false);

        for (check_id, status) in checks {
            if check_id == NODE_MAINTENANCE_CHECK || check_id.starts_with(SERVICE_MAINTENANCE_PREFIX) {
                maintenance = true;
                continue;
            }

            match CheckStatus::parse(status) {
                CheckStatus::Passing => {}
                CheckStatus::Warning => warning = true,
                CheckStatus::Critical => critical = true,
                CheckStatus::Maintenance => maintenance = true,
                CheckStatus::Unknown => return CheckStatus::Unknown,
            }
        }

        if maintenance {
            CheckStatus::Maintenance
        } else if critical {
            CheckStatus::Critical
        } else if warning {
            CheckStatus::Warning
        } else {
            CheckStatus::Passing
        }
    }
}

impl fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_checks_is_passing() {
        assert_eq!(CheckStatus::aggregate(Vec::<(&str, &str)>::new()), CheckStatus::Passing);
    }

    #[test]
    fn test_worst_status_wins() {
        let checks = vec![("serfHealth", "passing"), ("service:a", "warning")];
        assert_eq!(CheckStatus::aggregate(checks), CheckStatus::Warning);

        let checks = vec![
            ("serfHealth", "passing"),
            ("service:a", "warning"),
            ("service:b", "critical"),
        ];
        assert_eq!(CheckStatus::aggregate(checks), CheckStatus::Critical);
    }

    #[test]
    fn test_maintenance_overrides() {
        let checks = vec![("_node_maintenance", "critical"), ("service:a", "passing")];
        assert_eq!(CheckStatus::aggregate(checks), CheckStatus::Maintenance);

        let checks = vec![("_service_maintenance:orders-1", "critical")];
        assert_eq!(CheckStatus::aggregate(checks), CheckStatus::Maintenance);
    }

    #[test]
    fn test_unknown_status() {
        let checks = vec![("service:a", "passing"), ("service:b", "bogus")];
        let status = CheckStatus::aggregate(checks);
        assert_eq!(status, CheckStatus::Unknown);
        assert!(!status.is_passing());
    }
}
