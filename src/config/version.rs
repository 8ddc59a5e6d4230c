//! Version validation for bumps.
//!
//! Versions are parsed as semver when possible. Dotted integers that are not
//! semver, such as CalVer `2024.10` or `2024.10.3.1`, are accepted too and
//! compared component by component. A bump must move strictly forward.

use semver::Version;
use std::cmp::Ordering;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionError {
    /// Neither semver nor dotted integers (e.g., "not-a-version")
    InvalidVersion { value: String, source: String },
    /// New version is not greater than the current one
    NotIncreasing { current: String, new: String },
    /// A pre-release or build version against a plain dotted one
    Incomparable { current: String, new: String },
}

impl fmt::Display for VersionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionError::InvalidVersion { value, source } => {
                write!(f, "invalid version '{}': {}", value, source)
            }
            VersionError::NotIncreasing { current, new } => {
                write!(
                    f,
                    "new version '{}' must be greater than current version '{}'",
                    new, current
                )
            }
            VersionError::Incomparable { current, new } => {
                write!(
                    f,
                    "cannot compare new version '{}' with current version '{}'",
                    new, current
                )
            }
        }
    }
}

impl std::error::Error for VersionError {}

/// A parsed version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BumpVersion {
    Semver(Version),
    /// Dot separated integers that are not valid semver.
    Numeric(Vec<u64>),
}

impl BumpVersion {
    /// Integer components, if the version has no pre-release or build part.
    fn numeric_parts(&self) -> Option<Vec<u64>> {
        match self {
            BumpVersion::Semver(v) if v.pre.is_empty() && v.build.is_empty() => {
                Some(vec![v.major, v.minor, v.patch])
            }
            BumpVersion::Semver(_) => None,
            BumpVersion::Numeric(parts) => Some(parts.clone()),
        }
    }
}

pub fn parse_version(value: &str) -> Result<BumpVersion, VersionError> {
    let trimmed = value.trim();
    match Version::parse(trimmed) {
        Ok(version) => Ok(BumpVersion::Semver(version)),
        Err(err) => parse_numeric(trimmed)
            .map(BumpVersion::Numeric)
            .ok_or_else(|| VersionError::InvalidVersion {
                value: value.to_string(),
                source: err.to_string(),
            }),
    }
}

fn parse_numeric(value: &str) -> Option<Vec<u64>> {
    value
        .split('.')
        .map(|part| {
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            part.parse().ok()
        })
        .collect()
}

/// Compare integer components, missing trailing components count as zero.
fn compare_numeric(a: &[u64], b: &[u64]) -> Ordering {
    let len = a.len().max(b.len());
    (0..len)
        .map(|i| {
            let x = a.get(i).copied().unwrap_or(0);
            let y = b.get(i).copied().unwrap_or(0);
            x.cmp(&y)
        })
        .find(|ord| ord.is_ne())
        .unwrap_or(Ordering::Equal)
}

/// Check that `new` is a valid version strictly greater than `current`.
///
/// # Examples
///
/// ```
/// use verbump::config::version::check_bump;
///
/// assert!(check_bump("0.88.0", "0.89.0").is_ok());
/// assert!(check_bump("1.0.0", "1.0.0-rc.1").is_err());
/// assert!(check_bump("2024.9", "2024.10").is_ok());
/// ```
pub fn check_bump(current: &str, new: &str) -> Result<(), VersionError> {
    let current_version = parse_version(current)?;
    let new_version = parse_version(new)?;

    let ordering = match (&current_version, &new_version) {
        (BumpVersion::Semver(a), BumpVersion::Semver(b)) => b.cmp(a),
        _ => match (current_version.numeric_parts(), new_version.numeric_parts()) {
            (Some(a), Some(b)) => compare_numeric(&b, &a),
            _ => {
                return Err(VersionError::Incomparable {
                    current: current.to_string(),
                    new: new.to_string(),
                })
            }
        },
    };

    if ordering != Ordering::Greater {
        return Err(VersionError::NotIncreasing {
            current: current.to_string(),
            new: new.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_bump() {
        assert!(check_bump("0.88.0", "0.88.1").is_ok());
        assert!(check_bump("0.88.0", "1.0.0").is_ok());
    }

    #[test]
    fn test_prerelease_ordering() {
        assert!(check_bump("1.0.0-alpha.4", "1.0.0-alpha.5").is_ok());
        assert!(check_bump("1.0.0-rc.1", "1.0.0").is_ok());
        assert!(check_bump("1.0.0", "1.0.0-rc.1").is_err());
    }

    #[test]
    fn test_same_version_rejected() {
        let err = check_bump("2.1.0", "2.1.0").unwrap_err();
        assert!(matches!(err, VersionError::NotIncreasing { .. }));
    }

    #[test]
    fn test_downgrade_rejected() {
        assert!(matches!(
            check_bump("2.1.0", "2.0.9").unwrap_err(),
            VersionError::NotIncreasing { .. }
        ));
    }

    #[test]
    fn test_invalid_versions() {
        assert!(matches!(
            check_bump("not-a-version", "1.0.0").unwrap_err(),
            VersionError::InvalidVersion { .. }
        ));
        assert!(matches!(
            check_bump("1.0.0", "1..0").unwrap_err(),
            VersionError::InvalidVersion { .. }
        ));
        assert!(matches!(
            check_bump("1.0.0", "v2").unwrap_err(),
            VersionError::InvalidVersion { .. }
        ));
    }

    #[test]
    fn test_calver_bump() {
        assert!(check_bump("2024.9", "2024.10").is_ok());
        assert!(check_bump("2024.10", "2025.1.0").is_ok());
        assert!(check_bump("2024.10.3.1", "2024.10.3.2").is_ok());
        assert!(matches!(
            check_bump("2024.10", "2024.9").unwrap_err(),
            VersionError::NotIncreasing { .. }
        ));
    }

    #[test]
    fn test_short_numeric_against_semver() {
        // Missing components count as zero.
        assert!(matches!(
            check_bump("1.0.0", "1.0").unwrap_err(),
            VersionError::NotIncreasing { .. }
        ));
        assert!(check_bump("1.0.0", "1.1").is_ok());
    }

    #[test]
    fn test_prerelease_against_numeric_is_incomparable() {
        assert!(matches!(
            check_bump("1.0.0-rc.1", "2024.10").unwrap_err(),
            VersionError::Incomparable { .. }
        ));
    }

    #[test]
    fn test_parse_version_kinds() {
        assert!(matches!(
            parse_version("1.2.3").unwrap(),
            BumpVersion::Semver(_)
        ));
        assert_eq!(
            parse_version(" 2024.10 ").unwrap(),
            BumpVersion::Numeric(vec![2024, 10])
        );
    }
}
