//! Ordering of package-manager version strings
//!
//! Backends report versions in their own dialects (`38`, `8.0.3`,
//! `2:8.2.2434-3+deb11u1`, `7.0.0-1.fc39`). `PackageVersion` reduces them to
//! `epoch`, a `semver::Version` built from the leading numeric run, any
//! further numeric components, and a trailing suffix (package revision,
//! distro tag, pre-release marker).

use std::cmp::Ordering;
use std::fmt;

use semver::Version;

use crate::error::CoreError;

/// Parsed, totally ordered package version
#[derive(Debug, Clone)]
pub struct PackageVersion {
    raw: String,
    epoch: u64,
    release: Version,
    extra: Vec<u64>,
    suffix: String,
}

impl PackageVersion {
    /// Parse a version string
    ///
    /// # Errors
    /// Returns `CoreError::UnparsableVersion` when the string (after an
    /// optional epoch and `v` prefix) does not start with a digit
    pub fn parse(input: &str) -> Result<Self, CoreError> {
        let unparsable = || CoreError::UnparsableVersion(input.to_string());
        let mut rest = input.trim();

        let mut epoch = 0;
        if let Some((head, tail)) = rest.split_once(':')
            && !head.is_empty()
            && head.bytes().all(|b| b.is_ascii_digit())
        {
            epoch = head.parse().map_err(|_| unparsable())?;
            rest = tail;
        }

        rest = rest.strip_prefix(['v', 'V']).unwrap_or(rest);

        let mut numbers = Vec::new();
        loop {
            let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
            if digits == 0 {
                break;
            }
            numbers.push(rest[..digits].parse::<u64>().map_err(|_| unparsable())?);
            rest = &rest[digits..];

            // continue only on a dot followed by another number
            match rest.strip_prefix('.') {
                Some(next) if next.starts_with(|c: char| c.is_ascii_digit()) => rest = next,
                _ => break,
            }
        }

        let Some((&major, tail)) = numbers.split_first() else {
            return Err(unparsable());
        };
        let minor = tail.first().copied().unwrap_or(0);
        let patch = tail.get(1).copied().unwrap_or(0);

        let mut extra: Vec<u64> = tail.iter().skip(2).copied().collect();
        while extra.last() == Some(&0) {
            extra.pop();
        }

        Ok(Self {
            raw: input.trim().to_string(),
            epoch,
            release: Version::new(major, minor, patch),
            extra,
            suffix: rest.to_string(),
        })
    }

    /// Original string as reported by the backend
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// The `major.minor.patch` part
    #[must_use]
    pub fn release(&self) -> &Version {
        &self.release
    }

    /// Whether `latest` is strictly newer than `installed`
    ///
    /// # Errors
    /// Returns `CoreError::UnparsableVersion` if either string cannot be parsed
    pub fn is_newer(latest: &str, installed: &str) -> Result<bool, CoreError> {
        Ok(Self::parse(latest)? > Self::parse(installed)?)
    }
}

impl Ord for PackageVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.epoch
            .cmp(&other.epoch)
            .then_with(|| self.release.cmp(&other.release))
            .then_with(|| self.extra.cmp(&other.extra))
            .then_with(|| compare_suffix(&self.suffix, &other.suffix))
    }
}

/// Split off the leading run of bytes matching `pred`
fn split_run(s: &[u8], pred: impl Fn(u8) -> bool) -> (&[u8], &[u8]) {
    let len = s.iter().take_while(|&&b| pred(b)).count();
    s.split_at(len)
}

/// Compare revision suffixes segment by segment, as dpkg and rpm do
///
/// Digit runs compare numerically and other runs as text. A `~` sorts
/// before anything, including the end of the string, so `40~rc1 < 40`.
/// A digit run sorts after a text run at the same position.
fn compare_suffix(a: &str, b: &str) -> Ordering {
    let (mut a, mut b) = (a.as_bytes(), b.as_bytes());
    loop {
        match (a.first(), b.first()) {
            (Some(b'~'), Some(b'~')) => {
                a = &a[1..];
                b = &b[1..];
                continue;
            }
            (Some(b'~'), _) => return Ordering::Less,
            (_, Some(b'~')) => return Ordering::Greater,
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => match (x.is_ascii_digit(), y.is_ascii_digit()) {
                (true, false) => return Ordering::Greater,
                (false, true) => return Ordering::Less,
                (true, true) => {
                    let (x_run, x_rest) = split_run(a, |c| c.is_ascii_digit());
                    let (y_run, y_rest) = split_run(b, |c| c.is_ascii_digit());
                    let (_, x_run) = split_run(x_run, |c| c == b'0');
                    let (_, y_run) = split_run(y_run, |c| c == b'0');
                    let ord = x_run.len().cmp(&y_run.len()).then_with(|| x_run.cmp(y_run));
                    if ord != Ordering::Equal {
                        return ord;
                    }
                    a = x_rest;
                    b = y_rest;
                }
                (false, false) => {
                    let text = |c: u8| !c.is_ascii_digit() && c != b'~';
                    let (x_run, x_rest) = split_run(a, text);
                    let (y_run, y_rest) = split_run(b, text);
                    let ord = x_run.cmp(y_run);
                    if ord != Ordering::Equal {
                        return ord;
                    }
                    a = x_rest;
                    b = y_rest;
                }
            },
        }
    }
}

impl PartialOrd for PackageVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for PackageVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for PackageVersion {}

impl fmt::Display for PackageVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl std::str::FromStr for PackageVersion {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
