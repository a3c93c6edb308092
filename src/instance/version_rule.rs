//! Version-rule matching for find queries.

/// How a find query constrains the provider's version.
///
/// Parsed from the textual forms `latest`, `{version}+` (at least),
/// `{start}-{end}` (start inclusive, end exclusive) and an exact version.
/// An empty rule means `latest`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionRule {
    /// Only the highest version among the matched services
    Latest,

    /// Any version not lower than the bound
    AtLeast(String),

    /// `start <= version < end`
    Range { start: String, end: String },

    /// Exactly this version
    Exact(String),
}

impl VersionRule {
    pub fn parse(rule: &str) -> Self {
        let rule = rule.trim();
        if rule.is_empty() || rule.eq_ignore_ascii_case("latest") {
            return VersionRule::Latest;
        }
        if let Some(bound) = rule.strip_suffix('+') {
            return VersionRule::AtLeast(bound.to_string());
        }
        if let Some((start, end)) = rule.split_once('-') {
            return VersionRule::Range {
                start: start.to_string(),
                end: end.to_string(),
            };
        }
        VersionRule::Exact(rule.to_string())
    }

    /// Whether a concrete version satisfies this rule.
    ///
    /// `Latest` matches everything here; narrowing to the single highest
    /// version happens once the candidate set is known.
    pub fn matches(
        &self,
        version: &str,
    ) -> bool {
        match self {
            VersionRule::Latest => true,
            VersionRule::AtLeast(bound) => version_ord(version) >= version_ord(bound),
            VersionRule::Range { start, end } => {
                let v = version_ord(version);
                v >= version_ord(start) && v < version_ord(end)
            }
            VersionRule::Exact(exact) => version_ord(version) == version_ord(exact),
        }
    }
}

/// Numeric ordering key of a dotted version.
///
/// Missing segments compare as 0, so `1.0` equals `1.0.0`; non-numeric
/// segments also collapse to 0. Segments past the fourth are ignored.
pub(crate) fn version_ord(version: &str) -> [u64; 4] {
    let mut ord = [0u64; 4];
    for (slot, segment) in ord.iter_mut().zip(version.trim().split('.')) {
        *slot = segment.parse().unwrap_or(0);
    }
    ord
}
