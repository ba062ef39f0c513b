use regex::{Regex, RegexBuilder};

use crate::db;
use crate::error::{Error, Result};
use crate::substitution::{max_group_ref, resolve, substitute};
use crate::types::{Device, Os, UserAgent};

/// Validate every explicit template against the pattern's group count,
/// and require a group for the implicit `family = $1` extraction when
/// no family template was supplied.
fn validate(regex: &Regex, templates: &[Option<&str>], has_family_template: bool) -> Result<()> {
    let groups = regex.captures_len() - 1;
    for template in templates.iter().copied().flatten() {
        let referenced = max_group_ref(template);
        if referenced > groups {
            return Err(Error::GroupReference {
                pattern: regex.as_str().to_owned(),
                group: referenced,
                groups,
            });
        }
    }
    if !has_family_template && groups < 1 {
        return Err(Error::MissingFamilyGroup {
            pattern: regex.as_str().to_owned(),
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// UserAgentMatcher
// ---------------------------------------------------------------------------

/// Match-and-extract unit for the user-agent (client) facet.
///
/// Default extraction: family from group 1, major/minor/patch from
/// groups 2-4, patch_minor from group 5. An explicit template replaces
/// the default for its field.
#[derive(Debug)]
pub struct UserAgentMatcher {
    regex: Regex,
    family: Option<String>,
    major: Option<String>,
    minor: Option<String>,
    patch: Option<String>,
    patch_minor: Option<String>,
}

impl UserAgentMatcher {
    /// A matcher with no replacement templates.
    pub fn new(pattern: &str) -> Result<Self> {
        db::UserAgentRule {
            regex: pattern.to_owned(),
            ..Default::default()
        }
        .try_into()
    }

    pub fn pattern(&self) -> &str {
        self.regex.as_str()
    }

    pub fn extract(&self, ua: &str) -> Option<UserAgent> {
        let caps = self.regex.captures(ua)?;
        // A family that resolves to nothing voids the whole match.
        let family = resolve(self.family.as_deref(), &caps, 1)?;
        Some(UserAgent {
            family,
            major: resolve(self.major.as_deref(), &caps, 2),
            minor: resolve(self.minor.as_deref(), &caps, 3),
            patch: resolve(self.patch.as_deref(), &caps, 4),
            patch_minor: resolve(self.patch_minor.as_deref(), &caps, 5),
        })
    }
}

impl TryFrom<db::UserAgentRule> for UserAgentMatcher {
    type Error = Error;

    fn try_from(rule: db::UserAgentRule) -> Result<Self> {
        let regex = Regex::new(&rule.regex)?;
        validate(
            &regex,
            &[
                rule.family_replacement.as_deref(),
                rule.v1_replacement.as_deref(),
                rule.v2_replacement.as_deref(),
                rule.v3_replacement.as_deref(),
                rule.v4_replacement.as_deref(),
            ],
            rule.family_replacement.is_some(),
        )?;
        Ok(Self {
            regex,
            family: rule.family_replacement,
            major: rule.v1_replacement,
            minor: rule.v2_replacement,
            patch: rule.v3_replacement,
            patch_minor: rule.v4_replacement,
        })
    }
}

// ---------------------------------------------------------------------------
// OsMatcher
// ---------------------------------------------------------------------------

/// Match-and-extract unit for the OS facet.
///
/// Default extraction: family from group 1, versions from groups 2-5.
#[derive(Debug)]
pub struct OsMatcher {
    regex: Regex,
    family: Option<String>,
    major: Option<String>,
    minor: Option<String>,
    patch: Option<String>,
    patch_minor: Option<String>,
}

impl OsMatcher {
    /// A matcher with no replacement templates.
    pub fn new(pattern: &str) -> Result<Self> {
        db::OsRule {
            regex: pattern.to_owned(),
            ..Default::default()
        }
        .try_into()
    }

    pub fn pattern(&self) -> &str {
        self.regex.as_str()
    }

    pub fn extract(&self, ua: &str) -> Option<Os> {
        let caps = self.regex.captures(ua)?;
        let family = resolve(self.family.as_deref(), &caps, 1)?;
        Some(Os {
            family,
            major: resolve(self.major.as_deref(), &caps, 2),
            minor: resolve(self.minor.as_deref(), &caps, 3),
            patch: resolve(self.patch.as_deref(), &caps, 4),
            patch_minor: resolve(self.patch_minor.as_deref(), &caps, 5),
        })
    }
}

impl TryFrom<db::OsRule> for OsMatcher {
    type Error = Error;

    fn try_from(rule: db::OsRule) -> Result<Self> {
        let regex = Regex::new(&rule.regex)?;
        validate(
            &regex,
            &[
                rule.os_replacement.as_deref(),
                rule.os_v1_replacement.as_deref(),
                rule.os_v2_replacement.as_deref(),
                rule.os_v3_replacement.as_deref(),
                rule.os_v4_replacement.as_deref(),
            ],
            rule.os_replacement.is_some(),
        )?;
        Ok(Self {
            regex,
            family: rule.os_replacement,
            major: rule.os_v1_replacement,
            minor: rule.os_v2_replacement,
            patch: rule.os_v3_replacement,
            patch_minor: rule.os_v4_replacement,
        })
    }
}

// ---------------------------------------------------------------------------
// DeviceMatcher
// ---------------------------------------------------------------------------

/// Match-and-extract unit for the device facet.
///
/// Default extraction: family and model from group 1; brand only comes
/// from an explicit template. The case-insensitivity flag affects
/// pattern matching only, never template substitution.
#[derive(Debug)]
pub struct DeviceMatcher {
    regex: Regex,
    case_insensitive: bool,
    family: Option<String>,
    brand: Option<String>,
    model: Option<String>,
}

impl DeviceMatcher {
    /// A case-sensitive matcher with no replacement templates.
    pub fn new(pattern: &str) -> Result<Self> {
        db::DeviceRule {
            regex: pattern.to_owned(),
            ..Default::default()
        }
        .try_into()
    }

    pub fn pattern(&self) -> &str {
        self.regex.as_str()
    }

    pub fn case_insensitive(&self) -> bool {
        self.case_insensitive
    }

    pub fn extract(&self, ua: &str) -> Option<Device> {
        let caps = self.regex.captures(ua)?;
        let family = resolve(self.family.as_deref(), &caps, 1)?;
        Some(Device {
            family,
            brand: self.brand.as_deref().and_then(|t| substitute(t, &caps)),
            model: resolve(self.model.as_deref(), &caps, 1),
        })
    }
}

impl TryFrom<db::DeviceRule> for DeviceMatcher {
    type Error = Error;

    fn try_from(rule: db::DeviceRule) -> Result<Self> {
        let case_insensitive = match rule.regex_flag.as_deref() {
            None => false,
            Some("i") => true,
            Some(flag) => {
                return Err(Error::RegexFlag {
                    pattern: rule.regex,
                    flag: flag.to_owned(),
                })
            }
        };
        let regex = RegexBuilder::new(&rule.regex)
            .case_insensitive(case_insensitive)
            .build()?;
        validate(
            &regex,
            &[
                rule.device_replacement.as_deref(),
                rule.brand_replacement.as_deref(),
                rule.model_replacement.as_deref(),
            ],
            rule.device_replacement.is_some(),
        )?;
        Ok(Self {
            regex,
            case_insensitive,
            family: rule.device_replacement,
            brand: rule.brand_replacement,
            model: rule.model_replacement,
        })
    }
}

// ---------------------------------------------------------------------------
// Matchers — the full ruleset
// ---------------------------------------------------------------------------

/// Three ordered matcher lists, one per facet. Matchers are tried in
/// sequence and the first match wins for its facet. Immutable once
/// constructed.
#[derive(Debug, Default)]
pub struct Matchers {
    pub user_agent: Vec<UserAgentMatcher>,
    pub os: Vec<OsMatcher>,
    pub device: Vec<DeviceMatcher>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ua_default_extraction() {
        let m = UserAgentMatcher::new(r"(Chrome)/(\d+)\.(\d+)\.(\d+)\.(\d+)").unwrap();
        let ua = m.extract("Chrome/41.0.2272.104").unwrap();
        assert_eq!(ua.family, "Chrome");
        assert_eq!(ua.major.as_deref(), Some("41"));
        assert_eq!(ua.minor.as_deref(), Some("0"));
        assert_eq!(ua.patch.as_deref(), Some("2272"));
        assert_eq!(ua.patch_minor.as_deref(), Some("104"));
    }

    #[test]
    fn ua_family_template() {
        let m: UserAgentMatcher = db::UserAgentRule {
            regex: r"(Firefox)/\d+".to_owned(),
            family_replacement: Some("$1 Mobile".to_owned()),
            ..Default::default()
        }
        .try_into()
        .unwrap();
        let ua = m.extract("Firefox/120").unwrap();
        assert_eq!(ua.family, "Firefox Mobile");
        assert_eq!(ua.major, None);
    }

    #[test]
    fn ua_no_match() {
        let m = UserAgentMatcher::new("(a)").unwrap();
        assert_eq!(m.extract("x"), None);
    }

    #[test]
    fn ua_optional_family_group_voids_match() {
        // Group 1 exists but does not participate: family resolves to
        // nothing, so the facet reports no match.
        let m = UserAgentMatcher::new(r"(?:(iPhone)|iPad)").unwrap();
        assert_eq!(m.extract("iPad"), None);
        assert_eq!(m.extract("iPhone").unwrap().family, "iPhone");
    }

    #[test]
    fn os_default_extraction() {
        let m = OsMatcher::new(r"Mac OS X (\d+)[_.](\d+)(?:[_.](\d+))?").unwrap();
        // Default family is group 1, which here captures the major
        // version, so an explicit template is required in real rules.
        let os = m.extract("Mac OS X 10_9_4").unwrap();
        assert_eq!(os.family, "10");
        assert_eq!(os.major.as_deref(), Some("9"));
    }

    #[test]
    fn os_templates() {
        let m: OsMatcher = db::OsRule {
            regex: r"Mac OS X (\d+)[_.](\d+)(?:[_.](\d+))?".to_owned(),
            os_replacement: Some("Mac OS X".to_owned()),
            os_v1_replacement: Some("$1".to_owned()),
            os_v2_replacement: Some("$2".to_owned()),
            os_v3_replacement: Some("$3".to_owned()),
            ..Default::default()
        }
        .try_into()
        .unwrap();
        let os = m.extract("Mozilla/5.0 (Macintosh; Intel Mac OS X 10_9_4)").unwrap();
        assert_eq!(os.family, "Mac OS X");
        assert_eq!(os.major.as_deref(), Some("10"));
        assert_eq!(os.minor.as_deref(), Some("9"));
        assert_eq!(os.patch.as_deref(), Some("4"));
        assert_eq!(os.patch_minor, None);
    }

    #[test]
    fn device_defaults_have_no_brand() {
        let m = DeviceMatcher::new(r"(Nexus \d+)").unwrap();
        let d = m.extract("Linux; Android; Nexus 5 Build").unwrap();
        assert_eq!(d.family, "Nexus 5");
        assert_eq!(d.brand, None);
        assert_eq!(d.model.as_deref(), Some("Nexus 5"));
    }

    #[test]
    fn device_case_insensitive_flag() {
        let m: DeviceMatcher = db::DeviceRule {
            regex: r"(iPhone)".to_owned(),
            regex_flag: Some("i".to_owned()),
            device_replacement: Some("iPhone".to_owned()),
            brand_replacement: Some("Apple".to_owned()),
            model_replacement: Some("$1".to_owned()),
            ..Default::default()
        }
        .try_into()
        .unwrap();
        // The flag loosens matching only; substitution is verbatim.
        let d = m.extract("some iphone thing").unwrap();
        assert_eq!(d.family, "iPhone");
        assert_eq!(d.brand.as_deref(), Some("Apple"));
        assert_eq!(d.model.as_deref(), Some("iphone"));
    }

    #[test]
    fn unknown_regex_flag_is_rejected() {
        let r: Result<DeviceMatcher> = db::DeviceRule {
            regex: "(a)".to_owned(),
            regex_flag: Some("g".to_owned()),
            ..Default::default()
        }
        .try_into();
        assert!(matches!(r, Err(Error::RegexFlag { .. })));
    }

    #[test]
    fn out_of_range_reference_is_rejected() {
        let r: Result<UserAgentMatcher> = db::UserAgentRule {
            regex: "(a)".to_owned(),
            v1_replacement: Some("$4".to_owned()),
            ..Default::default()
        }
        .try_into();
        assert!(matches!(
            r,
            Err(Error::GroupReference {
                group: 4,
                groups: 1,
                ..
            })
        ));
    }

    #[test]
    fn family_needs_a_group_without_template() {
        assert!(matches!(
            UserAgentMatcher::new("abc"),
            Err(Error::MissingFamilyGroup { .. })
        ));
        // A family template lifts the requirement.
        let m: UserAgentMatcher = db::UserAgentRule {
            regex: "abc".to_owned(),
            family_replacement: Some("ABC".to_owned()),
            ..Default::default()
        }
        .try_into()
        .unwrap();
        assert_eq!(m.extract("xabcx").unwrap().family, "ABC");
    }

    #[test]
    fn invalid_pattern_is_rejected() {
        assert!(matches!(UserAgentMatcher::new("(a"), Err(Error::Regex(_))));
    }
}
