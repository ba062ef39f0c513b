use super::Domain;
use crate::error::{Error, Result};

/// Client ("user agent", the software responsible for the request)
/// information extracted from a user-agent string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserAgent {
    pub family: String,
    pub major: Option<String>,
    pub minor: Option<String>,
    pub patch: Option<String>,
    pub patch_minor: Option<String>,
}

impl Default for UserAgent {
    fn default() -> Self {
        Self {
            family: "Other".to_owned(),
            major: None,
            minor: None,
            patch: None,
            patch_minor: None,
        }
    }
}

/// OS information extracted from a user-agent string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Os {
    pub family: String,
    pub major: Option<String>,
    pub minor: Option<String>,
    pub patch: Option<String>,
    pub patch_minor: Option<String>,
}

impl Default for Os {
    fn default() -> Self {
        Self {
            family: "Other".to_owned(),
            major: None,
            minor: None,
            patch: None,
            patch_minor: None,
        }
    }
}

/// Device information extracted from a user-agent string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Device {
    pub family: String,
    pub brand: Option<String>,
    pub model: Option<String>,
}

impl Default for Device {
    fn default() -> Self {
        Self {
            family: "Other".to_owned(),
            brand: None,
            model: None,
        }
    }
}

/// Potentially incomplete resolver result.
///
/// Facet fields can be unset because the facet was never requested, or
/// because it was requested and no rule matched. `domains` records
/// which facets were looked up, disambiguating the two: a facet in
/// `domains` whose field is `None` is a lookup failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartialResult {
    pub domains: Domain,
    pub user_agent: Option<UserAgent>,
    pub os: Option<Os>,
    pub device: Option<Device>,
    pub string: String,
}

impl PartialResult {
    /// Requires that every facet was looked up, even if to a failure.
    ///
    /// Errors with [`Error::Incomplete`] when a facet was never
    /// requested, as there is nothing meaningful to report for it.
    pub fn complete(self) -> Result<ParseResult> {
        if self.domains != Domain::ALL {
            return Err(Error::Incomplete {
                missing: Domain::ALL - self.domains,
            });
        }
        Ok(ParseResult {
            user_agent: self.user_agent,
            os: self.os,
            device: self.device,
            string: self.string,
        })
    }
}

/// Fully resolved parse result.
///
/// Every facet was looked up; a `None` facet means no rule matched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseResult {
    pub user_agent: Option<UserAgent>,
    pub os: Option<Os>,
    pub device: Option<Device>,
    pub string: String,
}

impl ParseResult {
    /// Replaces every failed facet by its default value (family
    /// `"Other"`, everything else unset).
    pub fn with_defaults(self) -> DefaultedResult {
        DefaultedResult {
            user_agent: self.user_agent.unwrap_or_default(),
            os: self.os.unwrap_or_default(),
            device: self.device.unwrap_or_default(),
            string: self.string,
        }
    }
}

/// Variant of [`ParseResult`] where failed facets are set to their
/// default value instead of `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefaultedResult {
    pub user_agent: UserAgent,
    pub os: Os,
    pub device: Device,
    pub string: String,
}
