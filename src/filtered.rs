use std::borrow::Cow;

use regex_filtered::Regexes;

use crate::error::Result;
use crate::matchers::Matchers;
use crate::parser::Resolver;
use crate::types::{Domain, PartialResult};

/// Resolver that prefilters each facet's rule list through a
/// multi-pattern set engine before applying individual rules.
///
/// The set engine reports which rule indices match in one pass over
/// the input; extraction then reuses the lowest-indexed rule's own
/// regex, so tie-breaks stay identical to [`BasicResolver`]
/// (first-match-wins in rule order).
pub struct FilteredResolver {
    user_agent_filter: Option<Regexes>,
    os_filter: Option<Regexes>,
    device_filter: Option<Regexes>,
    matchers: Matchers,
}

/// Combine a facet's patterns into a set matcher. An empty facet has
/// no filter at all rather than an empty set.
fn build_filter<'a>(patterns: impl Iterator<Item = Cow<'a, str>>) -> Result<Option<Regexes>> {
    let mut builder = regex_filtered::Builder::new();
    let mut any = false;
    for pattern in patterns {
        builder = builder.push(&pattern)?;
        any = true;
    }
    if !any {
        return Ok(None);
    }
    Ok(Some(builder.build()?))
}

/// Walk the filter's candidates in ascending rule order and keep the
/// first successful extraction. A candidate whose own regex then fails
/// to extract (the set engine and the rule engine can disagree on flag
/// semantics) is skipped rather than aborting the facet.
fn scan<T>(filter: Option<&Regexes>, ua: &str, extract: impl Fn(usize) -> Option<T>) -> Option<T> {
    filter?
        .matching(ua)
        .find_map(|(index, _regex)| extract(index))
}

impl FilteredResolver {
    pub fn new(matchers: Matchers) -> Result<Self> {
        let user_agent_filter = build_filter(
            matchers
                .user_agent
                .iter()
                .map(|m| Cow::Borrowed(m.pattern())),
        )?;
        let os_filter = build_filter(matchers.os.iter().map(|m| Cow::Borrowed(m.pattern())))?;
        // The set engine has no per-pattern flag switch, the
        // case-insensitivity marker is folded into the pattern itself.
        let device_filter = build_filter(matchers.device.iter().map(|m| {
            if m.case_insensitive() {
                Cow::Owned(format!("(?i){}", m.pattern()))
            } else {
                Cow::Borrowed(m.pattern())
            }
        }))?;

        log::debug!(
            "built prefilters over {}/{}/{} rules",
            matchers.user_agent.len(),
            matchers.os.len(),
            matchers.device.len(),
        );

        Ok(Self {
            user_agent_filter,
            os_filter,
            device_filter,
            matchers,
        })
    }

    pub fn matchers(&self) -> &Matchers {
        &self.matchers
    }
}

impl Resolver for FilteredResolver {
    fn resolve(&self, ua: &str, domains: Domain) -> PartialResult {
        PartialResult {
            domains,
            user_agent: domains
                .contains(Domain::USER_AGENT)
                .then(|| {
                    scan(self.user_agent_filter.as_ref(), ua, |i| {
                        self.matchers.user_agent[i].extract(ua)
                    })
                })
                .flatten(),
            os: domains
                .contains(Domain::OS)
                .then(|| scan(self.os_filter.as_ref(), ua, |i| self.matchers.os[i].extract(ua)))
                .flatten(),
            device: domains
                .contains(Domain::DEVICE)
                .then(|| {
                    scan(self.device_filter.as_ref(), ua, |i| {
                        self.matchers.device[i].extract(ua)
                    })
                })
                .flatten(),
            string: ua.to_owned(),
        }
    }
}
