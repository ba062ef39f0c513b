use crate::matchers::Matchers;
use crate::parser::Resolver;
use crate::types::{Domain, PartialResult};

/// Straightforward resolver trying each matcher of a facet in rule
/// order until one matches.
///
/// Worst case is a full regex scan per facet, which only stays
/// affordable behind a cache; prefer
/// [`FilteredResolver`](crate::FilteredResolver) when lookups are not
/// overwhelmingly cache hits.
pub struct BasicResolver {
    matchers: Matchers,
}

impl BasicResolver {
    pub fn new(matchers: Matchers) -> Self {
        Self { matchers }
    }

    pub fn matchers(&self) -> &Matchers {
        &self.matchers
    }
}

impl Resolver for BasicResolver {
    fn resolve(&self, ua: &str, domains: Domain) -> PartialResult {
        PartialResult {
            domains,
            user_agent: domains
                .contains(Domain::USER_AGENT)
                .then(|| self.matchers.user_agent.iter().find_map(|m| m.extract(ua)))
                .flatten(),
            os: domains
                .contains(Domain::OS)
                .then(|| self.matchers.os.iter().find_map(|m| m.extract(ua)))
                .flatten(),
            device: domains
                .contains(Domain::DEVICE)
                .then(|| self.matchers.device.iter().find_map(|m| m.extract(ua)))
                .flatten(),
            string: ua.to_owned(),
        }
    }
}
