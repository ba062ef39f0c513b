use std::sync::Arc;

use crate::types::{Device, Domain, Os, ParseResult, PartialResult, UserAgent};

/// The universal resolution protocol: look a user-agent string up for
/// the requested facets, producing a partial result that carries at
/// least those facets (more is allowed when computationally free) and
/// echoes the requested set back so "not requested" and "requested but
/// unmatched" stay distinguishable.
///
/// Resolvers compose by wrapping (see
/// [`CachingResolver`](crate::CachingResolver)).
pub trait Resolver {
    fn resolve(&self, ua: &str, domains: Domain) -> PartialResult;
}

/// Adapter turning a plain function into a resolver, keeping test
/// doubles and one-off adapters free of boilerplate.
pub struct ResolverFn<F>(pub F);

impl<F> Resolver for ResolverFn<F>
where
    F: Fn(&str, Domain) -> PartialResult,
{
    fn resolve(&self, ua: &str, domains: Domain) -> PartialResult {
        (self.0)(ua, domains)
    }
}

/// Facet-specific entry points over an underlying resolver.
///
/// The facade is cheap to clone and safe to share across threads;
/// composition happens in the resolver it wraps.
#[derive(Clone)]
pub struct Parser {
    resolver: Arc<dyn Resolver + Send + Sync>,
}

impl Parser {
    pub fn new(resolver: impl Resolver + Send + Sync + 'static) -> Self {
        Self {
            resolver: Arc::new(resolver),
        }
    }

    /// Pass-through to the underlying resolver.
    pub fn resolve(&self, ua: &str, domains: Domain) -> PartialResult {
        self.resolver.resolve(ua, domains)
    }

    /// Looks up all three facets.
    ///
    /// Panics if the underlying resolver violates the resolution
    /// contract by dropping a requested facet, which is a programmer
    /// error in the resolver, not a runtime condition.
    pub fn parse(&self, ua: &str) -> ParseResult {
        self.resolver
            .resolve(ua, Domain::ALL)
            .complete()
            .expect("resolver dropped a requested facet")
    }

    /// Looks up only the client ("user agent") facet.
    pub fn parse_user_agent(&self, ua: &str) -> Option<UserAgent> {
        self.resolver.resolve(ua, Domain::USER_AGENT).user_agent
    }

    /// Looks up only the OS facet.
    pub fn parse_os(&self, ua: &str) -> Option<Os> {
        self.resolver.resolve(ua, Domain::OS).os
    }

    /// Looks up only the device facet.
    pub fn parse_device(&self, ua: &str) -> Option<Device> {
        self.resolver.resolve(ua, Domain::DEVICE).device
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn null_resolver(ua: &str, domains: Domain) -> PartialResult {
        PartialResult {
            domains,
            user_agent: None,
            os: None,
            device: None,
            string: ua.to_owned(),
        }
    }

    #[test]
    fn facade_over_a_closure() {
        let p = Parser::new(ResolverFn(null_resolver));

        assert_eq!(
            p.parse("a"),
            ParseResult {
                user_agent: None,
                os: None,
                device: None,
                string: "a".to_owned(),
            }
        );
        assert_eq!(p.parse_os("a"), None);
    }

    #[test]
    fn facade_requests_single_facets() {
        let p = Parser::new(ResolverFn(|ua: &str, domains: Domain| {
            assert_eq!(domains, Domain::DEVICE);
            null_resolver(ua, domains)
        }));
        assert_eq!(p.parse_device("a"), None);
    }
}
