//! User-Agent string parser driven by the `uap-core` regex ruleset.
//!
//! A ruleset is three ordered rule lists, one per facet (client, OS,
//! device); resolution applies them first-match-wins. Base resolvers
//! ([`BasicResolver`], [`FilteredResolver`]) do the matching, caching
//! ([`CachingResolver`] over [`Lru`], [`Sieve`] or [`S3Fifo`]) keeps
//! heavy-tailed workloads cheap, and [`Parser`] is the facet-oriented
//! facade over whichever stack was composed.
//!
//! ```
//! use ua_parser::{BasicResolver, Matchers, Parser, RuleFile, UserAgentRule};
//!
//! # fn main() -> ua_parser::Result<()> {
//! let matchers: Matchers = RuleFile {
//!     user_agent_parsers: vec![UserAgentRule {
//!         regex: r"(Firefox)/(\d+)\.(\d+)".to_owned(),
//!         ..Default::default()
//!     }],
//!     ..Default::default()
//! }
//! .try_into()?;
//!
//! let parser = Parser::new(BasicResolver::new(matchers));
//! let ua = parser.parse_user_agent("Mozilla/5.0 Firefox/120.0").unwrap();
//! assert_eq!(ua.family, "Firefox");
//! assert_eq!(ua.major.as_deref(), Some("120"));
//! # Ok(())
//! # }
//! ```

mod basic;
mod caching;
mod db;
mod error;
mod filtered;
mod loaders;
mod matchers;
mod parser;
mod substitution;
mod types;

pub use basic::BasicResolver;
pub use caching::{Cache, CachingResolver, Local, Lru, S3Fifo, Sieve};
pub use db::{DeviceRule, OsRule, RuleFile, UserAgentRule};
pub use error::{Error, Result};
pub use filtered::FilteredResolver;
pub use loaders::{load_json, load_yaml};
pub use matchers::{DeviceMatcher, Matchers, OsMatcher, UserAgentMatcher};
pub use parser::{Parser, Resolver, ResolverFn};
pub use types::{DefaultedResult, Device, Domain, Os, ParseResult, PartialResult, UserAgent};

use std::sync::{Arc, RwLock};

/// Process-wide parser used by the top-level convenience functions.
///
/// Replacement is an atomic swap of the reference: in-flight calls
/// finish against whichever parser they observed at entry.
static PARSER: RwLock<Option<Arc<Parser>>> = RwLock::new(None);

/// Installs `parser` as the process-wide parser and returns the
/// previous one, if any.
///
/// No ruleset is bundled with the library, so nothing is parsed at
/// the top level until this has been called.
pub fn set_parser(parser: Parser) -> Option<Arc<Parser>> {
    replace_parser(Some(Arc::new(parser)))
}

/// Swaps the process-wide parser wholesale, returning the previous
/// one. Mostly useful for tests that need to restore the earlier
/// state, including "unset".
pub fn replace_parser(parser: Option<Arc<Parser>>) -> Option<Arc<Parser>> {
    std::mem::replace(&mut *PARSER.write().expect("parser cell poisoned"), parser)
}

/// The current process-wide parser.
pub fn parser() -> Result<Arc<Parser>> {
    PARSER
        .read()
        .expect("parser cell poisoned")
        .clone()
        .ok_or(Error::ParserNotSet)
}

/// Parses all three facets using the process-wide parser.
///
/// Prefer the facet-specific functions when only some facets are
/// needed, unrequested rule lists are never scanned.
pub fn parse(ua: &str) -> Result<ParseResult> {
    Ok(parser()?.parse(ua))
}

/// Parses the client ("user agent") facet using the process-wide
/// parser.
pub fn parse_user_agent(ua: &str) -> Result<Option<UserAgent>> {
    Ok(parser()?.parse_user_agent(ua))
}

/// Parses the OS facet using the process-wide parser.
pub fn parse_os(ua: &str) -> Result<Option<Os>> {
    Ok(parser()?.parse_os(ua))
}

/// Parses the device facet using the process-wide parser.
pub fn parse_device(ua: &str) -> Result<Option<Device>> {
    Ok(parser()?.parse_device(ua))
}
