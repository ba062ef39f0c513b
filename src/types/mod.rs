mod domain;
mod result;

pub use domain::Domain;
pub use result::{DefaultedResult, Device, Os, ParseResult, PartialResult, UserAgent};
