#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    IO(#[from] std::io::Error),
    #[error(transparent)]
    YAML(#[from] serde_yaml::Error),
    #[error(transparent)]
    JSON(#[from] serde_json::Error),
    #[error(transparent)]
    Regex(#[from] regex::Error),
    #[error(transparent)]
    FilteredParse(#[from] regex_filtered::ParseError),
    #[error(transparent)]
    FilteredBuild(#[from] regex_filtered::BuildError),
    /// A replacement template references a capture group the pattern
    /// does not have.
    #[error("template references group ${group} but `{pattern}` only has {groups} group(s)")]
    GroupReference {
        pattern: String,
        group: usize,
        groups: usize,
    },
    /// A rule relies on the implicit `family = $1` extraction but its
    /// pattern has no capture group.
    #[error("`{pattern}` has no capture group to extract the family from")]
    MissingFamilyGroup { pattern: String },
    /// `regex_flag` had a value other than the case-insensitivity marker.
    #[error("unrecognised regex_flag {flag:?} on `{pattern}`")]
    RegexFlag { pattern: String, flag: String },
    /// A partial result was completed before every facet was resolved.
    #[error("cannot complete a result missing facets {missing:?}")]
    Incomplete { missing: crate::Domain },
    /// A top-level convenience function was called before `set_parser`.
    #[error("no global parser has been set")]
    ParserNotSet,
}

pub type Result<T> = std::result::Result<T, Error>;
