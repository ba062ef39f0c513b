use serde::Deserialize;

// ---------------------------------------------------------------------------
// Rule records, as decoded from the data project (regexes.yaml and its
// JSON mirror). Field keys follow the corpus verbatim; absence of a
// replacement field means "use the default extraction".
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserAgentRule {
    pub regex: String,
    #[serde(default)]
    pub family_replacement: Option<String>,
    #[serde(default)]
    pub v1_replacement: Option<String>,
    #[serde(default)]
    pub v2_replacement: Option<String>,
    #[serde(default)]
    pub v3_replacement: Option<String>,
    #[serde(default)]
    pub v4_replacement: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OsRule {
    pub regex: String,
    #[serde(default)]
    pub os_replacement: Option<String>,
    #[serde(default)]
    pub os_v1_replacement: Option<String>,
    #[serde(default)]
    pub os_v2_replacement: Option<String>,
    #[serde(default)]
    pub os_v3_replacement: Option<String>,
    #[serde(default)]
    pub os_v4_replacement: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeviceRule {
    pub regex: String,
    /// The only recognised value is `"i"` (case-insensitive matching).
    #[serde(default)]
    pub regex_flag: Option<String>,
    #[serde(default)]
    pub device_replacement: Option<String>,
    #[serde(default)]
    pub brand_replacement: Option<String>,
    #[serde(default)]
    pub model_replacement: Option<String>,
}

/// Top-level structure of `regexes.yaml`: one ordered rule list per
/// facet. Order is significant, the first matching rule wins.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RuleFile {
    pub user_agent_parsers: Vec<UserAgentRule>,
    pub os_parsers: Vec<OsRule>,
    pub device_parsers: Vec<DeviceRule>,
}
