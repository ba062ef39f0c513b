use std::path::Path;

use rayon::prelude::*;

use crate::db::RuleFile;
use crate::error::Result;
use crate::matchers::Matchers;

impl TryFrom<RuleFile> for Matchers {
    type Error = crate::Error;

    /// Compiles and validates every rule. A single invalid rule fails
    /// the whole conversion, rulesets are never silently truncated.
    fn try_from(rules: RuleFile) -> Result<Matchers> {
        let user_agent = rules
            .user_agent_parsers
            .into_par_iter()
            .map(TryInto::try_into)
            .collect::<Result<Vec<_>>>()?;
        let os = rules
            .os_parsers
            .into_par_iter()
            .map(TryInto::try_into)
            .collect::<Result<Vec<_>>>()?;
        let device = rules
            .device_parsers
            .into_par_iter()
            .map(TryInto::try_into)
            .collect::<Result<Vec<_>>>()?;

        log::debug!(
            "compiled ruleset: {} user agent, {} os, {} device matchers",
            user_agent.len(),
            os.len(),
            device.len(),
        );

        Ok(Matchers {
            user_agent,
            os,
            device,
        })
    }
}

/// Loads a ruleset following the `regexes.yaml` structure.
pub fn load_yaml(path: impl AsRef<Path>) -> Result<Matchers> {
    let content = std::fs::read_to_string(path)?;
    serde_yaml::from_str::<RuleFile>(&content)?.try_into()
}

/// Loads a ruleset from the JSON mirror of the `regexes.yaml` structure.
pub fn load_json(path: impl AsRef<Path>) -> Result<Matchers> {
    let content = std::fs::read_to_string(path)?;
    serde_json::from_str::<RuleFile>(&content)?.try_into()
}
