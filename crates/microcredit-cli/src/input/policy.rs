use microcredit_core::PolicyConfig;
use tracing::debug;

use super::file;

/// Load the policy file if one was given, otherwise the built-in defaults.
///
/// `.yaml`/`.yml` files are read as YAML, everything else as JSON. Omitted
/// sections keep their defaults; the merged policy is validated before use.
pub fn load_policy(path: Option<&str>) -> Result<PolicyConfig, Box<dyn std::error::Error>> {
    let Some(path) = path else {
        return Ok(PolicyConfig::default());
    };

    let (canonical, contents) = file::read_text(path)?;
    let is_yaml = canonical
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));

    let policy: PolicyConfig = if is_yaml {
        serde_yaml::from_str(&contents)
            .map_err(|e| format!("Failed to parse '{}': {}", canonical.display(), e))?
    } else {
        serde_json::from_str(&contents)
            .map_err(|e| format!("Failed to parse '{}': {}", canonical.display(), e))?
    };
    policy.validate()?;

    debug!(path = %canonical.display(), "policy loaded");
    Ok(policy)
}
