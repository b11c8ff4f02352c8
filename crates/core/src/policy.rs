//! Scan policy resolution from auto-detection and explicit configuration.

use jaxscope_api::{DeploymentError, Result, ScanPolicy, WebDescriptor};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanFlag {
    All,
    Providers,
    Resources,
}

impl ScanFlag {
    /// Maps both the short flag names and the context parameter names.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "scan-all" | "jaxrs.scan" => Some(ScanFlag::All),
            "scan-providers" | "jaxrs.scan.providers" => Some(ScanFlag::Providers),
            "scan-resources" | "jaxrs.scan.resources" => Some(ScanFlag::Resources),
            _ => None,
        }
    }
}

/// Auto-detected inputs for one unit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AutoDetect {
    pub has_boot_classes: bool,
    pub metadata_complete: bool,
}

/// Parses an explicit flag value, accepting only `true`/`false` in any case.
pub fn parse_flag(param: &str, value: Option<&str>) -> Result<bool> {
    let invalid = || DeploymentError::InvalidConfigValue {
        param: param.to_string(),
        value: value.map(str::to_string),
    };
    match value.map(str::to_ascii_lowercase).as_deref() {
        Some("true") => Ok(true),
        Some("false") => Ok(false),
        _ => Err(invalid()),
    }
}

/// Resolves the effective policy.
///
/// Every assignment is validated, even when boot classes later force scanning
/// off. Names that are not scan flags are ignored.
pub fn resolve<'a, I>(detected: AutoDetect, assignments: I) -> Result<ScanPolicy>
where
    I: IntoIterator<Item = (&'a str, Option<&'a str>)>,
{
    let mut all = None;
    let mut providers = None;
    let mut resources = None;

    for (name, value) in assignments {
        let Some(flag) = ScanFlag::from_name(name) else {
            continue;
        };
        let parsed = parse_flag(name, value)?;
        match flag {
            ScanFlag::All => all = Some(parsed),
            ScanFlag::Providers => providers = Some(parsed),
            ScanFlag::Resources => resources = Some(parsed),
        }
    }

    if detected.has_boot_classes {
        return Ok(ScanPolicy {
            has_boot_classes: true,
            ..ScanPolicy::default()
        });
    }

    // An explicit scan-all=true switches the other flags on; false only
    // switches itself off.
    let default = !detected.metadata_complete;
    let implied = default || all == Some(true);
    Ok(ScanPolicy {
        scan_all: all.unwrap_or(default),
        scan_providers: providers.unwrap_or(implied),
        scan_resources: resources.unwrap_or(implied),
        has_boot_classes: false,
    })
}

/// Resolves the policy of a web unit from its descriptor's context parameters.
pub fn resolve_for_descriptor(web: &WebDescriptor, has_boot_classes: bool) -> Result<ScanPolicy> {
    let detected = AutoDetect {
        has_boot_classes,
        metadata_complete: web.metadata_complete,
    };
    resolve(
        detected,
        web.context_params
            .iter()
            .map(|p| (p.name.as_str(), p.value.as_deref())),
    )
}
