use serde::Deserialize;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use crate::errors::{ScanError, ScanResult};

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONTAINER_CLASS: &str = "react-component";

/// Which shapes of scope entry are eligible for output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(try_from = "Option<String>")]
pub enum ScopeMode {
    /// Literal URLs / hostnames only.
    Narrow,
    /// Wildcard entries, rewritten to their bare domain.
    Wide,
    #[default]
    All,
}

impl FromStr for ScopeMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "all" => Ok(ScopeMode::All),
            "narrow" => Ok(ScopeMode::Narrow),
            "wide" => Ok(ScopeMode::Wide),
            other => Err(format!("unknown scope mode '{}' (expected narrow, wide or all)", other)),
        }
    }
}

/// A bare `scope:` key is YAML null and means the default.
impl TryFrom<Option<String>> for ScopeMode {
    type Error = String;

    fn try_from(value: Option<String>) -> Result<Self, Self::Error> {
        value.map_or(Ok(ScopeMode::All), |s| s.parse())
    }
}

impl fmt::Display for ScopeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ScopeMode::Narrow => "narrow",
            ScopeMode::Wide => "wide",
            ScopeMode::All => "all",
        };
        f.write_str(s)
    }
}

/// How `maxPrograms` behaves when an explicit include list replaces discovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IncludeCap {
    /// Run the whole include list.
    Ignore,
    /// Stop after the first included program that yields a target (only when maxPrograms > 0).
    First,
    /// Count yielding programs exactly like paginated discovery.
    Count,
}

/// What HackerOne's `all` mode accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AllMode {
    /// Wildcard-typed assets only (the platform's historical behaviour).
    #[default]
    Wildcard,
    /// Wildcard-typed assets, then URL-typed ones, like Bugcrowd's `all`.
    Union,
}

/// Settings shared by both platforms.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlatformConfig {
    pub reward: String,
    pub category: String,
    pub scope: ScopeMode,
    /// Programs that yielded at least one target before stopping; 0 = unlimited.
    pub max_programs: u32,
    pub include: Vec<String>,
    pub include_cap: Option<IncludeCap>,
}

impl PlatformConfig {
    /// Empty category means "every category".
    pub fn accepts_category(&self, category: &str) -> bool {
        self.category.is_empty() || self.category == category
    }

    pub fn include_cap_or(&self, platform_default: IncludeCap) -> IncludeCap {
        self.include_cap.unwrap_or(platform_default)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BugcrowdConfig {
    #[serde(flatten)]
    pub platform: PlatformConfig,
    /// Only accept the brief-endpoint attribute inside an element carrying `container_class`.
    pub require_container: bool,
    pub container_class: String,
}

impl Default for BugcrowdConfig {
    fn default() -> Self {
        Self {
            platform: PlatformConfig::default(),
            require_container: true,
            container_class: DEFAULT_CONTAINER_CLASS.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HackerOneConfig {
    #[serde(flatten)]
    pub platform: PlatformConfig,
    pub all_mode: AllMode,
    pub h1_username: String,
    pub h1_token: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Platforms {
    pub bugcrowd: Option<BugcrowdConfig>,
    pub hackerone: Option<HackerOneConfig>,
}

/// Parsed template: which platforms to scan and how to reach them.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub findtarget: Platforms,
    proxy: Option<String>,
    timeout: Option<u64>,
}

impl RunConfig {
    pub fn proxy(&self) -> Option<&str> {
        self.proxy.as_deref().map(str::trim).filter(|p| !p.is_empty())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout.filter(|t| *t > 0).unwrap_or(DEFAULT_TIMEOUT_SECS))
    }
}

pub fn parse_template(yaml: &str) -> ScanResult<RunConfig> {
    serde_yaml::from_str(yaml).map_err(|e| ScanError::Config(format!("failed to parse YAML: {}", e)))
}

/// Load the YAML template at `path`.
pub fn load_template(path: &Path) -> ScanResult<RunConfig> {
    if path.as_os_str().is_empty() {
        return Err(ScanError::Config("no template path provided".into()));
    }
    if !path.exists() {
        return Err(ScanError::Config(format!("config file not found: {}", path.display())));
    }
    let data = std::fs::read_to_string(path)
        .map_err(|e| ScanError::Config(format!("failed to read config file: {}", e)))?;
    parse_template(&data)
}

/// HackerOne API Basic Auth pair.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub api_key: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    pub fn new(username: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self { username: username.into(), api_key: api_key.into() }
    }

    /// Resolve credentials from `lookup` (normally the process environment),
    /// falling back to the template values. Both must end up non-empty.
    pub fn resolve<F>(lookup: F, cfg: &HackerOneConfig) -> ScanResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let pick = |key: &str, fallback: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| fallback.to_string())
        };
        let api_key = pick("H1_API_KEY", &cfg.h1_token);
        if api_key.is_empty() {
            return Err(ScanError::MissingCredential("H1_API_KEY"));
        }
        let username = pick("H1_USERNAME", &cfg.h1_username);
        if username.is_empty() {
            return Err(ScanError::MissingCredential("H1_USERNAME"));
        }
        Ok(Self { username, api_key })
    }

    pub fn from_env(cfg: &HackerOneConfig) -> ScanResult<Self> {
        Self::resolve(|k| std::env::var(k).ok(), cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_template() {
        let yaml = r#"
findtarget:
  bugcrowd:
    reward: points
    category: website
    scope: wide
    maxPrograms: 3
    include:
      - https://bugcrowd.com/engagements/acme
    requireContainer: false
  hackerone:
    scope: narrow
    maxPrograms: 2
    includeCap: count
    allMode: union
proxy: socks5://127.0.0.1:9050
timeout: 12
"#;
        let cfg = parse_template(yaml).unwrap();
        let bc = cfg.findtarget.bugcrowd.as_ref().unwrap();
        assert_eq!(bc.platform.reward, "points");
        assert_eq!(bc.platform.scope, ScopeMode::Wide);
        assert_eq!(bc.platform.max_programs, 3);
        assert_eq!(bc.platform.include.len(), 1);
        assert!(!bc.require_container);
        assert_eq!(bc.container_class, DEFAULT_CONTAINER_CLASS);

        let h1 = cfg.findtarget.hackerone.as_ref().unwrap();
        assert_eq!(h1.platform.scope, ScopeMode::Narrow);
        assert_eq!(h1.platform.include_cap, Some(IncludeCap::Count));
        assert_eq!(h1.all_mode, AllMode::Union);

        assert_eq!(cfg.proxy(), Some("socks5://127.0.0.1:9050"));
        assert_eq!(cfg.timeout(), Duration::from_secs(12));
    }

    #[test]
    fn scope_defaults_to_all() {
        let cfg = parse_template("findtarget:\n  bugcrowd:\n    category: api\n").unwrap();
        let bc = cfg.findtarget.bugcrowd.unwrap();
        assert_eq!(bc.platform.scope, ScopeMode::All);
        assert_eq!(bc.platform.max_programs, 0);
        assert!(bc.require_container);
        assert!(cfg.findtarget.hackerone.is_none());

        let cfg = parse_template("findtarget:\n  hackerone:\n    scope: \"\"\n").unwrap();
        assert_eq!(cfg.findtarget.hackerone.unwrap().platform.scope, ScopeMode::All);

        let cfg = parse_template("findtarget:\n  bugcrowd:\n    scope:\n    category: website\n").unwrap();
        let bc = cfg.findtarget.bugcrowd.unwrap();
        assert_eq!(bc.platform.scope, ScopeMode::All);
        assert_eq!(bc.platform.category, "website");
    }

    #[test]
    fn unknown_scope_is_rejected() {
        let err = parse_template("findtarget:\n  bugcrowd:\n    scope: everything\n").unwrap_err();
        assert!(err.to_string().contains("everything"));
    }

    #[test]
    fn blank_proxy_is_none() {
        let cfg = parse_template("proxy: \"\"\n").unwrap();
        assert!(cfg.proxy().is_none());
        assert_eq!(cfg.timeout(), Duration::from_secs(DEFAULT_TIMEOUT_SECS));
    }

    #[test]
    fn category_filter() {
        let mut p = PlatformConfig::default();
        assert!(p.accepts_category("anything"));
        p.category = "website".into();
        assert!(p.accepts_category("website"));
        assert!(!p.accepts_category("api"));
    }

    #[test]
    fn credentials_prefer_env_and_fall_back_to_template() {
        let cfg = HackerOneConfig { h1_username: "tmpl-user".into(), h1_token: "tmpl-key".into(), ..Default::default() };
        let creds = Credentials::resolve(|k| (k == "H1_API_KEY").then(|| "env-key".to_string()), &cfg).unwrap();
        assert_eq!(creds.api_key, "env-key");
        assert_eq!(creds.username, "tmpl-user");
    }

    #[test]
    fn credentials_missing_is_an_error() {
        let cfg = HackerOneConfig::default();
        let err = Credentials::resolve(|k| (k == "H1_API_KEY").then(|| "k".to_string()), &cfg).unwrap_err();
        assert!(matches!(err, ScanError::MissingCredential("H1_USERNAME")));
        let err = Credentials::resolve(|_| Some("  ".to_string()), &cfg).unwrap_err();
        assert!(matches!(err, ScanError::MissingCredential("H1_API_KEY")));
    }

    #[test]
    fn credentials_debug_hides_key() {
        let c = Credentials::new("me", "secret");
        assert!(!format!("{:?}", c).contains("secret"));
    }
}
