//! Rotation run configuration
//!
//! YAML file with the shared access-key credentials and one entry per
//! (bucket, domain) pair. Credential values support `${ENV_VAR}`
//! expansion so the file itself can stay free of secrets.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Top-level configuration file format
#[derive(Debug, Clone, Deserialize)]
pub struct RotationConfig {
    /// Access-key credentials shared by every domain entry
    pub credentials: CredentialsConfig,

    /// One entry per (bucket, domain) pair to rotate
    #[serde(default)]
    pub domains: Vec<DomainEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CredentialsConfig {
    pub access_key_id: String,
    pub access_key_secret: String,
}

/// One (bucket, domain) pair to rotate
#[derive(Debug, Clone, Deserialize)]
pub struct DomainEntry {
    /// Control-plane endpoint, e.g. "https://oss-cn-hangzhou.aliyuncs.com"
    pub endpoint: String,

    /// Bucket the custom domain is bound to
    pub bucket: String,

    /// Region for request signing (default: cn-hangzhou)
    #[serde(default = "default_region")]
    pub region: String,

    /// Custom domain whose certificate gets rotated, exact match
    pub domain: String,

    /// Path to the private key PEM file
    pub private_key: PathBuf,

    /// Path to the certificate chain PEM file
    pub certificate: PathBuf,
}

fn default_region() -> String {
    "cn-hangzhou".to_string()
}

impl RotationConfig {
    /// Load and validate a config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        Self::parse(&content)
    }

    /// Parse config from a YAML string, expanding `${ENV_VAR}` references
    /// in the credential values
    pub fn parse(content: &str) -> Result<Self> {
        let mut config: RotationConfig =
            serde_yaml::from_str(content).context("Failed to parse YAML config")?;

        config.credentials.access_key_id = expand_env_vars(&config.credentials.access_key_id);
        config.credentials.access_key_secret =
            expand_env_vars(&config.credentials.access_key_secret);

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.credentials.access_key_id.trim().is_empty() {
            bail!("access_key_id is empty (check ${{ENV_VAR}} references)");
        }
        if self.credentials.access_key_secret.trim().is_empty() {
            bail!("access_key_secret is empty (check ${{ENV_VAR}} references)");
        }
        if self.domains.is_empty() {
            bail!("No domain entries configured");
        }

        let mut seen = HashSet::new();
        for entry in &self.domains {
            for (field, value) in [
                ("endpoint", &entry.endpoint),
                ("bucket", &entry.bucket),
                ("domain", &entry.domain),
            ] {
                if value.trim().is_empty() {
                    bail!(
                        "Empty {} in entry for bucket '{}' domain '{}'",
                        field,
                        entry.bucket,
                        entry.domain
                    );
                }
            }

            if !seen.insert((entry.bucket.clone(), entry.domain.clone())) {
                bail!(
                    "Duplicate entry for bucket '{}' domain '{}'",
                    entry.bucket,
                    entry.domain
                );
            }
        }

        Ok(())
    }

    /// Generate a template config file content
    pub fn template() -> String {
        r#"# cnamecert configuration
#
# Rotates the TLS certificate bound to each configured custom domain.
# Credential values may reference environment variables with ${VAR}.

credentials:
  access_key_id: "${OSS_ACCESS_KEY_ID}"
  access_key_secret: "${OSS_ACCESS_KEY_SECRET}"

domains:
  - endpoint: https://oss-cn-hangzhou.aliyuncs.com
    bucket: my-bucket
    # region: cn-hangzhou
    domain: static.example.com
    private_key: /etc/cnamecert/static.example.com.key
    certificate: /etc/cnamecert/static.example.com.pem
"#
        .to_string()
    }
}

impl DomainEntry {
    /// Read this entry's PEM material from disk
    ///
    /// Unreadable paths are configuration errors; emptiness is checked
    /// later by the rotation core before any update call.
    pub fn read_material(&self) -> Result<(String, String)> {
        let private_key = std::fs::read_to_string(&self.private_key)
            .with_context(|| format!("Failed to read private key file: {:?}", self.private_key))?;
        let certificate = std::fs::read_to_string(&self.certificate)
            .with_context(|| format!("Failed to read certificate file: {:?}", self.certificate))?;
        Ok((private_key, certificate))
    }
}

/// Expand `${VAR}` references from the environment; unset variables
/// expand to the empty string
pub fn expand_env_vars(input: &str) -> String {
    let mut result = input.to_string();
    let re = regex_lite::Regex::new(r"\$\{([^}]+)\}").unwrap();

    for cap in re.captures_iter(input) {
        let var_name = &cap[1];
        let var_value = std::env::var(var_name).unwrap_or_default();
        result = result.replace(&cap[0], &var_value);
    }

    result
}
