// file: src/config/loader.rs
// version: 2.0.0
// guid: 61d3f8a0-b2e7-4c95-8f14-a7c0e9d25b36

//! Cluster file loading and environment variable substitution

use super::ClusterSpec;
use crate::Result;
use regex::Regex;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Configuration loader with environment variable substitution
pub struct ConfigLoader {
    env_vars: HashMap<String, String>,
}

impl ConfigLoader {
    /// Create a new config loader
    pub fn new() -> Self {
        Self {
            env_vars: std::env::vars().collect(),
        }
    }

    /// Load and validate a cluster description from a YAML file
    pub fn load_cluster_spec<P: AsRef<Path>>(&self, path: P) -> Result<ClusterSpec> {
        let content = fs::read_to_string(&path).map_err(|e| {
            crate::error::BootstrapError::ConfigError(format!(
                "Failed to read cluster config file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        self.parse_cluster_spec(&content)
    }

    /// Parse and validate a cluster description from YAML text
    pub fn parse_cluster_spec(&self, content: &str) -> Result<ClusterSpec> {
        let expanded = self.expand_env_vars(content)?;
        let spec: ClusterSpec = serde_yaml::from_str(&expanded).map_err(|e| {
            crate::error::BootstrapError::ConfigError(format!("Invalid cluster config: {}", e))
        })?;

        spec.validate()?;

        Ok(spec)
    }

    /// Expand `${VAR}` placeholders, failing on any that are unset
    fn expand_env_vars(&self, content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| {
            crate::error::BootstrapError::ConfigError(format!("Invalid regex pattern: {}", e))
        })?;

        let mut missing_vars = Vec::new();
        let expanded = re.replace_all(content, |cap: &regex::Captures| {
            match self.env_vars.get(&cap[1]) {
                Some(value) => value.clone(),
                None => {
                    missing_vars.push(cap[1].to_string());
                    String::new()
                }
            }
        });

        if !missing_vars.is_empty() {
            missing_vars.dedup();
            return Err(crate::error::BootstrapError::ConfigError(format!(
                "Missing environment variables: {}",
                missing_vars.join(", ")
            )));
        }

        Ok(expanded.into_owned())
    }

    /// Set environment variable for substitution
    pub fn set_env_var(&mut self, key: String, value: String) {
        self.env_vars.insert(key, value);
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
