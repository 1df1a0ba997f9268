use std::path::{Path, PathBuf};

use crate::error::{HmsError, Result};

/// Default HMS deployment hosted by EPA QED.
pub const DEFAULT_URL: &str = "https://qed.epacdx.net/hms/rest/api";

/// Resolved client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base API URL, typically `https://qed.epacdx.net/hms/rest/api`.
    pub url: String,
    /// Whether to verify TLS certificates.
    pub verify: bool,
}

#[derive(Debug, Default)]
struct RcConfig {
    url: Option<String>,
    verify: Option<bool>,
}

/// Resolves configuration from (in order of precedence):
/// - explicit arguments
/// - environment variables `HMS_URL`
/// - config file from `HMS_RC`, `./.hmsrc`, or `~/.hmsrc`
/// - the built-in default URL
///
/// The HMS API needs no credentials, so unlike most API clients the rc file
/// is optional all the way down.
pub(crate) fn load_config(url: Option<String>, verify: Option<bool>) -> Result<ClientConfig> {
    let mut url = url.or_else(|| std::env::var("HMS_URL").ok());
    let mut file_verify: Option<bool> = None;

    if url.is_none() || verify.is_none() {
        for rc_path in rc_candidates() {
            if rc_path.exists() {
                let cfg = read_rc(&rc_path)?;
                if url.is_none() {
                    url = cfg.url;
                }
                file_verify = cfg.verify;
                break;
            }
        }
    }

    Ok(ClientConfig {
        url: url.unwrap_or_else(|| DEFAULT_URL.to_string()),
        verify: verify.or(file_verify).unwrap_or(true),
    })
}

fn read_rc(path: &Path) -> Result<RcConfig> {
    let text = std::fs::read_to_string(path).map_err(|e| HmsError::Config {
        path: path.display().to_string(),
        detail: e.to_string(),
    })?;

    let mut cfg = RcConfig::default();
    for raw in text.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some((k, v)) = line.split_once(':') {
            let v = strip_quotes(v.trim());
            match k.trim() {
                "url" => {
                    if !v.is_empty() {
                        cfg.url = Some(v.to_string());
                    }
                }
                "verify" => {
                    if !v.is_empty() {
                        cfg.verify = Some(v != "0");
                    }
                }
                _ => {}
            }
        }
    }
    Ok(cfg)
}

fn strip_quotes(s: &str) -> &str {
    let s = s.trim();
    if (s.starts_with('"') && s.ends_with('"') && s.len() >= 2)
        || (s.starts_with('\'') && s.ends_with('\'') && s.len() >= 2)
    {
        &s[1..s.len() - 1]
    } else {
        s
    }
}

fn rc_candidates() -> Vec<PathBuf> {
    // Search order: explicit HMS_RC, then the working directory, then home.
    if let Ok(p) = std::env::var("HMS_RC") {
        return vec![PathBuf::from(p)];
    }

    let mut v = Vec::new();
    if let Ok(cwd) = std::env::current_dir() {
        v.push(cwd.join(".hmsrc"));
    }
    if let Some(home) = dirs::home_dir() {
        v.push(home.join(".hmsrc"));
    }
    v
}
