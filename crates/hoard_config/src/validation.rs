use std::fmt;

use http::Uri;

use crate::ProxyConfig;

/// Problems found in a loaded [`ProxyConfig`].
///
/// Errors stop startup; warnings are logged and the proxy runs anyway.
#[derive(Debug, Default)]
pub struct ConfigReport {
    warnings: Vec<String>,
    errors: Vec<String>,
}

impl ConfigReport {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }
}

/// One error per line, ready for stderr.
impl fmt::Display for ConfigReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid configuration:")?;
        for err in &self.errors {
            write!(f, "\n  - {err}")?;
        }
        Ok(())
    }
}

impl ProxyConfig {
    /// Validate the configuration and return a report of warnings and errors.
    pub fn validate(&self) -> ConfigReport {
        let mut report = ConfigReport::default();

        if self.port == 0 {
            report.errors.push("--port flag is required".into());
        }
        if self.origin_timeout_secs == 0 {
            report.errors.push("origin_timeout_secs must be greater than 0".into());
        }
        validate_origin(&self.origin, &mut report);

        report
    }
}

fn validate_origin(origin: &str, report: &mut ConfigReport) {
    if origin.trim().is_empty() {
        report.errors.push("--origin flag is required".into());
        return;
    }

    let uri = match origin.parse::<Uri>() {
        Ok(uri) => uri,
        Err(e) => {
            report.errors.push(format!("origin '{origin}' is not a valid URL: {e}"));
            return;
        }
    };

    let (Some(scheme), Some(_)) = (uri.scheme_str(), uri.authority()) else {
        report.errors.push(format!("origin '{origin}' must include a scheme and host"));
        return;
    };

    if !matches!(scheme, "http" | "https") {
        report.errors.push(format!(
            "origin '{origin}' uses scheme '{scheme}'; only http and https origins are supported"
        ));
    }

    let path = uri.path();
    if (!path.is_empty() && path != "/") || uri.query().is_some() {
        report.warnings.push(format!(
            "origin '{origin}' has a path or query; only its scheme and host are used"
        ));
    }
}
