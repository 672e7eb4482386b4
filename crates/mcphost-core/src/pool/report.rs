//! Startup report

use std::fmt;

/// Result of starting one configured provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderOutcome {
    Connected { name: String, summary: String },
    Failed { name: String, error: String },
    /// Configured with `enabled: false`
    Skipped { name: String },
}

impl ProviderOutcome {
    pub fn name(&self) -> &str {
        match self {
            Self::Connected { name, .. } | Self::Failed { name, .. } | Self::Skipped { name } => {
                name
            }
        }
    }

    /// The report line for this provider
    pub fn line(&self) -> String {
        match self {
            Self::Connected { summary, .. } => summary.clone(),
            Self::Failed { name, error } => {
                format!("Failed to connect to {} (error: {})", name, single_line(error))
            }
            Self::Skipped { name } => format!("{} skipped (disabled)", name),
        }
    }
}

/// Fold multi-line error text (tracebacks, stderr dumps) onto one line
fn single_line(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("; ")
}

/// One outcome per configured provider, in configuration order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StartupReport {
    pub outcomes: Vec<ProviderOutcome>,
}

impl StartupReport {
    pub fn lines(&self) -> Vec<String> {
        self.outcomes.iter().map(ProviderOutcome::line).collect()
    }

    /// The multi-line status text
    pub fn text(&self) -> String {
        self.lines().join("\n")
    }

    pub fn connected_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, ProviderOutcome::Connected { .. }))
            .count()
    }

    pub fn failed_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, ProviderOutcome::Failed { .. }))
            .count()
    }
}

impl fmt::Display for StartupReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_lines() {
        let report = StartupReport {
            outcomes: vec![
                ProviderOutcome::Connected {
                    name: "clock".to_string(),
                    summary: "clock connected; tools: get_time".to_string(),
                },
                ProviderOutcome::Failed {
                    name: "disk".to_string(),
                    error: "launch failed: python3: not found".to_string(),
                },
                ProviderOutcome::Skipped {
                    name: "web".to_string(),
                },
            ],
        };

        assert_eq!(
            report.to_string(),
            "clock connected; tools: get_time\n\
             Failed to connect to disk (error: launch failed: python3: not found)\n\
             web skipped (disabled)"
        );
        assert_eq!(report.connected_count(), 1);
        assert_eq!(report.failed_count(), 1);
        assert_eq!(report.outcomes[2].name(), "web");
    }

    #[test]
    fn test_multiline_error_stays_on_one_line() {
        let outcome = ProviderOutcome::Failed {
            name: "disk".to_string(),
            error: "Traceback:\n  File server.py\n\nImportError\n".to_string(),
        };

        assert_eq!(
            outcome.line(),
            "Failed to connect to disk (error: Traceback:; File server.py; ImportError)"
        );
    }
}
