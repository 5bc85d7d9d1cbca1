use console::style;
use donorlink_core::error::DonorlinkError;
use std::fmt;

/// Enhanced error type with suggestions
pub struct CliError {
    pub message: String,
    pub context: Option<String>,
    pub suggestions: Vec<String>,
    pub help_command: Option<String>,
}

impl CliError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            context: None,
            suggestions: Vec::new(),
            help_command: None,
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    pub fn with_help(mut self, command: impl Into<String>) -> Self {
        self.help_command = Some(command.into());
        self
    }

    pub fn display(&self) {
        eprintln!("{} {}\n", style("✗").red().bold(), style(&self.message).red().bold());

        if let Some(ref context) = self.context {
            eprintln!("{}", context);
            eprintln!();
        }

        if !self.suggestions.is_empty() {
            eprintln!("{}", style("To fix this:").yellow().bold());
            for (i, suggestion) in self.suggestions.iter().enumerate() {
                eprintln!("  {}. {}", i + 1, suggestion);
            }
            eprintln!();
        }

        if let Some(ref help_cmd) = self.help_command {
            eprintln!("{} {}", style("Need help?").cyan(), style(help_cmd).cyan().bold());
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl fmt::Debug for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

/// Create error for a location the geocoder does not know
pub fn location_not_found(location: &str) -> CliError {
    CliError::new("Location not found")
        .with_context(format!("The geocoder returned no match.\n\nLocation: {}", location))
        .with_suggestion("Add a city or district, e.g. \"Jayanagar, Bengaluru\"")
        .with_suggestion("Or give coordinates directly: --origin LAT,LON (find) or --coordinates LAT,LON (register)")
}

/// Create error for a geocoding request that ran out of time
pub fn geocoding_timeout(location: &str, timeout_secs: u64) -> CliError {
    CliError::new("Geocoding timed out")
        .with_context(format!(
            "No answer from the geocoder within {} seconds.\n\nLocation: {}",
            timeout_secs, location
        ))
        .with_suggestion("Try again in a moment")
        .with_suggestion("Raise the limit: DONORLINK_GEOCODER_TIMEOUT_SECS=30")
        .with_suggestion("Or skip geocoding with --origin / --coordinates")
}

/// Create error for an unreachable or misbehaving geocoder
pub fn geocoder_unavailable(reason: &str) -> CliError {
    CliError::new("Geocoder unavailable")
        .with_context(format!("Error: {}", reason))
        .with_suggestion("Check your network connection")
        .with_suggestion("Check geocoder_url in donorlink.toml or DONORLINK_GEOCODER_URL")
        .with_suggestion("Or skip geocoding with --origin / --coordinates")
}

/// Create error for a cluster count the dataset cannot support
pub fn invalid_cluster_count(k: usize, donors: usize) -> CliError {
    CliError::new("Invalid cluster count")
        .with_context(format!("Cannot form {} clusters from {} donors.", k, donors))
        .with_suggestion("Use fewer clusters: donorlink cluster --k N")
        .with_suggestion("Or search without clustering: donorlink find ... --no-cluster")
        .with_help("Run: donorlink status")
}

/// Create error for a feature column with no spread
pub fn degenerate_feature(column: &str) -> CliError {
    CliError::new("Degenerate feature column")
        .with_context(format!("Every donor has the same value for '{}'.", column))
        .with_suggestion("Set degenerate_features = \"leave-unscaled\" in donorlink.toml")
        .with_suggestion("Or set DONORLINK_DEGENERATE_FEATURES=leave-unscaled")
}

/// Create error for a dataset that cannot be read
pub fn invalid_dataset(message: String) -> CliError {
    CliError::new("Invalid donor dataset")
        .with_context(message)
        .with_suggestion("Fix the reported row or header in the CSV file")
        .with_suggestion("Or skip malformed rows: --row-policy quarantine")
        .with_help("Run: donorlink status --row-policy quarantine")
}

/// Create error for invalid configuration
pub fn invalid_config(key: &str, reason: &str) -> CliError {
    CliError::new(format!("Invalid configuration: {}", key))
        .with_context(format!("Configuration value is invalid.\n\nReason: {}", reason))
        .with_suggestion("Check donorlink.toml for syntax errors")
        .with_suggestion("Check DONORLINK_* environment variables")
        .with_help("Run: donorlink status")
}

/// Map a domain error to a CliError with suggestions
pub fn from_domain(error: &DonorlinkError) -> CliError {
    match error {
        DonorlinkError::LocationNotFound { location } => location_not_found(location),
        DonorlinkError::GeocodingTimeout { location, timeout_secs } => {
            geocoding_timeout(location, *timeout_secs)
        }
        DonorlinkError::GeocoderUnavailable { reason } => geocoder_unavailable(reason),
        DonorlinkError::InvalidClusterCount { k, donors } => invalid_cluster_count(*k, *donors),
        DonorlinkError::DegenerateFeature { column } => degenerate_feature(column),
        DonorlinkError::InvalidSchema { .. } | DonorlinkError::InvalidDonorRecord { .. } => {
            invalid_dataset(error.to_string())
        }
        DonorlinkError::ConfigInvalid { key, reason } => invalid_config(key, reason),
        DonorlinkError::ConfigMissing { key } => invalid_config(key, "value is empty"),
        DonorlinkError::InsufficientData { reason } => CliError::new("Not enough donor data")
            .with_context(reason.clone())
            .with_suggestion("Register donors first: donorlink register --help"),
        other => CliError::new(other.to_string()),
    }
}

/// Convert anyhow::Error to CliError with context
pub fn from_anyhow(error: anyhow::Error) -> CliError {
    if let Some(domain) = error.chain().find_map(|e| e.downcast_ref::<DonorlinkError>()) {
        let cli_error = from_domain(domain);
        let outer = error.to_string();
        return if outer != domain.to_string() && cli_error.context.is_none() {
            cli_error.with_context(outer)
        } else {
            cli_error
        };
    }

    let message = error.to_string();
    if message.contains("No such file or directory") {
        CliError::new("File not found")
            .with_context(format!("Error: {}", message))
            .with_suggestion("Check the file path and try again")
    } else if message.contains("permission denied") {
        CliError::new("Permission denied")
            .with_context(format!("Error: {}", message))
            .with_suggestion("Check file permissions")
    } else {
        CliError::new(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_domain_errors_get_suggestions() {
        let error = from_domain(&DonorlinkError::GeocodingTimeout {
            location: "Bengaluru".to_string(),
            timeout_secs: 10,
        });
        assert_eq!(error.message, "Geocoding timed out");
        assert!(!error.suggestions.is_empty());
    }

    #[test]
    fn test_from_anyhow_finds_wrapped_domain_error() {
        let result: Result<(), DonorlinkError> =
            Err(DonorlinkError::InvalidClusterCount { k: 3, donors: 2 });
        let error = result.context("Failed to cluster donors").unwrap_err();
        let cli_error = from_anyhow(error);
        assert_eq!(cli_error.message, "Invalid cluster count");
    }

    #[test]
    fn test_from_anyhow_plain_message() {
        let cli_error = from_anyhow(anyhow::anyhow!("something odd"));
        assert_eq!(cli_error.message, "something odd");
        assert!(cli_error.suggestions.is_empty());
    }
}
