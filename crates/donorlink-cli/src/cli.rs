use clap::{Parser, Subcommand};
use donorlink_core::config::{parse_feature_set, parse_row_policy};
use donorlink_core::models::{BloodType, Coordinates, FeatureSet, RowPolicy};
use std::path::PathBuf;

/// Donorlink - Blood donor proximity matching
#[derive(Parser, Debug)]
#[command(name = "donorlink")]
#[command(about = "Find nearby blood donors, register donors and inspect donor clusters", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Output results in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Show planned actions without executing them
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Configuration file (defaults to ./donorlink.toml when present)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Donor dataset CSV file
    #[arg(long, global = true, value_name = "PATH")]
    pub dataset: Option<PathBuf>,

    /// What to do with malformed dataset rows (reject or quarantine)
    #[arg(long, global = true, value_name = "POLICY", value_parser = parse_row_policy)]
    pub row_policy: Option<RowPolicy>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Find donors of a blood type near a location
    Find(FindArgs),

    /// Register a new donor
    Register(RegisterArgs),

    /// Cluster all donors and show the assignment
    Cluster(ClusterArgs),

    /// Score clustering quality over a range of cluster counts
    Evaluate(EvaluateArgs),

    /// Show dataset and configuration status
    Status,
}

#[derive(Parser, Debug)]
pub struct FindArgs {
    /// Location to search around (e.g., "MG Road, Bengaluru")
    #[arg(required_unless_present = "origin")]
    pub location: Option<String>,

    /// Search around known coordinates instead of geocoding
    #[arg(long, value_name = "LAT,LON", allow_hyphen_values = true)]
    pub origin: Option<Coordinates>,

    /// Blood type to match (A+, A-, B+, B-, AB+, AB-, O+, O-)
    #[arg(long, short = 'b', allow_hyphen_values = true)]
    pub blood_type: BloodType,

    /// Search radius in kilometres
    #[arg(long, short = 't')]
    pub threshold: Option<f64>,

    /// Skip clustering; matches carry no cluster id
    #[arg(long)]
    pub no_cluster: bool,
}

#[derive(Parser, Debug)]
pub struct RegisterArgs {
    /// Interactive mode - fill in the registration form
    #[arg(long, short = 'i')]
    pub interactive: bool,

    /// Full name
    #[arg(long, required_unless_present = "interactive")]
    pub name: Option<String>,

    /// Age in years
    #[arg(long, required_unless_present = "interactive")]
    pub age: Option<u32>,

    /// Gender
    #[arg(long, required_unless_present = "interactive")]
    pub gender: Option<String>,

    /// Blood type (A+, A-, B+, B-, AB+, AB-, O+, O-)
    #[arg(long, required_unless_present = "interactive", allow_hyphen_values = true)]
    pub blood_type: Option<BloodType>,

    /// Location, geocoded unless --coordinates is given
    #[arg(long, required_unless_present = "interactive")]
    pub location: Option<String>,

    /// Known coordinates for the location
    #[arg(long, value_name = "LAT,LON", allow_hyphen_values = true)]
    pub coordinates: Option<Coordinates>,

    #[arg(long)]
    pub medical_conditions: Option<String>,

    #[arg(long)]
    pub allergies: Option<String>,

    #[arg(long)]
    pub blood_pressure: Option<String>,

    /// Height in cm
    #[arg(long)]
    pub height: Option<f64>,

    /// Weight in kg
    #[arg(long)]
    pub weight: Option<f64>,

    #[arg(long)]
    pub contact: Option<String>,

    #[arg(long)]
    pub country: Option<String>,

    #[arg(long)]
    pub state: Option<String>,

    #[arg(long)]
    pub district: Option<String>,

    #[arg(long)]
    pub pincode: Option<String>,

    /// Months since the last donation (omit all four for a first-time donor)
    #[arg(long, requires_all = ["frequency", "monetary", "time"])]
    pub recency: Option<f64>,

    /// Number of donations so far
    #[arg(long, requires_all = ["recency", "monetary", "time"])]
    pub frequency: Option<f64>,

    /// Total blood donated, in c.c.
    #[arg(long, requires_all = ["recency", "frequency", "time"])]
    pub monetary: Option<f64>,

    /// Months since the first donation
    #[arg(long, requires_all = ["recency", "frequency", "monetary"])]
    pub time: Option<f64>,
}

#[derive(Parser, Debug)]
pub struct ClusterArgs {
    /// Number of clusters
    #[arg(long, short = 'k')]
    pub k: Option<usize>,

    /// Random seed for centroid initialisation
    #[arg(long)]
    pub seed: Option<u64>,
}

#[derive(Parser, Debug)]
pub struct EvaluateArgs {
    /// Smallest cluster count to score
    #[arg(long)]
    pub min_k: Option<usize>,

    /// Largest cluster count to score
    #[arg(long)]
    pub max_k: Option<usize>,

    /// Features to score on (spatial or full)
    #[arg(long, value_parser = parse_feature_set)]
    pub features: Option<FeatureSet>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_find_with_origin_needs_no_location() {
        let cli = Cli::try_parse_from([
            "donorlink", "find", "--origin", "12.97,77.59", "--blood-type", "O-",
        ])
        .unwrap();
        match cli.command {
            Commands::Find(args) => {
                assert!(args.location.is_none());
                assert_eq!(args.blood_type, BloodType::ONegative);
                assert_eq!(args.origin, Some(Coordinates::new(12.97, 77.59).unwrap()));
            }
            other => panic!("Expected find, got {:?}", other),
        }
    }

    #[test]
    fn test_find_requires_location_or_origin() {
        assert!(Cli::try_parse_from(["donorlink", "find", "--blood-type", "A+"]).is_err());
    }

    #[test]
    fn test_register_requires_fields_unless_interactive() {
        assert!(Cli::try_parse_from(["donorlink", "register", "--name", "Asha"]).is_err());
        assert!(Cli::try_parse_from(["donorlink", "register", "--interactive"]).is_ok());
    }

    #[test]
    fn test_activity_flags_come_together() {
        let base = [
            "donorlink", "register", "--name", "Asha", "--age", "30", "--gender", "Female",
            "--blood-type", "B+", "--location", "Mysuru",
        ];
        let mut partial = base.to_vec();
        partial.extend(["--recency", "2"]);
        assert!(Cli::try_parse_from(partial).is_err());

        let mut full = base.to_vec();
        full.extend(["--recency", "2", "--frequency", "3", "--monetary", "750", "--time", "20"]);
        assert!(Cli::try_parse_from(full).is_ok());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "donorlink", "evaluate", "--features", "full", "--json", "--row-policy", "quarantine",
        ])
        .unwrap();
        assert!(cli.json);
        assert_eq!(cli.row_policy, Some(RowPolicy::Quarantine));
        match cli.command {
            Commands::Evaluate(args) => assert_eq!(args.features, Some(FeatureSet::Full)),
            other => panic!("Expected evaluate, got {:?}", other),
        }
    }
}
