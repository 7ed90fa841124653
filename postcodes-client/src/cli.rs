//! Command-line interface of `postcodes`.
//!
//! Connection settings can come from flags or from the same environment
//! variables [`ClientConfig::from_env`] reads.

use clap::{Parser, Subcommand};
use postcodes_client::config::{BASE_URL_ENV, TIMEOUT_ENV};
use postcodes_client::{ClientConfig, DEFAULT_AUTOCOMPLETE_LIMIT};

#[derive(Parser)]
#[command(name = "postcodes", version, about = "Query the postcodes.io API")]
pub struct Cli {
    /// API base URL (default https://api.postcodes.io)
    #[arg(long, env = BASE_URL_ENV)]
    pub base_url: Option<String>,

    /// Request timeout in seconds (default 30)
    #[arg(long, env = TIMEOUT_ENV)]
    pub timeout: Option<u64>,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Client configuration with any overrides given on the command line.
    pub fn config(&self) -> ClientConfig {
        let mut config = ClientConfig::new();
        if let Some(url) = &self.base_url {
            config = config.with_base_url(url.as_str());
        }
        if let Some(secs) = self.timeout {
            config = config.with_timeout(secs);
        }
        config
    }
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Commands {
    /// Look up a postcode
    Lookup { postcode: String },

    /// Look up several postcodes in one request
    Bulk {
        #[arg(required = true)]
        postcodes: Vec<String>,
    },

    /// Postcodes near a point
    Latlon {
        #[arg(allow_negative_numbers = true)]
        longitude: f64,
        #[arg(allow_negative_numbers = true)]
        latitude: f64,
    },

    /// Check that a postcode exists
    Validate { postcode: String },

    /// Postcodes near a postcode
    Nearest { postcode: String },

    /// Complete a partial postcode
    Autocomplete {
        postcode: String,
        /// Maximum number of completions (0 to 100)
        #[arg(short, long, default_value_t = DEFAULT_AUTOCOMPLETE_LIMIT, allow_negative_numbers = true)]
        limit: i64,
    },

    /// A random postcode
    Random,

    /// Distance between two postcodes in kilometres
    Distance { from: String, to: String },

    /// Look up an outward code
    Outcode { outcode: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("postcodes").chain(args.iter().copied()))
    }

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn latlon_takes_negative_longitudes() {
        let cli = parse(&["latlon", "-1.93115910963689", "50.7299678681388"]).unwrap();
        assert_eq!(
            cli.command,
            Commands::Latlon {
                longitude: -1.93115910963689,
                latitude: 50.7299678681388,
            }
        );
    }

    #[test]
    fn latlon_rejects_non_numbers() {
        assert!(parse(&["latlon", "west", "50.7"]).is_err());
        assert!(parse(&["latlon", "-1.9"]).is_err());
    }

    #[test]
    fn autocomplete_limit_defaults() {
        let cli = parse(&["autocomplete", "BH12"]).unwrap();
        assert_eq!(
            cli.command,
            Commands::Autocomplete {
                postcode: "BH12".into(),
                limit: DEFAULT_AUTOCOMPLETE_LIMIT,
            }
        );

        let cli = parse(&["autocomplete", "BH12", "--limit", "3"]).unwrap();
        assert!(matches!(cli.command, Commands::Autocomplete { limit: 3, .. }));
    }

    #[test]
    fn bulk_needs_a_postcode() {
        assert!(parse(&["bulk"]).is_err());
        let cli = parse(&["bulk", "OX49 5NU", "M32 0JG"]).unwrap();
        assert_eq!(
            cli.command,
            Commands::Bulk {
                postcodes: vec!["OX49 5NU".into(), "M32 0JG".into()],
            }
        );
    }

    #[test]
    fn flags_override_config() {
        let cli = parse(&["--base-url", "http://localhost:8000/", "--timeout", "5", "random"]).unwrap();
        let config = cli.config();
        assert_eq!(config.base_url, "http://localhost:8000");
        assert_eq!(config.timeout_secs, 5);
        assert_eq!(cli.command, Commands::Random);
    }
}
