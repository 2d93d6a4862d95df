use std::ffi::OsString;

use clap::error::ErrorKind;
use clap::{CommandFactory as _, Parser};
use url::Url;

/// Configuration read from the environment. The process takes no
/// command-line arguments.
#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Cli {
    /// Aggregator base URL (store pages live directly under it).
    #[arg(env = "SBERMARKET_URL")]
    pub base_url: Url,

    /// Remote browser endpoint each worker connects to.
    #[arg(env = "GRID_URL")]
    pub grid_url: Url,

    /// Number of workers, one browser session each.
    #[arg(env = "THREADS", value_parser = clap::value_parser!(u16).range(1..))]
    pub threads: u16,

    /// JSON file mapping store name to its list of site ids.
    #[arg(env = "STORES_FILE", default_value = "resources/sids.json")]
    pub stores: String,

    /// Output directory for the category document.
    #[arg(env = "OUTPUT_DIR", default_value = "output")]
    pub out: String,

    /// File name prefix of the category document.
    #[arg(env = "OUTPUT_SOURCE", default_value = "sbermarket")]
    pub source: String,
}

impl Cli {
    pub fn from_env() -> Result<Self, clap::Error> {
        Self::from_args(std::env::args_os())
    }

    /// Only the program name is accepted; anything after it is an error.
    pub fn from_args<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        let mut args = args.into_iter().map(Into::into);
        let program = args
            .next()
            .unwrap_or_else(|| OsString::from(env!("CARGO_PKG_NAME")));
        if let Some(extra) = args.next() {
            return Err(Self::command().error(
                ErrorKind::UnknownArgument,
                format!(
                    "unexpected argument {:?}; configuration comes from the environment",
                    extra.to_string_lossy()
                ),
            ));
        }
        Self::try_parse_from([program])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arguments_are_rejected() {
        let err = Cli::from_args(["store-taxonomy", "--threads", "2"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownArgument);
        assert!(err.to_string().contains("configuration comes from the environment"));
    }
}
