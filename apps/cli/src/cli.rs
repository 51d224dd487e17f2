use crate::error::{Result, error};
use clap::{ArgAction, Args, Parser, Subcommand};
use nvd::{Severity, SeverityScheme};
use search_core::SearchFilters;
use search_core::pagination;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Increase verbosity. Can be used multiple times (e.g., -v, -vv, -vvv).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Read configuration from this file instead of the default location
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Search vulnerabilities
    Search(SearchArgs),
    /// Look up one vulnerability by CVE identifier
    Get {
        /// e.g. CVE-2021-44228
        id: String,
    },
    /// List vulnerabilities published in the last few days
    Recent {
        /// Size of the window in days (at most 120)
        #[arg(short, long)]
        days: Option<u32>,
    },
    /// Show or edit the keyword search history
    History {
        #[command(subcommand)]
        action: Option<HistoryAction>,
    },
    /// Interactive search session
    Shell,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum HistoryAction {
    /// Print stored searches, most recent first
    List,
    /// Forget one search term
    Remove { term: String },
    /// Forget every search term
    Clear,
}

#[derive(Args, Debug, Clone, Default)]
pub struct SearchArgs {
    /// Keywords to match against descriptions
    pub keyword: Option<String>,

    /// Match the keywords as one exact phrase
    #[arg(long)]
    pub exact: bool,

    /// Weakness identifier, e.g. CWE-79
    #[arg(long)]
    pub cwe: Option<String>,

    /// CVSS v2 severity (LOW, MEDIUM, HIGH)
    #[arg(long, value_name = "SEVERITY")]
    pub cvss_v2: Option<Severity>,

    /// CVSS v3 severity (LOW, MEDIUM, HIGH, CRITICAL)
    #[arg(long, value_name = "SEVERITY")]
    pub cvss_v3: Option<Severity>,

    /// CVSS v4 severity (LOW, MEDIUM, HIGH, CRITICAL)
    #[arg(long, value_name = "SEVERITY")]
    pub cvss_v4: Option<Severity>,

    /// Published on or after this timestamp (ISO-8601)
    #[arg(long, value_name = "DATE")]
    pub pub_start: Option<String>,

    /// Published on or before this timestamp (ISO-8601)
    #[arg(long, value_name = "DATE")]
    pub pub_end: Option<String>,

    /// Platform name (CPE 2.3)
    #[arg(long)]
    pub cpe: Option<String>,

    /// Only records where the CPE is marked vulnerable
    #[arg(long, requires = "cpe")]
    pub vulnerable: bool,

    /// 0-based page of results
    #[arg(long, default_value_t = 0)]
    pub page: u32,

    /// Results per page
    #[arg(long)]
    pub per_page: Option<u32>,
}

impl SearchArgs {
    pub fn to_filters(&self, default_per_page: u32) -> Result<SearchFilters> {
        let per_page = self.per_page.unwrap_or(default_per_page);
        let start_index = pagination::checked_offset(self.page, per_page)?;

        let mut filters = SearchFilters {
            keyword_search: self.keyword.clone(),
            keyword_exact_match: self.exact.then_some(true),
            cwe_id: self.cwe.clone(),
            pub_start_date: self.pub_start.clone(),
            pub_end_date: self.pub_end.clone(),
            cpe_name: self.cpe.clone(),
            is_vulnerable: self.vulnerable.then_some(true),
            results_per_page: Some(per_page),
            start_index: Some(start_index),
            ..Default::default()
        };

        for (scheme, severity) in [
            (SeverityScheme::V2, self.cvss_v2),
            (SeverityScheme::V3, self.cvss_v3),
            (SeverityScheme::V4, self.cvss_v4),
        ] {
            if let Some(severity) = severity {
                if !scheme.supports(severity) {
                    return Err(error!("{} does not accept {}", scheme.param_name(), severity));
                }
                filters.set_severity(scheme, Some(severity));
            }
        }

        Ok(filters)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(args: &[&str]) -> SearchArgs {
        let cli = Cli::try_parse_from(std::iter::once("vulnwatch").chain(args.iter().copied()))
            .expect("valid arguments");
        match cli.command {
            Some(Commands::Search(args)) => args,
            other => panic!("expected search, got {other:?}"),
        }
    }

    #[test]
    fn test_search_args_to_filters() {
        let args = parse(&["search", "log4j", "--exact", "--cvss-v3", "critical", "--page", "2"]);
        let filters = args.to_filters(20).unwrap();

        assert_eq!(filters.keyword_search.as_deref(), Some("log4j"));
        assert_eq!(filters.keyword_exact_match, Some(true));
        assert_eq!(filters.cvss_v3_severity.as_deref(), Some("CRITICAL"));
        assert_eq!(filters.start_index, Some(40));
        assert_eq!(filters.results_per_page, Some(20));
    }

    #[test]
    fn test_v2_rejects_critical() {
        let args = parse(&["search", "--cvss-v2", "CRITICAL"]);
        assert!(args.to_filters(20).is_err());
    }

    #[test]
    fn test_zero_page_size_is_rejected() {
        let args = parse(&["search", "openssl", "--per-page", "0"]);
        assert!(args.to_filters(20).is_err());
    }

    #[test]
    fn test_page_past_last_offset_is_rejected() {
        let args = parse(&["search", "openssl", "--page", "4294967295"]);
        assert!(args.to_filters(20).is_err());
    }

    #[test]
    fn test_vulnerable_requires_cpe() {
        let parsed = Cli::try_parse_from(["vulnwatch", "search", "--vulnerable"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_verbosity_is_global() {
        let cli = Cli::try_parse_from(["vulnwatch", "recent", "-vv"]).unwrap();
        assert_eq!(cli.verbose, 2);
    }
}
