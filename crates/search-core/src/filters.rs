use crate::normalize::normalize_params;
use nvd::{QueryParams, Severity, SeverityScheme};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DEFAULT_RESULTS_PER_PAGE: u32 = 20;

pub const KEYWORD_SEARCH: &str = "keywordSearch";
pub const RESULTS_PER_PAGE: &str = "resultsPerPage";
pub const START_INDEX: &str = "startIndex";

/// Raw search criteria as the caller edits them.
///
/// String fields may hold placeholders (`""`, `"any"`); they are only
/// stripped when a search snapshots the filters through [`SearchFilters::to_params`].
/// Every field is optional so the same type doubles as a set of overrides,
/// see [`SearchFilters::merged`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchFilters {
    pub keyword_search: Option<String>,
    pub keyword_exact_match: Option<bool>,
    pub cve_id: Option<String>,
    pub cwe_id: Option<String>,
    pub cvss_v2_severity: Option<String>,
    pub cvss_v3_severity: Option<String>,
    pub cvss_v4_severity: Option<String>,
    pub pub_start_date: Option<String>,
    pub pub_end_date: Option<String>,
    pub last_mod_start_date: Option<String>,
    pub last_mod_end_date: Option<String>,
    pub kev_start_date: Option<String>,
    pub kev_end_date: Option<String>,
    pub cpe_name: Option<String>,
    pub is_vulnerable: Option<bool>,
    pub results_per_page: Option<u32>,
    pub start_index: Option<u32>,
    /// UI-only: whether the advanced filter panel is open. Never sent.
    #[serde(skip)]
    pub show_advanced: Option<bool>,
}

impl SearchFilters {
    /// Filters a fresh search starts from.
    pub fn defaults(results_per_page: u32) -> Self {
        Self {
            results_per_page: Some(results_per_page),
            start_index: Some(0),
            ..Default::default()
        }
    }

    pub fn keyword(term: impl Into<String>) -> Self {
        Self {
            keyword_search: Some(term.into()),
            ..Default::default()
        }
    }

    pub fn page_offset(start_index: u32) -> Self {
        Self {
            start_index: Some(start_index),
            ..Default::default()
        }
    }

    /// Overlay every field set in `overrides` onto a copy of `self`.
    pub fn merged(&self, overrides: &SearchFilters) -> SearchFilters {
        macro_rules! pick {
            ($($field:ident),* $(,)?) => {
                SearchFilters {
                    $($field: overrides.$field.clone().or_else(|| self.$field.clone()),)*
                }
            };
        }

        pick!(
            keyword_search,
            keyword_exact_match,
            cve_id,
            cwe_id,
            cvss_v2_severity,
            cvss_v3_severity,
            cvss_v4_severity,
            pub_start_date,
            pub_end_date,
            last_mod_start_date,
            last_mod_end_date,
            kev_start_date,
            kev_end_date,
            cpe_name,
            is_vulnerable,
            results_per_page,
            start_index,
            show_advanced,
        )
    }

    pub fn set_severity(&mut self, scheme: SeverityScheme, severity: Option<Severity>) {
        let value = severity.map(|s| s.as_str().to_string());
        match scheme {
            SeverityScheme::V2 => self.cvss_v2_severity = value,
            SeverityScheme::V3 => self.cvss_v3_severity = value,
            SeverityScheme::V4 => self.cvss_v4_severity = value,
        }
    }

    /// Whether both filters select the same records, ignoring the page
    /// offset and placeholder values.
    pub fn same_criteria(&self, other: &SearchFilters) -> bool {
        let without_offset = |filters: &SearchFilters| {
            SearchFilters {
                start_index: None,
                ..filters.clone()
            }
            .to_params()
        };
        without_offset(self) == without_offset(other)
    }

    /// Canonical payload for these filters.
    pub fn to_params(&self) -> QueryParams {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => normalize_params(&map),
            // A struct of options always serializes to an object.
            _ => QueryParams::new(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_params_use_service_names() {
        let filters = SearchFilters {
            keyword_search: Some("apache".into()),
            keyword_exact_match: Some(true),
            cvss_v3_severity: Some("HIGH".into()),
            last_mod_start_date: Some("2024-01-01T00:00:00.000".into()),
            is_vulnerable: Some(false),
            ..SearchFilters::defaults(20)
        };

        let params = filters.to_params();
        assert_eq!(
            serde_json::to_value(&params).unwrap(),
            json!({
                "keywordSearch": "apache",
                "keywordExactMatch": true,
                "cvssV3Severity": "HIGH",
                "lastModStartDate": "2024-01-01T00:00:00.000",
                "isVulnerable": false,
                "resultsPerPage": 20,
                "startIndex": 0
            })
        );
    }

    #[test]
    fn test_ui_flag_never_reaches_payload() {
        let filters = SearchFilters {
            show_advanced: Some(true),
            ..Default::default()
        };
        assert!(filters.to_params().is_empty());
    }

    #[test]
    fn test_sentinels_are_stripped_from_payload() {
        let filters = SearchFilters {
            keyword_search: Some("apache".into()),
            cvss_v3_severity: Some("any".into()),
            cwe_id: Some("".into()),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(filters.to_params()).unwrap(),
            json!({ "keywordSearch": "apache" })
        );
    }

    #[test]
    fn test_merge_overrides_only_set_fields() {
        let current = SearchFilters {
            keyword_search: Some("openssl".into()),
            cvss_v3_severity: Some("CRITICAL".into()),
            ..SearchFilters::defaults(20)
        };

        let merged = current.merged(&SearchFilters::page_offset(40));
        assert_eq!(merged.keyword_search.as_deref(), Some("openssl"));
        assert_eq!(merged.cvss_v3_severity.as_deref(), Some("CRITICAL"));
        assert_eq!(merged.start_index, Some(40));
        assert_eq!(merged.results_per_page, Some(20));

        // Setting the placeholder clears the criterion in the next payload.
        let cleared = merged.merged(&SearchFilters {
            cvss_v3_severity: Some("any".into()),
            ..Default::default()
        });
        assert!(!cleared.to_params().contains_key("cvssV3Severity"));
    }

    #[test]
    fn test_same_criteria_ignores_offset_and_placeholders() {
        let current = SearchFilters {
            keyword_search: Some("openssl".into()),
            ..SearchFilters::defaults(20)
        };

        assert!(current.same_criteria(&current.merged(&SearchFilters::page_offset(60))));
        assert!(current.same_criteria(&current.merged(&SearchFilters {
            cwe_id: Some("any".into()),
            show_advanced: Some(true),
            ..Default::default()
        })));
        assert!(!current.same_criteria(&current.merged(&SearchFilters::keyword("nginx"))));
    }

    #[test]
    fn test_set_severity() {
        let mut filters = SearchFilters::default();
        filters.set_severity(SeverityScheme::V4, Some(Severity::Critical));
        assert_eq!(filters.cvss_v4_severity.as_deref(), Some("CRITICAL"));
        filters.set_severity(SeverityScheme::V4, None);
        assert_eq!(filters.cvss_v4_severity, None);
    }
}
