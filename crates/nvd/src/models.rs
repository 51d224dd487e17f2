use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// One page of the CVE API response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VulnerabilityPage {
    pub results_per_page: u32,
    pub start_index: u32,
    pub total_results: u32,
    pub vulnerabilities: Vec<Vulnerability>,
}

impl VulnerabilityPage {
    pub fn is_empty(&self) -> bool {
        self.vulnerabilities.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vulnerability {
    pub cve: Cve,
}

impl Vulnerability {
    pub fn id(&self) -> &str {
        &self.cve.id
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Cve {
    pub id: String,
    pub source_identifier: Option<String>,
    pub published: Option<String>,
    pub last_modified: Option<String>,
    pub vuln_status: Option<String>,
    pub descriptions: Vec<Description>,
    /// Raw CVSS metric blocks keyed by scheme (`cvssMetricV31`, `cvssMetricV2`, ...).
    pub metrics: Value,
    pub weaknesses: Value,
    pub references: Vec<Reference>,
    /// Set when the record is listed in CISA's known-exploited catalog.
    pub cisa_exploit_add: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Description {
    pub lang: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reference {
    pub url: String,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

// Newest scheme wins when a record carries several.
const METRIC_PRECEDENCE: &[&str] = &[
    "cvssMetricV40",
    "cvssMetricV31",
    "cvssMetricV30",
    "cvssMetricV2",
];

impl Cve {
    pub fn english_description(&self) -> Option<&str> {
        self.descriptions
            .iter()
            .find(|d| d.lang == "en")
            .or_else(|| self.descriptions.first())
            .map(|d| d.value.as_str())
    }

    pub fn base_severity(&self) -> Option<Severity> {
        METRIC_PRECEDENCE.iter().find_map(|key| {
            let metric = self.metrics.get(key)?.as_array()?.first()?;
            // v2 keeps the tier next to cvssData, v3/v4 keep it inside.
            metric
                .get("cvssData")
                .and_then(|data| data.get("baseSeverity"))
                .or_else(|| metric.get("baseSeverity"))
                .and_then(Value::as_str)
                .and_then(|s| s.parse().ok())
        })
    }

    pub fn is_known_exploited(&self) -> bool {
        self.cisa_exploit_add.is_some()
    }
}

/// Qualitative severity tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "LOW",
            Severity::Medium => "MEDIUM",
            Severity::High => "HIGH",
            Severity::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "LOW" => Ok(Severity::Low),
            "MEDIUM" => Ok(Severity::Medium),
            "HIGH" => Ok(Severity::High),
            "CRITICAL" => Ok(Severity::Critical),
            other => Err(format!("unknown severity '{other}'")),
        }
    }
}

/// CVSS scoring scheme a severity filter applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeverityScheme {
    V2,
    V3,
    V4,
}

impl SeverityScheme {
    /// v2 tops out at `HIGH`.
    pub fn supports(&self, severity: Severity) -> bool {
        !matches!((self, severity), (SeverityScheme::V2, Severity::Critical))
    }

    /// Query parameter carrying the filter for this scheme.
    pub fn param_name(&self) -> &'static str {
        match self {
            SeverityScheme::V2 => "cvssV2Severity",
            SeverityScheme::V3 => "cvssV3Severity",
            SeverityScheme::V4 => "cvssV4Severity",
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    fn cve_with_metrics(metrics: Value) -> Cve {
        Cve {
            id: "CVE-2021-44228".to_string(),
            metrics,
            ..Default::default()
        }
    }

    #[test]
    fn test_page_deserializes_from_service_shape() {
        let body = json!({
            "resultsPerPage": 1,
            "startIndex": 0,
            "totalResults": 1,
            "format": "NVD_CVE",
            "version": "2.0",
            "vulnerabilities": [{
                "cve": {
                    "id": "CVE-2021-44228",
                    "published": "2021-12-10T10:15:09.143",
                    "descriptions": [
                        { "lang": "es", "value": "Apache Log4j2 ..." },
                        { "lang": "en", "value": "Apache Log4j2 JNDI features ..." }
                    ],
                    "cisaExploitAdd": "2021-12-10"
                }
            }]
        });

        let page: VulnerabilityPage = serde_json::from_value(body).unwrap();
        assert_eq!(page.total_results, 1);
        assert_eq!(page.vulnerabilities.len(), 1);

        let cve = &page.vulnerabilities[0].cve;
        assert_eq!(cve.id, "CVE-2021-44228");
        assert_eq!(cve.english_description(), Some("Apache Log4j2 JNDI features ..."));
        assert!(cve.is_known_exploited());
    }

    #[test]
    fn test_missing_fields_default() {
        let page: VulnerabilityPage = serde_json::from_value(json!({})).unwrap();
        assert_eq!(page, VulnerabilityPage::default());
        assert!(page.is_empty());
    }

    #[test]
    fn test_base_severity_prefers_newest_scheme() {
        let cve = cve_with_metrics(json!({
            "cvssMetricV2": [{ "baseSeverity": "MEDIUM", "cvssData": { "baseScore": 5.0 } }],
            "cvssMetricV31": [{ "cvssData": { "baseScore": 10.0, "baseSeverity": "CRITICAL" } }]
        }));
        assert_eq!(cve.base_severity(), Some(Severity::Critical));
    }

    #[test]
    fn test_base_severity_reads_v2_outer_field() {
        let cve = cve_with_metrics(json!({
            "cvssMetricV2": [{ "baseSeverity": "HIGH", "cvssData": { "baseScore": 7.5 } }]
        }));
        assert_eq!(cve.base_severity(), Some(Severity::High));
    }

    #[test]
    fn test_base_severity_without_metrics() {
        assert_eq!(cve_with_metrics(Value::Null).base_severity(), None);
    }

    #[rstest]
    #[case("low", Severity::Low)]
    #[case("MEDIUM", Severity::Medium)]
    #[case(" High ", Severity::High)]
    #[case("critical", Severity::Critical)]
    fn test_severity_parse(#[case] input: &str, #[case] expected: Severity) {
        assert_eq!(input.parse::<Severity>().unwrap(), expected);
    }

    #[test]
    fn test_severity_parse_rejects_sentinel() {
        assert!("any".parse::<Severity>().is_err());
    }

    #[rstest]
    #[case(SeverityScheme::V2, Severity::Critical, false)]
    #[case(SeverityScheme::V2, Severity::High, true)]
    #[case(SeverityScheme::V3, Severity::Critical, true)]
    #[case(SeverityScheme::V4, Severity::Low, true)]
    fn test_scheme_supports(
        #[case] scheme: SeverityScheme,
        #[case] severity: Severity,
        #[case] supported: bool,
    ) {
        assert_eq!(scheme.supports(severity), supported);
    }
}
