//! Terminal output for search results.

use nvd::Cve;
use search_core::SearchState;
use std::fmt::Write;

const SUMMARY_WIDTH: usize = 90;

fn truncate(text: &str, width: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= width {
        return flat;
    }
    let mut cut: String = flat.chars().take(width.saturating_sub(3)).collect();
    cut.push_str("...");
    cut
}

/// `2024-03-29T15:15:08.000` → `2024-03-29`
fn date_part(timestamp: Option<&str>) -> &str {
    timestamp
        .and_then(|ts| ts.split('T').next())
        .unwrap_or("-")
}

pub fn summary_line(cve: &Cve) -> String {
    let severity = cve
        .base_severity()
        .map(|s| s.as_str())
        .unwrap_or("-");
    let kev = if cve.is_known_exploited() { " [KEV]" } else { "" };
    format!(
        "{:<16} {:<8} {}  {}{}",
        cve.id,
        severity,
        date_part(cve.published.as_deref()),
        truncate(cve.english_description().unwrap_or(""), SUMMARY_WIDTH),
        kev,
    )
}

pub fn results(state: &SearchState) -> String {
    let mut out = String::new();
    if state.results.is_empty() {
        out.push_str("No results.\n");
        return out;
    }
    for vuln in &state.results {
        let _ = writeln!(out, "{}", summary_line(&vuln.cve));
    }
    let _ = writeln!(
        out,
        "-- page {} of {} ({} results)",
        state.current_page.saturating_add(1),
        state.total_pages().max(1),
        state.total_results
    );
    out
}

pub fn detail(cve: &Cve) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", cve.id);
    let _ = writeln!(out, "  status:        {}", cve.vuln_status.as_deref().unwrap_or("-"));
    let _ = writeln!(out, "  published:     {}", cve.published.as_deref().unwrap_or("-"));
    let _ = writeln!(out, "  last modified: {}", cve.last_modified.as_deref().unwrap_or("-"));
    let _ = writeln!(
        out,
        "  severity:      {}",
        cve.base_severity().map(|s| s.as_str()).unwrap_or("-")
    );
    if let Some(added) = &cve.cisa_exploit_add {
        let _ = writeln!(out, "  known exploited since {added}");
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "{}", cve.english_description().unwrap_or("(no description)"));
    if !cve.references.is_empty() {
        let _ = writeln!(out);
        for reference in &cve.references {
            let _ = writeln!(out, "  {}", reference.url);
        }
    }
    out
}

#[cfg(test)]
mod test {
    use super::*;
    use nvd::{Description, Vulnerability};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn log4shell() -> Cve {
        Cve {
            id: "CVE-2021-44228".into(),
            published: Some("2021-12-10T10:15:09.143".into()),
            descriptions: vec![Description {
                lang: "en".into(),
                value: "Apache Log4j2 JNDI features do not protect against attacker controlled LDAP.".into(),
            }],
            metrics: json!({
                "cvssMetricV31": [{ "cvssData": { "baseSeverity": "CRITICAL" } }]
            }),
            cisa_exploit_add: Some("2021-12-10".into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_summary_line() {
        assert_eq!(
            summary_line(&log4shell()),
            "CVE-2021-44228   CRITICAL 2021-12-10  Apache Log4j2 JNDI features do not protect against attacker controlled LDAP. [KEV]"
        );
    }

    #[test]
    fn test_long_descriptions_are_truncated() {
        let text = "word ".repeat(40);
        let cut = truncate(&text, 20);
        assert_eq!(cut.chars().count(), 20);
        assert!(cut.ends_with("..."));
    }

    #[test]
    fn test_results_footer() {
        let mut state = SearchState::new(20);
        state.results = vec![Vulnerability { cve: log4shell() }];
        state.total_results = 45;
        state.current_page = 1;

        let out = results(&state);
        assert!(out.ends_with("-- page 2 of 3 (45 results)\n"));
    }

    #[test]
    fn test_footer_on_last_addressable_page() {
        let mut state = SearchState::new(1);
        state.results = vec![Vulnerability { cve: log4shell() }];
        state.total_results = u32::MAX;
        state.current_page = u32::MAX;

        let out = results(&state);
        let footer = format!("-- page {max} of {max} ({max} results)\n", max = u32::MAX);
        assert!(out.ends_with(&footer));
    }

    #[test]
    fn test_empty_results() {
        assert_eq!(results(&SearchState::new(20)), "No results.\n");
    }
}
