use super::Report;

/// Pretty JSON array of articles in canonical order; `[]` when empty.
pub fn render_json(report: &Report<'_>) -> Result<String, serde_json::Error> {
    let articles: Vec<_> = report.articles().collect();
    serde_json::to_string_pretty(&articles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::news::{Article, RankedArticles};
    use crate::render::tests::sample_ranked;
    use time::macros::date;

    #[test]
    fn empty_report_is_empty_array() {
        let ranked = RankedArticles::default();
        let report = Report::new("Digest", date!(2025 - 03 - 05), &ranked);
        assert_eq!(render_json(&report).unwrap(), "[]");
    }

    #[test]
    fn output_reads_back_identically() {
        let ranked = sample_ranked();
        let report = Report::new("Digest", date!(2025 - 03 - 05), &ranked);
        let json = render_json(&report).unwrap();
        let back: Vec<Article> = serde_json::from_str(&json).unwrap();
        let expected: Vec<Article> = report.articles().cloned().collect();
        assert_eq!(back, expected);
        assert_eq!(render_json(&report).unwrap(), json);
        assert!(json.contains("\"published\": null"));
    }
}
