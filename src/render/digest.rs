use std::fmt::Write;
use time::macros::format_description;

use super::Report;
use crate::util::sanitize::plain_text;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Digest {
    pub subject: String,
    pub body: String,
}

/// Plain-text condensation of the report.
///
/// Sections keep the report order. Within a section, consecutive articles
/// from the same source share one source heading, so grouping never
/// reorders articles.
pub fn render_digest(report: &Report<'_>) -> Digest {
    let date = report
        .date
        .format(format_description!("[year]-[month]-[day]"))
        .unwrap_or_default();
    let subject = format!("{} - {} ({} articles)", plain_text(report.title), date, report.len());

    let mut body = String::new();
    if report.is_empty() {
        body.push_str("No new articles today.\n");
    }
    for section in report.sections.iter().filter(|s| !s.articles.is_empty()) {
        let heading = section.kind.heading();
        let _ = writeln!(body, "{heading}\n{}\n", "=".repeat(heading.len()));
        let mut current_source: Option<&str> = None;
        for a in &section.articles {
            if current_source != Some(a.source.as_str()) {
                let _ = writeln!(body, "{}:", plain_text(&a.source));
                current_source = Some(a.source.as_str());
            }
            let _ = writeln!(body, "- {}", plain_text(&a.title));
            if let Some(summary) = &a.summary {
                let _ = writeln!(body, "  {}", plain_text(summary));
            }
            if let Some(drawback) = &a.drawbacks {
                let _ = writeln!(body, "  Potential drawback: {}", plain_text(drawback));
            }
            let _ = writeln!(body, "  {}\n", a.link);
        }
    }

    Digest {
        subject,
        body: body.trim_end().to_string() + "\n",
    }
}
