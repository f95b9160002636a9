use html_escape::{encode_double_quoted_attribute, encode_text};
use std::fmt::Write;
use time::macros::format_description;

use super::Report;
use crate::news::Article;

const STYLE: &str = "\
body { font-family: Arial, sans-serif; margin: 2em auto; max-width: 60em; color: #222; }
h2 { border-bottom: 1px solid #ccc; }
ul { list-style-type: none; padding-left: 0; }
li { margin-bottom: 1em; }
.meta { color: #666; font-size: 0.9em; }
.tag { text-transform: uppercase; font-size: 0.75em; margin-left: 0.5em; }
.drawback { font-style: italic; color: #8a4b00; }
";

/// Self-contained static page: inline CSS, no scripts.
pub fn render_html(report: &Report<'_>) -> String {
    let mut out = String::with_capacity(4096 + report.len() * 512);
    let title = encode_text(report.title);
    let date = report
        .date
        .format(format_description!("[year]-[month]-[day]"))
        .unwrap_or_default();

    // Writing into a String cannot fail.
    let _ = write!(
        out,
        "<!doctype html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\" />\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\" />\n\
         <title>{title}</title>\n<style>\n{STYLE}</style>\n</head>\n<body>\n\
         <h1>{title}</h1>\n<p class=\"meta\">{date} &middot; {} articles</p>\n",
        report.len()
    );

    if report.is_empty() {
        out.push_str("<p>No articles.</p>\n");
    }

    for section in report.sections.iter().filter(|s| !s.articles.is_empty()) {
        let _ = writeln!(
            out,
            "<section id=\"{}\">\n<h2>{}</h2>\n<ul>",
            section.kind.anchor(),
            section.kind.heading()
        );
        for article in &section.articles {
            render_item(&mut out, article);
        }
        out.push_str("</ul>\n</section>\n");
    }

    out.push_str("</body>\n</html>\n");
    out
}

fn render_item(out: &mut String, a: &Article) {
    let _ = write!(
        out,
        "<li><a href=\"{}\">{}</a>\n<div class=\"meta\">{}<span class=\"tag\">{}</span>",
        encode_double_quoted_attribute(&a.link),
        encode_text(&a.title),
        encode_text(&a.source),
        a.category
    );
    if let Some(published) = a.published {
        if let Ok(day) = published.format(format_description!("[year]-[month]-[day]")) {
            let _ = write!(out, " &middot; {day}");
        }
    }
    out.push_str("</div>\n");
    if let Some(summary) = &a.summary {
        let _ = writeln!(out, "<p>{}</p>", encode_text(summary));
    }
    if let Some(drawback) = &a.drawbacks {
        let _ = writeln!(
            out,
            "<p class=\"drawback\">Potential drawback: {}</p>",
            encode_text(drawback)
        );
    }
    out.push_str("</li>\n");
}
