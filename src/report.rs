//! Static HTML report assembly: one page embedding the chart artifacts and
//! their sidecar descriptions/statistics.

use crate::Result;
use crate::artifact;
use anyhow::Context;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::Path;

const STYLESHEET: &str = "\
body {
    margin: 40px auto;
    max-width: 21cm;
    line-height: 1.6;
    font-family: sans-serif;
    padding: 0 10px;
}
img, svg {
    max-width: 100%;
    height: auto;
    margin: auto;
}
";

/// Render the report. `info` is the provenance mapping shown at the top
/// (its "Title" entry, when present, becomes the page title). Each artifact
/// must have a `.meta.json` sidecar; SVG artifacts are referenced relative
/// to the report, or inlined when `self_contained` is set.
pub fn render_report(
    info: &BTreeMap<String, String>,
    artifacts: &[&Path],
    output: &Path,
    self_contained: bool,
) -> Result<String> {
    let base = output.parent().unwrap_or_else(|| Path::new(""));
    let title = info.get("Title").map(String::as_str).unwrap_or("Benchmark");

    let mut html = String::new();
    html.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    let _ = writeln!(html, "<title>{}</title>", escape(title));
    let _ = writeln!(html, "<style>\n{STYLESHEET}</style>");
    html.push_str("</head>\n<body>\n");

    let _ = writeln!(html, "<h1>{}</h1>", escape(title));
    push_dictionary(&mut html, info.iter().filter(|(k, _)| k.as_str() != "Title"));

    for artifact_path in artifacts {
        let meta = artifact::read_meta(artifact_path)?;

        let _ = writeln!(html, "<h2>{}</h2>", escape(&meta.title));
        if let Some(description) = &meta.description {
            let _ = writeln!(html, "<p>{}</p>", escape(description));
        }
        if let Some(statistics) = &meta.statistics {
            html.push_str("<p><b>Statistics:</b></p>\n");
            push_dictionary(
                &mut html,
                statistics.iter().map(|(k, v)| (k, format_stat(*v))),
            );
        }

        if artifact_path.extension().and_then(|e| e.to_str()) == Some("svg") {
            if self_contained {
                let svg = std::fs::read_to_string(artifact_path)
                    .with_context(|| format!("read artifact {}", artifact_path.display()))?;
                html.push_str(&svg);
                html.push('\n');
            } else {
                let relative = artifact_path
                    .strip_prefix(base)
                    .unwrap_or(artifact_path);
                let _ = writeln!(html, "<img src=\"{}\">", escape(&relative.to_string_lossy()));
            }
        }
    }

    html.push_str("</body>\n</html>\n");
    Ok(html)
}

fn push_dictionary<K, V, I>(html: &mut String, entries: I)
where
    K: AsRef<str>,
    V: AsRef<str>,
    I: Iterator<Item = (K, V)>,
{
    html.push_str("<ul>\n");
    for (key, value) in entries {
        let _ = writeln!(
            html,
            "<li><b>{}: </b>{}</li>",
            escape(key.as_ref()),
            escape(value.as_ref())
        );
    }
    html.push_str("</ul>\n");
}

/// Trim trailing zeros so counts read as integers.
fn format_stat(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        format!("{v:.3}")
    }
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
