//! HTML export: one page per chart with the SVG inlined, an index page, and
//! a JSON dump of the summary. PNG copies are optional.

use crate::charts::renderer::{RenderError, StaticChartRenderer};
use crate::charts::ChartKind;
use crate::stats::ImmigrationSummary;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error("failed to serialize summary: {0}")]
    Json(#[from] serde_json::Error),
}

/// Files written by one export.
#[derive(Debug, Clone, Default)]
pub struct ExportReport {
    pub pages: Vec<PathBuf>,
    pub images: Vec<PathBuf>,
    pub index: PathBuf,
    pub summary: PathBuf,
}

impl ExportReport {
    pub fn file_count(&self) -> usize {
        self.pages.len() + self.images.len() + 2
    }
}

pub struct HtmlExporter<'a> {
    renderer: StaticChartRenderer<'a>,
    summary: &'a ImmigrationSummary,
    out_dir: PathBuf,
    png: bool,
}

impl<'a> HtmlExporter<'a> {
    pub fn new(
        renderer: StaticChartRenderer<'a>,
        summary: &'a ImmigrationSummary,
        out_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            renderer,
            summary,
            out_dir: out_dir.into(),
            png: false,
        }
    }

    pub fn with_png(mut self, png: bool) -> Self {
        self.png = png;
        self
    }

    /// Write every chart, the index and `summary.json`.
    pub fn export_all(&self) -> Result<ExportReport, ExportError> {
        fs::create_dir_all(&self.out_dir).map_err(|source| ExportError::Io {
            path: self.out_dir.clone(),
            source,
        })?;

        let mut report = ExportReport::default();
        for kind in ChartKind::ALL {
            let title = self.renderer.title(kind);
            let svg = self.renderer.render_svg(kind)?;
            let path = self.out_dir.join(format!("{}.html", kind.file_stem()));
            write_file(&path, &chart_page(&title, &svg))?;
            report.pages.push(path);

            if self.png {
                let png = self.out_dir.join(format!("{}.png", kind.file_stem()));
                self.renderer.render_png(kind, &png)?;
                report.images.push(png);
            }
            info!(chart = kind.file_stem(), "exported chart");
        }

        let entries: Vec<(String, String)> = ChartKind::ALL
            .iter()
            .map(|kind| (format!("{}.html", kind.file_stem()), self.renderer.title(*kind)))
            .collect();
        report.index = self.out_dir.join("index.html");
        write_file(&report.index, &index_page(&entries))?;

        report.summary = self.write_summary()?;

        info!(
            out_dir = %self.out_dir.display(),
            files = report.file_count(),
            "export complete"
        );
        Ok(report)
    }

    fn write_summary(&self) -> Result<PathBuf, ExportError> {
        let path = self.out_dir.join("summary.json");
        let json = serde_json::to_string_pretty(self.summary)?;
        write_file(&path, &json)?;
        Ok(path)
    }
}

fn write_file(path: &Path, contents: &str) -> Result<(), ExportError> {
    fs::write(path, contents).map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })
}

pub(crate) fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

const STYLE: &str = "body{font-family:sans-serif;margin:24px;color:#2a3f5f;background:#fff}\
h1{font-size:20px}a{color:#636efa}li{margin:6px 0}";

/// Standalone page wrapping one rendered chart.
pub(crate) fn chart_page(title: &str, svg: &str) -> String {
    let title = escape_html(title);
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{title}</title>\n<style>{STYLE}</style>\n</head>\n<body>\n\
         <h1>{title}</h1>\n<div class=\"chart\">\n{svg}\n</div>\n\
         <p><a href=\"index.html\">All charts</a></p>\n</body>\n</html>\n"
    )
}

/// Index linking every chart page; entries are (file name, title).
pub(crate) fn index_page(entries: &[(String, String)]) -> String {
    let items: String = entries
        .iter()
        .map(|(file, title)| {
            format!(
                "<li><a href=\"{}\">{}</a></li>\n",
                escape_html(file),
                escape_html(title)
            )
        })
        .collect();
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>Canadian Immigration Charts</title>\n<style>{STYLE}</style>\n</head>\n<body>\n\
         <h1>Canadian Immigration Charts</h1>\n<ol>\n{items}</ol>\n</body>\n</html>\n"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charts::ChartTheme;
    use crate::config::AnalysisSettings;
    use crate::data::TidyRecord;

    #[test]
    fn escapes_markup() {
        assert_eq!(
            escape_html("Côte d'Ivoire <b> & \"x\""),
            "Côte d&#39;Ivoire &lt;b&gt; &amp; &quot;x&quot;"
        );
    }

    #[test]
    fn chart_page_inlines_svg() {
        let page = chart_page("Developed vs. Developing Regions", "<svg></svg>");
        assert!(page.contains("<title>Developed vs. Developing Regions</title>"));
        assert!(page.contains("<svg></svg>"));
        assert!(page.contains("href=\"index.html\""));
    }

    #[test]
    fn index_lists_every_entry_in_order() {
        let entries: Vec<(String, String)> = ChartKind::ALL
            .iter()
            .map(|k| (format!("{}.html", k.file_stem()), k.file_stem().to_string()))
            .collect();
        let page = index_page(&entries);
        assert_eq!(page.matches("<li>").count(), 10);
        let first = page.find("1_total_immigration.html").unwrap();
        let last = page.find("10_treemap.html").unwrap();
        assert!(first < last);
    }

    #[test]
    fn summary_json_is_written() {
        let records = vec![
            TidyRecord::new("India", "Asia", "Southern Asia", "Developing regions", 1980, 8880),
            TidyRecord::new("India", "Asia", "Southern Asia", "Developing regions", 1981, 8670),
        ];
        let settings = AnalysisSettings::default();
        let summary = ImmigrationSummary::compute(&records, &settings);
        let theme = ChartTheme::default();
        let dir = tempfile::tempdir().unwrap();

        let exporter = HtmlExporter::new(
            StaticChartRenderer::new(&summary, &settings, &theme),
            &summary,
            dir.path(),
        );
        let path = exporter.write_summary().unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(value["kpis"]["total_immigrants"], 17550);
        assert_eq!(value["kpis"]["top_country"], "India");
    }
}
