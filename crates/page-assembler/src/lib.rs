//! Serializes rendered page models into one self-contained HTML artifact
//! with tab navigation. Charts are embedded as JSON payloads that a small
//! inline script hands to Plotly, loaded from its CDN; everything else is
//! static markup, so the same inputs always produce the same bytes.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use report_core::{
    ChartSpec, Narrative, NarrativeTone, PageModel, ReportError, Section, Table,
};
use tracing::info;

const PLOTLY_CDN: &str = "https://cdn.plot.ly/plotly-2.35.2.min.js";

/// Description of the written artifact, returned to the caller for logging.
#[derive(Debug, Clone, PartialEq)]
pub struct ArtifactMeta {
    pub path: PathBuf,
    pub bytes: usize,
    pub pages: usize,
    pub generated_at: DateTime<Utc>,
}

pub struct PageAssembler {
    report_title: String,
    /// Injected so that reruns over identical inputs are byte-identical.
    generated_at: DateTime<Utc>,
}

impl PageAssembler {
    pub fn new(report_title: impl Into<String>, generated_at: DateTime<Utc>) -> Self {
        Self {
            report_title: report_title.into(),
            generated_at,
        }
    }

    /// Renders the complete document as a string.
    pub fn assemble(&self, pages: &[PageModel]) -> Result<String, ReportError> {
        if pages.is_empty() {
            return Err(ReportError::InvalidData(
                "no pages to assemble".to_string(),
            ));
        }

        let title = escape(&self.report_title);
        let tabs: String = pages
            .iter()
            .enumerate()
            .map(|(index, page)| {
                let active = if index == 0 { " active" } else { "" };
                format!(
                    r#"<button class="tab{active}" data-target="{slug}">{label}</button>"#,
                    slug = escape(&page.slug),
                    label = escape(&page.title),
                )
            })
            .collect();

        let mut bodies = String::new();
        for (index, page) in pages.iter().enumerate() {
            let display = if index == 0 { "block" } else { "none" };
            bodies.push_str(&format!(
                r#"<div class="page" id="{slug}" style="display:{display};">
<h2>{title}</h2>
"#,
                slug = escape(&page.slug),
                title = escape(&page.title),
            ));
            for section in &page.sections {
                bodies.push_str(&render_section(section)?);
            }
            bodies.push_str("</div>\n");
        }

        let stamp = self.generated_at.format("%Y-%m-%d %H:%M UTC");
        let html = format!(
            r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{title}</title>
<script src="{PLOTLY_CDN}"></script>
<style>{STYLE}</style>
</head>
<body>
<header><h1>{title}</h1><span class="stamp">Generated {stamp}</span></header>
<nav>{tabs}</nav>
<main>
{bodies}</main>
<script>{SCRIPT}</script>
</body>
</html>
"#
        );
        Ok(html)
    }

    /// Assembles and writes the artifact to `path`.
    pub fn write_file(
        &self,
        path: impl AsRef<Path>,
        pages: &[PageModel],
    ) -> Result<ArtifactMeta, ReportError> {
        let path = path.as_ref();
        let html = self.assemble(pages)?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, &html)?;
        let meta = ArtifactMeta {
            path: path.to_path_buf(),
            bytes: html.len(),
            pages: pages.len(),
            generated_at: self.generated_at,
        };
        info!(path = %meta.path.display(), bytes = meta.bytes, pages = meta.pages, "wrote report artifact");
        Ok(meta)
    }
}

fn render_section(section: &Section) -> Result<String, ReportError> {
    Ok(match section {
        Section::Table(table) => render_table(table),
        Section::Chart(chart) => render_chart(chart)?,
        Section::Narrative(narrative) => render_narrative(narrative),
    })
}

fn render_table(table: &Table) -> String {
    let mut out = String::from(r#"<section class="table">"#);
    if let Some(title) = &table.title {
        out.push_str(&format!("<h3>{}</h3>", escape(title)));
    }
    out.push_str("<table><thead><tr>");
    for column in &table.columns {
        out.push_str(&format!("<th>{}</th>", escape(column)));
    }
    out.push_str("</tr></thead><tbody>");
    for row in &table.rows {
        out.push_str("<tr>");
        for cell in row {
            out.push_str(&format!("<td>{}</td>", escape(cell)));
        }
        out.push_str("</tr>");
    }
    out.push_str("</tbody></table></section>\n");
    out
}

fn render_chart(chart: &ChartSpec) -> Result<String, ReportError> {
    // "<" must not appear verbatim inside the inline JSON block, or a
    // "</script>" in a series name would terminate it; "<" parses to
    // the same string.
    let payload = serde_json::to_string(chart)?.replace('<', "\\u003c");
    Ok(format!(
        r#"<section class="chart"><h3>{title}</h3><div class="plot"></div><script type="application/json" data-chart>{payload}</script></section>
"#,
        title = escape(&chart.title),
    ))
}

fn render_narrative(narrative: &Narrative) -> String {
    let mut out = format!(
        r#"<section class="narrative"><h3>{}</h3><ul>"#,
        escape(&narrative.heading)
    );
    for item in &narrative.items {
        let class = match item.tone {
            NarrativeTone::Strength => "strength",
            NarrativeTone::Weakness => "weakness",
            NarrativeTone::Recommendation => "recommendation",
        };
        out.push_str(&format!(
            r#"<li class="{class}">{}</li>"#,
            escape(&item.text)
        ));
    }
    out.push_str("</ul></section>\n");
    out
}

fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

const STYLE: &str = r#"
body{font-family:Segoe UI,Arial,sans-serif;margin:0;background:#f8fafc;color:#1e293b;}
header{display:flex;justify-content:space-between;align-items:baseline;padding:16px 24px;background:#0f172a;color:#f8fafc;}
header h1{margin:0;font-size:22px;}
.stamp{color:#94a3b8;font-size:13px;}
nav{display:flex;flex-wrap:wrap;gap:4px;padding:8px 24px;background:#1e293b;}
.tab{border:0;padding:8px 14px;border-radius:6px 6px 0 0;background:#334155;color:#e2e8f0;cursor:pointer;font-size:14px;}
.tab.active{background:#f8fafc;color:#0f172a;font-weight:600;}
main{padding:16px 24px;max-width:1200px;margin:0 auto;}
section{background:#fff;border-radius:8px;padding:12px 16px;margin:12px 0;box-shadow:0 1px 2px rgba(15,23,42,.08);}
h2{margin:8px 0;}
h3{margin:4px 0 8px;font-size:16px;}
table{width:100%;border-collapse:collapse;font-size:14px;}
th{text-align:left;padding:6px 10px;background:#f1f5f9;color:#475569;}
td{padding:6px 10px;border-top:1px solid #e2e8f0;}
.narrative li{margin:4px 0;}
li.strength{color:#15803d;}
li.weakness{color:#b91c1c;}
li.recommendation{color:#1d4ed8;}
.plot{min-height:360px;}
"#;

const SCRIPT: &str = r#"
document.querySelectorAll('.tab').forEach(function(tab){
  tab.addEventListener('click',function(){
    document.querySelectorAll('.tab').forEach(function(t){t.classList.remove('active');});
    document.querySelectorAll('.page').forEach(function(p){p.style.display='none';});
    tab.classList.add('active');
    document.getElementById(tab.dataset.target).style.display='block';
  });
});
document.querySelectorAll('script[data-chart]').forEach(function(node){
  var spec=JSON.parse(node.textContent);
  var div=node.parentElement.querySelector('.plot');
  var traces=spec.series.map(function(s){
    var base={name:s.name};
    if(s.color){base.marker={color:s.color};base.line={color:s.color};}
    if(spec.kind==='bar'){return Object.assign(base,{type:'bar',x:s.x,y:s.values});}
    if(spec.kind==='box'){return Object.assign(base,{type:'box',y:s.values.filter(function(v){return v!==null;})});}
    if(spec.kind==='radar'){return Object.assign(base,{type:'scatterpolar',theta:s.x.concat([s.x[0]]),r:s.values.concat([s.values[0]]),fill:'toself'});}
    if(spec.kind==='heatmap'){return null;}
    return Object.assign(base,{type:'scatter',mode:'lines+markers',x:s.x,y:s.values});
  }).filter(function(t){return t!==null;});
  if(spec.kind==='heatmap'){
    traces=[{type:'heatmap',x:spec.series.length?spec.series[0].x:[],y:spec.series.map(function(s){return s.name;}),z:spec.series.map(function(s){return s.values;}),colorscale:'RdYlGn',zmin:0,zmax:2}];
  }
  var layout={title:'',margin:{t:24},xaxis:{title:spec.x_label},yaxis:{title:spec.y_label}};
  if(spec.kind==='radar'){layout.polar={radialaxis:{range:[0,1]}};}
  Plotly.newPlot(div,traces,layout,{displayModeBar:false});
});
"#;
