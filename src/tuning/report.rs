//! Rendering of note run results

use super::ParamReport;
use crate::error::Result;
use crate::param::{Compliance, Operator};
use serde::Serialize;
use std::io::{self, Write};

/// Flat, serialisable view of one [`ParamReport`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportRow {
    /// Parameter name
    pub name: String,
    /// Kind label
    pub kind: String,
    /// Operator of the recommendation
    pub operator: Operator,
    /// Value found on the system
    pub current: String,
    /// Value asked for
    pub recommended: String,
    /// Value to write, empty if not optimised
    pub resolved: String,
    /// Whether the system can take the resolved value
    pub supported: bool,
    /// None when the parameter failed
    pub compliance: Option<Compliance>,
    /// Failure message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ReportRow {
    /// Build a row from a report
    pub fn from_report(report: &ParamReport) -> Self {
        match &report.outcome {
            Ok(p) => Self {
                name: report.name.clone(),
                kind: p.kind().label().to_string(),
                operator: p.operator(),
                current: p.current().to_string(),
                recommended: p.recommended().to_string(),
                resolved: p.resolved().map(|v| v.to_string()).unwrap_or_default(),
                supported: p.is_supported(),
                compliance: Some(p.compliance()),
                error: None,
            },
            Err(e) => Self {
                name: report.name.clone(),
                kind: crate::param::ParamKind::classify(&report.name)
                    .label()
                    .to_string(),
                operator: Operator::default(),
                current: String::new(),
                recommended: String::new(),
                resolved: String::new(),
                supported: false,
                compliance: None,
                error: Some(e.to_string()),
            },
        }
    }

    fn status(&self) -> &'static str {
        match (&self.error, self.compliance) {
            (Some(_), _) => "error",
            (None, _) if !self.supported => "unsupported",
            (None, Some(Compliance::Compliant)) => "ok",
            (None, Some(Compliance::NonCompliant)) => "differs",
            _ => "-",
        }
    }
}

/// Counts over a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    /// Parameters already at the resolved value
    pub compliant: usize,
    /// Parameters that differ
    pub non_compliant: usize,
    /// Parameters with nothing to compare
    pub not_applicable: usize,
    /// Parameters that failed
    pub failed: usize,
}

impl Summary {
    /// Tally the reports of a run
    pub fn of(reports: &[ParamReport]) -> Self {
        let mut summary = Self::default();
        for report in reports {
            match &report.outcome {
                Ok(p) => match p.compliance() {
                    Compliance::Compliant => summary.compliant += 1,
                    Compliance::NonCompliant => summary.non_compliant += 1,
                    Compliance::NotApplicable => summary.not_applicable += 1,
                },
                Err(_) => summary.failed += 1,
            }
        }
        summary
    }
}

/// Tab-free text for table cells
fn cell(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn write_row(out: &mut impl Write, fields: &[&str], widths: &[usize]) -> io::Result<()> {
    let padded: Vec<String> = fields
        .iter()
        .zip(widths.iter())
        .map(|(f, w)| format!("{:<width$}", f, width = *w))
        .collect();
    writeln!(out, "{}", padded.join("  ").trim_end())
}

/// Write reports as an aligned text table followed by a summary line
pub fn write_text(out: &mut impl Write, reports: &[ParamReport]) -> io::Result<()> {
    let rows: Vec<ReportRow> = reports.iter().map(ReportRow::from_report).collect();
    let headers = ["PARAMETER", "KIND", "CURRENT", "OP", "RECOMMENDED", "RESOLVED", "STATUS"];

    let cells: Vec<[String; 7]> = rows
        .iter()
        .map(|r| {
            [
                r.name.clone(),
                r.kind.clone(),
                cell(&r.current),
                r.operator.symbol().to_string(),
                cell(&r.recommended),
                cell(&r.resolved),
                r.status().to_string(),
            ]
        })
        .collect();

    let mut widths = headers.map(str::len);
    for row in &cells {
        for (w, c) in widths.iter_mut().zip(row.iter()) {
            *w = (*w).max(c.len());
        }
    }

    write_row(out, &headers, &widths)?;
    for row in &cells {
        let fields: Vec<&str> = row.iter().map(String::as_str).collect();
        write_row(out, &fields, &widths)?;
    }

    for row in rows.iter().filter(|r| r.error.is_some()) {
        writeln!(out, "\n[!!] {}: {}", row.name, row.error.as_deref().unwrap_or_default())?;
    }

    let s = Summary::of(reports);
    writeln!(
        out,
        "\n=== Summary ===\nCompliant: {}, Differs: {}, Not applicable: {}, Failed: {}",
        s.compliant, s.non_compliant, s.not_applicable, s.failed
    )
}

/// Reports as pretty JSON
pub fn to_json(reports: &[ParamReport]) -> Result<String> {
    #[derive(Serialize)]
    struct Document {
        parameters: Vec<ReportRow>,
        summary: Summary,
    }

    let doc = Document {
        parameters: reports.iter().map(ReportRow::from_report).collect(),
        summary: Summary::of(reports),
    };
    Ok(serde_json::to_string_pretty(&doc)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TuneError;
    use crate::param::{Parameter, Recommendation, Value};

    fn reports() -> Vec<ParamReport> {
        let ok = Parameter::new("vm.swappiness")
            .with_current("60")
            .resolve(&Recommendation::new("10"), Value::text("10"), true);
        let same = Parameter::new("KSM")
            .with_current("0")
            .resolve(&Recommendation::new("0"), Value::text("0"), true);
        vec![
            ParamReport {
                name: "vm.swappiness".to_string(),
                outcome: Ok(ok),
            },
            ParamReport {
                name: "KSM".to_string(),
                outcome: Ok(same),
            },
            ParamReport {
                name: "ShmFileSystemSizeMB".to_string(),
                outcome: Err(TuneError::config("boom")),
            },
        ]
    }

    #[test]
    fn test_summary() {
        let s = Summary::of(&reports());
        assert_eq!(s.compliant, 1);
        assert_eq!(s.non_compliant, 1);
        assert_eq!(s.failed, 1);
    }

    #[test]
    fn test_text_table() {
        let mut out = Vec::new();
        write_text(&mut out, &reports()).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("PARAMETER"));
        assert!(text.contains("vm.swappiness"));
        assert!(text.contains("differs"));
        assert!(text.contains("[!!] ShmFileSystemSizeMB"));
        assert!(text.contains("Compliant: 1, Differs: 1, Not applicable: 0, Failed: 1"));
    }

    #[test]
    fn test_json() {
        let json = to_json(&reports()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["parameters"][0]["name"], "vm.swappiness");
        assert_eq!(value["parameters"][0]["compliance"], "non_compliant");
        assert_eq!(value["parameters"][0]["operator"], "=");
        assert_eq!(value["parameters"][2]["error"], "Configuration error: boom");
        assert_eq!(value["summary"]["failed"], 1);
    }
}
