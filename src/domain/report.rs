//! Turns a detection set into what the two front-ends display.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::classes::ClassRegistry;
use super::detection::Detection;
use super::errors::{DomainError, DomainResult};

/// Which front-end the wording is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shell {
    Dashboard,
    Form,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DetectionRow {
    pub index: usize,
    pub label: String,
    pub confidence: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BannerLevel {
    Success,
    Warning,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Banner {
    pub level: BannerLevel,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DetectionReport {
    Found { rows: Vec<DetectionRow> },
    Empty,
}

/// `0.8567` -> `"85.67%"`
pub fn format_confidence(score: f32) -> String {
    format!("{:.2}%", f64::from(score) * 100.0)
}

/// One row per detection, in detector order.
pub fn format_rows(detections: &[Detection], registry: &ClassRegistry) -> DomainResult<Vec<DetectionRow>> {
    detections
        .iter()
        .enumerate()
        .map(|(i, det)| {
            let label = registry.label(det.class_id).ok_or_else(|| {
                DomainError::Inference(format!(
                    "detector emitted class index {} outside the {}-label registry",
                    det.class_id,
                    registry.len()
                ))
            })?;
            Ok(DetectionRow {
                index: i + 1,
                label: label.to_string(),
                confidence: format_confidence(det.score),
            })
        })
        .collect()
}

pub fn summarize(detections: &[Detection], registry: &ClassRegistry) -> DomainResult<DetectionReport> {
    if detections.is_empty() {
        return Ok(DetectionReport::Empty);
    }
    Ok(DetectionReport::Found { rows: format_rows(detections, registry)? })
}

fn objects(n: usize) -> &'static str {
    if n == 1 { "object" } else { "objects" }
}

pub fn success_banner(count: usize) -> Banner {
    Banner {
        level: BannerLevel::Success,
        text: format!("Successfully detected {count} {}.", objects(count)),
    }
}

pub fn advisory(shell: Shell) -> &'static str {
    match shell {
        Shell::Dashboard => {
            "No objects detected. Try:\n\
             - lowering the confidence threshold\n\
             - using a photo of a physical card (not a screenshot or handwriting)\n\
             - making sure the image is clear"
        }
        Shell::Form => {
            "No objects detected\n\n\
             Suggestions:\n\
             - Lower the confidence threshold\n\
             - Use images with physical cards\n\
             - Ensure the image is clear"
        }
    }
}

pub fn dashboard_banner(report: &DetectionReport) -> Banner {
    match report {
        DetectionReport::Found { rows } => success_banner(rows.len()),
        DetectionReport::Empty => Banner {
            level: BannerLevel::Warning,
            text: advisory(Shell::Dashboard).to_string(),
        },
    }
}

/// Multi-line text block for the form front-end.
pub fn form_text(report: &DetectionReport) -> String {
    match report {
        DetectionReport::Found { rows } => {
            let mut out = format!("Detected {} {}:\n\n", rows.len(), objects(rows.len()));
            for row in rows {
                out.push_str(&format!("{}. {} - Confidence: {}\n", row.index, row.label, row.confidence));
            }
            out
        }
        DetectionReport::Empty => advisory(Shell::Form).to_string(),
    }
}

/// "2 Bullseye, 1 circle" style summary for logs.
pub fn label_counts(detections: &[Detection], registry: &ClassRegistry) -> String {
    let mut counts = BTreeMap::new();
    for det in detections {
        let label = registry.label(det.class_id).unwrap_or("?");
        *counts.entry(label).or_insert(0) += 1;
    }
    counts
        .iter()
        .map(|(label, count)| format!("{} {}", count, label))
        .collect::<Vec<_>>()
        .join(", ")
}
