use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::nutrition::{NutritionSummary, NutritionTotals};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageDetections {
    pub filename: String,
    pub detections: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageNutrition {
    pub filename: String,
    pub nutrition: NutritionSummary,
}

/// Respuesta de un lote: una entrada por imagen procesada más el total.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub detections: Vec<ImageDetections>,
    pub nutrition: Vec<ImageNutrition>,
    pub total_nutrition: NutritionTotals,
}

impl AnalysisReport {
    pub fn push(&mut self, filename: &str, labels: Vec<String>, nutrition: NutritionSummary) {
        self.total_nutrition.add(&nutrition);
        self.detections.push(ImageDetections { filename: filename.to_string(), detections: labels });
        self.nutrition.push(ImageNutrition { filename: filename.to_string(), nutrition });
    }
}

/// "2 apple, 1 banana" para los logs.
pub fn summarize_labels(labels: &[String]) -> String {
    let mut counts = BTreeMap::new();
    for label in labels {
        *counts.entry(label.as_str()).or_insert(0) += 1;
    }
    counts
        .iter()
        .map(|(label, count)| format!("{} {}", count, label))
        .collect::<Vec<_>>()
        .join(", ")
}
