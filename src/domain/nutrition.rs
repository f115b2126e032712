use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Valores nutricionales por cada 100 g.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NutritionFact {
    pub calories: f64,
    pub carbs: f64,
    pub protein: f64,
    pub fat: f64,
    pub fiber: f64,
    pub vitamin_c: f64,
    pub potassium: f64,
}

const BUILTIN_FACTS: &[(&str, NutritionFact)] = &[
    ("apple", NutritionFact { calories: 52.0, carbs: 14.0, protein: 0.3, fat: 0.2, fiber: 2.4, vitamin_c: 4.6, potassium: 107.0 }),
    ("banana", NutritionFact { calories: 89.0, carbs: 23.0, protein: 1.1, fat: 0.3, fiber: 2.6, vitamin_c: 8.7, potassium: 358.0 }),
    ("carrot", NutritionFact { calories: 41.0, carbs: 10.0, protein: 0.9, fat: 0.2, fiber: 2.8, vitamin_c: 5.9, potassium: 320.0 }),
    ("broccoli", NutritionFact { calories: 55.0, carbs: 11.0, protein: 3.7, fat: 0.6, fiber: 2.6, vitamin_c: 89.2, potassium: 316.0 }),
    ("potato", NutritionFact { calories: 77.0, carbs: 17.0, protein: 2.0, fat: 0.1, fiber: 2.2, vitamin_c: 19.7, potassium: 429.0 }),
    ("orange", NutritionFact { calories: 47.0, carbs: 12.0, protein: 0.9, fat: 0.1, fiber: 2.4, vitamin_c: 53.2, potassium: 181.0 }),
];

/// Tabla inmutable etiqueta -> valores por 100 g. Se construye una vez al arrancar.
#[derive(Debug, Clone)]
pub struct NutritionTable {
    facts: HashMap<String, NutritionFact>,
}

impl NutritionTable {
    pub fn builtin() -> Self {
        Self::from_entries(BUILTIN_FACTS.iter().map(|(label, fact)| (label.to_string(), *fact)))
    }

    pub fn from_entries(entries: impl IntoIterator<Item = (String, NutritionFact)>) -> Self {
        Self { facts: entries.into_iter().collect() }
    }

    pub fn get(&self, label: &str) -> Option<&NutritionFact> {
        self.facts.get(label)
    }

    pub fn len(&self) -> usize {
        self.facts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }

    /// Entradas ordenadas por etiqueta.
    pub fn entries(&self) -> Vec<(&str, &NutritionFact)> {
        let mut out: Vec<_> = self.facts.iter().map(|(k, v)| (k.as_str(), v)).collect();
        out.sort_by(|a, b| a.0.cmp(b.0));
        out
    }

    /// Suma los valores de cada etiqueta conocida escalados por `weight_grams / 100`.
    ///
    /// Cada etiqueta recibe el peso completo: el peso no se reparte entre los
    /// alimentos detectados. Las etiquetas desconocidas no aportan nada y las
    /// repetidas cuentan una vez por aparición.
    pub fn summarize<S: AsRef<str>>(&self, labels: &[S], weight_grams: f64) -> NutritionSummary {
        let mut acc = NutritionFact::default();
        for label in labels {
            if let Some(fact) = self.get(label.as_ref()) {
                let factor = weight_grams / 100.0;
                acc.calories += fact.calories * factor;
                acc.carbs += fact.carbs * factor;
                acc.protein += fact.protein * factor;
                acc.fat += fact.fat * factor;
                acc.fiber += fact.fiber * factor;
                acc.vitamin_c += fact.vitamin_c * factor;
                acc.potassium += fact.potassium * factor;
            }
        }

        NutritionSummary {
            total_calories: round2(acc.calories),
            macros: Macros {
                carbs: round2(acc.carbs),
                protein: round2(acc.protein),
                fat: round2(acc.fat),
                fiber: round2(acc.fiber),
            },
            micros: Micros {
                vitamin_c: round2(acc.vitamin_c),
                potassium: round2(acc.potassium),
            },
        }
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Macros {
    #[serde(rename = "Carbs")]
    pub carbs: f64,
    #[serde(rename = "Protein")]
    pub protein: f64,
    #[serde(rename = "Fat")]
    pub fat: f64,
    #[serde(rename = "Fiber")]
    pub fiber: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Micros {
    #[serde(rename = "Vitamin C")]
    pub vitamin_c: f64,
    #[serde(rename = "Potassium")]
    pub potassium: f64,
}

/// Resumen escalado para una imagen (valores redondeados a 2 decimales).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NutritionSummary {
    pub total_calories: f64,
    pub macros: Macros,
    pub micros: Micros,
}

/// Acumulado del lote: suma directa de los resúmenes por imagen.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NutritionTotals {
    pub calories: f64,
    pub macros: Macros,
    pub micros: Micros,
}

impl NutritionTotals {
    pub fn add(&mut self, s: &NutritionSummary) {
        self.calories += s.total_calories;
        self.macros.carbs += s.macros.carbs;
        self.macros.protein += s.macros.protein;
        self.macros.fat += s.macros.fat;
        self.macros.fiber += s.macros.fiber;
        self.micros.vitamin_c += s.micros.vitamin_c;
        self.micros.potassium += s.micros.potassium;
    }
}
