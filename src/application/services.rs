use std::sync::Arc;
use tracing::{debug, error, info};

use crate::{
    application::{
        dto::{FoodEntry, UploadBatch},
        ports::{DetectorPort, UploadStorePort},
    },
    domain::{
        detection::labels,
        errors::{DomainResult, FileFailure},
        nutrition::{NutritionSummary, NutritionTable},
        report::{summarize_labels, AnalysisReport},
    },
};

/// Caso de uso principal: guardar cada imagen, detectar alimentos y escalar la tabla nutricional.
#[derive(Clone)]
pub struct AnalysisService {
    detector: Arc<dyn DetectorPort>,
    store: Arc<dyn UploadStorePort>,
    nutrition: Arc<NutritionTable>,
}

impl AnalysisService {
    pub fn new(
        detector: Arc<dyn DetectorPort>,
        store: Arc<dyn UploadStorePort>,
        nutrition: Arc<NutritionTable>,
    ) -> Self {
        Self { detector, store, nutrition }
    }

    /// Procesa el lote en orden. El primer fichero que falla aborta el resto;
    /// los ficheros ya guardados se quedan en disco.
    pub async fn analyze(&self, batch: UploadBatch) -> Result<AnalysisReport, FileFailure> {
        let mut report = AnalysisReport::default();

        for file in &batch.files {
            if file.filename.is_empty() {
                continue;
            }

            match self.analyze_one(&file.filename, &file.bytes, batch.weight_grams).await {
                Ok((found, nutrition)) => report.push(&file.filename, found, nutrition),
                Err(source) => {
                    error!("Failed to process file {}: {}", file.filename, source);
                    return Err(FileFailure { filename: file.filename.clone(), source });
                }
            }
        }

        info!(
            "Lote procesado: {} imagen(es), {:.2} kcal en total",
            report.detections.len(),
            report.total_nutrition.calories
        );
        Ok(report)
    }

    async fn analyze_one(
        &self,
        filename: &str,
        bytes: &[u8],
        weight_grams: f64,
    ) -> DomainResult<(Vec<String>, NutritionSummary)> {
        let path = self.store.save(filename, bytes).await?;
        debug!("File saved at: {}", path.display());

        let detections = self.detector.detect(&path).await?;
        let found = labels(&detections);
        debug!("{}: [{}]", filename, summarize_labels(&found));

        let nutrition = self.nutrition.summarize(found.as_slice(), weight_grams);
        Ok((found, nutrition))
    }

    /// Tabla por 100 g, ordenada por etiqueta.
    pub fn foods(&self) -> Vec<FoodEntry> {
        self.nutrition
            .entries()
            .into_iter()
            .map(|(label, fact)| FoodEntry { label: label.to_string(), per_100g: *fact })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::dto::UploadedFile;
    use crate::domain::{
        detection::{BoundingBox, Detection},
        errors::DomainError,
    };
    use async_trait::async_trait;
    use std::path::{Path, PathBuf};
    use std::sync::Mutex;

    /// Detector falso: las etiquetas son el contenido del fichero separado por comas.
    struct ContentDetector;

    #[async_trait]
    impl DetectorPort for ContentDetector {
        async fn detect(&self, image_path: &Path) -> DomainResult<Vec<Detection>> {
            let text = tokio::fs::read_to_string(image_path).await?;
            if text == "corrupt" {
                return Err(DomainError::Inference("cannot decode image".into()));
            }
            Ok(text
                .split(',')
                .filter(|s| !s.is_empty())
                .map(|label| Detection {
                    bbox: BoundingBox { x: 0, y: 0, width: 1, height: 1 },
                    score: 0.9,
                    class_id: 0,
                    label: label.to_string(),
                })
                .collect())
        }
    }

    #[derive(Default)]
    struct MemoryStore {
        dir: PathBuf,
        saved: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl UploadStorePort for MemoryStore {
        async fn save(&self, filename: &str, bytes: &[u8]) -> DomainResult<PathBuf> {
            let path = self.dir.join(filename);
            tokio::fs::write(&path, bytes).await?;
            self.saved.lock().unwrap().push(filename.to_string());
            Ok(path)
        }
    }

    fn file(name: &str, content: &str) -> UploadedFile {
        UploadedFile { filename: name.to_string(), bytes: content.as_bytes().to_vec() }
    }

    fn service(dir: &Path) -> (AnalysisService, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore { dir: dir.to_path_buf(), ..Default::default() });
        let svc = AnalysisService::new(
            Arc::new(ContentDetector),
            store.clone(),
            Arc::new(NutritionTable::builtin()),
        );
        (svc, store)
    }

    #[tokio::test]
    async fn batch_reports_each_image_and_total() {
        let tmp = tempfile::tempdir().unwrap();
        let (svc, _) = service(tmp.path());
        let batch = UploadBatch {
            weight_grams: 100.0,
            files: vec![file("one.jpg", "apple,banana"), file("two.jpg", "orange,person")],
        };

        let report = svc.analyze(batch).await.unwrap();

        assert_eq!(report.detections[0].detections, vec!["apple", "banana"]);
        assert_eq!(report.detections[1].detections, vec!["orange", "person"]);
        assert_eq!(report.nutrition[0].nutrition.total_calories, 141.0);
        assert_eq!(report.nutrition[1].nutrition.total_calories, 47.0);
        assert_eq!(report.total_nutrition.calories, 188.0);
    }

    #[tokio::test]
    async fn empty_filenames_are_skipped() {
        let tmp = tempfile::tempdir().unwrap();
        let (svc, store) = service(tmp.path());
        let batch = UploadBatch { weight_grams: 50.0, files: vec![file("", "apple"), file("c.jpg", "carrot")] };

        let report = svc.analyze(batch).await.unwrap();

        assert_eq!(report.detections.len(), 1);
        assert_eq!(report.nutrition[0].nutrition.total_calories, 20.5);
        assert_eq!(*store.saved.lock().unwrap(), vec!["c.jpg"]);
    }

    #[tokio::test]
    async fn first_failure_aborts_without_cleanup() {
        let tmp = tempfile::tempdir().unwrap();
        let (svc, store) = service(tmp.path());
        let batch = UploadBatch {
            weight_grams: 100.0,
            files: vec![file("ok.jpg", "apple"), file("bad.jpg", "corrupt"), file("never.jpg", "banana")],
        };

        let err = svc.analyze(batch).await.unwrap_err();

        assert_eq!(err.filename, "bad.jpg");
        assert_eq!(err.to_string(), "Failed to process file bad.jpg: Error de inferencia: cannot decode image");
        assert_eq!(*store.saved.lock().unwrap(), vec!["ok.jpg", "bad.jpg"]);
        assert!(tmp.path().join("ok.jpg").exists());
    }

    #[tokio::test]
    async fn foods_are_sorted_by_label() {
        let tmp = tempfile::tempdir().unwrap();
        let (svc, _) = service(tmp.path());
        let foods = svc.foods();
        assert_eq!(foods.len(), 6);
        assert_eq!(foods[0].label, "apple");
        assert_eq!(foods[5].label, "potato");
    }
}
