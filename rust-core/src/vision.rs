//! Camera-based path analysis.
//!
//! `PathAnalyzer` is the boundary to an image-understanding service. Until
//! a real service is wired in, `CannedPathAnalyzer` answers every photo
//! with a fixed assessment after a short delay.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::catalog::TrekPath;
use crate::geo::Coordinate;

/// What the analyzer saw in a photo of the trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualAnalysis {
    pub path_direction: String,
    pub terrain_type: String,
    pub obstacles: Vec<String>,
    pub landmarks: Vec<String>,
    pub safety_alerts: Vec<String>,
    pub recommendations: Vec<String>,
}

impl VisualAnalysis {
    /// Stand-in result when analysis failed; points the hiker back to GPS.
    pub fn unavailable() -> Self {
        Self {
            path_direction: "Unable to determine path direction".into(),
            terrain_type: "Unknown terrain".into(),
            obstacles: vec!["Analysis failed - proceed with caution".into()],
            landmarks: Vec::new(),
            safety_alerts: vec!["Visual analysis unavailable - rely on GPS navigation".into()],
            recommendations: vec!["Use GPS navigation and stay on marked trails".into()],
        }
    }
}

/// Why a visual analysis produced no result.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("Empty image payload")]
    EmptyImage,

    #[error("Analysis timed out after {0:?}")]
    Timeout(Duration),

    #[error("Analysis service error: {0}")]
    Service(String),
}

/// A photo plus the context it was taken in.
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    /// Encoded image bytes, passed through to the service untouched.
    pub image: Vec<u8>,
    pub location: Coordinate,
    pub trek: Arc<TrekPath>,
}

/// Client for an image-understanding service.
pub trait PathAnalyzer: Send + Sync {
    /// Assess one photo of the trail ahead.
    fn analyze(
        &self,
        request: AnalysisRequest,
    ) -> impl Future<Output = Result<VisualAnalysis, AnalysisError>> + Send;
}

/// Placeholder analyzer returning a fixed rocky-trail assessment.
#[derive(Debug, Clone)]
pub struct CannedPathAnalyzer {
    delay: Duration,
}

impl CannedPathAnalyzer {
    /// Analyzer answering after `delay`.
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

impl Default for CannedPathAnalyzer {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}

impl PathAnalyzer for CannedPathAnalyzer {
    fn analyze(
        &self,
        request: AnalysisRequest,
    ) -> impl Future<Output = Result<VisualAnalysis, AnalysisError>> + Send {
        let delay = self.delay;
        async move {
            if request.image.is_empty() {
                return Err(AnalysisError::EmptyImage);
            }

            tokio::time::sleep(delay).await;

            Ok(VisualAnalysis {
                path_direction: "Continue straight ahead on the marked trail".into(),
                terrain_type: "Rocky mountain path".into(),
                obstacles: vec!["Small rocks on path".into(), "Steep incline ahead".into()],
                landmarks: vec![
                    "Mountain peak visible to the right".into(),
                    "Stream crossing ahead".into(),
                ],
                safety_alerts: vec!["Watch for loose rocks".into(), "Stay on marked trail".into()],
                recommendations: vec![
                    "Use trekking poles for stability".into(),
                    "Take regular breaks on steep sections".into(),
                ],
            })
        }
    }
}

/// Run an analysis with an upper time bound.
pub async fn analyze_with_timeout<A: PathAnalyzer>(
    analyzer: &A,
    request: AnalysisRequest,
    timeout: Duration,
) -> Result<VisualAnalysis, AnalysisError> {
    match tokio::time::timeout(timeout, analyzer.analyze(request)).await {
        Ok(result) => result,
        Err(_) => Err(AnalysisError::Timeout(timeout)),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::catalog::TrekCatalog;

    /// Analyzer that always fails.
    pub(crate) struct BrokenAnalyzer;

    impl PathAnalyzer for BrokenAnalyzer {
        fn analyze(
            &self,
            _request: AnalysisRequest,
        ) -> impl Future<Output = Result<VisualAnalysis, AnalysisError>> + Send {
            async { Err(AnalysisError::Service("connection refused".into())) }
        }
    }

    pub(crate) fn request(image: &[u8]) -> AnalysisRequest {
        AnalysisRequest {
            image: image.to_vec(),
            location: Coordinate::new(30.0668, 78.9629),
            trek: TrekCatalog::builtin().require("himalayan-ascent").unwrap(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn canned_analysis_after_delay() {
        let analyzer = CannedPathAnalyzer::default();
        let start = tokio::time::Instant::now();

        let analysis = analyzer.analyze(request(b"jpeg")).await.unwrap();

        assert!(start.elapsed() >= Duration::from_secs(1));
        assert_eq!(analysis.terrain_type, "Rocky mountain path");
        assert_eq!(analysis.safety_alerts.len(), 2);
    }

    #[tokio::test]
    async fn empty_image_is_rejected() {
        let analyzer = CannedPathAnalyzer::new(Duration::ZERO);
        let result = analyzer.analyze(request(b"")).await;
        assert!(matches!(result, Err(AnalysisError::EmptyImage)));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_analysis_times_out() {
        let analyzer = CannedPathAnalyzer::new(Duration::from_secs(60));
        let result =
            analyze_with_timeout(&analyzer, request(b"jpeg"), Duration::from_secs(15)).await;
        assert!(matches!(result, Err(AnalysisError::Timeout(d)) if d == Duration::from_secs(15)));
    }

    #[tokio::test]
    async fn service_errors_pass_through() {
        let result =
            analyze_with_timeout(&BrokenAnalyzer, request(b"jpeg"), Duration::from_secs(15)).await;
        assert!(matches!(result, Err(AnalysisError::Service(_))));
    }

    #[test]
    fn unavailable_analysis_points_to_gps() {
        let fallback = VisualAnalysis::unavailable();
        assert_eq!(
            fallback.safety_alerts,
            ["Visual analysis unavailable - rely on GPS navigation"]
        );

        let value = serde_json::to_value(&fallback).unwrap();
        assert!(value.get("pathDirection").is_some());
        assert!(value.get("safetyAlerts").is_some());
    }
}
