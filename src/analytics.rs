//! Client-side species analytics over analysis results
//!
//! Everything here is pure and works on whatever results the caller holds,
//! typically the cached history from [`crate::Dashboard::view`].

use crate::types::{AnalysisResult, Statistics};
use crate::utils::truncate_chars;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use utoipa::ToSchema;

/// Longest file label shown in a frequency series
const SERIES_LABEL_CHARS: usize = 15;

/// Which results a history view shows
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum SpeciesFilter {
    /// Every result
    #[default]
    All,
    /// Results with a detection of this species
    Species(String),
}

impl SpeciesFilter {
    /// Parse a query value; `None`, empty, or `"all"` select everything
    pub fn from_query(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            None | Some("") | Some("all") => SpeciesFilter::All,
            Some(species) => SpeciesFilter::Species(species.to_string()),
        }
    }
}

/// Distinct species names across all detections, in first-seen order
pub fn unique_species(results: &[AnalysisResult]) -> Vec<String> {
    let mut seen = HashSet::new();
    results
        .iter()
        .flat_map(|r| r.species_detected.iter())
        .map(|d| d.species.as_str())
        .filter(|s| !s.trim().is_empty())
        .filter(|s| seen.insert(*s))
        .map(str::to_string)
        .collect()
}

/// Results matching `filter`, order preserved
pub fn filter_by_species<'a>(
    results: &'a [AnalysisResult],
    filter: &SpeciesFilter,
) -> Vec<&'a AnalysisResult> {
    match filter {
        SpeciesFilter::All => results.iter().collect(),
        SpeciesFilter::Species(species) => results
            .iter()
            .filter(|r| r.species_detected.iter().any(|d| &d.species == species))
            .collect(),
    }
}

/// Call frequencies of one result, for a per-species series chart
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct FrequencyPoint {
    /// File label (first 15 characters of the filename)
    pub name: String,
    /// Peak frequency (kHz)
    pub peak: f64,
    /// Start frequency (kHz)
    pub start: f64,
    /// End frequency (kHz)
    pub end: f64,
}

/// One axis of the species radar chart
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RadarMetric {
    /// Axis label
    pub metric: String,
    /// Plotted value
    pub value: f64,
    /// Axis maximum
    pub full_mark: f64,
}

impl RadarMetric {
    fn new(metric: &str, value: f64, full_mark: f64) -> Self {
        Self {
            metric: metric.to_string(),
            value,
            full_mark,
        }
    }
}

/// Acoustic summary of one species
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SpeciesProfile {
    /// Species name
    pub species: String,
    /// Number of results where it is the top detection
    pub count: usize,
    /// Mean peak frequency (kHz)
    pub avg_peak: f64,
    /// Mean bandwidth (kHz)
    pub avg_bandwidth: f64,
    /// Mean pulse duration (ms)
    pub avg_duration: f64,
    /// Mean start frequency (kHz)
    pub avg_start: f64,
    /// Mean end frequency (kHz)
    pub avg_end: f64,
    /// Per-result frequencies
    pub frequency_series: Vec<FrequencyPoint>,
    /// Radar chart axes
    pub radar: Vec<RadarMetric>,
}

/// Profile of `species` over the results where it is the top detection
///
/// Returns `None` when no result has it as top detection.
pub fn species_profile(results: &[AnalysisResult], species: &str) -> Option<SpeciesProfile> {
    let matching: Vec<&AnalysisResult> = results
        .iter()
        .filter(|r| r.top_species().is_some_and(|top| top.species == species))
        .collect();

    if matching.is_empty() {
        return None;
    }

    let count = matching.len();
    let mean = |field: fn(&AnalysisResult) -> f64| -> f64 {
        matching.iter().map(|r| field(r)).sum::<f64>() / count as f64
    };

    let avg_peak = mean(|r| r.call_parameters.peak_frequency);
    let avg_bandwidth = mean(|r| r.call_parameters.bandwidth);
    let avg_duration = mean(|r| r.call_parameters.pulse_duration);
    let avg_start = mean(|r| r.call_parameters.start_frequency);
    let avg_end = mean(|r| r.call_parameters.end_frequency);

    let frequency_series = matching
        .iter()
        .map(|r| FrequencyPoint {
            name: truncate_chars(&r.original_filename, SERIES_LABEL_CHARS),
            peak: r.call_parameters.peak_frequency,
            start: r.call_parameters.start_frequency,
            end: r.call_parameters.end_frequency,
        })
        .collect();

    // Duration is in ms, scaled x10 to share the chart with kHz axes
    let radar = vec![
        RadarMetric::new("Peak Freq", avg_peak, 150.0),
        RadarMetric::new("Bandwidth", avg_bandwidth, 100.0),
        RadarMetric::new("Duration", avg_duration * 10.0, 100.0),
        RadarMetric::new("Start Freq", avg_start, 150.0),
        RadarMetric::new("End Freq", avg_end, 150.0),
    ];

    Some(SpeciesProfile {
        species: species.to_string(),
        count,
        avg_peak,
        avg_bandwidth,
        avg_duration,
        avg_start,
        avg_end,
        frequency_series,
        radar,
    })
}

/// Format a confidence as a percentage with one decimal
///
/// Values above 1 are taken as percentages already; non-finite values
/// format as `0.0%`.
pub fn format_confidence(value: f64) -> String {
    let percent = if value > 1.0 { value } else { value * 100.0 };
    let percent = if percent.is_finite() { percent } else { 0.0 };
    format!("{percent:.1}%")
}

/// One slice of the top-species chart
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ChartSlice {
    /// Species name
    pub name: String,
    /// Detection count
    pub value: u64,
}

/// The first `limit` entries of the backend's top-species ranking
pub fn top_species_chart(statistics: &Statistics, limit: usize) -> Vec<ChartSlice> {
    statistics
        .top_species
        .iter()
        .take(limit)
        .map(|s| ChartSlice {
            name: s.species.clone(),
            value: s.count,
        })
        .collect()
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SpeciesCount;
    use serde_json::json;

    fn sample_results() -> Vec<AnalysisResult> {
        serde_json::from_value(json!([
            {
                "file_id": "f-1",
                "original_filename": "Pipistrellus_night_01.wav",
                "species_detected": [
                    {"species": "Pipistrellus pipistrellus", "confidence": 0.9},
                    {"species": "Pipistrellus pygmaeus", "confidence": 0.05}
                ],
                "call_parameters": {
                    "peak_frequency": 46.0, "bandwidth": 30.0, "pulse_duration": 5.0,
                    "start_frequency": 70.0, "end_frequency": 40.0
                }
            },
            {
                "file_id": "f-2",
                "original_filename": "short.wav",
                "species_detected": [{"species": "Pipistrellus pipistrellus", "confidence": 0.8}],
                "call_parameters": {
                    "peak_frequency": 44.0, "bandwidth": 20.0, "pulse_duration": 7.0,
                    "start_frequency": 60.0, "end_frequency": 42.0
                }
            },
            {
                "file_id": "f-3",
                "original_filename": "noctule.wav",
                "species_detected": [
                    {"species": "Nyctalus noctula", "confidence": 0.7},
                    {"species": "", "confidence": 0.1}
                ]
            },
            {"file_id": "f-4", "original_filename": "silence.wav"}
        ]))
        .unwrap()
    }

    #[test]
    fn test_unique_species_first_seen_order() {
        assert_eq!(
            unique_species(&sample_results()),
            vec![
                "Pipistrellus pipistrellus",
                "Pipistrellus pygmaeus",
                "Nyctalus noctula",
            ]
        );
    }

    #[test]
    fn test_filter_by_species_matches_any_detection() {
        let results = sample_results();

        let all = filter_by_species(&results, &SpeciesFilter::All);
        assert_eq!(all.len(), 4);

        let pygmaeus = filter_by_species(
            &results,
            &SpeciesFilter::Species("Pipistrellus pygmaeus".to_string()),
        );
        assert_eq!(pygmaeus.len(), 1);
        assert_eq!(pygmaeus[0].file_id, "f-1");
    }

    #[test]
    fn test_filter_from_query() {
        assert_eq!(SpeciesFilter::from_query(None), SpeciesFilter::All);
        assert_eq!(SpeciesFilter::from_query(Some("all")), SpeciesFilter::All);
        assert_eq!(SpeciesFilter::from_query(Some(" ")), SpeciesFilter::All);
        assert_eq!(
            SpeciesFilter::from_query(Some("Myotis nattereri")),
            SpeciesFilter::Species("Myotis nattereri".to_string())
        );
    }

    #[test]
    fn test_species_profile_averages_top_detections_only() {
        let profile = species_profile(&sample_results(), "Pipistrellus pipistrellus").unwrap();

        assert_eq!(profile.count, 2);
        assert_eq!(profile.avg_peak, 45.0);
        assert_eq!(profile.avg_bandwidth, 25.0);
        assert_eq!(profile.avg_duration, 6.0);
        assert_eq!(profile.avg_start, 65.0);
        assert_eq!(profile.avg_end, 41.0);

        assert_eq!(profile.frequency_series[0].name, "Pipistrellus_ni");
        assert_eq!(profile.frequency_series[1].name, "short.wav");

        let duration = profile.radar.iter().find(|m| m.metric == "Duration").unwrap();
        assert_eq!(duration.value, 60.0);
        assert_eq!(duration.full_mark, 100.0);
        let full_marks: Vec<f64> = profile.radar.iter().map(|m| m.full_mark).collect();
        assert_eq!(full_marks, vec![150.0, 100.0, 100.0, 150.0, 150.0]);
    }

    #[test]
    fn test_species_profile_ignores_secondary_detections() {
        // Only ever a runner-up detection
        assert!(species_profile(&sample_results(), "Pipistrellus pygmaeus").is_none());
        assert!(species_profile(&sample_results(), "Myotis myotis").is_none());
    }

    #[test]
    fn test_format_confidence() {
        assert_eq!(format_confidence(0.934), "93.4%");
        assert_eq!(format_confidence(87.26), "87.3%");
        assert_eq!(format_confidence(1.0), "100.0%");
        assert_eq!(format_confidence(0.0), "0.0%");
        assert_eq!(format_confidence(f64::NAN), "0.0%");
    }

    #[test]
    fn test_top_species_chart_respects_limit() {
        let stats = Statistics {
            top_species: vec![
                SpeciesCount {
                    species: "A".to_string(),
                    count: 9,
                },
                SpeciesCount {
                    species: "B".to_string(),
                    count: 4,
                },
                SpeciesCount {
                    species: "C".to_string(),
                    count: 1,
                },
            ],
            ..Statistics::default()
        };

        let chart = top_species_chart(&stats, 2);
        assert_eq!(chart.len(), 2);
        assert_eq!(chart[1].name, "B");
        assert_eq!(chart[1].value, 4);
        assert!(top_species_chart(&Statistics::default(), 5).is_empty());
    }
}
