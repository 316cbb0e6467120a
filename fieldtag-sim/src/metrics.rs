/// Localization quality metrics: match located tags to ground truth and
/// measure positional error on the field.
use fieldtag::locate::TagPosition;
use serde::{Deserialize, Serialize};

use crate::scene::PlacedTag;

/// One ground-truth tag matched (or not) against a located position.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionMatch {
    pub id: i32,
    /// Ground-truth field position, mm.
    pub truth: [f64; 2],
    /// Located field position, if the tag was localized.
    pub located: Option<[f64; 2]>,
    /// Euclidean position error, mm.
    pub error_mm: Option<f64>,
}

/// Aggregate result for one scene.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalResult {
    pub matches: Vec<PositionMatch>,
    /// Fraction of ground-truth tags that were localized (0.0 - 1.0).
    pub localization_rate: f64,
    pub mean_error_mm: f64,
    pub max_error_mm: f64,
    pub rmse_mm: f64,
    /// Located tags with no ground-truth counterpart.
    pub spurious: usize,
}

/// Match positions to ground truth by tag id and compute error statistics.
pub fn evaluate(ground_truth: &[PlacedTag], positions: &[TagPosition]) -> EvalResult {
    let mut matches = Vec::new();
    let mut used = vec![false; positions.len()];

    for gt in ground_truth {
        let found = positions
            .iter()
            .enumerate()
            .find(|(i, p)| !used[*i] && p.id == gt.id);

        match found {
            Some((idx, pos)) => {
                used[idx] = true;
                let dx = pos.point.x - gt.position[0];
                let dy = pos.point.y - gt.position[1];
                matches.push(PositionMatch {
                    id: gt.id,
                    truth: gt.position,
                    located: Some([pos.point.x, pos.point.y]),
                    error_mm: Some((dx * dx + dy * dy).sqrt()),
                });
            }
            None => matches.push(PositionMatch {
                id: gt.id,
                truth: gt.position,
                located: None,
                error_mm: None,
            }),
        }
    }

    let spurious = used.iter().filter(|u| !**u).count();

    let errors: Vec<f64> = matches.iter().filter_map(|m| m.error_mm).collect();
    let localization_rate = if ground_truth.is_empty() {
        1.0
    } else {
        errors.len() as f64 / ground_truth.len() as f64
    };

    let (mean, max, rmse) = if errors.is_empty() {
        (0.0, 0.0, 0.0)
    } else {
        let mean = errors.iter().sum::<f64>() / errors.len() as f64;
        let max = errors.iter().cloned().fold(0.0, f64::max);
        let rmse = (errors.iter().map(|e| e * e).sum::<f64>() / errors.len() as f64).sqrt();
        (mean, max, rmse)
    };

    EvalResult {
        matches,
        localization_rate,
        mean_error_mm: mean,
        max_error_mm: max,
        rmse_mm: rmse,
        spurious,
    }
}
