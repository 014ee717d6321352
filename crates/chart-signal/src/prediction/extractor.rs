use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::domain::{ChartFeatures, ChartImage, Momentum, Pattern, Trend, Zone};

/// Source of chart features for an uploaded screenshot.
pub trait FeatureExtractor: Send + Sync {
    fn extract(&self, image: &ChartImage) -> ChartFeatures;
}

/// Stand-in for vision analysis: every field is drawn uniformly and independently.
pub struct RandomFeatureExtractor {
    rng: Mutex<StdRng>,
}

impl RandomFeatureExtractor {
    pub fn from_entropy() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Same seed, same sequence of features.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl FeatureExtractor for RandomFeatureExtractor {
    fn extract(&self, _image: &ChartImage) -> ChartFeatures {
        let mut rng = self.rng.lock().expect("feature rng mutex poisoned");

        ChartFeatures {
            pattern: Pattern::ALL[rng.gen_range(0..Pattern::ALL.len())],
            trend: Trend::ALL[rng.gen_range(0..Trend::ALL.len())],
            zone: Zone::ALL[rng.gen_range(0..Zone::ALL.len())],
            momentum: Momentum::ALL[rng.gen_range(0..Momentum::ALL.len())],
        }
    }
}

/// Always reports the same features.
#[derive(Debug, Clone, Copy)]
pub struct FixedFeatureExtractor(pub ChartFeatures);

impl FeatureExtractor for FixedFeatureExtractor {
    fn extract(&self, _image: &ChartImage) -> ChartFeatures {
        self.0
    }
}
