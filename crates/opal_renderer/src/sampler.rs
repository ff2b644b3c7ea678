//! Stratified (jittered) sampling on the unit square.

use glam::DVec2;
use rand::{Rng, RngCore};

use crate::error::SceneError;

/// A single sample point in `[0,1)^2`.
pub type Sample = DVec2;

/// Generates jittered samples on the unit square.
///
/// The unit square is divided into a `side x side` grid and one uniform
/// sample is drawn inside each cell, guaranteeing coverage of the square
/// while keeping the randomness that breaks up banding.
#[derive(Debug, Default)]
pub struct JitteredSampler {
    samples: Vec<Sample>,
    cursor: usize,
}

impl JitteredSampler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generate `count` samples, discarding any previous set.
    ///
    /// `count` must be a positive perfect square so the grid is exact.
    pub fn generate(&mut self, count: usize, rng: &mut dyn RngCore) -> Result<(), SceneError> {
        let side = (count as f64).sqrt() as usize;
        if count == 0 || side * side != count {
            return Err(SceneError::BadSampleCount(count));
        }
        self.generate_grid(side, rng);
        Ok(())
    }

    /// Generate one sample per cell of a `side x side` grid. Infallible
    /// interior of [`generate`], for callers that already validated the
    /// count and hold the square root.
    pub fn generate_grid(&mut self, side: usize, rng: &mut dyn RngCore) {
        self.samples.clear();
        self.cursor = 0;

        let cell = 1.0 / side as f64;
        for grid_y in 0..side {
            for grid_x in 0..side {
                let x = (rng.gen::<f64>() + grid_x as f64) * cell;
                let y = (rng.gen::<f64>() + grid_y as f64) * cell;
                self.samples.push(Sample::new(x, y));
            }
        }
    }

    /// The generated sample list.
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// The sample under the cursor. Panics if called before [`generate`].
    pub fn current(&self) -> Sample {
        self.assert_generated();
        self.samples[self.cursor % self.samples.len()]
    }

    /// Step the cursor to the next sample, wrapping past the end of the
    /// list. Panics if called before [`generate`].
    pub fn advance(&mut self) {
        self.assert_generated();
        self.cursor += 1;
    }

    fn assert_generated(&self) {
        assert!(
            !self.samples.is_empty(),
            "sampler used before generating samples"
        );
    }
}
