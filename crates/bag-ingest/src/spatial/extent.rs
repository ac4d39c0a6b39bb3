//! Versioned bounding extents

use serde::{Deserialize, Serialize};

/// Default extent version
pub const RD_NEW_V1: &str = "rd-new-v1";

/// EPSG code of the Dutch national grid (RD New)
pub const RD_NEW_EPSG: u32 = 28992;

/// Fixed rectangle that Hilbert keys are computed against
///
/// Keys are only comparable between artifacts ordered with the same extent,
/// so every extent carries a version string that ends up in the artifact
/// metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundingExtent {
    pub version: String,
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Default for BoundingExtent {
    fn default() -> Self {
        Self::rd_new_v1()
    }
}

impl BoundingExtent {
    /// The Netherlands in RD New coordinates
    pub fn rd_new_v1() -> Self {
        Self {
            version: RD_NEW_V1.to_string(),
            min_x: 0.0,
            min_y: 280_000.0,
            max_x: 310_000.0,
            max_y: 640_000.0,
        }
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// True when the extent has no usable area or non-finite bounds
    pub fn is_degenerate(&self) -> bool {
        let bounds = [self.min_x, self.min_y, self.max_x, self.max_y];
        bounds.iter().any(|v| !v.is_finite()) || self.width() <= 0.0 || self.height() <= 0.0
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        (self.min_x..=self.max_x).contains(&x) && (self.min_y..=self.max_y).contains(&y)
    }

    /// Map a position into the unit square, clamping positions outside the extent
    pub fn normalize(&self, x: f64, y: f64) -> (f64, f64) {
        let nx = ((x - self.min_x) / self.width()).clamp(0.0, 1.0);
        let ny = ((y - self.min_y) / self.height()).clamp(0.0, 1.0);
        // NaN survives clamp
        (
            if nx.is_nan() { 0.0 } else { nx },
            if ny.is_nan() { 0.0 } else { ny },
        )
    }
}
