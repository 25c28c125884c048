//! Three-dimensional histogram with axis projections
//!
//! Pixel-detector observables are booked as (column, row, value) cubes; most
//! summaries only need the value axis, obtained with [`Histogram3D::project`].
//!
//! Entries out of range on exactly one axis are kept in that axis' flow
//! counters so that a projection onto it reproduces its under/overflow.
//! Entries out of range on two or more axes are dropped.

use serde::{Deserialize, Serialize};

use crate::histogram::{locate, validate_edges, BinPosition, Histogram1D, HistogramError, StatsResult};

/// Histogram axis selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    fn slot(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Histogram3DData {
    x_edges: Vec<f64>,
    y_edges: Vec<f64>,
    z_edges: Vec<f64>,
    counts: Vec<f64>,
    #[serde(default)]
    flows: [[f64; 2]; 3],
}

/// Dense 3D histogram, x-major storage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Histogram3DData", into = "Histogram3DData")]
pub struct Histogram3D {
    edges: [Vec<f64>; 3],
    counts: Vec<f64>,
    /// `[underflow, overflow]` per axis
    flows: [[f64; 2]; 3],
}

impl TryFrom<Histogram3DData> for Histogram3D {
    type Error = HistogramError;

    fn try_from(data: Histogram3DData) -> StatsResult<Self> {
        let mut hist = Histogram3D::new(data.x_edges, data.y_edges, data.z_edges)?;
        if data.counts.len() != hist.counts.len() {
            return Err(HistogramError::InvalidValue(format!(
                "expected {} bin contents, got {}",
                hist.counts.len(),
                data.counts.len()
            )));
        }
        if data.counts.iter().chain(data.flows.iter().flatten()).any(|c| !c.is_finite()) {
            return Err(HistogramError::InvalidValue("non-finite bin content".to_string()));
        }
        hist.counts = data.counts;
        hist.flows = data.flows;
        Ok(hist)
    }
}

impl From<Histogram3D> for Histogram3DData {
    fn from(hist: Histogram3D) -> Self {
        let [x_edges, y_edges, z_edges] = hist.edges;
        Self {
            x_edges,
            y_edges,
            z_edges,
            counts: hist.counts,
            flows: hist.flows,
        }
    }
}

impl Histogram3D {
    /// Build an empty histogram over the given edges
    pub fn new(x_edges: Vec<f64>, y_edges: Vec<f64>, z_edges: Vec<f64>) -> StatsResult<Self> {
        validate_edges(&x_edges)?;
        validate_edges(&y_edges)?;
        validate_edges(&z_edges)?;

        let size = (x_edges.len() - 1) * (y_edges.len() - 1) * (z_edges.len() - 1);
        Ok(Self {
            edges: [x_edges, y_edges, z_edges],
            counts: vec![0.0; size],
            flows: [[0.0; 2]; 3],
        })
    }

    /// Number of bins along `axis`
    pub fn n_bins(&self, axis: Axis) -> usize {
        self.edges[axis.slot()].len() - 1
    }

    pub fn edges(&self, axis: Axis) -> &[f64] {
        &self.edges[axis.slot()]
    }

    pub fn fill(&mut self, x: f64, y: f64, z: f64) {
        self.fill_weighted(x, y, z, 1.0);
    }

    /// Add an entry of weight `w`; NaN coordinates are ignored
    pub fn fill_weighted(&mut self, x: f64, y: f64, z: f64, w: f64) {
        if x.is_nan() || y.is_nan() || z.is_nan() {
            return;
        }
        let positions = [
            locate(&self.edges[0], x),
            locate(&self.edges[1], y),
            locate(&self.edges[2], z),
        ];

        match positions {
            [BinPosition::Bin(ix), BinPosition::Bin(iy), BinPosition::Bin(iz)] => {
                let idx = self.offset(ix, iy, iz);
                self.counts[idx] += w;
            }
            _ => {
                let outside: Vec<(usize, BinPosition)> = positions
                    .iter()
                    .copied()
                    .enumerate()
                    .filter(|(_, p)| p.index().is_none())
                    .collect();
                if let [(axis, position)] = outside.as_slice() {
                    let side = usize::from(*position == BinPosition::Overflow);
                    self.flows[*axis][side] += w;
                }
            }
        }
    }

    /// Content of in-range bin `(ix, iy, iz)`
    pub fn bin_content(&self, ix: usize, iy: usize, iz: usize) -> Option<f64> {
        self.in_range(ix, iy, iz)
            .then(|| self.counts[self.offset(ix, iy, iz)])
    }

    pub fn set_bin_content(&mut self, ix: usize, iy: usize, iz: usize, value: f64) -> StatsResult<()> {
        for (axis, index) in [(Axis::X, ix), (Axis::Y, iy), (Axis::Z, iz)] {
            let n_bins = self.n_bins(axis);
            if index >= n_bins {
                return Err(HistogramError::BinOutOfRange { index, n_bins });
            }
        }
        if !value.is_finite() {
            return Err(HistogramError::InvalidValue(format!(
                "non-finite bin content {}",
                value
            )));
        }
        let idx = self.offset(ix, iy, iz);
        self.counts[idx] = value;
        Ok(())
    }

    /// Sum of in-range contents
    pub fn integral(&self) -> f64 {
        self.counts.iter().sum()
    }

    /// Project onto `axis`, summing over the in-range bins of the other two
    pub fn project(&self, axis: Axis) -> Histogram1D {
        let ny = self.n_bins(Axis::Y);
        let nz = self.n_bins(Axis::Z);
        let mut projected = vec![0.0; self.n_bins(axis)];

        for (idx, &c) in self.counts.iter().enumerate() {
            let bin = match axis {
                Axis::X => idx / (ny * nz),
                Axis::Y => (idx / nz) % ny,
                Axis::Z => idx % nz,
            };
            projected[bin] += c;
        }

        let [underflow, overflow] = self.flows[axis.slot()];
        Histogram1D::from_parts(self.edges[axis.slot()].clone(), projected, underflow, overflow)
    }

    fn in_range(&self, ix: usize, iy: usize, iz: usize) -> bool {
        ix < self.n_bins(Axis::X) && iy < self.n_bins(Axis::Y) && iz < self.n_bins(Axis::Z)
    }

    fn offset(&self, ix: usize, iy: usize, iz: usize) -> usize {
        (ix * self.n_bins(Axis::Y) + iy) * self.n_bins(Axis::Z) + iz
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cube() -> Histogram3D {
        Histogram3D::new(
            vec![0.0, 1.0, 2.0],
            vec![0.0, 1.0, 2.0, 3.0],
            vec![0.0, 10.0, 20.0, 30.0, 40.0],
        )
        .unwrap()
    }

    #[test]
    fn test_project_z_sums_pixels() {
        let mut hist = cube();
        hist.fill(0.5, 0.5, 5.0);
        hist.fill(1.5, 2.5, 5.0);
        hist.fill(1.5, 0.5, 25.0);

        let z = hist.project(Axis::Z);
        assert_eq!(z.counts(), &[2.0, 0.0, 1.0, 0.0]);
        assert_eq!(z.edges(), &[0.0, 10.0, 20.0, 30.0, 40.0]);
        assert!((z.mean().unwrap() - 35.0 / 3.0).abs() < 1e-10);
    }

    #[test]
    fn test_project_x_and_y() {
        let mut hist = cube();
        hist.fill_weighted(1.5, 2.5, 15.0, 3.0);
        hist.fill(0.5, 0.5, 15.0);

        assert_eq!(hist.project(Axis::X).counts(), &[1.0, 3.0]);
        assert_eq!(hist.project(Axis::Y).counts(), &[1.0, 0.0, 3.0]);
    }

    #[test]
    fn test_flow_handling() {
        let mut hist = cube();
        hist.fill(0.5, 0.5, 50.0); // z overflow only
        hist.fill(0.5, 0.5, -1.0); // z underflow only
        hist.fill(5.0, 0.5, 50.0); // x and z out: dropped

        let z = hist.project(Axis::Z);
        assert_eq!(z.integral(), 0.0);
        assert_eq!(z.overflow(), 1.0);
        assert_eq!(z.underflow(), 1.0);

        let x = hist.project(Axis::X);
        assert_eq!(x.overflow(), 0.0);
        assert_eq!(x.underflow(), 0.0);
    }

    #[test]
    fn test_set_and_get_bin_content() {
        let mut hist = cube();
        hist.set_bin_content(1, 2, 3, 7.0).unwrap();
        assert_eq!(hist.bin_content(1, 2, 3), Some(7.0));
        assert_eq!(hist.integral(), 7.0);
        assert!(hist.bin_content(2, 0, 0).is_none());
        assert!(hist.set_bin_content(0, 3, 0, 1.0).is_err());
    }

    #[test]
    fn test_set_bin_content_huge_index() {
        let mut hist = Histogram3D::new(vec![0.0, 1.0], vec![0.0, 1.0, 2.0], vec![0.0, 1.0]).unwrap();
        assert_eq!(
            hist.set_bin_content(usize::MAX, 0, 0, 1.0),
            Err(HistogramError::BinOutOfRange {
                index: usize::MAX,
                n_bins: 1
            })
        );
        assert_eq!(
            hist.set_bin_content(0, 2, 0, 1.0),
            Err(HistogramError::BinOutOfRange { index: 2, n_bins: 2 })
        );
        assert_eq!(hist.bin_content(usize::MAX, usize::MAX, 0), None);
        assert_eq!(hist.integral(), 0.0);
    }

    #[test]
    fn test_serde_checks_count_length() {
        let mut hist = cube();
        hist.fill(0.5, 1.5, 35.0);
        let json = serde_json::to_string(&hist).unwrap();
        let back: Histogram3D = serde_json::from_str(&json).unwrap();
        assert_eq!(back, hist);

        let bad = r#"{"x_edges":[0,1],"y_edges":[0,1],"z_edges":[0,1],"counts":[1,2]}"#;
        assert!(serde_json::from_str::<Histogram3D>(bad).is_err());
    }
}
