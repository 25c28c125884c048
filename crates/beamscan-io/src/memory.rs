//! In-memory histogram source and archive

use std::collections::{BTreeMap, HashMap};

use beamscan_stats::{Histogram1D, Histogram3D};

use crate::reader::{BoxedSource, HistogramSource, IoError, IoResult, RunArchive};

#[derive(Debug, Clone)]
enum Stored {
    OneD(Histogram1D),
    ThreeD(Histogram3D),
}

/// Histograms held in a map, keyed by name
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    label: String,
    histograms: HashMap<String, Stored>,
}

impl MemorySource {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            histograms: HashMap::new(),
        }
    }

    /// Store a 1D histogram, replacing any histogram of the same name
    pub fn insert_1d(&mut self, name: impl Into<String>, hist: Histogram1D) {
        self.histograms.insert(name.into(), Stored::OneD(hist));
    }

    /// Store a 3D histogram, replacing any histogram of the same name
    pub fn insert_3d(&mut self, name: impl Into<String>, hist: Histogram3D) {
        self.histograms.insert(name.into(), Stored::ThreeD(hist));
    }

    pub fn len(&self) -> usize {
        self.histograms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.histograms.is_empty()
    }
}

impl HistogramSource for MemorySource {
    fn histogram_1d(&self, name: &str) -> IoResult<Histogram1D> {
        match self.histograms.get(name) {
            Some(Stored::OneD(h)) => Ok(h.clone()),
            Some(Stored::ThreeD(_)) => Err(IoError::WrongDimension {
                name: name.to_string(),
                expected: "1D",
            }),
            None => Err(IoError::not_found(name, self.location())),
        }
    }

    fn histogram_3d(&self, name: &str) -> IoResult<Histogram3D> {
        match self.histograms.get(name) {
            Some(Stored::ThreeD(h)) => Ok(h.clone()),
            Some(Stored::OneD(_)) => Err(IoError::WrongDimension {
                name: name.to_string(),
                expected: "3D",
            }),
            None => Err(IoError::not_found(name, self.location())),
        }
    }

    fn contains(&self, name: &str) -> bool {
        self.histograms.contains_key(name)
    }

    fn location(&self) -> String {
        format!("memory source '{}'", self.label)
    }
}

/// Runs held in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryArchive {
    runs: BTreeMap<u32, MemorySource>,
}

impl MemoryArchive {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_run(&mut self, run: u32, source: MemorySource) {
        self.runs.insert(run, source);
    }

    /// Mutable access to a run, created empty if missing
    pub fn run_mut(&mut self, run: u32) -> &mut MemorySource {
        self.runs
            .entry(run)
            .or_insert_with(|| MemorySource::new(format!("run {}", run)))
    }

    pub fn runs(&self) -> impl Iterator<Item = u32> + '_ {
        self.runs.keys().copied()
    }
}

impl RunArchive for MemoryArchive {
    fn open_run(&self, run: u32) -> IoResult<BoxedSource> {
        self.runs
            .get(&run)
            .map(|source| Box::new(source.clone()) as BoxedSource)
            .ok_or(IoError::RunNotFound(run))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_source_dimensions() {
        let mut source = MemorySource::new("test");
        source.insert_1d("h1", Histogram1D::uniform(3, 0.0, 3.0).unwrap());
        source.insert_3d(
            "h3",
            Histogram3D::new(vec![0.0, 1.0], vec![0.0, 1.0], vec![0.0, 1.0]).unwrap(),
        );

        assert_eq!(source.len(), 2);
        assert!(source.contains("h1"));
        assert!(source.histogram_1d("h1").is_ok());
        assert!(source.histogram_3d("h3").is_ok());
        assert!(matches!(
            source.histogram_3d("h1"),
            Err(IoError::WrongDimension { .. })
        ));
        assert!(matches!(
            source.histogram_1d("missing"),
            Err(IoError::HistogramNotFound { .. })
        ));
    }

    #[test]
    fn test_memory_archive() {
        let mut archive = MemoryArchive::new();
        archive
            .run_mut(322)
            .insert_1d("h", Histogram1D::uniform(1, 0.0, 1.0).unwrap());

        let source = archive.open_run(322).unwrap();
        assert!(source.contains("h"));
        assert_eq!(source.location(), "memory source 'run 322'");
        assert!(matches!(archive.open_run(1), Err(IoError::RunNotFound(1))));
        assert_eq!(archive.runs().collect::<Vec<_>>(), vec![322]);
    }
}
