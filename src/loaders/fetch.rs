use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use anyhow::{Context, Result};

use super::gltf::{load_model_slice, Model};

/// Where a model comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetLocation {
    Remote(String),
    Local(PathBuf),
}

impl AssetLocation {
    /// http(s) URLs are fetched, anything else is a filesystem path
    pub fn parse(location: &str) -> Self {
        let trimmed = location.trim();
        let lower = trimmed.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            AssetLocation::Remote(trimmed.to_string())
        } else {
            AssetLocation::Local(PathBuf::from(trimmed))
        }
    }
}

impl fmt::Display for AssetLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetLocation::Remote(url) => write!(f, "{}", url),
            AssetLocation::Local(path) => write!(f, "{}", path.display()),
        }
    }
}

/// The two models the sketch loads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    Fish,
    Landscape,
}

impl AssetKind {
    pub const ALL: [AssetKind; 2] = [AssetKind::Fish, AssetKind::Landscape];

    pub fn name(&self) -> &'static str {
        match self {
            AssetKind::Fish => "fish",
            AssetKind::Landscape => "landscape",
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

pub type AssetOutcome = Result<Model>;

/// A finished load, posted back to the event loop
#[derive(Debug)]
pub struct AssetEvent {
    pub kind: AssetKind,
    pub location: AssetLocation,
    pub outcome: AssetOutcome,
}

/// Raw bytes for a location
pub trait AssetSource: Send + Sync {
    fn fetch(&self, location: &AssetLocation) -> Result<Vec<u8>>;
}

/// Blocking HTTP with a timeout for URLs, plain reads for paths
pub struct DefaultSource {
    client: reqwest::blocking::Client,
}

impl DefaultSource {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client })
    }
}

impl AssetSource for DefaultSource {
    fn fetch(&self, location: &AssetLocation) -> Result<Vec<u8>> {
        match location {
            AssetLocation::Remote(url) => {
                let response = self
                    .client
                    .get(url)
                    .send()
                    .with_context(|| format!("Request to {} failed", url))?
                    .error_for_status()
                    .with_context(|| format!("Server refused {}", url))?;
                let bytes = response
                    .bytes()
                    .with_context(|| format!("Failed to read body of {}", url))?;
                Ok(bytes.to_vec())
            }
            AssetLocation::Local(path) => {
                std::fs::read(path).with_context(|| format!("Failed to read {:?}", path))
            }
        }
    }
}

/// Fetch then decode, on the calling thread
pub fn fetch_model(source: &dyn AssetSource, location: &AssetLocation) -> AssetOutcome {
    let bytes = source.fetch(location)?;
    log::debug!("fetched {} bytes from {}", bytes.len(), location);
    load_model_slice(&bytes).with_context(|| format!("Failed to decode model from {}", location))
}

/// Runs each load on its own worker thread and hands the outcome to a callback
#[derive(Clone)]
pub struct AssetLoader {
    source: Arc<dyn AssetSource>,
}

impl AssetLoader {
    pub fn new(source: Arc<dyn AssetSource>) -> Self {
        Self { source }
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        Ok(Self::new(Arc::new(DefaultSource::new(timeout)?)))
    }

    /// Start a load; `deliver` runs on the worker once it succeeds or fails
    pub fn load<F>(&self, kind: AssetKind, location: AssetLocation, deliver: F) -> Result<JoinHandle<()>>
    where
        F: FnOnce(AssetEvent) + Send + 'static,
    {
        let source = Arc::clone(&self.source);
        log::info!("loading {} from {}", kind, location);

        std::thread::Builder::new()
            .name(format!("fetch-{}", kind))
            .spawn(move || {
                let outcome = fetch_model(source.as_ref(), &location);
                deliver(AssetEvent {
                    kind,
                    location,
                    outcome,
                });
            })
            .with_context(|| format!("Failed to spawn loader thread for {}", kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    const FIXTURE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/two_nodes.gltf");

    struct Failing;

    impl AssetSource for Failing {
        fn fetch(&self, location: &AssetLocation) -> Result<Vec<u8>> {
            anyhow::bail!("offline: {}", location)
        }
    }

    #[test]
    fn parses_locations() {
        assert_eq!(
            AssetLocation::parse("https://assets.codepen.io/5946/fish.glb"),
            AssetLocation::Remote("https://assets.codepen.io/5946/fish.glb".to_string())
        );
        assert_eq!(
            AssetLocation::parse("HTTP://example.com/a.glb"),
            AssetLocation::Remote("HTTP://example.com/a.glb".to_string())
        );
        assert_eq!(
            AssetLocation::parse("assets/fish.glb"),
            AssetLocation::Local(PathBuf::from("assets/fish.glb"))
        );
    }

    #[test]
    fn loads_local_file_on_worker() {
        let loader = AssetLoader::with_timeout(Duration::from_secs(1)).unwrap();
        let (tx, rx) = mpsc::channel();

        let handle = loader
            .load(AssetKind::Landscape, AssetLocation::parse(FIXTURE), move |event| {
                let _ = tx.send(event);
            })
            .unwrap();
        handle.join().unwrap();

        let event = rx.recv().unwrap();
        assert_eq!(event.kind, AssetKind::Landscape);
        assert_eq!(event.outcome.unwrap().mesh_count(), 2);
    }

    #[test]
    fn failures_are_delivered_not_raised() {
        let loader = AssetLoader::new(Arc::new(Failing));
        let (tx, rx) = mpsc::channel();

        loader
            .load(AssetKind::Fish, AssetLocation::parse("https://example.invalid/fish.glb"), move |event| {
                let _ = tx.send(event);
            })
            .unwrap()
            .join()
            .unwrap();

        let event = rx.recv().unwrap();
        assert_eq!(event.kind, AssetKind::Fish);
        let err = event.outcome.unwrap_err();
        assert!(format!("{:#}", err).contains("offline"));
    }

    #[test]
    fn missing_file_is_an_error() {
        let source = DefaultSource::new(Duration::from_secs(1)).unwrap();
        assert!(fetch_model(&source, &AssetLocation::parse("/no/such/fish.glb")).is_err());
    }
}
