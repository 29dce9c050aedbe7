//! Image prefetching for the PDF target.
//!
//! Every image source in a document is fetched before rendering starts.
//! Distinct URLs load concurrently; repeated URLs share a single in-flight
//! load. The result is frozen into an immutable [`AssetCache`] that the
//! renderer reads without any I/O.

mod fetch;
mod raster;

pub use fetch::{Fetcher, HttpFetcher};
pub use raster::{is_svg_source, rasterize_svg};

use crate::detect::{detect_format_from_bytes, ImageFormat};
use crate::error::{Error, Result};
use crate::model::{Block, Document};
use futures::future::try_join_all;
use log::debug;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::OnceCell;

/// A fetched image, ready to embed.
#[derive(Debug, Clone, PartialEq)]
pub struct Asset {
    /// Image bytes; SVG sources hold their PNG rasterization
    pub data: Arc<Vec<u8>>,

    /// Format detected from the bytes
    pub format: Option<ImageFormat>,
}

impl Asset {
    /// Wrap bytes and detect their format.
    pub fn new(data: Vec<u8>) -> Self {
        let format = detect_format_from_bytes(&data);
        Self {
            data: Arc::new(data),
            format,
        }
    }
}

/// Immutable map from image source URL to its asset.
#[derive(Debug, Clone, Default)]
pub struct AssetCache {
    entries: HashMap<String, Asset>,
}

impl AssetCache {
    /// An empty cache, used by markup targets.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Look up the asset for a source URL.
    pub fn get(&self, src: &str) -> Option<&Asset> {
        self.entries.get(src)
    }

    /// Number of distinct sources.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the cache holds no assets.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over `(source, asset)` pairs in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Asset)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl FromIterator<(String, Asset)> for AssetCache {
    fn from_iter<I: IntoIterator<Item = (String, Asset)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Collect every image source depth-first, in encounter order.
///
/// Duplicates are kept.
pub fn collect_image_sources(doc: &Document) -> Vec<String> {
    let mut sources = Vec::new();
    doc.for_each_block(&mut |block| {
        if let Block::Image(image) = block {
            sources.push(image.src.clone());
        }
    });
    sources
}

/// Prefetches the images of one document.
pub struct AssetResolver {
    fetcher: Arc<dyn Fetcher>,
    in_flight: Mutex<HashMap<String, Arc<OnceCell<Asset>>>>,
}

impl AssetResolver {
    /// Create a resolver around a fetcher.
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            fetcher,
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    /// Fetch every image of `doc`.
    ///
    /// Any failure aborts the whole resolution; there is no partial cache.
    pub async fn resolve(&self, doc: &Document) -> Result<AssetCache> {
        let sources = collect_image_sources(doc);
        if sources.is_empty() {
            return Ok(AssetCache::empty());
        }

        let loads = sources.iter().map(|src| async move {
            let asset = self.load(src).await?;
            Ok::<_, Error>((src.clone(), asset))
        });
        let cache: AssetCache = try_join_all(loads).await?.into_iter().collect();
        debug!(
            "Resolved {} image references into {} assets",
            sources.len(),
            cache.len()
        );
        Ok(cache)
    }

    /// Load one source, sharing the in-flight load with concurrent callers.
    async fn load(&self, src: &str) -> Result<Asset> {
        let cell = {
            let mut in_flight = match self.in_flight.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            in_flight.entry(src.to_string()).or_default().clone()
        };
        cell.get_or_try_init(|| self.fetch_asset(src))
            .await
            .cloned()
    }

    async fn fetch_asset(&self, src: &str) -> Result<Asset> {
        let data = self.fetcher.fetch(src).await?;
        if !is_svg_source(src) {
            return Ok(Asset::new(data));
        }

        let url = src.to_string();
        let png = tokio::task::spawn_blocking(move || rasterize_svg(&url, &data))
            .await
            .map_err(|e| Error::internal(format!("rasterization task failed: {}", e)))??;
        debug!("Rasterized {} to PNG ({} bytes)", src, png.len());
        Ok(Asset::new(png))
    }
}
