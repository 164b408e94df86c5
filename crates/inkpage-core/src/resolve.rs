//! Two-phase creation of content that needs out-of-band work.
//!
//! Image decoding and link-metadata lookup happen outside the core. A
//! [`ContentResolver`] produces a value asynchronously; the host then hands that value
//! to [`Editor::commit_image`](crate::Editor::commit_image) or
//! [`Editor::commit_bookmark`](crate::Editor::commit_bookmark), which mutate the document
//! synchronously. Nothing is mutated before resolution, and a failed resolution leaves
//! the document untouched.

use crate::assets::Asset;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::RwLock;
use thiserror::Error;

/// Resolution errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("Fetch failed: {0}")]
    Fetch(String),
    #[error("Decode failed: {0}")]
    Decode(String),
    #[error("Unsupported content: {0}")]
    Unsupported(String),
}

pub type ResolveResult<T> = Result<T, ResolveError>;

/// Boxed future for async operations (compatible with WASM).
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// A decoded image ready to be committed.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedImage {
    pub asset: Asset,
    /// Intrinsic size in pixels.
    pub width: f64,
    pub height: f64,
}

/// Metadata of a link preview.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookmarkMetadata {
    pub title: String,
    pub description: String,
    /// Preview image, stored as an asset when the bookmark is committed.
    pub image: Option<Asset>,
}

/// Out-of-band content lookup.
#[cfg(not(target_arch = "wasm32"))]
pub trait ContentResolver: Send + Sync {
    /// Decode image bytes enough to learn the intrinsic size.
    fn resolve_image(&self, bytes: &[u8], mime: &str) -> BoxFuture<'_, ResolveResult<ResolvedImage>>;

    /// Fetch the preview metadata of a link.
    fn resolve_bookmark(&self, url: &str) -> BoxFuture<'_, ResolveResult<BookmarkMetadata>>;
}

/// Out-of-band content lookup (WASM version without Send + Sync).
#[cfg(target_arch = "wasm32")]
pub trait ContentResolver {
    /// Decode image bytes enough to learn the intrinsic size.
    fn resolve_image(&self, bytes: &[u8], mime: &str) -> BoxFuture<'_, ResolveResult<ResolvedImage>>;

    /// Fetch the preview metadata of a link.
    fn resolve_bookmark(&self, url: &str) -> BoxFuture<'_, ResolveResult<BookmarkMetadata>>;
}

/// Resolver backed by in-memory tables, for tests and offline hosts.
///
/// Images of any `image/*` type resolve to a size registered per MIME type.
#[derive(Default)]
pub struct MemoryResolver {
    image_sizes: RwLock<HashMap<String, (f64, f64)>>,
    bookmarks: RwLock<HashMap<String, BookmarkMetadata>>,
}

impl MemoryResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_image_size(&self, mime: &str, width: f64, height: f64) {
        if let Ok(mut sizes) = self.image_sizes.write() {
            sizes.insert(mime.to_string(), (width, height));
        }
    }

    pub fn insert_bookmark(&self, url: &str, metadata: BookmarkMetadata) {
        if let Ok(mut bookmarks) = self.bookmarks.write() {
            bookmarks.insert(url.to_string(), metadata);
        }
    }
}

impl ContentResolver for MemoryResolver {
    fn resolve_image(&self, bytes: &[u8], mime: &str) -> BoxFuture<'_, ResolveResult<ResolvedImage>> {
        let asset = Asset::from_bytes(mime, bytes);
        let mime = mime.to_string();
        let empty = bytes.is_empty();
        Box::pin(async move {
            if !asset.is_image() {
                return Err(ResolveError::Unsupported(mime));
            }
            if empty {
                return Err(ResolveError::Decode("empty image".to_string()));
            }
            let sizes = self
                .image_sizes
                .read()
                .map_err(|e| ResolveError::Decode(format!("Lock error: {}", e)))?;
            let (width, height) = sizes
                .get(&mime)
                .copied()
                .ok_or_else(|| ResolveError::Decode(format!("unknown size for {mime}")))?;
            Ok(ResolvedImage { asset, width, height })
        })
    }

    fn resolve_bookmark(&self, url: &str) -> BoxFuture<'_, ResolveResult<BookmarkMetadata>> {
        let url = url.to_string();
        Box::pin(async move {
            let bookmarks = self
                .bookmarks
                .read()
                .map_err(|e| ResolveError::Fetch(format!("Lock error: {}", e)))?;
            bookmarks.get(&url).cloned().ok_or(ResolveError::Fetch(url))
        })
    }
}
