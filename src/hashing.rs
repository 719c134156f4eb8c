//! Frame fingerprinting and round-trip verification.
//!
//! Every decoded frame is hashed as a tightly packed RGB24 buffer. When frame
//! persistence is enabled the buffer is written through a [`FrameStore`],
//! read straight back, and hashed again. Matching digests prove the stored
//! image is a faithful copy of what the decoder produced; a mismatch points
//! at quantization, channel reordering, or metadata loss in the persistence
//! path. The result is recorded on the frame row and never stops processing.
//!
//! # Example
//!
//! ```no_run
//! use frameproof::hashing::{PngFrameStore, verify_round_trip};
//! use image::RgbImage;
//!
//! let image = RgbImage::new(4, 4);
//! let verification = verify_round_trip(&PngFrameStore, &image, "frame.png".as_ref())?;
//! assert!(verification.verified);
//! # Ok::<(), frameproof::FrameproofError>(())
//! ```

use std::path::Path;

use image::{ImageFormat, RgbImage};
use sha2::{Digest, Sha256};

use crate::error::FrameproofError;

/// SHA-256 of `data` as 64 lowercase hex characters.
pub fn sha256_hex(data: &[u8]) -> String {
    let hash = Sha256::digest(data);
    format!("{hash:x}")
}

/// Persistence path for decoded frames.
///
/// Implementations must write `image` to `path` and later return the pixels
/// found at `path` as RGB24. [`PngFrameStore`] is the lossless default.
pub trait FrameStore: Send + Sync {
    /// File extension (without dot) used for stored frames.
    fn extension(&self) -> &'static str;

    /// Write `image` to `path`.
    fn save(&self, image: &RgbImage, path: &Path) -> Result<(), FrameproofError>;

    /// Read the image at `path` back as RGB24.
    fn load(&self, path: &Path) -> Result<RgbImage, FrameproofError>;
}

/// Lossless PNG persistence.
#[derive(Debug, Clone, Copy, Default)]
pub struct PngFrameStore;

impl FrameStore for PngFrameStore {
    fn extension(&self) -> &'static str {
        "png"
    }

    fn save(&self, image: &RgbImage, path: &Path) -> Result<(), FrameproofError> {
        image.save_with_format(path, ImageFormat::Png)?;
        Ok(())
    }

    fn load(&self, path: &Path) -> Result<RgbImage, FrameproofError> {
        let reloaded = image::open(path)?;
        Ok(reloaded.into_rgb8())
    }
}

/// Outcome of one save/reload cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verification {
    /// Digest of the buffer handed to the store.
    pub decoded_hash: String,
    /// Digest of the buffer read back from disk.
    pub image_hash: String,
    /// `decoded_hash == image_hash`.
    pub verified: bool,
}

/// Hash `image`, persist it at `path` through `store`, reload, and rehash.
pub fn verify_round_trip(
    store: &dyn FrameStore,
    image: &RgbImage,
    path: &Path,
) -> Result<Verification, FrameproofError> {
    let decoded_hash = sha256_hex(image.as_raw());
    let image_hash = persist_and_rehash(store, image, path)?;
    let verified = decoded_hash == image_hash;
    Ok(Verification {
        decoded_hash,
        image_hash,
        verified,
    })
}

/// Persist `image` and return the digest of the reloaded pixels.
pub(crate) fn persist_and_rehash(
    store: &dyn FrameStore,
    image: &RgbImage,
    path: &Path,
) -> Result<String, FrameproofError> {
    store.save(image, path)?;
    let reloaded = store.load(path)?;
    Ok(sha256_hex(reloaded.as_raw()))
}
