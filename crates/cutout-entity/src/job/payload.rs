//! Tagged job payload definitions.
//!
//! Payloads travel through the durable queue as JSON, with raw image bytes
//! carried base64-encoded.

use serde::{Deserialize, Serialize};

use cutout_core::error::AppError;
use cutout_core::result::AppResult;

/// Allowed feather radius range, in pixels.
pub const FEATHER_RADIUS_RANGE: (f32, f32) = (0.0, 8.0);
/// Allowed alpha boost multiplier range.
pub const ALPHA_BOOST_RANGE: (f32, f32) = (0.4, 2.5);

/// Post-removal alpha refinement options.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RemovalOptions {
    /// Alpha-channel feathering radius in pixels, `[0, 8]`.
    #[serde(default)]
    pub feather_radius: f32,
    /// Alpha multiplier, `[0.4, 2.5]`.
    #[serde(default = "default_alpha_boost")]
    pub alpha_boost: f32,
}

impl RemovalOptions {
    /// Check both options against their allowed ranges.
    pub fn validate(&self) -> AppResult<()> {
        let (fmin, fmax) = FEATHER_RADIUS_RANGE;
        if !self.feather_radius.is_finite() || self.feather_radius < fmin || self.feather_radius > fmax
        {
            return Err(AppError::validation(format!(
                "feather_radius must be between {fmin} and {fmax}, got {}",
                self.feather_radius
            )));
        }
        let (amin, amax) = ALPHA_BOOST_RANGE;
        if !self.alpha_boost.is_finite() || self.alpha_boost < amin || self.alpha_boost > amax {
            return Err(AppError::validation(format!(
                "alpha_boost must be between {amin} and {amax}, got {}",
                self.alpha_boost
            )));
        }
        Ok(())
    }
}

impl Default for RemovalOptions {
    fn default() -> Self {
        Self {
            feather_radius: 0.0,
            alpha_boost: default_alpha_boost(),
        }
    }
}

fn default_alpha_boost() -> f32 {
    1.0
}

/// One image inside a batch submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchItem {
    /// Original file name as uploaded.
    pub name: String,
    /// Raw image bytes.
    #[serde(with = "base64_bytes")]
    pub bytes: Vec<u8>,
}

/// Work carried by a job, serialized into the queue record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum JobPayload {
    /// One image in, one PNG out.
    Single {
        /// Original file name as uploaded.
        name: String,
        /// Raw image bytes.
        #[serde(with = "base64_bytes")]
        bytes: Vec<u8>,
        /// Refinement options.
        options: RemovalOptions,
    },
    /// Several images in, one zip archive out. Order is preserved.
    Batch {
        /// Ordered batch items.
        items: Vec<BatchItem>,
        /// Refinement options applied to every item.
        options: RemovalOptions,
    },
    /// Delete job outputs older than the threshold.
    Cleanup {
        /// Age threshold in seconds.
        older_than_seconds: u64,
    },
}

/// Base64 transport for raw byte fields inside JSON job records.
mod base64_bytes {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let encoded = String::deserialize(deserializer)?;
        STANDARD.decode(encoded).map_err(serde::de::Error::custom)
    }
}
