/// Conversion configuration, validated before any work starts
use crate::error::ConversionError;
use crate::point_types::PointTypeSelector;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq)]
pub struct ConversionConfig {
    /// LAS/LAZ file to convert.
    pub source: PathBuf,
    /// Directory receiving `meta.json`, the hierarchy and the octant files.
    pub destination: PathBuf,
    pub max_points_per_bucket: usize,
    pub point_type: PointTypeSelector,
    /// Exchange the Y and Z axes while reading.
    pub exchange_yz: bool,
}

impl ConversionConfig {
    /// Validate raw command line values.
    /// Rejects a missing source, a non-positive bucket size and unknown point types.
    pub fn new(
        source: &Path,
        destination: &Path,
        max_points_per_bucket: i64,
        point_type: i64,
        exchange_yz: bool,
    ) -> Result<Self, ConversionError> {
        if !source.is_file() {
            return Err(ConversionError::InvalidConfiguration(format!(
                "source file does not exist: {}",
                source.display()
            )));
        }

        let max_points_per_bucket = usize::try_from(max_points_per_bucket)
            .ok()
            .filter(|&n| n > 0)
            .ok_or_else(|| {
                ConversionError::InvalidConfiguration(format!(
                    "max points per bucket must be positive, got {max_points_per_bucket}"
                ))
            })?;

        let point_type = PointTypeSelector::from_index(point_type).ok_or_else(|| {
            ConversionError::InvalidConfiguration(format!(
                "unknown point type {point_type}, expected 0..={}",
                PointTypeSelector::ALL.len() - 1
            ))
        })?;

        Ok(Self {
            source: source.to_path_buf(),
            destination: destination.to_path_buf(),
            max_points_per_bucket,
            point_type,
            exchange_yz,
        })
    }
}
