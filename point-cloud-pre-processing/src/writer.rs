/// Out-of-core octree writer.
/// Produces `Octants/<id>.node` payload files, the binary hierarchy index and `meta.json`.
use crate::accessor::{PointAccessor, PointRecord};
use crate::codec::encode_points;
use crate::error::ConversionError;
use crate::hierarchy::{HierarchyEntry, encode_hierarchy};
use crate::manifest::OctreeMeta;
use crate::octree::{Octant, PtOctree};
use constants::octree::{HIERARCHY_FILE_NAME, META_FILE_NAME, NODE_FILE_EXTENSION, OCTANTS_DIR_NAME};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Statistics of one completed write.
#[derive(Debug, Clone, PartialEq)]
pub struct WriteSummary {
    pub output_dir: PathBuf,
    pub octant_count: usize,
    pub node_files: usize,
    pub point_count: usize,
    pub bytes_written: u64,
}

pub struct OctreeFileWriter {
    output_dir: PathBuf,
}

impl OctreeFileWriter {
    pub fn new(output_dir: &Path) -> Self {
        Self {
            output_dir: output_dir.to_path_buf(),
        }
    }

    /// Path of the payload file for an octant id below `output_dir`.
    pub fn node_path(output_dir: &Path, id: &str) -> PathBuf {
        output_dir
            .join(OCTANTS_DIR_NAME)
            .join(format!("{id}.{NODE_FILE_EXTENSION}"))
    }

    /// Write every octant payload, then the hierarchy, then the metadata document.
    /// Hierarchy and metadata are only written once all payload files exist.
    pub fn write_complete_data<P, A>(
        &self,
        octree: &PtOctree<P>,
        accessor: &A,
    ) -> Result<WriteSummary, ConversionError>
    where
        P: PointRecord,
        A: PointAccessor<P> + ?Sized,
    {
        let layout = accessor.layout();
        if !layout.has_position() {
            return Err(ConversionError::UnsupportedPointLayout(
                accessor.type_name().to_string(),
            ));
        }

        fs::create_dir_all(&self.output_dir)?;
        self.clear_previous_output()?;
        fs::create_dir_all(self.output_dir.join(OCTANTS_DIR_NAME))?;

        info!(
            octants = octree.len(),
            output = %self.output_dir.display(),
            "Writing octree"
        );

        let (node_files, mut bytes_written) = self.write_octants(octree, accessor)?;
        bytes_written += self.write_hierarchy(octree)?;
        bytes_written += self.write_meta(octree, accessor)?;

        let summary = WriteSummary {
            output_dir: self.output_dir.clone(),
            octant_count: octree.len(),
            node_files,
            point_count: octree.point_count(),
            bytes_written,
        };
        info!(
            node_files = summary.node_files,
            bytes = summary.bytes_written,
            "Octree written"
        );
        Ok(summary)
    }

    /// Remove the metadata, hierarchy and node files of an earlier run.
    /// Unrelated files in the output directory are left alone.
    fn clear_previous_output(&self) -> Result<(), ConversionError> {
        for name in [META_FILE_NAME, HIERARCHY_FILE_NAME] {
            let path = self.output_dir.join(name);
            if path.is_file() {
                fs::remove_file(&path)?;
            }
        }

        let octants_dir = self.output_dir.join(OCTANTS_DIR_NAME);
        if !octants_dir.is_dir() {
            return Ok(());
        }
        let node_suffix = format!(".{NODE_FILE_EXTENSION}");
        let tmp_suffix = format!(".{NODE_FILE_EXTENSION}.tmp");
        let mut removed = 0usize;
        for entry in fs::read_dir(&octants_dir)? {
            let path = entry?.path();
            let stale = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.ends_with(&node_suffix) || n.ends_with(&tmp_suffix));
            if stale && path.is_file() {
                fs::remove_file(&path)?;
                removed += 1;
            }
        }
        if removed > 0 {
            info!(removed, "Removed node files of a previous run");
        }
        Ok(())
    }

    /// Serialise payload octants in parallel; the first failure aborts the batch.
    fn write_octants<P, A>(
        &self,
        octree: &PtOctree<P>,
        accessor: &A,
    ) -> Result<(usize, u64), ConversionError>
    where
        P: PointRecord,
        A: PointAccessor<P> + ?Sized,
    {
        let payload: Vec<&Octant<P>> = octree
            .octants()
            .iter()
            .filter(|o| !o.points.is_empty())
            .collect();

        let pb = ProgressBar::new(payload.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{bar:40.green/blue}] {pos}/{len} octants ({percent}%) {msg}")
                .unwrap()
                .progress_chars("▉▊▋▌▍▎▏ "),
        );
        pb.set_message("Writing octant files");

        let sizes = payload
            .par_iter()
            .map(|octant| -> Result<u64, ConversionError> {
                let written = self.write_node(octant, accessor)?;
                pb.inc(1);
                Ok(written)
            })
            .collect::<Result<Vec<u64>, ConversionError>>();

        match sizes {
            Ok(sizes) => {
                pb.finish_with_message("Octant files written");
                Ok((sizes.len(), sizes.iter().sum()))
            }
            Err(e) => {
                pb.abandon_with_message("Octant write failed");
                Err(e)
            }
        }
    }

    /// Write one node file through a temporary name so readers never see a partial file.
    fn write_node<P, A>(&self, octant: &Octant<P>, accessor: &A) -> Result<u64, ConversionError>
    where
        A: PointAccessor<P> + ?Sized,
    {
        let header = node_header(
            octant.id.as_str(),
            octant.points.len(),
            accessor.layout().point_size(),
        )?;
        let body = encode_points(accessor, &octant.points)?;

        let mut bytes = Vec::with_capacity(header.len() + body.len());
        bytes.extend_from_slice(&header);
        bytes.extend_from_slice(&body);

        let path = Self::node_path(&self.output_dir, octant.id.as_str());
        let tmp_path = path.with_extension(format!("{NODE_FILE_EXTENSION}.tmp"));
        fs::write(&tmp_path, &bytes)?;
        fs::rename(&tmp_path, &path)?;

        debug!(octant = %octant.id, points = octant.points.len(), "Wrote node file");
        Ok(bytes.len() as u64)
    }

    fn write_hierarchy<P>(&self, octree: &PtOctree<P>) -> Result<u64, ConversionError> {
        let bytes = encode_hierarchy(&HierarchyEntry::collect(octree));
        let path = self.output_dir.join(HIERARCHY_FILE_NAME);
        fs::write(&path, &bytes)?;
        debug!("Generated hierarchy: {}", path.display());
        Ok(bytes.len() as u64)
    }

    fn write_meta<P, A>(&self, octree: &PtOctree<P>, accessor: &A) -> Result<u64, ConversionError>
    where
        A: PointAccessor<P> + ?Sized,
    {
        let meta = OctreeMeta::describe(octree, accessor);
        let meta_json = serde_json::to_string_pretty(&meta)?;
        let path = self.output_dir.join(META_FILE_NAME);
        fs::write(&path, &meta_json)?;
        info!("Generated metadata: {}", path.display());
        Ok(meta_json.len() as u64)
    }
}

/// Node file header: point count and point size, both little-endian `u32`.
fn node_header(
    id: &str,
    point_count: usize,
    point_size: usize,
) -> Result<[u8; 8], ConversionError> {
    let count = u32::try_from(point_count).map_err(|_| ConversionError::OversizedNode {
        octant: id.to_string(),
        points: point_count,
    })?;
    let size = u32::try_from(point_size).map_err(|_| {
        ConversionError::UnsupportedPointLayout(format!(
            "point size {point_size} does not fit a node header"
        ))
    })?;
    let mut header = [0u8; 8];
    header[..4].copy_from_slice(&count.to_le_bytes());
    header[4..].copy_from_slice(&size.to_le_bytes());
    Ok(header)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_header_is_count_then_point_size() {
        let header = node_header("r0", 3, 24).unwrap();
        assert_eq!(&header[..4], &3u32.to_le_bytes());
        assert_eq!(&header[4..], &24u32.to_le_bytes());
    }

    #[test]
    fn node_header_rejects_counts_beyond_u32() {
        let too_many = u32::MAX as usize + 1;
        let result = node_header("r07", too_many, 24);
        assert!(matches!(
            result,
            Err(ConversionError::OversizedNode { ref octant, points })
                if octant == "r07" && points == too_many
        ));
    }
}
