/// Conversion pipeline from a point source to an out-of-core octree.
/// Stages run strictly in sequence: read and bound, build, write.
use crate::accessor::{PointAccessor, PointRecord};
use crate::bounds::PointCloudBounds;
use crate::config::ConversionConfig;
use crate::error::ConversionError;
use crate::laz::LasPointReader;
use crate::octree::PtOctree;
use crate::point_types::{
    Pos32Accessor, Pos64Accessor, Pos64Col32Accessor, Pos64Col32IShortAccessor,
    Pos64IShortAccessor, Pos64Label8Accessor, Pos64Nor32Col32IShortAccessor, PointTypeSelector,
};
use crate::source::PointReader;
use crate::writer::OctreeFileWriter;
use constants::coordinate_system::{EXCHANGE_YZ_TRANSFORM, transform_coordinates};
use constants::octree::PROGRESS_UPDATE_INTERVAL;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

/// Outcome of a finished conversion.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionSummary {
    pub point_type: &'static str,
    pub points_read: usize,
    pub bounds: PointCloudBounds,
    pub octant_count: usize,
    pub leaf_count: usize,
    pub depth: u32,
    pub node_files: usize,
    pub bytes_written: u64,
}

pub struct PointCloudConverter {
    config: ConversionConfig,
}

impl PointCloudConverter {
    pub fn new(config: ConversionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ConversionConfig {
        &self.config
    }

    /// Convert the configured LAS/LAZ source with the configured point type.
    pub fn convert(&self) -> Result<ConversionSummary, ConversionError> {
        info!(
            "Converting {} to {} as {}",
            self.config.source.display(),
            self.config.destination.display(),
            self.config.point_type.name()
        );

        match self.config.point_type {
            PointTypeSelector::Pos64 => self.convert_las(&Pos64Accessor),
            PointTypeSelector::Pos64Col32IShort => self.convert_las(&Pos64Col32IShortAccessor),
            PointTypeSelector::Pos64IShort => self.convert_las(&Pos64IShortAccessor),
            PointTypeSelector::Pos64Col32 => self.convert_las(&Pos64Col32Accessor),
            PointTypeSelector::Pos64Label8 => self.convert_las(&Pos64Label8Accessor),
            PointTypeSelector::Pos64Nor32Col32IShort => {
                self.convert_las(&Pos64Nor32Col32IShortAccessor)
            }
            PointTypeSelector::Pos32 => self.convert_las(&Pos32Accessor),
        }
    }

    fn convert_las<P, A>(&self, accessor: &A) -> Result<ConversionSummary, ConversionError>
    where
        P: PointRecord,
        A: PointAccessor<P>,
    {
        let mut reader = LasPointReader::open(&self.config.source)?;
        self.convert_points(&mut reader, accessor)
    }

    /// Run all stages against any point source.
    pub fn convert_points<P, A, R>(
        &self,
        reader: &mut R,
        accessor: &A,
    ) -> Result<ConversionSummary, ConversionError>
    where
        P: PointRecord,
        A: PointAccessor<P> + ?Sized,
        R: PointReader<P>,
    {
        if !accessor.layout().has_position() {
            return Err(ConversionError::UnsupportedPointLayout(
                accessor.type_name().to_string(),
            ));
        }

        let (points, bounds) = self.read_points(reader, accessor)?;
        self.print_bounds(&bounds);
        let points_read = points.len();

        let octree = PtOctree::build(bounds, accessor, points, self.config.max_points_per_bucket)?;

        let writer = OctreeFileWriter::new(&self.config.destination);
        let written = writer.write_complete_data(&octree, accessor)?;

        let summary = ConversionSummary {
            point_type: accessor.type_name(),
            points_read,
            bounds,
            octant_count: octree.len(),
            leaf_count: octree.leaves().count(),
            depth: octree.depth(),
            node_files: written.node_files,
            bytes_written: written.bytes_written,
        };
        info!(
            points = summary.points_read,
            octants = summary.octant_count,
            leaves = summary.leaf_count,
            depth = summary.depth,
            "Conversion complete"
        );
        Ok(summary)
    }

    /// Stream every source point, applying the axis exchange and growing the bounds.
    fn read_points<P, A, R>(
        &self,
        reader: &mut R,
        accessor: &A,
    ) -> Result<(Vec<P>, PointCloudBounds), ConversionError>
    where
        P: PointRecord,
        A: PointAccessor<P> + ?Sized,
        R: PointReader<P>,
    {
        let total_points = reader.meta_info().point_count as usize;

        let pb = ProgressBar::new(total_points as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{bar:40.cyan/blue}] {pos}/{len} points ({percent}%) {msg}")
                .unwrap()
                .progress_chars("▉▊▋▌▍▎▏ "),
        );
        pb.set_message("Loading points");

        let mut bounds = PointCloudBounds::new();
        let mut points = Vec::with_capacity(total_points);
        let mut point = P::default();

        while reader.read_next_point(&mut point, accessor)? {
            let [x, y, z] = accessor.position(&point)?;
            let (x, y, z) = if self.config.exchange_yz {
                let exchanged = transform_coordinates(&EXCHANGE_YZ_TRANSFORM, x, y, z);
                accessor.set_position(&mut point, [exchanged.0, exchanged.1, exchanged.2])?;
                if accessor.has_normal() {
                    let [nx, ny, nz] = accessor.normal(&point)?;
                    accessor.set_normal(&mut point, [nx, nz, ny])?;
                }
                exchanged
            } else {
                (x, y, z)
            };
            bounds.update(x, y, z);
            points.push(point.clone());

            if points.len() % PROGRESS_UPDATE_INTERVAL == 0 {
                pb.set_position(points.len() as u64);
            }
        }
        pb.finish_with_message("Points loaded");

        info!(points = points.len(), "Read {}", reader.meta_info().source);
        Ok((points, bounds))
    }

    /// Log the bounds gathered during reading.
    fn print_bounds(&self, bounds: &PointCloudBounds) {
        let (dx, dy, dz) = bounds.dimensions();
        info!(
            "Bounds: X [{:.3}, {:.3}] Y [{:.3}, {:.3}] Z [{:.3}, {:.3}] ({:.3} x {:.3} x {:.3})",
            bounds.min_x, bounds.max_x, bounds.min_y, bounds.max_y, bounds.min_z, bounds.max_z, dx, dy, dz
        );
    }
}
