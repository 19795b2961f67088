/// LAS/LAZ point source
use crate::accessor::PointAccessor;
use crate::error::ConversionError;
use crate::source::{PointReader, SourceMetaInfo};
use las::Reader;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::debug;

/// Create LAS file reader for point cloud access.
/// Handles both .las and .laz compressed formats.
pub fn create_reader(file_path: &Path) -> Result<Reader, ConversionError> {
    let file = File::open(file_path)?;
    let buf_reader = BufReader::new(file);
    Ok(Reader::new(buf_reader)?)
}

/// Streams LAS/LAZ points into any point layout.
/// Fields the layout lacks are skipped; 16-bit colors are normalised to 0..1.
pub struct LasPointReader {
    reader: Reader,
    meta: SourceMetaInfo,
}

impl LasPointReader {
    pub fn open(file_path: &Path) -> Result<Self, ConversionError> {
        let reader = create_reader(file_path)?;
        let header = reader.header();
        let meta = SourceMetaInfo {
            point_count: header.number_of_points(),
            source: file_path.display().to_string(),
            has_color: header.point_format().has_color,
        };
        debug!(
            points = meta.point_count,
            has_color = meta.has_color,
            "Opened {}",
            meta.source
        );
        Ok(Self { reader, meta })
    }
}

impl<P> PointReader<P> for LasPointReader {
    fn meta_info(&self) -> &SourceMetaInfo {
        &self.meta
    }

    fn read_next_point<A>(&mut self, point: &mut P, accessor: &A) -> Result<bool, ConversionError>
    where
        A: PointAccessor<P> + ?Sized,
    {
        let Some(las_point) = self.reader.points().next().transpose()? else {
            return Ok(false);
        };

        accessor.set_position(point, [las_point.x, las_point.y, las_point.z])?;
        if accessor.has_color() {
            let rgb = las_point
                .color
                .map(|c| {
                    [
                        c.red as f32 / u16::MAX as f32,
                        c.green as f32 / u16::MAX as f32,
                        c.blue as f32 / u16::MAX as f32,
                    ]
                })
                .unwrap_or([0.0; 3]);
            accessor.set_color(point, rgb)?;
        }
        if accessor.has_intensity() {
            accessor.set_intensity(point, las_point.intensity)?;
        }
        if accessor.has_label() {
            accessor.set_label(point, u8::from(las_point.classification))?;
        }

        Ok(true)
    }
}
