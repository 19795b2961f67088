/// Streaming point sources feeding the conversion pipeline
use crate::accessor::{PointAccessor, PointRecord};
use crate::error::ConversionError;
use serde::{Deserialize, Serialize};

/// Summary of a point source known before streaming starts
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceMetaInfo {
    /// Number of points announced by the source header.
    pub point_count: u64,
    /// Human readable origin of the points (file path or "memory").
    pub source: String,
    pub has_color: bool,
}

/// Sequential reader filling caller-owned point records.
pub trait PointReader<P> {
    fn meta_info(&self) -> &SourceMetaInfo;

    /// Fill `point` with the next record. Returns false once the source is exhausted.
    fn read_next_point<A>(&mut self, point: &mut P, accessor: &A) -> Result<bool, ConversionError>
    where
        A: PointAccessor<P> + ?Sized;
}

/// In-memory point source
pub struct VecPointReader<P> {
    points: Vec<P>,
    cursor: usize,
    meta: SourceMetaInfo,
}

impl<P> VecPointReader<P> {
    pub fn new(points: Vec<P>) -> Self {
        let meta = SourceMetaInfo {
            point_count: points.len() as u64,
            source: "memory".to_string(),
            has_color: false,
        };
        Self {
            points,
            cursor: 0,
            meta,
        }
    }
}

impl<P: PointRecord> PointReader<P> for VecPointReader<P> {
    fn meta_info(&self) -> &SourceMetaInfo {
        &self.meta
    }

    fn read_next_point<A>(&mut self, point: &mut P, _accessor: &A) -> Result<bool, ConversionError>
    where
        A: PointAccessor<P> + ?Sized,
    {
        match self.points.get(self.cursor) {
            Some(next) => {
                *point = next.clone();
                self.cursor += 1;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
