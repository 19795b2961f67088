/// Little-endian point record serialisation.
/// Fields are written in the fixed order position, normal, intensity, color, label,
/// skipping whatever the layout does not carry.
use crate::accessor::{
    ColorType, IntensityType, LabelType, NormalType, PointAccessor, PointLayout, PositionType,
};
use crate::error::AccessorError;

/// Append one point to `out`.
pub fn encode_point<P, A>(accessor: &A, point: &P, out: &mut Vec<u8>) -> Result<(), AccessorError>
where
    A: PointAccessor<P> + ?Sized,
{
    let layout = accessor.layout();

    match layout.position {
        PositionType::Float64x3 => {
            for v in accessor.position_f64(point)? {
                out.extend_from_slice(&v.to_le_bytes());
            }
        }
        PositionType::Float32x3 => {
            for v in accessor.position_f32(point)? {
                out.extend_from_slice(&v.to_le_bytes());
            }
        }
        PositionType::Undefined => return Err(accessor.unsupported("position")),
    }

    if layout.normal == NormalType::Float32x3 {
        for v in accessor.normal(point)? {
            out.extend_from_slice(&v.to_le_bytes());
        }
    }
    if layout.intensity == IntensityType::UInt16 {
        out.extend_from_slice(&accessor.intensity(point)?.to_le_bytes());
    }
    if layout.color == ColorType::Float32x3 {
        for v in accessor.color(point)? {
            out.extend_from_slice(&v.to_le_bytes());
        }
    }
    if layout.label == LabelType::UInt8 {
        out.push(accessor.label(point)?);
    }

    Ok(())
}

/// Serialise a slice of points into one contiguous buffer.
pub fn encode_points<P, A>(accessor: &A, points: &[P]) -> Result<Vec<u8>, AccessorError>
where
    A: PointAccessor<P> + ?Sized,
{
    let mut out = Vec::with_capacity(points.len() * accessor.layout().point_size());
    for point in points {
        encode_point(accessor, point, &mut out)?;
    }
    Ok(out)
}

/// Decode one record. `bytes` must hold exactly `layout.point_size()` bytes.
pub fn decode_point<P, A>(accessor: &A, bytes: &[u8]) -> Result<P, AccessorError>
where
    P: Default,
    A: PointAccessor<P> + ?Sized,
{
    let layout: PointLayout = accessor.layout();
    let mut cursor = ByteCursor { bytes, offset: 0 };
    let mut point = P::default();

    match layout.position {
        PositionType::Float64x3 => {
            let value = [cursor.f64(), cursor.f64(), cursor.f64()];
            accessor.set_position_f64(&mut point, value)?;
        }
        PositionType::Float32x3 => {
            let value = [cursor.f32(), cursor.f32(), cursor.f32()];
            accessor.set_position_f32(&mut point, value)?;
        }
        PositionType::Undefined => return Err(accessor.unsupported("position")),
    }

    if layout.normal == NormalType::Float32x3 {
        let value = [cursor.f32(), cursor.f32(), cursor.f32()];
        accessor.set_normal(&mut point, value)?;
    }
    if layout.intensity == IntensityType::UInt16 {
        accessor.set_intensity(&mut point, cursor.u16())?;
    }
    if layout.color == ColorType::Float32x3 {
        let value = [cursor.f32(), cursor.f32(), cursor.f32()];
        accessor.set_color(&mut point, value)?;
    }
    if layout.label == LabelType::UInt8 {
        accessor.set_label(&mut point, cursor.u8())?;
    }

    Ok(point)
}

struct ByteCursor<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl ByteCursor<'_> {
    fn take<const N: usize>(&mut self) -> [u8; N] {
        let mut buf = [0u8; N];
        buf.copy_from_slice(&self.bytes[self.offset..self.offset + N]);
        self.offset += N;
        buf
    }

    fn f64(&mut self) -> f64 {
        f64::from_le_bytes(self.take())
    }

    fn f32(&mut self) -> f32 {
        f32::from_le_bytes(self.take())
    }

    fn u16(&mut self) -> u16 {
        u16::from_le_bytes(self.take())
    }

    fn u8(&mut self) -> u8 {
        self.take::<1>()[0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::point_types::{Pos64Nor32Col32IShort, Pos64Nor32Col32IShortAccessor};

    #[test]
    fn fields_are_written_in_fixed_order() {
        let accessor = Pos64Nor32Col32IShortAccessor;
        let point = Pos64Nor32Col32IShort {
            position: [1.0, 2.0, 3.0],
            normal: [0.0, 1.0, 0.0],
            color: [0.25, 0.5, 0.75],
            intensity: 0x0102,
        };

        let mut bytes = Vec::new();
        encode_point(&accessor, &point, &mut bytes).unwrap();

        assert_eq!(bytes.len(), accessor.layout().point_size());
        assert_eq!(&bytes[0..8], &1.0f64.to_le_bytes());
        assert_eq!(&bytes[28..32], &1.0f32.to_le_bytes());
        assert_eq!(&bytes[36..38], &[0x02, 0x01]);
        assert_eq!(&bytes[38..42], &0.25f32.to_le_bytes());

        let decoded: Pos64Nor32Col32IShort = decode_point(&accessor, &bytes).unwrap();
        assert_eq!(decoded, point);
    }
}
