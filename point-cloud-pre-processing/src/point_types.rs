/// Concrete point records and their zero-sized accessors
use crate::accessor::{
    ColorType, IntensityType, LabelType, NormalType, PointAccessor, PointLayout, PositionType,
};
use crate::error::AccessorError;

/// Double precision position
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Pos64 {
    pub position: [f64; 3],
}

/// Double precision position, float color, 16-bit intensity
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Pos64Col32IShort {
    pub position: [f64; 3],
    pub color: [f32; 3],
    pub intensity: u16,
}

/// Double precision position, 16-bit intensity
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Pos64IShort {
    pub position: [f64; 3],
    pub intensity: u16,
}

/// Double precision position, float color
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Pos64Col32 {
    pub position: [f64; 3],
    pub color: [f32; 3],
}

/// Double precision position, 8-bit classification label
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Pos64Label8 {
    pub position: [f64; 3],
    pub label: u8,
}

/// Double precision position, float normal, float color, 16-bit intensity
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Pos64Nor32Col32IShort {
    pub position: [f64; 3],
    pub normal: [f32; 3],
    pub color: [f32; 3],
    pub intensity: u16,
}

/// Single precision position
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Pos32 {
    pub position: [f32; 3],
}

const fn layout(
    position: PositionType,
    color: ColorType,
    normal: NormalType,
    intensity: IntensityType,
    label: LabelType,
) -> PointLayout {
    PointLayout {
        position,
        color,
        normal,
        intensity,
        label,
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Pos64Accessor;

impl PointAccessor<Pos64> for Pos64Accessor {
    fn type_name(&self) -> &'static str {
        "Pos64"
    }

    fn layout(&self) -> PointLayout {
        PointLayout::position_only()
    }

    fn position_f64(&self, point: &Pos64) -> Result<[f64; 3], AccessorError> {
        Ok(point.position)
    }

    fn set_position_f64(&self, point: &mut Pos64, value: [f64; 3]) -> Result<(), AccessorError> {
        point.position = value;
        Ok(())
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Pos64Col32IShortAccessor;

impl PointAccessor<Pos64Col32IShort> for Pos64Col32IShortAccessor {
    fn type_name(&self) -> &'static str {
        "Pos64Col32IShort"
    }

    fn layout(&self) -> PointLayout {
        layout(
            PositionType::Float64x3,
            ColorType::Float32x3,
            NormalType::None,
            IntensityType::UInt16,
            LabelType::None,
        )
    }

    fn position_f64(&self, point: &Pos64Col32IShort) -> Result<[f64; 3], AccessorError> {
        Ok(point.position)
    }

    fn set_position_f64(
        &self,
        point: &mut Pos64Col32IShort,
        value: [f64; 3],
    ) -> Result<(), AccessorError> {
        point.position = value;
        Ok(())
    }

    fn color(&self, point: &Pos64Col32IShort) -> Result<[f32; 3], AccessorError> {
        Ok(point.color)
    }

    fn set_color(&self, point: &mut Pos64Col32IShort, value: [f32; 3]) -> Result<(), AccessorError> {
        point.color = value;
        Ok(())
    }

    fn intensity(&self, point: &Pos64Col32IShort) -> Result<u16, AccessorError> {
        Ok(point.intensity)
    }

    fn set_intensity(&self, point: &mut Pos64Col32IShort, value: u16) -> Result<(), AccessorError> {
        point.intensity = value;
        Ok(())
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Pos64IShortAccessor;

impl PointAccessor<Pos64IShort> for Pos64IShortAccessor {
    fn type_name(&self) -> &'static str {
        "Pos64IShort"
    }

    fn layout(&self) -> PointLayout {
        layout(
            PositionType::Float64x3,
            ColorType::None,
            NormalType::None,
            IntensityType::UInt16,
            LabelType::None,
        )
    }

    fn position_f64(&self, point: &Pos64IShort) -> Result<[f64; 3], AccessorError> {
        Ok(point.position)
    }

    fn set_position_f64(&self, point: &mut Pos64IShort, value: [f64; 3]) -> Result<(), AccessorError> {
        point.position = value;
        Ok(())
    }

    fn intensity(&self, point: &Pos64IShort) -> Result<u16, AccessorError> {
        Ok(point.intensity)
    }

    fn set_intensity(&self, point: &mut Pos64IShort, value: u16) -> Result<(), AccessorError> {
        point.intensity = value;
        Ok(())
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Pos64Col32Accessor;

impl PointAccessor<Pos64Col32> for Pos64Col32Accessor {
    fn type_name(&self) -> &'static str {
        "Pos64Col32"
    }

    fn layout(&self) -> PointLayout {
        layout(
            PositionType::Float64x3,
            ColorType::Float32x3,
            NormalType::None,
            IntensityType::None,
            LabelType::None,
        )
    }

    fn position_f64(&self, point: &Pos64Col32) -> Result<[f64; 3], AccessorError> {
        Ok(point.position)
    }

    fn set_position_f64(&self, point: &mut Pos64Col32, value: [f64; 3]) -> Result<(), AccessorError> {
        point.position = value;
        Ok(())
    }

    fn color(&self, point: &Pos64Col32) -> Result<[f32; 3], AccessorError> {
        Ok(point.color)
    }

    fn set_color(&self, point: &mut Pos64Col32, value: [f32; 3]) -> Result<(), AccessorError> {
        point.color = value;
        Ok(())
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Pos64Label8Accessor;

impl PointAccessor<Pos64Label8> for Pos64Label8Accessor {
    fn type_name(&self) -> &'static str {
        "Pos64Label8"
    }

    fn layout(&self) -> PointLayout {
        layout(
            PositionType::Float64x3,
            ColorType::None,
            NormalType::None,
            IntensityType::None,
            LabelType::UInt8,
        )
    }

    fn position_f64(&self, point: &Pos64Label8) -> Result<[f64; 3], AccessorError> {
        Ok(point.position)
    }

    fn set_position_f64(&self, point: &mut Pos64Label8, value: [f64; 3]) -> Result<(), AccessorError> {
        point.position = value;
        Ok(())
    }

    fn label(&self, point: &Pos64Label8) -> Result<u8, AccessorError> {
        Ok(point.label)
    }

    fn set_label(&self, point: &mut Pos64Label8, value: u8) -> Result<(), AccessorError> {
        point.label = value;
        Ok(())
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Pos64Nor32Col32IShortAccessor;

impl PointAccessor<Pos64Nor32Col32IShort> for Pos64Nor32Col32IShortAccessor {
    fn type_name(&self) -> &'static str {
        "Pos64Nor32Col32IShort"
    }

    fn layout(&self) -> PointLayout {
        layout(
            PositionType::Float64x3,
            ColorType::Float32x3,
            NormalType::Float32x3,
            IntensityType::UInt16,
            LabelType::None,
        )
    }

    fn position_f64(&self, point: &Pos64Nor32Col32IShort) -> Result<[f64; 3], AccessorError> {
        Ok(point.position)
    }

    fn set_position_f64(
        &self,
        point: &mut Pos64Nor32Col32IShort,
        value: [f64; 3],
    ) -> Result<(), AccessorError> {
        point.position = value;
        Ok(())
    }

    fn normal(&self, point: &Pos64Nor32Col32IShort) -> Result<[f32; 3], AccessorError> {
        Ok(point.normal)
    }

    fn set_normal(
        &self,
        point: &mut Pos64Nor32Col32IShort,
        value: [f32; 3],
    ) -> Result<(), AccessorError> {
        point.normal = value;
        Ok(())
    }

    fn color(&self, point: &Pos64Nor32Col32IShort) -> Result<[f32; 3], AccessorError> {
        Ok(point.color)
    }

    fn set_color(
        &self,
        point: &mut Pos64Nor32Col32IShort,
        value: [f32; 3],
    ) -> Result<(), AccessorError> {
        point.color = value;
        Ok(())
    }

    fn intensity(&self, point: &Pos64Nor32Col32IShort) -> Result<u16, AccessorError> {
        Ok(point.intensity)
    }

    fn set_intensity(
        &self,
        point: &mut Pos64Nor32Col32IShort,
        value: u16,
    ) -> Result<(), AccessorError> {
        point.intensity = value;
        Ok(())
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Pos32Accessor;

impl PointAccessor<Pos32> for Pos32Accessor {
    fn type_name(&self) -> &'static str {
        "Pos32"
    }

    fn layout(&self) -> PointLayout {
        layout(
            PositionType::Float32x3,
            ColorType::None,
            NormalType::None,
            IntensityType::None,
            LabelType::None,
        )
    }

    fn position_f32(&self, point: &Pos32) -> Result<[f32; 3], AccessorError> {
        Ok(point.position)
    }

    fn set_position_f32(&self, point: &mut Pos32, value: [f32; 3]) -> Result<(), AccessorError> {
        point.position = value;
        Ok(())
    }
}

/// Point type chosen on the command line by index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointTypeSelector {
    Pos64,
    Pos64Col32IShort,
    Pos64IShort,
    Pos64Col32,
    Pos64Label8,
    Pos64Nor32Col32IShort,
    Pos32,
}

impl PointTypeSelector {
    pub const ALL: [PointTypeSelector; 7] = [
        PointTypeSelector::Pos64,
        PointTypeSelector::Pos64Col32IShort,
        PointTypeSelector::Pos64IShort,
        PointTypeSelector::Pos64Col32,
        PointTypeSelector::Pos64Label8,
        PointTypeSelector::Pos64Nor32Col32IShort,
        PointTypeSelector::Pos32,
    ];

    /// Map a CLI index to a point type, rejecting unknown values
    pub fn from_index(index: i64) -> Option<Self> {
        usize::try_from(index)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
    }

    pub fn name(&self) -> &'static str {
        match self {
            PointTypeSelector::Pos64 => "Pos64",
            PointTypeSelector::Pos64Col32IShort => "Pos64Col32IShort",
            PointTypeSelector::Pos64IShort => "Pos64IShort",
            PointTypeSelector::Pos64Col32 => "Pos64Col32",
            PointTypeSelector::Pos64Label8 => "Pos64Label8",
            PointTypeSelector::Pos64Nor32Col32IShort => "Pos64Nor32Col32IShort",
            PointTypeSelector::Pos32 => "Pos32",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selector_accepts_known_indices_only() {
        assert_eq!(PointTypeSelector::from_index(0), Some(PointTypeSelector::Pos64));
        assert_eq!(PointTypeSelector::from_index(6), Some(PointTypeSelector::Pos32));
        assert_eq!(PointTypeSelector::from_index(7), None);
        assert_eq!(PointTypeSelector::from_index(-1), None);
    }

    #[test]
    fn setters_touch_only_their_field() {
        let accessor = Pos64Col32IShortAccessor;
        let mut point = Pos64Col32IShort::default();

        accessor.set_color(&mut point, [0.5, 0.25, 1.0]).unwrap();
        assert_eq!(point.position, [0.0; 3]);
        assert_eq!(point.intensity, 0);
        assert_eq!(accessor.color(&point).unwrap(), [0.5, 0.25, 1.0]);

        accessor.set_intensity(&mut point, 900).unwrap();
        assert_eq!(point.color, [0.5, 0.25, 1.0]);
        assert_eq!(accessor.intensity(&point).unwrap(), 900);
    }

    #[test]
    fn flags_match_layout() {
        let accessor = Pos64Nor32Col32IShortAccessor;
        assert!(accessor.has_position_f64());
        assert!(!accessor.has_position_f32());
        assert!(accessor.has_normal());
        assert!(accessor.has_color());
        assert!(accessor.has_intensity());
        assert!(!accessor.has_label());

        let accessor = Pos64Label8Accessor;
        assert!(accessor.has_label());
        assert!(accessor.normal(&Pos64Label8::default()).is_err());
    }

    #[test]
    fn single_precision_position_is_widened() {
        let accessor = Pos32Accessor;
        let mut point = Pos32::default();
        accessor.set_position(&mut point, [1.5, -2.0, 3.25]).unwrap();
        assert_eq!(point.position, [1.5, -2.0, 3.25]);
        assert_eq!(accessor.position(&point).unwrap(), [1.5, -2.0, 3.25]);
        assert!(accessor.position_f64(&point).is_err());
    }
}
