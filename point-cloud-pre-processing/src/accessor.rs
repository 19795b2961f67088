/// Point accessor abstraction.
/// Point records are opaque values; their layout is only known through an accessor,
/// which exposes capability flags plus typed getters and setters for each field.
use crate::error::AccessorError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PositionType {
    Undefined,
    Float32x3,
    Float64x3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColorType {
    None,
    Float32x3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NormalType {
    None,
    Float32x3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IntensityType {
    None,
    UInt16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LabelType {
    None,
    UInt8,
}

/// Capability set of a point record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointLayout {
    pub position: PositionType,
    pub color: ColorType,
    pub normal: NormalType,
    pub intensity: IntensityType,
    pub label: LabelType,
}

impl PointLayout {
    /// Layout carrying only a double precision position
    pub const fn position_only() -> Self {
        Self {
            position: PositionType::Float64x3,
            color: ColorType::None,
            normal: NormalType::None,
            intensity: IntensityType::None,
            label: LabelType::None,
        }
    }

    pub fn has_position(&self) -> bool {
        self.position != PositionType::Undefined
    }

    /// Bytes per serialised record
    pub fn point_size(&self) -> usize {
        let position = match self.position {
            PositionType::Undefined => 0,
            PositionType::Float32x3 => 12,
            PositionType::Float64x3 => 24,
        };
        let normal = match self.normal {
            NormalType::None => 0,
            NormalType::Float32x3 => 12,
        };
        let intensity = match self.intensity {
            IntensityType::None => 0,
            IntensityType::UInt16 => 2,
        };
        let color = match self.color {
            ColorType::None => 0,
            ColorType::Float32x3 => 12,
        };
        let label = match self.label {
            LabelType::None => 0,
            LabelType::UInt8 => 1,
        };
        position + normal + intensity + color + label
    }

    /// Names of the capability flags that are set, as written to the metadata document.
    pub fn capability_names(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        match self.position {
            PositionType::Float32x3 => names.push("HasPositionFloat32"),
            PositionType::Float64x3 => names.push("HasPositionFloat64"),
            PositionType::Undefined => {}
        }
        if self.normal == NormalType::Float32x3 {
            names.push("HasNormalFloat32");
        }
        if self.intensity == IntensityType::UInt16 {
            names.push("HasIntensityUInt16");
        }
        if self.color == ColorType::Float32x3 {
            names.push("HasColorFloat32");
        }
        if self.label == LabelType::UInt8 {
            names.push("HasLabelUInt8");
        }
        names
    }

    /// Compact description used in log lines and mismatch errors
    pub fn describe(&self) -> String {
        let names = self.capability_names();
        if names.is_empty() {
            "no fields".to_string()
        } else {
            names.join("+")
        }
    }
}

/// Bound satisfied by every value usable as a point record.
pub trait PointRecord: Default + Clone + Send + Sync + 'static {}

impl<T: Default + Clone + Send + Sync + 'static> PointRecord for T {}

/// Stateless field access for point records of type `P`.
///
/// Only the getters and setters matching [`PointAccessor::layout`] are overridden by
/// implementors; every other call fails with [`AccessorError::Unsupported`].
pub trait PointAccessor<P>: Send + Sync {
    /// Type name reported in errors and log lines
    fn type_name(&self) -> &'static str;

    fn layout(&self) -> PointLayout;

    fn has_position_f32(&self) -> bool {
        self.layout().position == PositionType::Float32x3
    }

    fn has_position_f64(&self) -> bool {
        self.layout().position == PositionType::Float64x3
    }

    fn has_color(&self) -> bool {
        self.layout().color != ColorType::None
    }

    fn has_normal(&self) -> bool {
        self.layout().normal != NormalType::None
    }

    fn has_intensity(&self) -> bool {
        self.layout().intensity != IntensityType::None
    }

    fn has_label(&self) -> bool {
        self.layout().label != LabelType::None
    }

    fn position_f64(&self, _point: &P) -> Result<[f64; 3], AccessorError> {
        Err(self.unsupported("position (f64)"))
    }

    fn set_position_f64(&self, _point: &mut P, _value: [f64; 3]) -> Result<(), AccessorError> {
        Err(self.unsupported("position (f64)"))
    }

    fn position_f32(&self, _point: &P) -> Result<[f32; 3], AccessorError> {
        Err(self.unsupported("position (f32)"))
    }

    fn set_position_f32(&self, _point: &mut P, _value: [f32; 3]) -> Result<(), AccessorError> {
        Err(self.unsupported("position (f32)"))
    }

    fn color(&self, _point: &P) -> Result<[f32; 3], AccessorError> {
        Err(self.unsupported("color"))
    }

    fn set_color(&self, _point: &mut P, _value: [f32; 3]) -> Result<(), AccessorError> {
        Err(self.unsupported("color"))
    }

    fn normal(&self, _point: &P) -> Result<[f32; 3], AccessorError> {
        Err(self.unsupported("normal"))
    }

    fn set_normal(&self, _point: &mut P, _value: [f32; 3]) -> Result<(), AccessorError> {
        Err(self.unsupported("normal"))
    }

    fn intensity(&self, _point: &P) -> Result<u16, AccessorError> {
        Err(self.unsupported("intensity"))
    }

    fn set_intensity(&self, _point: &mut P, _value: u16) -> Result<(), AccessorError> {
        Err(self.unsupported("intensity"))
    }

    fn label(&self, _point: &P) -> Result<u8, AccessorError> {
        Err(self.unsupported("label"))
    }

    fn set_label(&self, _point: &mut P, _value: u8) -> Result<(), AccessorError> {
        Err(self.unsupported("label"))
    }

    /// Position widened to f64 regardless of the stored precision.
    fn position(&self, point: &P) -> Result<[f64; 3], AccessorError> {
        match self.layout().position {
            PositionType::Float64x3 => self.position_f64(point),
            PositionType::Float32x3 => {
                let [x, y, z] = self.position_f32(point)?;
                Ok([x as f64, y as f64, z as f64])
            }
            PositionType::Undefined => Err(self.unsupported("position")),
        }
    }

    /// Store a position in whatever precision the layout carries.
    fn set_position(&self, point: &mut P, value: [f64; 3]) -> Result<(), AccessorError> {
        match self.layout().position {
            PositionType::Float64x3 => self.set_position_f64(point, value),
            PositionType::Float32x3 => self.set_position_f32(
                point,
                [value[0] as f32, value[1] as f32, value[2] as f32],
            ),
            PositionType::Undefined => Err(self.unsupported("position")),
        }
    }

    fn unsupported(&self, field: &'static str) -> AccessorError {
        AccessorError::Unsupported {
            point_type: self.type_name(),
            field,
        }
    }
}
