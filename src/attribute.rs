// Typed vertex attributes
//
// Maps a host element type to the layout glVertexAttrib*Pointer needs:
// component count, scalar kind, and whether the integer or the float entry
// point applies. Buffers are tightly packed, so stride and offset are 0.

use glam::{DVec2, DVec3, DVec4, IVec2, IVec3, IVec4, UVec2, UVec3, UVec4, Vec2, Vec3, Vec4};

use crate::error::{GlazyError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    Byte,
    UnsignedByte,
    Short,
    UnsignedShort,
    Int,
    UnsignedInt,
    HalfFloat,
    Float,
    Double,
}

impl ScalarKind {
    pub const fn gl_enum(self) -> u32 {
        match self {
            ScalarKind::Byte => glow::BYTE,
            ScalarKind::UnsignedByte => glow::UNSIGNED_BYTE,
            ScalarKind::Short => glow::SHORT,
            ScalarKind::UnsignedShort => glow::UNSIGNED_SHORT,
            ScalarKind::Int => glow::INT,
            ScalarKind::UnsignedInt => glow::UNSIGNED_INT,
            ScalarKind::HalfFloat => glow::HALF_FLOAT,
            ScalarKind::Float => glow::FLOAT,
            ScalarKind::Double => glow::DOUBLE,
        }
    }

    pub fn from_gl_enum(value: u32) -> Result<Self> {
        let kind = match value {
            glow::BYTE => ScalarKind::Byte,
            glow::UNSIGNED_BYTE => ScalarKind::UnsignedByte,
            glow::SHORT => ScalarKind::Short,
            glow::UNSIGNED_SHORT => ScalarKind::UnsignedShort,
            glow::INT => ScalarKind::Int,
            glow::UNSIGNED_INT => ScalarKind::UnsignedInt,
            glow::HALF_FLOAT => ScalarKind::HalfFloat,
            glow::FLOAT => ScalarKind::Float,
            glow::DOUBLE => ScalarKind::Double,
            other => {
                return Err(GlazyError::UnsupportedType(format!(
                    "attribute scalar type 0x{:04X}",
                    other
                )))
            }
        };
        Ok(kind)
    }

    pub const fn is_integer(self) -> bool {
        !matches!(
            self,
            ScalarKind::HalfFloat | ScalarKind::Float | ScalarKind::Double
        )
    }

    pub const fn size_bytes(self) -> usize {
        match self {
            ScalarKind::Byte | ScalarKind::UnsignedByte => 1,
            ScalarKind::Short | ScalarKind::UnsignedShort | ScalarKind::HalfFloat => 2,
            ScalarKind::Int | ScalarKind::UnsignedInt | ScalarKind::Float => 4,
            ScalarKind::Double => 8,
        }
    }
}

/// Which attribute-pointer entry point uploads the data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeUpload {
    /// glVertexAttribIPointer; values reach the shader as integers.
    Integer,
    /// glVertexAttribPointer; values are converted to float.
    Float,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttributeLayout {
    pub components: i32,
    pub scalar: ScalarKind,
    pub upload: AttributeUpload,
}

impl AttributeLayout {
    /// Layout for a runtime-described element. Fails for component counts
    /// outside 1..=4.
    pub fn new(components: i32, scalar: ScalarKind) -> Result<Self> {
        if !(1..=4).contains(&components) {
            return Err(GlazyError::UnsupportedType(format!(
                "attribute with {} components",
                components
            )));
        }
        Ok(Self {
            components,
            scalar,
            upload: Self::upload_for(scalar),
        })
    }

    pub const fn of<T: VertexAttribute>() -> Self {
        Self {
            components: T::COMPONENTS,
            scalar: T::SCALAR,
            upload: Self::upload_for(T::SCALAR),
        }
    }

    const fn upload_for(scalar: ScalarKind) -> AttributeUpload {
        if scalar.is_integer() {
            AttributeUpload::Integer
        } else {
            AttributeUpload::Float
        }
    }

    /// Bytes per element, which is also the stride of a packed buffer.
    pub const fn element_size(&self) -> usize {
        self.components as usize * self.scalar.size_bytes()
    }
}

/// A host type that can feed one vertex attribute.
///
/// Implemented for the fixed-width scalars, `[T; 1..=4]` arrays of them, and
/// the matching glam vectors. Anything else fails to compile.
pub trait VertexAttribute: bytemuck::Pod {
    const COMPONENTS: i32;
    const SCALAR: ScalarKind;
}

macro_rules! scalar_attribute {
    ($($t:ty => $kind:ident),* $(,)?) => {
        $(
            impl VertexAttribute for $t {
                const COMPONENTS: i32 = 1;
                const SCALAR: ScalarKind = ScalarKind::$kind;
            }

            impl<const N: usize> VertexAttribute for [$t; N]
            where
                [$t; N]: bytemuck::Pod,
            {
                const COMPONENTS: i32 = {
                    assert!(N >= 1 && N <= 4, "attributes have 1 to 4 components");
                    N as i32
                };
                const SCALAR: ScalarKind = ScalarKind::$kind;
            }
        )*
    };
}

scalar_attribute! {
    i8 => Byte,
    u8 => UnsignedByte,
    i16 => Short,
    u16 => UnsignedShort,
    i32 => Int,
    u32 => UnsignedInt,
    f32 => Float,
    f64 => Double,
}

macro_rules! vector_attribute {
    ($($t:ty => ($n:expr, $kind:ident)),* $(,)?) => {
        $(
            impl VertexAttribute for $t {
                const COMPONENTS: i32 = $n;
                const SCALAR: ScalarKind = ScalarKind::$kind;
            }
        )*
    };
}

vector_attribute! {
    Vec2 => (2, Float),
    Vec3 => (3, Float),
    Vec4 => (4, Float),
    IVec2 => (2, Int),
    IVec3 => (3, Int),
    IVec4 => (4, Int),
    UVec2 => (2, UnsignedInt),
    UVec3 => (3, UnsignedInt),
    UVec4 => (4, UnsignedInt),
    DVec2 => (2, Double),
    DVec3 => (3, Double),
    DVec4 => (4, Double),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn glam_vectors_resolve_to_float_layouts() {
        let layout = AttributeLayout::of::<Vec3>();
        assert_eq!(layout.components, 3);
        assert_eq!(layout.scalar, ScalarKind::Float);
        assert_eq!(layout.upload, AttributeUpload::Float);
        assert_eq!(layout.element_size(), std::mem::size_of::<Vec3>());
    }

    #[test]
    fn integer_kinds_use_integer_upload() {
        assert_eq!(AttributeLayout::of::<u8>().upload, AttributeUpload::Integer);
        assert_eq!(AttributeLayout::of::<[i16; 2]>().upload, AttributeUpload::Integer);
        assert_eq!(AttributeLayout::of::<UVec4>().components, 4);
        assert_eq!(AttributeLayout::of::<DVec2>().upload, AttributeUpload::Float);
    }

    #[test]
    fn arrays_report_their_length() {
        assert_eq!(AttributeLayout::of::<[f32; 1]>().components, 1);
        assert_eq!(AttributeLayout::of::<[f32; 4]>().components, 4);
        assert_eq!(
            AttributeLayout::of::<[u16; 3]>().element_size(),
            std::mem::size_of::<[u16; 3]>()
        );
    }

    #[test]
    fn runtime_layouts_are_validated() {
        assert!(AttributeLayout::new(0, ScalarKind::Float).is_err());
        assert!(AttributeLayout::new(5, ScalarKind::Int).is_err());
        let half = AttributeLayout::new(2, ScalarKind::HalfFloat).unwrap();
        assert_eq!(half.upload, AttributeUpload::Float);
        assert_eq!(half.element_size(), 4);
    }

    #[test]
    fn gl_enums_round_trip_and_unknowns_fail() {
        assert_eq!(ScalarKind::from_gl_enum(glow::SHORT).unwrap(), ScalarKind::Short);
        let err = ScalarKind::from_gl_enum(glow::FLOAT_VEC3).unwrap_err();
        assert!(matches!(err, GlazyError::UnsupportedType(_)));
    }
}
