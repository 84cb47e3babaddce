// Uniform dispatch
//
// Each host type names the glUniform* call it needs through `Uniform::KIND`
// and hands over its values as a flat scalar payload. Slices upload as one
// call with count = slice length.

use std::borrow::Cow;
use std::fmt;

use glam::{IVec2, IVec3, IVec4, Mat2, Mat3, Mat4, UVec2, UVec3, UVec4, Vec2, Vec3, Vec4};

use crate::error::{GlazyError, Result};

/// The glUniform* family a value uploads through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UniformKind {
    /// `glUniform{n}fv`
    Float(u8),
    /// `glUniform{n}iv`; bools upload through this too.
    Int(u8),
    /// `glUniform{n}uiv`
    UInt(u8),
    /// `glUniformMatrix{c}x{r}fv`, column-major.
    Matrix { columns: u8, rows: u8 },
}

impl UniformKind {
    /// Runtime lookup for matrix uploads; fails outside 2x2 ..= 4x4.
    pub fn matrix(columns: u8, rows: u8) -> Result<Self> {
        if !(2..=4).contains(&columns) || !(2..=4).contains(&rows) {
            return Err(GlazyError::UnsupportedType(format!(
                "{}x{} matrix uniform",
                columns, rows
            )));
        }
        Ok(UniformKind::Matrix { columns, rows })
    }

    /// Scalars per element of this kind.
    pub const fn scalars(self) -> usize {
        match self {
            UniformKind::Float(n) | UniformKind::Int(n) | UniformKind::UInt(n) => n as usize,
            UniformKind::Matrix { columns, rows } => columns as usize * rows as usize,
        }
    }
}

impl fmt::Display for UniformKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UniformKind::Float(n) => write!(f, "glUniform{}fv", n),
            UniformKind::Int(n) => write!(f, "glUniform{}iv", n),
            UniformKind::UInt(n) => write!(f, "glUniform{}uiv", n),
            UniformKind::Matrix { columns, rows } if columns == rows => {
                write!(f, "glUniformMatrix{}fv", columns)
            }
            UniformKind::Matrix { columns, rows } => {
                write!(f, "glUniformMatrix{}x{}fv", columns, rows)
            }
        }
    }
}

/// Flat scalar payload for one upload.
#[derive(Debug, Clone, PartialEq)]
pub enum UniformData<'a> {
    Float(Cow<'a, [f32]>),
    Int(Cow<'a, [i32]>),
    UInt(Cow<'a, [u32]>),
}

impl UniformData<'_> {
    pub fn len(&self) -> usize {
        match self {
            UniformData::Float(v) => v.len(),
            UniformData::Int(v) => v.len(),
            UniformData::UInt(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn to_owned_data(&self) -> UniformData<'static> {
        match self {
            UniformData::Float(v) => UniformData::Float(Cow::Owned(v.to_vec())),
            UniformData::Int(v) => UniformData::Int(Cow::Owned(v.to_vec())),
            UniformData::UInt(v) => UniformData::UInt(Cow::Owned(v.to_vec())),
        }
    }
}

/// A host type with a matching GLSL uniform type.
pub trait Uniform: Sized {
    const KIND: UniformKind;

    fn data(values: &[Self]) -> UniformData<'_>;
}

macro_rules! pod_uniform {
    ($variant:ident, $scalar:ty, $($t:ty => $kind:expr),* $(,)?) => {
        $(
            impl Uniform for $t {
                const KIND: UniformKind = $kind;

                fn data(values: &[Self]) -> UniformData<'_> {
                    UniformData::$variant(Cow::Borrowed(bytemuck::cast_slice::<$t, $scalar>(values)))
                }
            }
        )*
    };
}

pod_uniform!(Float, f32,
    f32 => UniformKind::Float(1),
    Vec2 => UniformKind::Float(2),
    Vec3 => UniformKind::Float(3),
    Vec4 => UniformKind::Float(4),
    [f32; 2] => UniformKind::Float(2),
    [f32; 3] => UniformKind::Float(3),
    [f32; 4] => UniformKind::Float(4),
    Mat2 => UniformKind::Matrix { columns: 2, rows: 2 },
    Mat3 => UniformKind::Matrix { columns: 3, rows: 3 },
    Mat4 => UniformKind::Matrix { columns: 4, rows: 4 },
);

pod_uniform!(Int, i32,
    i32 => UniformKind::Int(1),
    IVec2 => UniformKind::Int(2),
    IVec3 => UniformKind::Int(3),
    IVec4 => UniformKind::Int(4),
    [i32; 2] => UniformKind::Int(2),
    [i32; 3] => UniformKind::Int(3),
    [i32; 4] => UniformKind::Int(4),
);

pod_uniform!(UInt, u32,
    u32 => UniformKind::UInt(1),
    UVec2 => UniformKind::UInt(2),
    UVec3 => UniformKind::UInt(3),
    UVec4 => UniformKind::UInt(4),
    [u32; 2] => UniformKind::UInt(2),
    [u32; 3] => UniformKind::UInt(3),
    [u32; 4] => UniformKind::UInt(4),
);

// Column-major matrices as `[[f32; ROWS]; COLUMNS]`; the only way to reach
// the non-square uploads, since glam has no non-square types.
pod_uniform!(Float, f32,
    [[f32; 2]; 2] => UniformKind::Matrix { columns: 2, rows: 2 },
    [[f32; 3]; 3] => UniformKind::Matrix { columns: 3, rows: 3 },
    [[f32; 4]; 4] => UniformKind::Matrix { columns: 4, rows: 4 },
    [[f32; 3]; 2] => UniformKind::Matrix { columns: 2, rows: 3 },
    [[f32; 2]; 3] => UniformKind::Matrix { columns: 3, rows: 2 },
    [[f32; 4]; 2] => UniformKind::Matrix { columns: 2, rows: 4 },
    [[f32; 2]; 4] => UniformKind::Matrix { columns: 4, rows: 2 },
    [[f32; 4]; 3] => UniformKind::Matrix { columns: 3, rows: 4 },
    [[f32; 3]; 4] => UniformKind::Matrix { columns: 4, rows: 3 },
);

impl Uniform for bool {
    const KIND: UniformKind = UniformKind::Int(1);

    fn data(values: &[Self]) -> UniformData<'_> {
        UniformData::Int(values.iter().map(|&b| b as i32).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalars_and_vectors_pick_their_call() {
        assert_eq!(f32::KIND, UniformKind::Float(1));
        assert_eq!(IVec3::KIND, UniformKind::Int(3));
        assert_eq!(UVec2::KIND, UniformKind::UInt(2));
        assert_eq!(bool::KIND, UniformKind::Int(1));
        assert_eq!(Mat4::KIND.to_string(), "glUniformMatrix4fv");
        assert_eq!(<[[f32; 3]; 2]>::KIND.to_string(), "glUniformMatrix2x3fv");
    }

    #[test]
    fn payload_is_flattened_column_major() {
        let m = Mat2::from_cols(Vec2::new(1.0, 2.0), Vec2::new(3.0, 4.0));
        assert_eq!(
            Mat2::data(&[m]),
            UniformData::Float(Cow::Owned(vec![1.0, 2.0, 3.0, 4.0]))
        );
    }

    #[test]
    fn arrays_carry_every_element() {
        let values = [Vec3::X, Vec3::Y];
        let data = Vec3::data(&values);
        assert_eq!(data.len(), 6);
        assert_eq!(data.len(), values.len() * Vec3::KIND.scalars());
    }

    #[test]
    fn bools_upload_as_ints() {
        assert_eq!(
            bool::data(&[true, false]),
            UniformData::Int(Cow::Owned(vec![1, 0]))
        );
    }

    #[test]
    fn matrix_lookup_rejects_bad_shapes() {
        assert!(UniformKind::matrix(4, 3).is_ok());
        assert!(matches!(
            UniformKind::matrix(1, 4),
            Err(GlazyError::UnsupportedType(_))
        ));
        assert!(UniformKind::matrix(5, 5).is_err());
    }
}
