//! Runtime description of a compound pixel type: the pair
//! (scalar kind, compound layout). Lets type-erased code reflect
//! on what an opaque image holds.

use std::fmt;
use std::str::FromStr;

use crate::errors::ImageError;

/// Closed set of scalar sample kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ScalarKind {
    Undefined,
    U8,
    I8,
    U16,
    I16,
    U32,
    I32,
    U64,
    I64,
    F32,
    F64,
}

/// Closed set of channel layouts. The last four are descriptor-only
/// kinds (no image implements them).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CompoundKind {
    Undefined,
    Scalar,
    Pixel3,
    Pixel4,
    Complex,
    Coordinate,
    Vector,
    Map,
    Object,
}

const SCALAR_NAMES : [(ScalarKind, &str); 11] = [
    (ScalarKind::Undefined, "undefined"),
    (ScalarKind::U8, "u8"),
    (ScalarKind::I8, "i8"),
    (ScalarKind::U16, "u16"),
    (ScalarKind::I16, "i16"),
    (ScalarKind::U32, "u32"),
    (ScalarKind::I32, "i32"),
    (ScalarKind::U64, "u64"),
    (ScalarKind::I64, "i64"),
    (ScalarKind::F32, "f32"),
    (ScalarKind::F64, "f64"),
];

const COMPOUND_NAMES : [(CompoundKind, &str); 9] = [
    (CompoundKind::Undefined, "undefined"),
    (CompoundKind::Scalar, "scalar"),
    (CompoundKind::Pixel3, "pixel3"),
    (CompoundKind::Pixel4, "pixel4"),
    (CompoundKind::Complex, "complex"),
    (CompoundKind::Coordinate, "coordinate"),
    (CompoundKind::Vector, "vector"),
    (CompoundKind::Map, "map"),
    (CompoundKind::Object, "object"),
];

impl ScalarKind {
    pub const ALL : [ScalarKind; 11] = [
        ScalarKind::Undefined, ScalarKind::U8, ScalarKind::I8, ScalarKind::U16,
        ScalarKind::I16, ScalarKind::U32, ScalarKind::I32, ScalarKind::U64,
        ScalarKind::I64, ScalarKind::F32, ScalarKind::F64,
    ];

    pub fn name(&self) -> &'static str {
        SCALAR_NAMES.iter().find(|(kind, _)| kind == self).map(|(_, name)| *name).unwrap_or("undefined")
    }

    pub fn from_name(name : &str) -> Option<ScalarKind> {
        SCALAR_NAMES.iter().find(|(_, n)| *n == name).map(|(kind, _)| *kind)
    }

    /// Stable on-disk code, used by the raw codec.
    pub fn code(&self) -> u8 {
        Self::ALL.iter().position(|kind| kind == self).unwrap_or(0) as u8
    }

    pub fn from_code(code : u8) -> Option<ScalarKind> {
        Self::ALL.get(code as usize).copied()
    }

    /// Size in bytes of one sample, 0 when undefined.
    pub fn size_of(&self) -> usize {
        match self {
            ScalarKind::Undefined => 0,
            ScalarKind::U8 | ScalarKind::I8 => 1,
            ScalarKind::U16 | ScalarKind::I16 => 2,
            ScalarKind::U32 | ScalarKind::I32 | ScalarKind::F32 => 4,
            ScalarKind::U64 | ScalarKind::I64 | ScalarKind::F64 => 8,
        }
    }
}

impl CompoundKind {
    pub const ALL : [CompoundKind; 9] = [
        CompoundKind::Undefined, CompoundKind::Scalar, CompoundKind::Pixel3,
        CompoundKind::Pixel4, CompoundKind::Complex, CompoundKind::Coordinate,
        CompoundKind::Vector, CompoundKind::Map, CompoundKind::Object,
    ];

    pub fn name(&self) -> &'static str {
        COMPOUND_NAMES.iter().find(|(kind, _)| kind == self).map(|(_, name)| *name).unwrap_or("undefined")
    }

    pub fn from_name(name : &str) -> Option<CompoundKind> {
        COMPOUND_NAMES.iter().find(|(_, n)| *n == name).map(|(kind, _)| *kind)
    }

    pub fn code(&self) -> u8 {
        Self::ALL.iter().position(|kind| kind == self).unwrap_or(0) as u8
    }

    pub fn from_code(code : u8) -> Option<CompoundKind> {
        Self::ALL.get(code as usize).copied()
    }
}

/// `TypeDescriptor` identifies a compound pixel type at runtime.
///
/// Equality is structural. The canonical text form is
/// `"<scalar>:<compound>"`, e.g. `"u8:scalar"` or `"f64:complex"`;
/// the fully undefined descriptor prints as `"undefined"`.
///
/// ## Example
///
/// ```
/// use yayi_core::{TypeDescriptor, ScalarKind, CompoundKind};
///
/// let t = TypeDescriptor::new(ScalarKind::U16, CompoundKind::Pixel3);
/// assert_eq!(t.to_string(), "u16:pixel3");
/// assert_eq!(TypeDescriptor::create("u16:pixel3"), t);
/// assert_eq!(TypeDescriptor::create("garbage"), TypeDescriptor::UNDEFINED);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeDescriptor {
    pub scalar : ScalarKind,
    pub compound : CompoundKind,
}

impl TypeDescriptor {
    pub const UNDEFINED : TypeDescriptor = TypeDescriptor {
        scalar : ScalarKind::Undefined,
        compound : CompoundKind::Undefined,
    };

    pub const fn new(scalar : ScalarKind, compound : CompoundKind) -> TypeDescriptor {
        TypeDescriptor { scalar, compound }
    }

    pub const fn scalar(scalar : ScalarKind) -> TypeDescriptor {
        TypeDescriptor::new(scalar, CompoundKind::Scalar)
    }

    pub fn is_undefined(&self) -> bool {
        *self == TypeDescriptor::UNDEFINED
    }

    /// Parses the canonical text form, returning `UNDEFINED`
    /// for anything unrecognized.
    pub fn create(text : &str) -> TypeDescriptor {
        text.parse().unwrap_or(TypeDescriptor::UNDEFINED)
    }

    /// Every representable descriptor.
    pub fn all() -> impl Iterator<Item = TypeDescriptor> {
        ScalarKind::ALL.into_iter().flat_map(|scalar| {
            CompoundKind::ALL.into_iter().map(move |compound| TypeDescriptor::new(scalar, compound))
        })
    }
}

impl Default for TypeDescriptor {
    fn default() -> Self {
        TypeDescriptor::UNDEFINED
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f : &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_undefined() {
            return write!(f, "undefined");
        }
        write!(f, "{}:{}", self.scalar.name(), self.compound.name())
    }
}

impl FromStr for TypeDescriptor {
    type Err = ImageError;

    fn from_str(text : &str) -> Result<Self, Self::Err> {
        let trimmed = text.trim();
        if trimmed == "undefined" {
            return Ok(TypeDescriptor::UNDEFINED);
        }
        let unrecognized = || ImageError::BadParameters(
            format!("Unrecognized pixel type description '{}'", text)
        );
        let (scalar, compound) = trimmed.split_once(':').ok_or_else(unrecognized)?;
        Ok(TypeDescriptor::new(
            ScalarKind::from_name(scalar).ok_or_else(unrecognized)?,
            CompoundKind::from_name(compound).ok_or_else(unrecognized)?,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_every_descriptor() {
        let mut count = 0;
        for t in TypeDescriptor::all() {
            assert_eq!(TypeDescriptor::create(&t.to_string()), t, "failed on {}", t);
            count += 1;
        }
        assert_eq!(count, ScalarKind::ALL.len() * CompoundKind::ALL.len());
    }

    #[test]
    fn test_unrecognized_text() {
        for text in ["", "u8", "u8:", ":scalar", "u9:scalar", "u8:pixel5", "u8:scalar:x"] {
            assert_eq!(TypeDescriptor::create(text), TypeDescriptor::UNDEFINED, "accepted '{}'", text);
        }
        assert!("u8-scalar".parse::<TypeDescriptor>().is_err());
        assert_eq!(TypeDescriptor::create("undefined:undefined"), TypeDescriptor::UNDEFINED);
    }

    #[test]
    fn test_codes() {
        for kind in ScalarKind::ALL {
            assert_eq!(ScalarKind::from_code(kind.code()), Some(kind));
        }
        for kind in CompoundKind::ALL {
            assert_eq!(CompoundKind::from_code(kind.code()), Some(kind));
        }
        assert_eq!(ScalarKind::from_code(200), None);
        assert_eq!(ScalarKind::F64.size_of(), 8);
    }
}
