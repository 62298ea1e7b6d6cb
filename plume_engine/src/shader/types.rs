/// Reflected type graph and byte-size computation
///
/// The SPIR-V type system is modeled as a closed set of variants. Size
/// queries are an exhaustive recursive match over that set.

use crate::error::Result;
use crate::shader::spirv::{dim, storage_class};

const SOURCE: &str = "plume::shader";

/// Image dimensionality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageDim {
    /// 1D image
    D1,
    /// 2D image
    D2,
    /// 3D image
    D3,
    /// Cube map
    Cube,
    /// Texel buffer
    Buffer,
    /// Subpass input attachment
    SubpassData,
}

impl ImageDim {
    /// Decode a SPIR-V `Dim` operand
    pub fn from_spirv(value: u32) -> Result<Self> {
        match value {
            dim::DIM_1D => Ok(ImageDim::D1),
            dim::DIM_2D => Ok(ImageDim::D2),
            dim::DIM_3D => Ok(ImageDim::D3),
            dim::CUBE => Ok(ImageDim::Cube),
            dim::BUFFER => Ok(ImageDim::Buffer),
            dim::SUBPASS_DATA => Ok(ImageDim::SubpassData),
            dim::RECT => Err(crate::plume_err!(SOURCE, UnsupportedConstruct,
                "image dimensionality Rect")),
            dim::TILE_IMAGE_DATA_EXT => Err(crate::plume_err!(SOURCE, UnsupportedConstruct,
                "image dimensionality TileImageDataEXT")),
            other => Err(crate::plume_err!(SOURCE, UnsupportedConstruct,
                "image dimensionality {}", other)),
        }
    }
}

/// Image type operands relevant to descriptor classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImageType {
    pub dim: ImageDim,
    /// 0 = not depth, 1 = depth, 2 = unknown
    pub depth: u32,
    pub arrayed: bool,
    pub multisampled: bool,
    /// 1 = used with a sampler, 2 = storage image, 0 = unknown at compile time
    pub sampled: u32,
}

/// Block decoration carried by a struct type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockKind {
    /// Plain struct
    None,
    /// `Block`: uniform, push-constant, or storage-class storage buffer block
    Block,
    /// `BufferBlock`: legacy storage buffer block in the Uniform storage class
    BufferBlock,
}

/// Matrix layout taken from struct member decorations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MatrixLayout {
    /// `MatrixStride` in bytes
    pub stride: u32,
    /// `RowMajor` decoration present
    pub row_major: bool,
}

/// One struct member
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StructMember {
    /// Debug name (empty if stripped)
    pub name: String,
    /// `Offset` decoration, if any
    pub offset: Option<u32>,
    /// Matrix layout for matrix (or matrix array) members
    pub matrix_layout: Option<MatrixLayout>,
    /// Member carries a `BuiltIn` decoration
    pub builtin: bool,
    pub ty: ReflectedType,
}

/// Struct type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StructType {
    /// Debug name of the type (block name for interface blocks)
    pub name: String,
    pub block: BlockKind,
    pub members: Vec<StructMember>,
}

/// A resolved SPIR-V type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ReflectedType {
    Bool,
    Int { width: u32, signed: bool },
    Float { width: u32 },
    Vector { component: Box<ReflectedType>, count: u32 },
    Matrix { column: Box<ReflectedType>, columns: u32 },
    Array { element: Box<ReflectedType>, length: u32, stride: Option<u32> },
    RuntimeArray { element: Box<ReflectedType>, stride: Option<u32> },
    Struct(StructType),
    Image(ImageType),
    Sampler,
    SampledImage(ImageType),
    AccelerationStructure,
    /// Pointer; the pointee is not followed, pointers may be self-referential
    Pointer { storage_class: u32, pointee: u32 },
}

impl ReflectedType {
    /// Short description for diagnostics
    pub fn describe(&self) -> &'static str {
        match self {
            ReflectedType::Bool => "bool",
            ReflectedType::Int { .. } => "integer",
            ReflectedType::Float { .. } => "float",
            ReflectedType::Vector { .. } => "vector",
            ReflectedType::Matrix { .. } => "matrix",
            ReflectedType::Array { .. } => "array",
            ReflectedType::RuntimeArray { .. } => "runtime array",
            ReflectedType::Struct(_) => "struct",
            ReflectedType::Image(_) => "image",
            ReflectedType::Sampler => "sampler",
            ReflectedType::SampledImage(_) => "sampled image",
            ReflectedType::AccelerationStructure => "acceleration structure",
            ReflectedType::Pointer { .. } => "pointer",
        }
    }

    /// Declared byte size of a value of this type
    pub fn size(&self) -> Result<u32> {
        self.size_with_layout(None)
    }

    /// Declared byte size, honoring a member's matrix layout
    ///
    /// Explicit `ArrayStride` / `MatrixStride` decorations take precedence
    /// over the element sizes. Runtime arrays contribute nothing.
    pub fn size_with_layout(&self, matrix_layout: Option<MatrixLayout>) -> Result<u32> {
        match self {
            ReflectedType::Int { width, .. } | ReflectedType::Float { width } => Ok(width / 8),
            ReflectedType::Vector { component, count } => {
                checked_product(*count, component.size()?)
            }
            ReflectedType::Matrix { column, columns } => match matrix_layout {
                Some(MatrixLayout { stride, row_major: false }) => checked_product(*columns, stride),
                Some(MatrixLayout { stride, row_major: true }) => {
                    let rows = match column.as_ref() {
                        ReflectedType::Vector { count, .. } => *count,
                        _ => 1,
                    };
                    checked_product(rows, stride)
                }
                None => checked_product(*columns, column.size()?),
            },
            ReflectedType::Array { element, length, stride } => match stride {
                Some(stride) => checked_product(*length, *stride),
                None => checked_product(*length, element.size_with_layout(matrix_layout)?),
            },
            ReflectedType::RuntimeArray { .. } => Ok(0),
            ReflectedType::Struct(st) => st.members.iter().try_fold(0u32, |total, member| {
                let size = member.ty.size_with_layout(member.matrix_layout)?;
                total.checked_add(size).ok_or_else(|| crate::plume_err!(SOURCE,
                    MalformedBinary, "size of struct '{}' overflows", st.name))
            }),
            ReflectedType::Pointer { storage_class, .. }
                if *storage_class == storage_class::PHYSICAL_STORAGE_BUFFER => Ok(8),
            ReflectedType::Bool => Err(crate::plume_err!(SOURCE, UnsupportedConstruct,
                "bool has no defined byte size")),
            ReflectedType::Pointer { storage_class, .. } => Err(crate::plume_err!(SOURCE,
                UnsupportedConstruct, "pointer in storage class {} has no byte size", storage_class)),
            ReflectedType::Image(_)
            | ReflectedType::Sampler
            | ReflectedType::SampledImage(_)
            | ReflectedType::AccelerationStructure => Err(crate::plume_err!(SOURCE,
                UnsupportedConstruct, "opaque {} type has no byte size", self.describe())),
        }
    }

    /// Whether this is a struct with any `BuiltIn` member (e.g. `gl_PerVertex`)
    pub fn is_builtin_block(&self) -> bool {
        match self {
            ReflectedType::Struct(st) => st.members.iter().any(|m| m.builtin),
            ReflectedType::Array { element, .. } | ReflectedType::RuntimeArray { element, .. } => {
                element.is_builtin_block()
            }
            _ => false,
        }
    }
}

fn checked_product(count: u32, size: u32) -> Result<u32> {
    count.checked_mul(size).ok_or_else(|| crate::plume_err!(SOURCE, MalformedBinary,
        "type size {} x {} overflows", count, size))
}

#[cfg(test)]
#[path = "types_tests.rs"]
mod tests;
