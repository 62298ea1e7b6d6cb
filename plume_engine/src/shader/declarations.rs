/// Declarations - single linear walk over a module's instructions
///
/// Records names, decorations, types, constants, global variables and entry
/// points into id-indexed tables, then validates cross references. Type ids
/// are later resolved into owned `ReflectedType` trees on demand.

use rustc_hash::{FxHashMap, FxHashSet};
use crate::error::Result;
use crate::shader::binary::{Instruction, ShaderBinary};
use crate::shader::spirv::{self, decoration, op, storage_class, ResultId};
use crate::shader::types::{
    BlockKind, ImageDim, ImageType, MatrixLayout, ReflectedType, StructMember, StructType,
};

const SOURCE: &str = "plume::shader";

/// One decoration with its literal (or id) operands
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Decoration {
    pub kind: u32,
    pub operands: Vec<u32>,
}

/// Raw type declaration, still referring to other ids
#[derive(Debug, Clone, PartialEq, Eq)]
enum TypeDecl {
    Bool,
    Int { width: u32, signed: bool },
    Float { width: u32 },
    Vector { component: u32, count: u32 },
    Matrix { column: u32, columns: u32 },
    Image { dim: u32, depth: u32, arrayed: bool, multisampled: bool, sampled: u32 },
    Sampler,
    SampledImage { image: u32 },
    Array { element: u32, length: u32 },
    RuntimeArray { element: u32 },
    Struct { members: Vec<u32> },
    Pointer { storage_class: u32, pointee: u32 },
    AccelerationStructure,
    /// Declared but not part of the reflected model
    Other { opcode: u32 },
}

/// Scalar constant usable as an array length
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConstantValue {
    Literal(u64),
    SpecDefault(u64),
    /// Computed by OpSpecConstantOp
    Computed,
}

/// Module-scope OpVariable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct VariableDecl {
    pub id: u32,
    pub pointer_type: u32,
    pub storage_class: u32,
}

/// OpEntryPoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct EntryPointDecl {
    pub execution_model: u32,
    pub function: u32,
    pub name: String,
}

/// Reference from a name or decoration to another id
#[derive(Debug, Clone, Copy)]
struct Reference {
    target: u32,
    member: Option<u32>,
    what: &'static str,
}

/// Everything reflection needs from one module
pub(crate) struct Declarations {
    names: FxHashMap<u32, String>,
    member_names: FxHashMap<(u32, u32), String>,
    decorations: FxHashMap<u32, Vec<Decoration>>,
    member_decorations: FxHashMap<(u32, u32), Vec<Decoration>>,
    types: FxHashMap<u32, TypeDecl>,
    constants: FxHashMap<u32, ConstantValue>,
    defined: FxHashSet<u32>,
    references: Vec<Reference>,
    group_targets: Vec<(u32, Vec<u32>)>,
    group_member_targets: Vec<(u32, Vec<(u32, u32)>)>,
    max_type_depth: u32,
    /// Module-scope variables in declaration order
    pub variables: Vec<VariableDecl>,
    /// Entry points in declaration order
    pub entry_points: Vec<EntryPointDecl>,
}

impl Declarations {
    /// Walk `binary` once and validate all cross references
    pub fn collect(binary: &ShaderBinary, max_type_depth: u32) -> Result<Self> {
        let mut decls = Declarations {
            names: FxHashMap::default(),
            member_names: FxHashMap::default(),
            decorations: FxHashMap::default(),
            member_decorations: FxHashMap::default(),
            types: FxHashMap::default(),
            constants: FxHashMap::default(),
            defined: FxHashSet::default(),
            references: Vec::new(),
            group_targets: Vec::new(),
            group_member_targets: Vec::new(),
            max_type_depth,
            variables: Vec::new(),
            entry_points: Vec::new(),
        };

        let bound = binary.header().bound;
        let mut in_function = false;

        for inst in binary.instructions() {
            let inst = inst?;

            let result = match spirv::result_id(inst.opcode) {
                Some(result) => result,
                None => crate::plume_bail!(SOURCE, UnsupportedConstruct,
                    "unknown opcode {} at word {}", inst.opcode, inst.offset),
            };
            if let ResultId::At(position) = result {
                let id = inst.word(position)?;
                if id == 0 || id >= bound {
                    crate::plume_bail!(SOURCE, MalformedBinary,
                        "result id {} at word {} is outside the id bound {}", id, inst.offset, bound);
                }
                if !decls.defined.insert(id) {
                    crate::plume_bail!(SOURCE, MalformedBinary,
                        "id {} is defined more than once (again at word {})", id, inst.offset);
                }
            }

            match inst.opcode {
                op::FUNCTION => in_function = true,
                op::FUNCTION_END => in_function = false,
                op::VARIABLE if !in_function => decls.record_variable(&inst)?,
                _ => decls.record(&inst)?,
            }
        }

        decls.apply_decoration_groups();
        decls.validate_references()?;
        Ok(decls)
    }

    fn record(&mut self, inst: &Instruction<'_>) -> Result<()> {
        match inst.opcode {
            op::NAME => {
                let target = inst.word(0)?;
                let (name, _) = inst.string(1)?;
                self.reference(target, None, "OpName");
                self.names.insert(target, name);
            }
            op::MEMBER_NAME => {
                let target = inst.word(0)?;
                let member = inst.word(1)?;
                let (name, _) = inst.string(2)?;
                self.reference(target, Some(member), "OpMemberName");
                self.member_names.insert((target, member), name);
            }
            op::DECORATE | op::DECORATE_ID | op::DECORATE_STRING => {
                let target = inst.word(0)?;
                let kind = inst.word(1)?;
                self.reference(target, None, "decoration");
                self.decorations.entry(target).or_default().push(Decoration {
                    kind,
                    operands: inst.rest(2).to_vec(),
                });
            }
            op::MEMBER_DECORATE | op::MEMBER_DECORATE_STRING => {
                let target = inst.word(0)?;
                let member = inst.word(1)?;
                let kind = inst.word(2)?;
                self.reference(target, Some(member), "member decoration");
                self.member_decorations.entry((target, member)).or_default().push(Decoration {
                    kind,
                    operands: inst.rest(3).to_vec(),
                });
            }
            op::GROUP_DECORATE => {
                let group = inst.word(0)?;
                let targets = inst.rest(1).to_vec();
                self.reference(group, None, "OpGroupDecorate");
                for &target in &targets {
                    self.reference(target, None, "group decoration");
                }
                self.group_targets.push((group, targets));
            }
            op::GROUP_MEMBER_DECORATE => {
                let group = inst.word(0)?;
                let pairs = inst.rest(1);
                if pairs.len() % 2 != 0 {
                    crate::plume_bail!(SOURCE, MalformedBinary,
                        "OpGroupMemberDecorate at word {} has an unpaired target", inst.offset);
                }
                self.reference(group, None, "OpGroupMemberDecorate");
                let pairs: Vec<(u32, u32)> = pairs.chunks_exact(2).map(|p| (p[0], p[1])).collect();
                for &(target, member) in &pairs {
                    self.reference(target, Some(member), "group member decoration");
                }
                self.group_member_targets.push((group, pairs));
            }
            op::ENTRY_POINT => {
                let execution_model = inst.word(0)?;
                let function = inst.word(1)?;
                let (name, _) = inst.string(2)?;
                self.reference(function, None, "OpEntryPoint");
                self.entry_points.push(EntryPointDecl { execution_model, function, name });
            }
            op::CONSTANT | op::SPEC_CONSTANT => {
                let id = inst.word(1)?;
                let low = inst.word(2)? as u64;
                let high = inst.rest(3).first().copied().unwrap_or(0) as u64;
                let value = (high << 32) | low;
                let constant = if inst.opcode == op::CONSTANT {
                    ConstantValue::Literal(value)
                } else {
                    ConstantValue::SpecDefault(value)
                };
                self.constants.insert(id, constant);
            }
            op::SPEC_CONSTANT_OP => {
                self.constants.insert(inst.word(1)?, ConstantValue::Computed);
            }
            opcode if spirv::is_type_declaration(opcode) => {
                let id = inst.word(0)?;
                let decl = Self::decode_type(inst)?;
                self.types.insert(id, decl);
            }
            _ => {}
        }
        Ok(())
    }

    fn decode_type(inst: &Instruction<'_>) -> Result<TypeDecl> {
        let decl = match inst.opcode {
            op::TYPE_BOOL => TypeDecl::Bool,
            op::TYPE_INT => TypeDecl::Int { width: inst.word(1)?, signed: inst.word(2)? != 0 },
            op::TYPE_FLOAT => TypeDecl::Float { width: inst.word(1)? },
            op::TYPE_VECTOR => TypeDecl::Vector { component: inst.word(1)?, count: inst.word(2)? },
            op::TYPE_MATRIX => TypeDecl::Matrix { column: inst.word(1)?, columns: inst.word(2)? },
            op::TYPE_IMAGE => TypeDecl::Image {
                dim: inst.word(2)?,
                depth: inst.word(3)?,
                arrayed: inst.word(4)? != 0,
                multisampled: inst.word(5)? != 0,
                sampled: inst.word(6)?,
            },
            op::TYPE_SAMPLER => TypeDecl::Sampler,
            op::TYPE_SAMPLED_IMAGE => TypeDecl::SampledImage { image: inst.word(1)? },
            op::TYPE_ARRAY => TypeDecl::Array { element: inst.word(1)?, length: inst.word(2)? },
            op::TYPE_RUNTIME_ARRAY => TypeDecl::RuntimeArray { element: inst.word(1)? },
            op::TYPE_STRUCT => TypeDecl::Struct { members: inst.rest(1).to_vec() },
            op::TYPE_POINTER => TypeDecl::Pointer {
                storage_class: inst.word(1)?,
                pointee: inst.word(2)?,
            },
            op::TYPE_ACCELERATION_STRUCTURE_KHR => TypeDecl::AccelerationStructure,
            opcode => TypeDecl::Other { opcode },
        };
        Ok(decl)
    }

    fn record_variable(&mut self, inst: &Instruction<'_>) -> Result<()> {
        self.variables.push(VariableDecl {
            pointer_type: inst.word(0)?,
            id: inst.word(1)?,
            storage_class: inst.word(2)?,
        });
        Ok(())
    }

    fn reference(&mut self, target: u32, member: Option<u32>, what: &'static str) {
        self.references.push(Reference { target, member, what });
    }

    /// Copy decorations attached to decoration groups onto the grouped targets
    fn apply_decoration_groups(&mut self) {
        for (group, targets) in &self.group_targets {
            let Some(group_decorations) = self.decorations.get(group).cloned() else {
                continue;
            };
            for target in targets {
                self.decorations
                    .entry(*target)
                    .or_default()
                    .extend(group_decorations.iter().cloned());
            }
        }
        for (group, pairs) in &self.group_member_targets {
            let Some(group_decorations) = self.decorations.get(group).cloned() else {
                continue;
            };
            for pair in pairs {
                self.member_decorations
                    .entry(*pair)
                    .or_default()
                    .extend(group_decorations.iter().cloned());
            }
        }
    }

    /// Every name/decoration target must exist; member targets must be
    /// struct types with that many members
    fn validate_references(&self) -> Result<()> {
        for reference in &self.references {
            if !self.defined.contains(&reference.target) {
                crate::plume_bail!(SOURCE, MalformedBinary,
                    "{} references id {} which is never defined", reference.what, reference.target);
            }
            if let Some(member) = reference.member {
                match self.types.get(&reference.target) {
                    Some(TypeDecl::Struct { members }) if (member as usize) < members.len() => {}
                    Some(TypeDecl::Struct { members }) => crate::plume_bail!(SOURCE, MalformedBinary,
                        "{} targets member {} of struct {} which has {} members",
                        reference.what, member, reference.target, members.len()),
                    _ => crate::plume_bail!(SOURCE, MalformedBinary,
                        "{} targets id {} which is not a struct type", reference.what, reference.target),
                }
            }
        }
        Ok(())
    }

    // ===== QUERIES =====

    /// Debug name of `id`, empty if stripped
    pub fn name(&self, id: u32) -> &str {
        self.names.get(&id).map(String::as_str).unwrap_or("")
    }

    /// First decoration of `kind` on `id`
    pub fn decoration(&self, id: u32, kind: u32) -> Option<&Decoration> {
        self.decorations.get(&id)?.iter().find(|d| d.kind == kind)
    }

    /// Single-literal decoration value on `id`
    pub fn decoration_literal(&self, id: u32, kind: u32) -> Result<Option<u32>> {
        match self.decoration(id, kind) {
            None => Ok(None),
            Some(d) => match d.operands.first() {
                Some(&value) => Ok(Some(value)),
                None => Err(crate::plume_err!(SOURCE, MalformedBinary,
                    "decoration {} on id {} is missing its operand", kind, id)),
            },
        }
    }

    fn member_decoration(&self, ty: u32, member: u32, kind: u32) -> Option<&Decoration> {
        self.member_decorations.get(&(ty, member))?.iter().find(|d| d.kind == kind)
    }

    fn member_decoration_literal(&self, ty: u32, member: u32, kind: u32) -> Result<Option<u32>> {
        match self.member_decoration(ty, member, kind) {
            None => Ok(None),
            Some(d) => match d.operands.first() {
                Some(&value) => Ok(Some(value)),
                None => Err(crate::plume_err!(SOURCE, MalformedBinary,
                    "member decoration {} on member {} of struct {} is missing its operand",
                    kind, member, ty)),
            },
        }
    }

    /// Pointee type id of a variable's pointer type
    pub fn pointee(&self, variable: &VariableDecl) -> Result<u32> {
        match self.types.get(&variable.pointer_type) {
            Some(TypeDecl::Pointer { pointee, .. }) => Ok(*pointee),
            _ => Err(crate::plume_err!(SOURCE, MalformedBinary,
                "variable {} has type {} which is not a pointer type",
                variable.id, variable.pointer_type)),
        }
    }

    /// Resolve a type id into an owned type tree
    pub fn resolve_type(&self, id: u32) -> Result<ReflectedType> {
        self.resolve_at_depth(id, 0)
    }

    fn resolve_at_depth(&self, id: u32, depth: u32) -> Result<ReflectedType> {
        if depth > self.max_type_depth {
            crate::plume_bail!(SOURCE, MalformedBinary,
                "type nesting deeper than {} levels at id {}", self.max_type_depth, id);
        }
        let Some(decl) = self.types.get(&id) else {
            crate::plume_bail!(SOURCE, MalformedBinary, "id {} is not a declared type", id);
        };
        let next = depth + 1;

        let ty = match decl {
            TypeDecl::Bool => ReflectedType::Bool,
            TypeDecl::Int { width, signed } => ReflectedType::Int { width: *width, signed: *signed },
            TypeDecl::Float { width } => ReflectedType::Float { width: *width },
            TypeDecl::Vector { component, count } => ReflectedType::Vector {
                component: Box::new(self.resolve_at_depth(*component, next)?),
                count: *count,
            },
            TypeDecl::Matrix { column, columns } => ReflectedType::Matrix {
                column: Box::new(self.resolve_at_depth(*column, next)?),
                columns: *columns,
            },
            TypeDecl::Image { dim, depth: image_depth, arrayed, multisampled, sampled } => {
                ReflectedType::Image(ImageType {
                    dim: ImageDim::from_spirv(*dim)?,
                    depth: *image_depth,
                    arrayed: *arrayed,
                    multisampled: *multisampled,
                    sampled: *sampled,
                })
            }
            TypeDecl::Sampler => ReflectedType::Sampler,
            TypeDecl::SampledImage { image } => match self.resolve_at_depth(*image, next)? {
                ReflectedType::Image(image) => ReflectedType::SampledImage(image),
                other => crate::plume_bail!(SOURCE, MalformedBinary,
                    "sampled image {} wraps a {} instead of an image", id, other.describe()),
            },
            TypeDecl::Array { element, length } => ReflectedType::Array {
                element: Box::new(self.resolve_at_depth(*element, next)?),
                length: self.array_length(id, *length)?,
                stride: self.decoration_literal(id, decoration::ARRAY_STRIDE)?,
            },
            TypeDecl::RuntimeArray { element } => ReflectedType::RuntimeArray {
                element: Box::new(self.resolve_at_depth(*element, next)?),
                stride: self.decoration_literal(id, decoration::ARRAY_STRIDE)?,
            },
            TypeDecl::Struct { members } => ReflectedType::Struct(self.resolve_struct(id, members, next)?),
            TypeDecl::Pointer { storage_class, pointee } => {
                if *storage_class != storage_class::PHYSICAL_STORAGE_BUFFER {
                    crate::plume_bail!(SOURCE, UnsupportedConstruct,
                        "pointer type {} in storage class {} inside an interface type", id, storage_class);
                }
                ReflectedType::Pointer { storage_class: *storage_class, pointee: *pointee }
            }
            TypeDecl::AccelerationStructure => ReflectedType::AccelerationStructure,
            TypeDecl::Other { opcode } => crate::plume_bail!(SOURCE, UnsupportedConstruct,
                "type {} declared by {}", id, spirv::type_opcode_name(*opcode)),
        };
        Ok(ty)
    }

    fn resolve_struct(&self, id: u32, members: &[u32], depth: u32) -> Result<StructType> {
        let block = if self.decoration(id, decoration::BUFFER_BLOCK).is_some() {
            BlockKind::BufferBlock
        } else if self.decoration(id, decoration::BLOCK).is_some() {
            BlockKind::Block
        } else {
            BlockKind::None
        };

        let mut resolved = Vec::with_capacity(members.len());
        for (index, &member_type) in members.iter().enumerate() {
            let index = index as u32;
            let matrix_layout = self
                .member_decoration_literal(id, index, decoration::MATRIX_STRIDE)?
                .map(|stride| MatrixLayout {
                    stride,
                    row_major: self.member_decoration(id, index, decoration::ROW_MAJOR).is_some(),
                });
            resolved.push(StructMember {
                name: self.member_names.get(&(id, index)).cloned().unwrap_or_default(),
                offset: self.member_decoration_literal(id, index, decoration::OFFSET)?,
                matrix_layout,
                builtin: self.member_decoration(id, index, decoration::BUILT_IN).is_some(),
                ty: self.resolve_at_depth(member_type, depth)?,
            });
        }

        Ok(StructType {
            name: self.name(id).to_string(),
            block,
            members: resolved,
        })
    }

    fn array_length(&self, array: u32, length_id: u32) -> Result<u32> {
        let value = match self.constants.get(&length_id) {
            Some(ConstantValue::Literal(v)) | Some(ConstantValue::SpecDefault(v)) => *v,
            Some(ConstantValue::Computed) => crate::plume_bail!(SOURCE, UnsupportedConstruct,
                "array {} has a length computed by OpSpecConstantOp", array),
            None => crate::plume_bail!(SOURCE, MalformedBinary,
                "array {} length id {} is not an integer constant", array, length_id),
        };
        match u32::try_from(value) {
            Ok(0) => Err(crate::plume_err!(SOURCE, MalformedBinary, "array {} has length 0", array)),
            Ok(length) => Ok(length),
            Err(_) => Err(crate::plume_err!(SOURCE, UnsupportedConstruct,
                "array {} length {} does not fit in 32 bits", array, value)),
        }
    }
}

#[cfg(test)]
#[path = "declarations_tests.rs"]
mod tests;
