/// ShaderReflector - SPIR-V interface analysis
///
/// Reflection runs once, at construction, over a validated `ShaderBinary`.
/// It recovers four collections (entry points, stage inputs, push-constant
/// members and descriptors) in declaration order. Any structural violation
/// or unmodeled construct fails the whole reflection; there is no partial
/// result.
///
/// # Example
///
/// ```no_run
/// use plume_engine::plume::{ShaderBinary, ShaderReflector};
///
/// # fn run(bytes: &[u8]) -> plume_engine::plume::Result<()> {
/// let reflector = ShaderReflector::new(ShaderBinary::from_bytes(bytes)?)?;
/// for descriptor in reflector.descriptors() {
///     println!("set {} binding {}: {:?}", descriptor.set, descriptor.binding, descriptor.kind);
/// }
/// # Ok(())
/// # }
/// ```

use std::ops::Range;
use rustc_hash::FxHashSet;
use crate::error::Result;
use crate::shader::binary::{ShaderBinary, SpirvVersion};
use crate::shader::config::ReflectConfig;
use crate::shader::declarations::{Declarations, VariableDecl};
use crate::shader::interface::{
    Descriptor, DescriptorCount, DescriptorKind, EntryPoint, PushConstant, ShaderStage, StageInput,
};
use crate::shader::spirv::{decoration, storage_class};
use crate::shader::types::{BlockKind, ImageDim, ImageType, ReflectedType};

const SOURCE: &str = "plume::shader";

/// Reflected interface of one shader module
#[derive(Debug, Clone)]
pub struct ShaderReflector {
    binary: ShaderBinary,
    entry_points: Vec<EntryPoint>,
    stage_inputs: Vec<StageInput>,
    push_constants: Vec<PushConstant>,
    descriptors: Vec<Descriptor>,
}

impl ShaderReflector {
    /// Reflect `binary` with the default configuration
    pub fn new(binary: ShaderBinary) -> Result<Self> {
        Self::with_config(binary, &ReflectConfig::default())
    }

    /// Reflect `binary`
    ///
    /// # Errors
    ///
    /// - `MalformedBinary` for structural violations (version above
    ///   `config.max_version`, duplicate or out-of-bound ids, dangling
    ///   decoration targets, duplicate entry-point names or bindings)
    /// - `UnsupportedConstruct` for valid but unmodeled features
    pub fn with_config(binary: ShaderBinary, config: &ReflectConfig) -> Result<Self> {
        let version = binary.header().version;
        if version > config.max_version {
            crate::plume_bail!(SOURCE, MalformedBinary,
                "SPIR-V version {} is newer than the configured maximum {}",
                version, config.max_version);
        }

        let decls = Declarations::collect(&binary, config.max_type_depth)?;
        let entry_points = reflect_entry_points(&decls)?;

        let mut stage_inputs = Vec::new();
        let mut push_constants = Vec::new();
        let mut descriptors: Vec<Descriptor> = Vec::new();
        let mut bindings = FxHashSet::default();

        for variable in &decls.variables {
            match variable.storage_class {
                storage_class::INPUT => {
                    if let Some(input) = reflect_stage_input(&decls, variable)? {
                        stage_inputs.push(input);
                    }
                }
                storage_class::PUSH_CONSTANT => {
                    push_constants.extend(reflect_push_constants(&decls, variable)?);
                }
                storage_class::UNIFORM_CONSTANT
                | storage_class::UNIFORM
                | storage_class::STORAGE_BUFFER => {
                    let descriptor = reflect_descriptor(&decls, variable)?;
                    if !bindings.insert((descriptor.set, descriptor.binding)) {
                        crate::plume_bail!(SOURCE, MalformedBinary,
                            "set {} binding {} is declared more than once (again by '{}')",
                            descriptor.set, descriptor.binding, descriptor.name);
                    }
                    descriptors.push(descriptor);
                }
                _ => {}
            }
        }

        crate::plume_debug!(SOURCE,
            "Reflected SPIR-V {} module: {} entry point(s), {} stage input(s), {} push constant(s), {} descriptor(s)",
            version, entry_points.len(), stage_inputs.len(), push_constants.len(), descriptors.len());

        Ok(Self {
            binary,
            entry_points,
            stage_inputs,
            push_constants,
            descriptors,
        })
    }

    // ===== COLLECTIONS =====

    pub fn entry_points(&self) -> &[EntryPoint] {
        &self.entry_points
    }

    /// Entry point names in declaration order
    pub fn entry_point_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.entry_points.iter().map(|e| e.name.as_str())
    }

    pub fn stage_inputs(&self) -> &[StageInput] {
        &self.stage_inputs
    }

    pub fn push_constants(&self) -> &[PushConstant] {
        &self.push_constants
    }

    pub fn descriptors(&self) -> &[Descriptor] {
        &self.descriptors
    }

    // ===== QUERIES =====

    /// The reflected binary, unchanged
    pub fn binary(&self) -> &ShaderBinary {
        &self.binary
    }

    pub fn into_binary(self) -> ShaderBinary {
        self.binary
    }

    pub fn version(&self) -> SpirvVersion {
        self.binary.header().version
    }

    /// Find an entry point by name
    pub fn entry_point(&self, name: &str) -> Option<&EntryPoint> {
        self.entry_points.iter().find(|e| e.name == name)
    }

    /// Descriptors of one set, in declaration order
    pub fn descriptors_in_set(&self, set: u32) -> impl Iterator<Item = &Descriptor> + '_ {
        self.descriptors.iter().filter(move |d| d.set == set)
    }

    /// Number of descriptor set layouts needed (highest set index + 1)
    ///
    /// Saturates at `u32::MAX` for a descriptor in set `u32::MAX`.
    pub fn set_count(&self) -> u32 {
        self.descriptors.iter().map(|d| d.set.saturating_add(1)).max().unwrap_or(0)
    }

    /// Byte range covered by the push-constant members, if any
    pub fn push_constant_range(&self) -> Option<Range<u32>> {
        let start = self.push_constants.iter().map(|p| p.offset).min()?;
        let end = self
            .push_constants
            .iter()
            .map(|p| p.offset.saturating_add(p.size))
            .max()?;
        Some(start..end)
    }
}

// ============================================================================
// Classification
// ============================================================================

fn reflect_entry_points(decls: &Declarations) -> Result<Vec<EntryPoint>> {
    let mut names = FxHashSet::default();
    let mut entry_points = Vec::with_capacity(decls.entry_points.len());
    for decl in &decls.entry_points {
        if !names.insert(decl.name.as_str()) {
            crate::plume_bail!(SOURCE, MalformedBinary,
                "entry point '{}' is declared more than once", decl.name);
        }
        entry_points.push(EntryPoint {
            name: decl.name.clone(),
            stage: ShaderStage::from_execution_model(decl.execution_model)?,
        });
    }
    Ok(entry_points)
}

fn reflect_stage_input(decls: &Declarations, variable: &VariableDecl) -> Result<Option<StageInput>> {
    if decls.decoration(variable.id, decoration::BUILT_IN).is_some() {
        return Ok(None);
    }
    let ty = decls.resolve_type(decls.pointee(variable)?)?;
    if ty.is_builtin_block() {
        return Ok(None);
    }

    let name = decls.name(variable.id);
    let Some(location) = decls.decoration_literal(variable.id, decoration::LOCATION)? else {
        crate::plume_bail!(SOURCE, UnsupportedConstruct,
            "input variable '{}' (id {}) has neither a Location nor a BuiltIn decoration",
            name, variable.id);
    };

    Ok(Some(StageInput {
        location,
        size: ty.size()?,
        name: name.to_string(),
    }))
}

fn reflect_push_constants(decls: &Declarations, variable: &VariableDecl) -> Result<Vec<PushConstant>> {
    let ReflectedType::Struct(block) = decls.resolve_type(decls.pointee(variable)?)? else {
        crate::plume_bail!(SOURCE, UnsupportedConstruct,
            "push constant variable '{}' is not a struct block", decls.name(variable.id));
    };

    let mut members = Vec::with_capacity(block.members.len());
    for (index, member) in block.members.iter().enumerate() {
        let Some(offset) = member.offset else {
            crate::plume_bail!(SOURCE, MalformedBinary,
                "push constant member {} ('{}') of block '{}' has no Offset decoration",
                index, member.name, block.name);
        };
        members.push(PushConstant {
            index: index as u32,
            size: member.ty.size_with_layout(member.matrix_layout)?,
            offset,
            name: member.name.clone(),
        });
    }
    Ok(members)
}

fn reflect_descriptor(decls: &Declarations, variable: &VariableDecl) -> Result<Descriptor> {
    let var_name = decls.name(variable.id);
    let binding = decls.decoration_literal(variable.id, decoration::BINDING)?;
    let set = decls.decoration_literal(variable.id, decoration::DESCRIPTOR_SET)?;

    let (set, binding) = match (set, binding) {
        (set, Some(binding)) => (set.unwrap_or(0), binding),
        (Some(set), None) => crate::plume_bail!(SOURCE, MalformedBinary,
            "resource variable '{}' (id {}) is in set {} but has no Binding decoration",
            var_name, variable.id, set),
        (None, None) => crate::plume_bail!(SOURCE, UnsupportedConstruct,
            "resource variable '{}' (id {}) without DescriptorSet/Binding decorations",
            var_name, variable.id),
    };

    let ty = decls.resolve_type(decls.pointee(variable)?)?;
    let (count, resource) = peel_arrays(&ty, var_name)?;
    let kind = descriptor_kind(variable.storage_class, resource, var_name)?;

    let name = match resource {
        ReflectedType::Struct(block) if var_name.is_empty() => block.name.clone(),
        _ => var_name.to_string(),
    };

    Ok(Descriptor { set, binding, count, kind, name })
}

/// Strip array layers, multiplying their lengths into a descriptor count
fn peel_arrays<'a>(ty: &'a ReflectedType, name: &str) -> Result<(DescriptorCount, &'a ReflectedType)> {
    let mut count = 1u32;
    let mut unbounded = false;
    let mut current = ty;
    loop {
        match current {
            ReflectedType::Array { element, length, .. } => {
                count = count.checked_mul(*length).ok_or_else(|| crate::plume_err!(SOURCE,
                    MalformedBinary, "descriptor count of '{}' overflows", name))?;
                current = element.as_ref();
            }
            ReflectedType::RuntimeArray { element, .. } => {
                unbounded = true;
                current = element.as_ref();
            }
            _ => break,
        }
    }
    let count = if unbounded { DescriptorCount::Unbounded } else { DescriptorCount::Fixed(count) };
    Ok((count, current))
}

fn descriptor_kind(class: u32, resource: &ReflectedType, name: &str) -> Result<DescriptorKind> {
    let kind = match (class, resource) {
        (storage_class::STORAGE_BUFFER, ReflectedType::Struct(_)) => DescriptorKind::StorageBuffer,
        (storage_class::UNIFORM, ReflectedType::Struct(block)) => match block.block {
            BlockKind::BufferBlock => DescriptorKind::StorageBuffer,
            BlockKind::Block | BlockKind::None => DescriptorKind::UniformBuffer,
        },
        (storage_class::UNIFORM_CONSTANT, ReflectedType::Sampler) => DescriptorKind::Sampler,
        (storage_class::UNIFORM_CONSTANT, ReflectedType::SampledImage(image)) => match image.dim {
            ImageDim::Buffer => DescriptorKind::UniformTexelBuffer,
            _ => DescriptorKind::CombinedImageSampler,
        },
        (storage_class::UNIFORM_CONSTANT, ReflectedType::Image(image)) => image_kind(image, name)?,
        (storage_class::UNIFORM_CONSTANT, ReflectedType::AccelerationStructure) => {
            DescriptorKind::AccelerationStructure
        }
        (class, other) => crate::plume_bail!(SOURCE, UnsupportedConstruct,
            "resource '{}' of {} type in storage class {}", name, other.describe(), class),
    };
    Ok(kind)
}

fn image_kind(image: &ImageType, name: &str) -> Result<DescriptorKind> {
    let kind = match (image.dim, image.sampled) {
        (ImageDim::SubpassData, _) => DescriptorKind::InputAttachment,
        (ImageDim::Buffer, 1) => DescriptorKind::UniformTexelBuffer,
        (ImageDim::Buffer, 2) => DescriptorKind::StorageTexelBuffer,
        (_, 1) => DescriptorKind::SampledImage,
        (_, 2) => DescriptorKind::StorageImage,
        (_, sampled) => crate::plume_bail!(SOURCE, UnsupportedConstruct,
            "image '{}' with Sampled operand {} (sampling unknown at compile time)", name, sampled),
    };
    Ok(kind)
}

#[cfg(test)]
#[path = "reflector_tests.rs"]
mod tests;
