//! SPIR-V enumerants used by the reflector
//!
//! Only the enumerants that reflection inspects are listed. Values come from
//! the unified SPIR-V headers. Instruction shapes (where the result id sits)
//! are taken from the `rspirv` core grammar table instead.

use rspirv::grammar::{CoreInstructionTable, OperandKind};

/// Magic number in the first word of every module
pub const MAGIC: u32 = 0x0723_0203;

/// Number of words in the module header
pub const HEADER_WORDS: usize = 5;

/// Instruction opcodes
pub mod op {
    pub const NOP: u32 = 0;
    pub const NAME: u32 = 5;
    pub const MEMBER_NAME: u32 = 6;
    pub const ENTRY_POINT: u32 = 15;
    pub const CAPABILITY: u32 = 17;
    pub const TYPE_VOID: u32 = 19;
    pub const TYPE_BOOL: u32 = 20;
    pub const TYPE_INT: u32 = 21;
    pub const TYPE_FLOAT: u32 = 22;
    pub const TYPE_VECTOR: u32 = 23;
    pub const TYPE_MATRIX: u32 = 24;
    pub const TYPE_IMAGE: u32 = 25;
    pub const TYPE_SAMPLER: u32 = 26;
    pub const TYPE_SAMPLED_IMAGE: u32 = 27;
    pub const TYPE_ARRAY: u32 = 28;
    pub const TYPE_RUNTIME_ARRAY: u32 = 29;
    pub const TYPE_STRUCT: u32 = 30;
    pub const TYPE_OPAQUE: u32 = 31;
    pub const TYPE_POINTER: u32 = 32;
    pub const TYPE_FUNCTION: u32 = 33;
    pub const TYPE_EVENT: u32 = 34;
    pub const TYPE_DEVICE_EVENT: u32 = 35;
    pub const TYPE_RESERVE_ID: u32 = 36;
    pub const TYPE_QUEUE: u32 = 37;
    pub const TYPE_PIPE: u32 = 38;
    pub const CONSTANT: u32 = 43;
    pub const SPEC_CONSTANT: u32 = 50;
    pub const SPEC_CONSTANT_OP: u32 = 52;
    pub const FUNCTION: u32 = 54;
    pub const FUNCTION_END: u32 = 56;
    pub const VARIABLE: u32 = 59;
    pub const DECORATE: u32 = 71;
    pub const MEMBER_DECORATE: u32 = 72;
    pub const DECORATION_GROUP: u32 = 73;
    pub const GROUP_DECORATE: u32 = 74;
    pub const GROUP_MEMBER_DECORATE: u32 = 75;
    pub const TYPE_PIPE_STORAGE: u32 = 322;
    pub const TYPE_NAMED_BARRIER: u32 = 327;
    pub const DECORATE_ID: u32 = 332;
    pub const TYPE_COOPERATIVE_MATRIX_KHR: u32 = 4456;
    pub const TYPE_RAY_QUERY_KHR: u32 = 4472;
    pub const TYPE_ACCELERATION_STRUCTURE_KHR: u32 = 5341;
    pub const DECORATE_STRING: u32 = 5632;
    pub const MEMBER_DECORATE_STRING: u32 = 5633;
}

/// Decorations
pub mod decoration {
    pub const SPEC_ID: u32 = 1;
    pub const BLOCK: u32 = 2;
    pub const BUFFER_BLOCK: u32 = 3;
    pub const ROW_MAJOR: u32 = 4;
    pub const COL_MAJOR: u32 = 5;
    pub const ARRAY_STRIDE: u32 = 6;
    pub const MATRIX_STRIDE: u32 = 7;
    pub const BUILT_IN: u32 = 11;
    pub const LOCATION: u32 = 30;
    pub const COMPONENT: u32 = 31;
    pub const BINDING: u32 = 33;
    pub const DESCRIPTOR_SET: u32 = 34;
    pub const OFFSET: u32 = 35;
    pub const INPUT_ATTACHMENT_INDEX: u32 = 43;
}

/// Storage classes
pub mod storage_class {
    pub const UNIFORM_CONSTANT: u32 = 0;
    pub const INPUT: u32 = 1;
    pub const UNIFORM: u32 = 2;
    pub const OUTPUT: u32 = 3;
    pub const WORKGROUP: u32 = 4;
    pub const PRIVATE: u32 = 6;
    pub const FUNCTION: u32 = 7;
    pub const PUSH_CONSTANT: u32 = 9;
    pub const STORAGE_BUFFER: u32 = 12;
    pub const PHYSICAL_STORAGE_BUFFER: u32 = 5349;
}

/// Execution models
pub mod execution_model {
    pub const VERTEX: u32 = 0;
    pub const TESSELLATION_CONTROL: u32 = 1;
    pub const TESSELLATION_EVALUATION: u32 = 2;
    pub const GEOMETRY: u32 = 3;
    pub const FRAGMENT: u32 = 4;
    pub const GL_COMPUTE: u32 = 5;
    pub const KERNEL: u32 = 6;
    pub const TASK_NV: u32 = 5267;
    pub const MESH_NV: u32 = 5268;
    pub const RAY_GENERATION_KHR: u32 = 5313;
    pub const INTERSECTION_KHR: u32 = 5314;
    pub const ANY_HIT_KHR: u32 = 5315;
    pub const CLOSEST_HIT_KHR: u32 = 5316;
    pub const MISS_KHR: u32 = 5317;
    pub const CALLABLE_KHR: u32 = 5318;
    pub const TASK_EXT: u32 = 5364;
    pub const MESH_EXT: u32 = 5365;
}

/// Image dimensionalities
pub mod dim {
    pub const DIM_1D: u32 = 0;
    pub const DIM_2D: u32 = 1;
    pub const DIM_3D: u32 = 2;
    pub const CUBE: u32 = 3;
    pub const RECT: u32 = 4;
    pub const BUFFER: u32 = 5;
    pub const SUBPASS_DATA: u32 = 6;
    pub const TILE_IMAGE_DATA_EXT: u32 = 4173;
}

/// Human-readable name of a type-declaring opcode, for diagnostics
pub fn type_opcode_name(opcode: u32) -> &'static str {
    match opcode {
        op::TYPE_VOID => "OpTypeVoid",
        op::TYPE_BOOL => "OpTypeBool",
        op::TYPE_INT => "OpTypeInt",
        op::TYPE_FLOAT => "OpTypeFloat",
        op::TYPE_VECTOR => "OpTypeVector",
        op::TYPE_MATRIX => "OpTypeMatrix",
        op::TYPE_IMAGE => "OpTypeImage",
        op::TYPE_SAMPLER => "OpTypeSampler",
        op::TYPE_SAMPLED_IMAGE => "OpTypeSampledImage",
        op::TYPE_ARRAY => "OpTypeArray",
        op::TYPE_RUNTIME_ARRAY => "OpTypeRuntimeArray",
        op::TYPE_STRUCT => "OpTypeStruct",
        op::TYPE_OPAQUE => "OpTypeOpaque",
        op::TYPE_POINTER => "OpTypePointer",
        op::TYPE_FUNCTION => "OpTypeFunction",
        op::TYPE_EVENT => "OpTypeEvent",
        op::TYPE_DEVICE_EVENT => "OpTypeDeviceEvent",
        op::TYPE_RESERVE_ID => "OpTypeReserveId",
        op::TYPE_QUEUE => "OpTypeQueue",
        op::TYPE_PIPE => "OpTypePipe",
        op::TYPE_PIPE_STORAGE => "OpTypePipeStorage",
        op::TYPE_NAMED_BARRIER => "OpTypeNamedBarrier",
        op::TYPE_COOPERATIVE_MATRIX_KHR => "OpTypeCooperativeMatrixKHR",
        op::TYPE_RAY_QUERY_KHR => "OpTypeRayQueryKHR",
        op::TYPE_ACCELERATION_STRUCTURE_KHR => "OpTypeAccelerationStructureKHR",
        _ => "unknown type opcode",
    }
}

/// Whether `opcode` declares a type (its result id is operand 0)
pub fn is_type_declaration(opcode: u32) -> bool {
    matches!(
        opcode,
        op::TYPE_VOID..=op::TYPE_PIPE
            | op::TYPE_PIPE_STORAGE
            | op::TYPE_NAMED_BARRIER
            | op::TYPE_COOPERATIVE_MATRIX_KHR
            | op::TYPE_RAY_QUERY_KHR
            | op::TYPE_ACCELERATION_STRUCTURE_KHR
    )
}

/// Where an instruction places its result id
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultId {
    /// The instruction defines no id
    Absent,
    /// The result id is the operand at this index
    At(usize),
}

/// Result-id shape of `opcode`, read from the SPIR-V core grammar
///
/// Returns `None` for opcodes the grammar does not know.
pub fn result_id(opcode: u32) -> Option<ResultId> {
    let opcode = u16::try_from(opcode).ok()?;
    let grammar = CoreInstructionTable::lookup_opcode(opcode)?;
    let position = grammar
        .operands
        .iter()
        .position(|operand| matches!(operand.kind, OperandKind::IdResult));
    Some(position.map_or(ResultId::Absent, ResultId::At))
}

#[cfg(test)]
#[path = "spirv_tests.rs"]
mod tests;
