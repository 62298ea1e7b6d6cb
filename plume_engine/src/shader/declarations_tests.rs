//! Unit tests for declarations.rs
//!
//! Tests the declaration walk, id bookkeeping, decoration groups, target
//! validation and type resolution.

use crate::error::{Error, Result};
use crate::shader::binary::ShaderBinary;
use crate::shader::declarations::Declarations;
use crate::shader::spirv::{decoration, dim, execution_model, op, storage_class};
use crate::shader::spirv_test_utils::{instruction, SpirvBuilder};
use crate::shader::types::{BlockKind, ImageDim, MatrixLayout, ReflectedType};

fn collect(b: &SpirvBuilder) -> Result<Declarations> {
    collect_with_depth(b, 64)
}

fn collect_with_depth(b: &SpirvBuilder, depth: u32) -> Result<Declarations> {
    let binary = ShaderBinary::from_words(b.build()).unwrap();
    Declarations::collect(&binary, depth)
}

fn expect_malformed(result: Result<Declarations>, needle: &str) {
    match result {
        Err(Error::MalformedBinary(msg)) => assert!(msg.contains(needle), "message: {}", msg),
        Err(other) => panic!("expected MalformedBinary, got {:?}", other),
        Ok(_) => panic!("expected MalformedBinary, got Ok"),
    }
}

// ============================================================================
// WALK TESTS
// ============================================================================

#[test]
fn test_records_names_and_decorations() {
    let mut b = SpirvBuilder::new();
    let float = b.type_float(32);
    let var = b.pointer_variable(float, storage_class::INPUT);
    b.name(var, "in_weight").decorate(var, decoration::LOCATION, &[3]);

    let decls = collect(&b).unwrap();
    assert_eq!(decls.name(var), "in_weight");
    assert_eq!(decls.decoration_literal(var, decoration::LOCATION).unwrap(), Some(3));
    assert_eq!(decls.decoration_literal(var, decoration::BINDING).unwrap(), None);
    assert_eq!(decls.name(float), "");
}

#[test]
fn test_records_entry_points_in_order() {
    let mut b = SpirvBuilder::new();
    let vs = b.entry_point(0, "vs_main");
    let fs = b.entry_point(4, "fs_main");

    let decls = collect(&b).unwrap();
    assert_eq!(decls.entry_points.len(), 2);
    assert_eq!(decls.entry_points[0].name, "vs_main");
    assert_eq!(decls.entry_points[0].function, vs);
    assert_eq!(decls.entry_points[1].name, "fs_main");
    assert_eq!(decls.entry_points[1].execution_model, 4);
    assert_eq!(decls.entry_points[1].function, fs);
}

#[test]
fn test_function_local_variables_are_not_globals() {
    let mut b = SpirvBuilder::new();
    let float = b.type_float(32);
    let global = b.pointer_variable(float, storage_class::PRIVATE);
    b.local_variable(float);

    let decls = collect(&b).unwrap();
    assert_eq!(decls.variables.len(), 1);
    assert_eq!(decls.variables[0].id, global);
    assert_eq!(decls.variables[0].storage_class, storage_class::PRIVATE);
}

#[test]
fn test_decoration_without_operand_is_malformed() {
    let mut b = SpirvBuilder::new();
    let float = b.type_float(32);
    let var = b.pointer_variable(float, storage_class::INPUT);
    b.decorate(var, decoration::LOCATION, &[]);

    let decls = collect(&b).unwrap();
    assert!(matches!(
        decls.decoration_literal(var, decoration::LOCATION),
        Err(Error::MalformedBinary(_))
    ));
}

// ============================================================================
// FUNCTION BODIES
// ============================================================================

const OP_UNDEF: u32 = 1;
const OP_CONSTANT_TRUE: u32 = 41;
const OP_CONSTANT_COMPOSITE: u32 = 44;
const OP_LOAD: u32 = 61;
const OP_ACCESS_CHAIN: u32 = 65;
const OP_ATOMIC_FLAG_CLEAR: u32 = 318;
const OP_NAMED_BARRIER_INITIALIZE: u32 = 328;
const OP_MEMORY_NAMED_BARRIER: u32 = 329;
const OP_COOPERATIVE_MATRIX_STORE_KHR: u32 = 4458;
const OP_RAY_QUERY_INITIALIZE_KHR: u32 = 4473;
const OP_RAY_QUERY_TERMINATE_KHR: u32 = 4474;
const OP_RAY_QUERY_GENERATE_INTERSECTION_KHR: u32 = 4475;
const OP_RAY_QUERY_CONFIRM_INTERSECTION_KHR: u32 = 4476;
const OP_BEGIN_INVOCATION_INTERLOCK_EXT: u32 = 5364;
const OP_END_INVOCATION_INTERLOCK_EXT: u32 = 5365;
const OP_ASSUME_TRUE_KHR: u32 = 5630;

#[test]
fn test_invocation_interlock_in_body() {
    let mut b = SpirvBuilder::new();
    b.capability(5378); // FragmentShaderPixelInterlockEXT
    let mut body = instruction(OP_BEGIN_INVOCATION_INTERLOCK_EXT, &[]);
    body.extend(instruction(OP_END_INVOCATION_INTERLOCK_EXT, &[]));
    b.entry_point_with_body(execution_model::FRAGMENT, "main", &body);

    let decls = collect(&b).unwrap();
    assert_eq!(decls.entry_points.len(), 1);
    assert_eq!(decls.entry_points[0].name, "main");
}

#[test]
fn test_ray_query_in_body() {
    let mut b = SpirvBuilder::new();
    b.capability(4472); // RayQueryKHR
    let accel = b.type_acceleration_structure();
    let scene = b.pointer_variable(accel, storage_class::UNIFORM_CONSTANT);
    b.decorate(scene, decoration::DESCRIPTOR_SET, &[0]).decorate(scene, decoration::BINDING, &[0]);

    let ray_query = b.id();
    b.global(op::TYPE_RAY_QUERY_KHR, &[ray_query]);
    let query_ptr = b.type_pointer(storage_class::FUNCTION, ray_query);
    let float = b.type_float(32);
    let vec3 = b.type_vector(float, 3);
    let (zero, one, far) = (b.id(), b.id(), b.id());
    b.global(op::CONSTANT, &[float, zero, 0])
        .global(op::CONSTANT, &[float, one, 0x3f80_0000])
        .global(op::CONSTANT, &[float, far, 0x447a_0000]);
    let (origin, direction) = (b.id(), b.id());
    b.global(OP_CONSTANT_COMPOSITE, &[vec3, origin, zero, zero, zero])
        .global(OP_CONSTANT_COMPOSITE, &[vec3, direction, zero, zero, one]);
    let flags = b.constant_u32(0);
    let cull_mask = b.constant_u32(0xff);

    let (query, loaded) = (b.id(), b.id());
    let mut body = instruction(op::VARIABLE, &[query_ptr, query, storage_class::FUNCTION]);
    body.extend(instruction(OP_LOAD, &[accel, loaded, scene]));
    body.extend(instruction(
        OP_RAY_QUERY_INITIALIZE_KHR,
        &[query, loaded, flags, cull_mask, origin, zero, direction, far],
    ));
    body.extend(instruction(OP_RAY_QUERY_GENERATE_INTERSECTION_KHR, &[query, far]));
    body.extend(instruction(OP_RAY_QUERY_CONFIRM_INTERSECTION_KHR, &[query]));
    body.extend(instruction(OP_RAY_QUERY_TERMINATE_KHR, &[query]));
    b.entry_point_with_body(execution_model::GL_COMPUTE, "main", &body);

    let decls = collect(&b).unwrap();
    assert_eq!(decls.variables.len(), 1);
    assert_eq!(decls.variables[0].id, scene);
    assert_eq!(decls.decoration_literal(scene, decoration::BINDING).unwrap(), Some(0));
}

#[test]
fn test_barrier_flag_assume_and_matrix_store_in_body() {
    let mut b = SpirvBuilder::new();
    let float = b.type_float(32);
    let int = b.type_int(32, true);
    let flag = b.pointer_variable(int, storage_class::WORKGROUP);

    let data = b.type_runtime_array(float);
    b.decorate(data, decoration::ARRAY_STRIDE, &[4]);
    let block = b.type_struct(&[data]);
    b.decorate(block, decoration::BLOCK, &[])
        .member_decorate(block, 0, decoration::OFFSET, &[0]);
    let output = b.pointer_variable(block, storage_class::STORAGE_BUFFER);
    b.decorate(output, decoration::DESCRIPTOR_SET, &[0]).decorate(output, decoration::BINDING, &[0]);
    let element_ptr = b.type_pointer(storage_class::STORAGE_BUFFER, float);

    let zero = b.constant_u32(0);
    let device_scope = b.constant_u32(1);
    let workgroup_scope = b.constant_u32(2);
    let sixteen = b.constant_u32(16);
    let bool_type = b.type_bool();
    let yes = b.id();
    b.global(OP_CONSTANT_TRUE, &[bool_type, yes]);
    let barrier_type = b.id();
    b.global(op::TYPE_NAMED_BARRIER, &[barrier_type]);
    let matrix_type = b.id();
    b.global(op::TYPE_COOPERATIVE_MATRIX_KHR, &[matrix_type, float, workgroup_scope, sixteen, sixteen, zero]);

    let (barrier, matrix, element) = (b.id(), b.id(), b.id());
    let mut body = instruction(OP_ATOMIC_FLAG_CLEAR, &[flag, device_scope, zero]);
    body.extend(instruction(OP_NAMED_BARRIER_INITIALIZE, &[barrier_type, barrier, sixteen]));
    body.extend(instruction(OP_MEMORY_NAMED_BARRIER, &[barrier, workgroup_scope, zero]));
    body.extend(instruction(OP_ASSUME_TRUE_KHR, &[yes]));
    body.extend(instruction(OP_UNDEF, &[matrix_type, matrix]));
    body.extend(instruction(OP_ACCESS_CHAIN, &[element_ptr, element, output, zero, zero]));
    body.extend(instruction(OP_COOPERATIVE_MATRIX_STORE_KHR, &[element, matrix, zero, sixteen]));
    b.entry_point_with_body(execution_model::GL_COMPUTE, "main", &body);

    let decls = collect(&b).unwrap();
    assert_eq!(decls.variables.len(), 2);
    assert_eq!(decls.variables[1].id, output);
}

#[test]
fn test_unknown_opcode_is_unsupported() {
    let mut b = SpirvBuilder::new();
    let body = instruction(0xfff0, &[7]);
    b.entry_point_with_body(execution_model::GL_COMPUTE, "main", &body);

    match collect(&b) {
        Err(Error::UnsupportedConstruct(msg)) => assert!(msg.contains("65520"), "message: {}", msg),
        other => panic!("expected UnsupportedConstruct, got {:?}", other.map(|_| ())),
    }
}

// ============================================================================
// ID BOOKKEEPING
// ============================================================================

#[test]
fn test_id_outside_bound_is_malformed() {
    let mut b = SpirvBuilder::new();
    b.type_float(32);
    b.set_bound(2);
    expect_malformed(collect(&b), "outside the id bound");
}

#[test]
fn test_duplicate_definition_is_malformed() {
    let mut b = SpirvBuilder::new();
    let float = b.type_float(32);
    b.global(op::TYPE_FLOAT, &[float, 32]);
    expect_malformed(collect(&b), "defined more than once");
}

// ============================================================================
// TARGET VALIDATION
// ============================================================================

#[test]
fn test_dangling_decoration_target_is_malformed() {
    let mut b = SpirvBuilder::new();
    b.decorate(999, decoration::LOCATION, &[0]);
    expect_malformed(collect(&b), "999");
}

#[test]
fn test_dangling_name_target_is_malformed() {
    let mut b = SpirvBuilder::new();
    b.name(4242, "ghost");
    expect_malformed(collect(&b), "never defined");
}

#[test]
fn test_dangling_entry_point_function_is_malformed() {
    let mut b = SpirvBuilder::new();
    b.declare_entry_point(0, 77, "main");
    expect_malformed(collect(&b), "OpEntryPoint");
}

#[test]
fn test_member_decoration_on_non_struct_is_malformed() {
    let mut b = SpirvBuilder::new();
    let float = b.type_float(32);
    b.member_decorate(float, 0, decoration::OFFSET, &[0]);
    expect_malformed(collect(&b), "not a struct");
}

#[test]
fn test_member_index_out_of_range_is_malformed() {
    let mut b = SpirvBuilder::new();
    let float = b.type_float(32);
    let st = b.type_struct(&[float, float]);
    b.member_name(st, 2, "extra");
    expect_malformed(collect(&b), "has 2 members");
}

// ============================================================================
// DECORATION GROUPS
// ============================================================================

#[test]
fn test_decoration_group_is_flattened_onto_targets() {
    let mut b = SpirvBuilder::new();
    let group = b.id();
    let float = b.type_float(32);
    let a = b.pointer_variable(float, storage_class::UNIFORM_CONSTANT);
    let c = b.pointer_variable(float, storage_class::UNIFORM_CONSTANT);
    b.decorate(group, decoration::DESCRIPTOR_SET, &[2])
        .raw_annotation(op::DECORATION_GROUP, &[group])
        .raw_annotation(op::GROUP_DECORATE, &[group, a, c]);

    let decls = collect(&b).unwrap();
    assert_eq!(decls.decoration_literal(a, decoration::DESCRIPTOR_SET).unwrap(), Some(2));
    assert_eq!(decls.decoration_literal(c, decoration::DESCRIPTOR_SET).unwrap(), Some(2));
}

#[test]
fn test_group_member_decorate_is_flattened_onto_members() {
    let mut b = SpirvBuilder::new();
    let group = b.id();
    let float = b.type_float(32);
    let st = b.type_struct(&[float, float]);
    b.decorate(group, decoration::OFFSET, &[8])
        .raw_annotation(op::DECORATION_GROUP, &[group])
        .raw_annotation(op::GROUP_MEMBER_DECORATE, &[group, st, 1]);

    let decls = collect(&b).unwrap();
    let ReflectedType::Struct(resolved) = decls.resolve_type(st).unwrap() else {
        panic!("expected a struct");
    };
    assert_eq!(resolved.members[0].offset, None);
    assert_eq!(resolved.members[1].offset, Some(8));
}

// ============================================================================
// TYPE RESOLUTION
// ============================================================================

#[test]
fn test_resolve_struct_with_layout_decorations() {
    let mut b = SpirvBuilder::new();
    let float = b.type_float(32);
    let vec3 = b.type_vector(float, 3);
    let vec4 = b.type_vector(float, 4);
    let mat4 = b.type_matrix(vec4, 4);
    let st = b.type_struct(&[mat4, vec3]);
    b.name(st, "Globals")
        .member_name(st, 0, "model")
        .member_name(st, 1, "eye")
        .decorate(st, decoration::BLOCK, &[])
        .member_decorate(st, 0, decoration::OFFSET, &[0])
        .member_decorate(st, 0, decoration::COL_MAJOR, &[])
        .member_decorate(st, 0, decoration::MATRIX_STRIDE, &[16])
        .member_decorate(st, 1, decoration::OFFSET, &[64]);

    let decls = collect(&b).unwrap();
    let ty = decls.resolve_type(st).unwrap();
    let ReflectedType::Struct(ref resolved) = ty else {
        panic!("expected a struct, got {:?}", ty);
    };

    assert_eq!(resolved.name, "Globals");
    assert_eq!(resolved.block, BlockKind::Block);
    assert_eq!(resolved.members[0].name, "model");
    assert_eq!(resolved.members[0].offset, Some(0));
    assert_eq!(
        resolved.members[0].matrix_layout,
        Some(MatrixLayout { stride: 16, row_major: false })
    );
    assert_eq!(resolved.members[1].name, "eye");
    assert_eq!(resolved.members[1].offset, Some(64));
    assert_eq!(ty.size().unwrap(), 76);
}

#[test]
fn test_resolve_buffer_block_and_array_stride() {
    let mut b = SpirvBuilder::new();
    let float = b.type_float(32);
    let arr = b.type_array(float, 8);
    b.decorate(arr, decoration::ARRAY_STRIDE, &[16]);
    let st = b.type_struct(&[arr]);
    b.decorate(st, decoration::BUFFER_BLOCK, &[]);

    let decls = collect(&b).unwrap();
    let ty = decls.resolve_type(st).unwrap();
    match &ty {
        ReflectedType::Struct(resolved) => {
            assert_eq!(resolved.block, BlockKind::BufferBlock);
            assert_eq!(
                resolved.members[0].ty,
                ReflectedType::Array {
                    element: Box::new(ReflectedType::Float { width: 32 }),
                    length: 8,
                    stride: Some(16),
                }
            );
        }
        other => panic!("expected a struct, got {:?}", other),
    }
    assert_eq!(ty.size().unwrap(), 128);
}

#[test]
fn test_resolve_sampled_image() {
    let mut b = SpirvBuilder::new();
    let float = b.type_float(32);
    let image = b.type_image(float, dim::CUBE, 0, true, false, 1);
    let sampled = b.type_sampled_image(image);

    let decls = collect(&b).unwrap();
    match decls.resolve_type(sampled).unwrap() {
        ReflectedType::SampledImage(image) => {
            assert_eq!(image.dim, ImageDim::Cube);
            assert!(image.arrayed);
            assert!(!image.multisampled);
            assert_eq!(image.sampled, 1);
        }
        other => panic!("expected a sampled image, got {:?}", other),
    }
}

#[test]
fn test_array_length_from_spec_constant_default() {
    let mut b = SpirvBuilder::new();
    let sampler = b.type_sampler();
    let length = b.spec_constant_u32(6);
    let arr = b.type_array_with_length_id(sampler, length);

    let decls = collect(&b).unwrap();
    match decls.resolve_type(arr).unwrap() {
        ReflectedType::Array { length, .. } => assert_eq!(length, 6),
        other => panic!("expected an array, got {:?}", other),
    }
}

#[test]
fn test_array_length_from_spec_constant_op_is_unsupported() {
    let mut b = SpirvBuilder::new();
    let sampler = b.type_sampler();
    let uint = b.type_int(32, false);
    let base = b.spec_constant_u32(2);
    let computed = b.id();
    // IAdd (opcode 128) of the spec constant with itself
    b.global(op::SPEC_CONSTANT_OP, &[uint, computed, 128, base, base]);
    let arr = b.type_array_with_length_id(sampler, computed);

    let decls = collect(&b).unwrap();
    assert!(matches!(decls.resolve_type(arr), Err(Error::UnsupportedConstruct(_))));
}

#[test]
fn test_zero_array_length_is_malformed() {
    let mut b = SpirvBuilder::new();
    let float = b.type_float(32);
    let arr = b.type_array(float, 0);

    let decls = collect(&b).unwrap();
    assert!(matches!(decls.resolve_type(arr), Err(Error::MalformedBinary(_))));
}

#[test]
fn test_wide_array_length_constant() {
    let mut b = SpirvBuilder::new();
    let float = b.type_float(32);
    let ulong = b.type_int(64, false);
    let small = b.id();
    let huge = b.id();
    b.global(op::CONSTANT, &[ulong, small, 5, 0]);
    b.global(op::CONSTANT, &[ulong, huge, 0, 1]);
    let ok = b.type_array_with_length_id(float, small);
    let too_long = b.type_array_with_length_id(float, huge);

    let decls = collect(&b).unwrap();
    assert!(matches!(decls.resolve_type(ok).unwrap(), ReflectedType::Array { length: 5, .. }));
    assert!(matches!(decls.resolve_type(too_long), Err(Error::UnsupportedConstruct(_))));
}

#[test]
fn test_type_depth_limit() {
    let mut b = SpirvBuilder::new();
    let float = b.type_float(32);
    let inner = b.type_array(float, 2);
    let middle = b.type_array(inner, 2);
    let outer = b.type_array(middle, 2);

    assert!(collect_with_depth(&b, 3).unwrap().resolve_type(outer).is_ok());
    match collect_with_depth(&b, 2).unwrap().resolve_type(outer) {
        Err(Error::MalformedBinary(msg)) => assert!(msg.contains("deeper than 2")),
        other => panic!("expected MalformedBinary, got {:?}", other),
    }
}

#[test]
fn test_unmodeled_type_opcode_is_named() {
    let mut b = SpirvBuilder::new();
    let event = b.id();
    b.global(op::TYPE_EVENT, &[event]);

    let decls = collect(&b).unwrap();
    match decls.resolve_type(event) {
        Err(Error::UnsupportedConstruct(msg)) => assert!(msg.contains("OpTypeEvent")),
        other => panic!("expected UnsupportedConstruct, got {:?}", other),
    }
}

#[test]
fn test_logical_pointer_inside_type_is_unsupported() {
    let mut b = SpirvBuilder::new();
    let float = b.type_float(32);
    let ptr = b.type_pointer(storage_class::UNIFORM, float);
    let st = b.type_struct(&[ptr]);

    let decls = collect(&b).unwrap();
    assert!(matches!(decls.resolve_type(st), Err(Error::UnsupportedConstruct(_))));
}

#[test]
fn test_resolving_a_non_type_is_malformed() {
    let mut b = SpirvBuilder::new();
    let c = b.constant_u32(3);

    let decls = collect(&b).unwrap();
    assert!(matches!(decls.resolve_type(c), Err(Error::MalformedBinary(_))));
}
