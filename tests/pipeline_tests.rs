//! Pipeline Tests
//!
//! End-to-end runs of the demo setup code against the recording backend:
//! - the shipped shaders compile and expose the inputs the demos look up
//! - a frame binds, uploads and draws, then leaves every target unbound
//! - debug error checks name the operation that failed

use glam::{IVec2, Mat4, Vec2, Vec3};
use pretty_assertions::assert_eq;

use glazy::backend::recording::Call;
use glazy::shader::{Fragment, Vertex};
use glazy::{
    load_shader, shape, AttributeLayout, AttributeUpload, BindTarget, Buffer, BufferUsage,
    Context, GlazyError, Primitive, Program, RecordingBackend, ScalarKind, UniformData,
    UniformKind, VertexArray,
};

fn setup() -> (RecordingBackend, Context) {
    let gl = RecordingBackend::new();
    let ctx = Context::new(gl.clone());
    (gl, ctx)
}

// ============================================================================
// Shipped Shader Tests
// ============================================================================

#[test]
fn shipped_shaders_declare_demo_inputs() {
    let (_gl, ctx) = setup();

    let quad = Program::new(
        &ctx,
        &load_shader!(&ctx, Vertex, "../shaders/quad/quad.vert").unwrap(),
        &load_shader!(&ctx, Fragment, "../shaders/quad/quad.frag").unwrap(),
    )
    .unwrap();
    assert!(quad.attribute_index("point").is_ok());

    let camera = Program::new(
        &ctx,
        &load_shader!(&ctx, Vertex, "../shaders/camera/camera.vert").unwrap(),
        &load_shader!(&ctx, Fragment, "../shaders/camera/camera.frag").unwrap(),
    )
    .unwrap();
    for name in ["modl_transform", "view_transform", "proj_transform", "show_model"] {
        assert!(camera.uniform_location(name).is_ok(), "{}", name);
    }

    let texture = Program::new(
        &ctx,
        &load_shader!(&ctx, Vertex, "../shaders/texture/texture.vert").unwrap(),
        &load_shader!(&ctx, Fragment, "../shaders/texture/texture.frag").unwrap(),
    )
    .unwrap();
    assert_eq!(texture.attribute_index("pos").unwrap(), 0);
    assert_eq!(texture.attribute_index("uv").unwrap(), 1);

    let tictactoe = Program::new(
        &ctx,
        &load_shader!(&ctx, Vertex, "../shaders/tictactoe/tictactoe.vert").unwrap(),
        &load_shader!(&ctx, Fragment, "../shaders/tictactoe/tictactoe.frag").unwrap(),
    )
    .unwrap();
    for name in ["the_texture", "offset", "scale", "dim"] {
        assert!(tictactoe.uniform_location(name).is_ok(), "{}", name);
    }
}

#[test]
fn broken_shader_reports_compile_log() {
    let (_gl, ctx) = setup();
    let source = "#version 410 core\nvoid main() {\n  gl_Position = vec4(0.0));\n}\n";
    let err = glazy::VertexShader::new(&ctx, source).unwrap_err();
    let GlazyError::Compile { stage, log } = &err else {
        panic!("expected compile error, got {:?}", err);
    };
    assert_eq!(*stage, "Vertex");
    assert!(log.contains("0:3"), "{}", log);
    assert!(err.to_string().contains(log.as_str()));
}

// ============================================================================
// Frame Tests
// ============================================================================

#[test]
fn a_frame_draws_and_leaves_nothing_bound() {
    let (gl, ctx) = setup();
    let program = Program::new(
        &ctx,
        &load_shader!(&ctx, Vertex, "../shaders/camera/camera.vert").unwrap(),
        &load_shader!(&ctx, Fragment, "../shaders/camera/camera.frag").unwrap(),
    )
    .unwrap();
    let points = Buffer::with_data(&ctx, &shape::sphere(8, 4, 1.0), BufferUsage::StaticDraw).unwrap();
    let vao = VertexArray::new(&ctx).unwrap();
    vao.attribute(program.attribute_index("point").unwrap())
        .enable()
        .unwrap()
        .set_buffer(&points)
        .unwrap();
    gl.clear_calls();

    {
        let _program = program.bind();
        program.set_uniform("modl_transform", &Mat4::IDENTITY).unwrap();
        program.set_uniform("show_world", &true).unwrap();
        let _vao = vao.bind();
        ctx.draw_arrays(Primitive::Triangles, 0, points.len()).unwrap();
    }

    let calls = gl.calls();
    assert_eq!(calls.first(), Some(&Call::Bind { target: BindTarget::Program, id: program.id() }));
    assert!(calls.contains(&Call::Uniform {
        program: program.id(),
        location: program.uniform_location("show_world").unwrap().index(),
        kind: UniformKind::Int(1),
        data: UniformData::Int(vec![1].into()),
    }));
    assert!(calls.contains(&Call::DrawArrays {
        mode: Primitive::Triangles,
        first: 0,
        count: 8 * 4 * 6,
    }));
    // Uniform uploads reuse the outer binding instead of rebinding
    assert_eq!(gl.binds(BindTarget::Program), vec![program.id(), 0]);
    assert_eq!(gl.bound(BindTarget::VertexArray), 0);
}

#[test]
fn integer_and_float_attributes_take_their_own_paths() {
    let (gl, ctx) = setup();
    let vao = VertexArray::new(&ctx).unwrap();
    let cells = Buffer::with_data(&ctx, &[IVec2::new(1, 2)], BufferUsage::StaticDraw).unwrap();
    let uvs = Buffer::with_data(&ctx, &[Vec2::ONE], BufferUsage::StaticDraw).unwrap();
    let wide = Buffer::with_data(&ctx, &[[0.5f64; 3]], BufferUsage::StaticDraw).unwrap();
    vao.attribute(0).set_buffer(&cells).unwrap();
    vao.attribute(1).set_buffer(&uvs).unwrap();
    vao.attribute(2).set_buffer(&wide).unwrap();

    let layouts: Vec<AttributeLayout> = gl
        .calls()
        .into_iter()
        .filter_map(|call| match call {
            Call::VertexAttribPointer { layout, .. } => Some(layout),
            _ => None,
        })
        .collect();
    assert_eq!(
        layouts,
        vec![
            AttributeLayout { components: 2, scalar: ScalarKind::Int, upload: AttributeUpload::Integer },
            AttributeLayout { components: 2, scalar: ScalarKind::Float, upload: AttributeUpload::Float },
            AttributeLayout { components: 3, scalar: ScalarKind::Double, upload: AttributeUpload::Float },
        ]
    );
}

// ============================================================================
// Debug Check Tests
// ============================================================================

#[test]
fn debug_mode_blames_the_failing_operation() {
    let (gl, ctx) = setup();
    ctx.set_debug(true);
    let program = Program::new(
        &ctx,
        &load_shader!(&ctx, Vertex, "../shaders/quad/quad.vert").unwrap(),
        &load_shader!(&ctx, Fragment, "../shaders/quad/quad.frag").unwrap(),
    )
    .unwrap();
    let vao = VertexArray::new(&ctx).unwrap();
    let points = Buffer::with_data(&ctx, &[Vec3::ZERO], BufferUsage::StaticDraw).unwrap();
    vao.attribute(program.attribute_index("point").unwrap())
        .set_buffer(&points)
        .unwrap();

    // Simulate the driver rejecting the draw
    gl.push_error(glow::INVALID_OPERATION);
    let err = {
        let _program = program.bind();
        let _vao = vao.bind();
        ctx.draw_arrays(Primitive::Triangles, 0, 1).unwrap_err()
    };
    assert_eq!(err.to_string(), "GL error 0x0502 during before draw_arrays");
    assert!(ctx.check_errors("after").is_ok());
}
