// Camera demo - an orbiting sphere under model, view and projection
// transforms. M, W and V overlay a grid in model, world and view space.

use anyhow::Result;
use glam::{Mat4, Vec3};
use glazy::app::{self, FrameInfo, Scene};
use glazy::config::Config;
use glazy::shader::{Fragment, Vertex};
use glazy::{load_shader, shape, Buffer, BufferUsage, Context, Primitive, Program, VertexArray};
use winit::event::ElementState;
use winit::keyboard::KeyCode;

struct CameraDemo {
    program: Program,
    vao: VertexArray,
    points: Buffer<Vec3>,
    show_model: bool,
    show_world: bool,
    show_view: bool,
}

impl Scene for CameraDemo {
    const TITLE: &'static str = "Camera Demo";

    fn init(ctx: &Context, _config: &Config) -> Result<Self> {
        let vertex = load_shader!(ctx, Vertex, "../../shaders/camera/camera.vert")?;
        let fragment = load_shader!(ctx, Fragment, "../../shaders/camera/camera.frag")?;
        let program = Program::new(ctx, &vertex, &fragment)?;

        let points = Buffer::with_data(ctx, &shape::sphere(100, 100, 1.0), BufferUsage::StaticDraw)?;
        let vao = VertexArray::new(ctx)?;
        vao.attribute(program.attribute_index("point")?)
            .enable()?
            .set_buffer(&points)?;

        Ok(Self {
            program,
            vao,
            points,
            show_model: false,
            show_world: false,
            show_view: false,
        })
    }

    fn render(&mut self, ctx: &Context, frame: &FrameInfo) -> Result<()> {
        let time = frame.time;
        let proj = Mat4::perspective_rh_gl(80f32.to_radians(), frame.aspect(), 0.1, 1000.0);
        let modl = Mat4::from_translation(Vec3::new(
            (time * 0.1).cos() * 4.0,
            (time * 0.1).sin() * 4.0,
            0.0,
        )) * Mat4::from_rotation_y(time);
        let view = Mat4::from_translation(Vec3::new(0.0, 0.0, -7.0 + (time * 0.5).cos() * 4.0));

        let _program = self.program.bind();
        self.program.set_uniform("modl_transform", &modl)?;
        self.program.set_uniform("view_transform", &view)?;
        self.program.set_uniform("proj_transform", &proj)?;
        self.program.set_uniform("show_model", &self.show_model)?;
        self.program.set_uniform("show_world", &self.show_world)?;
        self.program.set_uniform("show_view", &self.show_view)?;

        let _vao = self.vao.bind();
        ctx.draw_arrays(Primitive::Triangles, 0, self.points.len())?;
        Ok(())
    }

    fn key_event(&mut self, key: KeyCode, state: ElementState) {
        if state != ElementState::Pressed {
            return;
        }
        let flag = match key {
            KeyCode::KeyM => &mut self.show_model,
            KeyCode::KeyW => &mut self.show_world,
            KeyCode::KeyV => &mut self.show_view,
            _ => return,
        };
        *flag = !*flag;
        log::debug!(
            "Grids: model {} world {} view {}",
            self.show_model,
            self.show_world,
            self.show_view
        );
    }
}

fn main() -> Result<()> {
    app::run::<CameraDemo>()
}
