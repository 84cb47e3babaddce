// Quad demo - the smallest complete glazy program: one buffer, one vertex
// array, one program, one draw call per frame.

use anyhow::Result;
use glam::Vec3;
use glazy::app::{self, FrameInfo, Scene};
use glazy::config::Config;
use glazy::shader::{Fragment, Vertex};
use glazy::{load_shader, shape, Buffer, BufferUsage, Context, Primitive, Program, VertexArray};

struct QuadDemo {
    program: Program,
    vao: VertexArray,
    points: Buffer<Vec3>,
}

impl Scene for QuadDemo {
    const TITLE: &'static str = "Quad Demo";
    const SIZE: (u32, u32) = (400, 400);

    fn init(ctx: &Context, _config: &Config) -> Result<Self> {
        let vertex = load_shader!(ctx, Vertex, "../../shaders/quad/quad.vert")?;
        let fragment = load_shader!(ctx, Fragment, "../../shaders/quad/quad.frag")?;
        let program = Program::new(ctx, &vertex, &fragment)?;

        let points = Buffer::with_data(ctx, &shape::quad(), BufferUsage::StaticDraw)?;
        let vao = VertexArray::new(ctx)?;
        vao.attribute(program.attribute_index("point")?)
            .enable()?
            .set_buffer(&points)?;

        Ok(Self {
            program,
            vao,
            points,
        })
    }

    fn render(&mut self, ctx: &Context, _frame: &FrameInfo) -> Result<()> {
        let _program = self.program.bind();
        let _vao = self.vao.bind();
        ctx.draw_arrays(Primitive::Triangles, 0, self.points.len())?;
        Ok(())
    }
}

fn main() -> Result<()> {
    app::run::<QuadDemo>()
}
