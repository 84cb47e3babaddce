// Texture demo - a sphere wrapped in a procedurally generated grid texture

use anyhow::Result;
use glam::{Mat4, Vec2, Vec3};
use glazy::app::{self, FrameInfo, Scene};
use glazy::config::Config;
use glazy::shader::{Fragment, Vertex};
use glazy::{
    load_shader, shape, Buffer, BufferUsage, Context, Primitive, Program, Rgb8, Texture,
    VertexArray,
};

const GRID_SIZE: u32 = 128;

/// Colour gradient with black lines every ten texels.
fn grid_texels(size: u32) -> Vec<Rgb8> {
    let mut texels = Vec::with_capacity((size * size) as usize);
    for y in 0..size {
        for x in 0..size {
            let texel = if x % 10 == 0 || y % 10 == 0 {
                Rgb8::new(0, 0, 0)
            } else {
                Rgb8::new((y * 2) as u8, (x * 2) as u8, 255)
            };
            texels.push(texel);
        }
    }
    texels
}

struct TextureDemo {
    program: Program,
    vao: VertexArray,
    positions: Buffer<Vec3>,
    // Sourced by `vao`; kept alive alongside it
    _uvs: Buffer<Vec2>,
    texture: Texture,
}

impl Scene for TextureDemo {
    const TITLE: &'static str = "Texture Demo";

    fn init(ctx: &Context, _config: &Config) -> Result<Self> {
        let vertex = load_shader!(ctx, Vertex, "../../shaders/texture/texture.vert")?;
        let fragment = load_shader!(ctx, Fragment, "../../shaders/texture/texture.frag")?;
        let program = Program::new(ctx, &vertex, &fragment)?;

        let texture = Texture::new(ctx, &grid_texels(GRID_SIZE), GRID_SIZE, GRID_SIZE, true)?;

        let positions =
            Buffer::with_data(ctx, &shape::sphere(100, 100, 1.0), BufferUsage::StaticDraw)?;
        let uvs = Buffer::with_data(ctx, &shape::uv_grid(100, 100), BufferUsage::StaticDraw)?;

        let vao = VertexArray::new(ctx)?;
        vao.attribute(program.attribute_index("pos")?)
            .enable()?
            .set_buffer(&positions)?;
        vao.attribute(program.attribute_index("uv")?)
            .enable()?
            .set_buffer(&uvs)?;

        program.set_uniform("the_texture", &0i32)?;

        Ok(Self {
            program,
            vao,
            positions,
            _uvs: uvs,
            texture,
        })
    }

    fn render(&mut self, ctx: &Context, frame: &FrameInfo) -> Result<()> {
        let time = frame.time;
        let proj = Mat4::perspective_rh_gl(80f32.to_radians(), frame.aspect(), 0.1, 1000.0);
        let modl = Mat4::from_translation(Vec3::new(
            (time * 0.1).cos() * 2.0,
            (time * 0.1).sin() * 2.0,
            0.0,
        )) * Mat4::from_rotation_y(time);
        let view = Mat4::from_translation(Vec3::new(0.0, 0.0, -4.0 + (time * 0.5).cos() * 2.0));

        let _program = self.program.bind();
        self.program.set_uniform("modl_transform", &modl)?;
        self.program.set_uniform("view_transform", &view)?;
        self.program.set_uniform("proj_transform", &proj)?;

        let _texture = self.texture.bind(0);
        let _vao = self.vao.bind();
        ctx.draw_arrays(Primitive::Triangles, 0, self.positions.len())?;
        Ok(())
    }
}

fn main() -> Result<()> {
    app::run::<TextureDemo>()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_has_lines_every_ten_texels() {
        let texels = grid_texels(GRID_SIZE);
        assert_eq!(texels.len(), 128 * 128);
        assert_eq!(texels[0], Rgb8::new(0, 0, 0));
        assert_eq!(texels[(20 * 128 + 5) as usize], Rgb8::new(0, 0, 0));
        assert_eq!(texels[(3 * 128 + 7) as usize], Rgb8::new(6, 14, 255));
    }
}
