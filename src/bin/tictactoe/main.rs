// Tic-tac-toe - WASD moves the cursor, Space marks a tile. Holding Space on
// a taken tile dims it further; Space after the game ends starts a new one.

mod art;
mod game;

use anyhow::{Context as _, Result};
use glam::{Vec2, Vec3};
use glazy::app::{self, FrameInfo, Scene};
use glazy::config::Config;
use glazy::program::UniformLocation;
use glazy::shader::{Fragment, Vertex};
use glazy::{
    load_shader, shape, Buffer, BufferUsage, Context, Primitive, Program, Texture, VertexArray,
};
use winit::event::ElementState;
use winit::keyboard::KeyCode;

use game::{Board, Mark, Outcome};

/// Texture coordinates for `shape::quad()`, image row 0 at the top.
const QUAD_UV: [Vec2; 6] = [
    Vec2::new(0.0, 1.0),
    Vec2::new(1.0, 1.0),
    Vec2::new(1.0, 0.0),
    Vec2::new(0.0, 1.0),
    Vec2::new(1.0, 0.0),
    Vec2::new(0.0, 0.0),
];

const TILE_SCALE: f32 = 1.0 / 5.0;
const BANNER_SCALE: f32 = 0.6;

struct Art {
    blank: Texture,
    x: Texture,
    o: Texture,
    x_wins: Texture,
    o_wins: Texture,
    tie: Texture,
}

impl Art {
    fn load(ctx: &Context, config: &Config) -> Result<Self> {
        let tile = |file: &str, mark: Option<Mark>| {
            load_or_draw(ctx, config, file, || {
                (art::tile(mark), art::TILE_SIZE, art::TILE_SIZE)
            })
        };
        let banner = |file: &str, outcome: Outcome| {
            load_or_draw(ctx, config, file, || {
                let (width, height) = art::BANNER_SIZE;
                (art::banner(outcome), width, height)
            })
        };
        Ok(Self {
            blank: tile("blank.png", None)?,
            x: tile("x.png", Some(Mark::X))?,
            o: tile("o.png", Some(Mark::O))?,
            x_wins: banner("x_win.png", Outcome::Won(Mark::X))?,
            o_wins: banner("o_win.png", Outcome::Won(Mark::O))?,
            tie: banner("draw.png", Outcome::Tie)?,
        })
    }

    fn tile(&self, mark: Option<Mark>) -> &Texture {
        match mark {
            Some(Mark::X) => &self.x,
            Some(Mark::O) => &self.o,
            None => &self.blank,
        }
    }

    fn banner(&self, outcome: Outcome) -> &Texture {
        match outcome {
            Outcome::Won(Mark::X) => &self.x_wins,
            Outcome::Won(Mark::O) => &self.o_wins,
            Outcome::Tie => &self.tie,
        }
    }
}

/// Load `file` from the assets directory, or draw the fallback if it isn't
/// there. A file that exists but fails to decode is an error.
fn load_or_draw(
    ctx: &Context,
    config: &Config,
    file: &str,
    draw: impl FnOnce() -> (Vec<glazy::Rgba8>, u32, u32),
) -> Result<Texture> {
    let path = config.asset(file);
    if path.exists() {
        log::debug!("Loading {:?}", path);
        return Texture::from_image(ctx, &path, false)
            .with_context(|| format!("Failed to load {:?}", path));
    }
    log::info!("{:?} not found, drawing it instead", path);
    let (texels, width, height) = draw();
    Ok(Texture::new(ctx, &texels, width, height, false)?)
}

struct Uniforms {
    texture: UniformLocation,
    offset: UniformLocation,
    scale: UniformLocation,
    dim: UniformLocation,
}

struct TicTacToe {
    board: Board,
    art: Art,
    program: Program,
    uniforms: Uniforms,
    vao: VertexArray,
    _positions: Buffer<Vec3>,
    _uvs: Buffer<Vec2>,
}

impl TicTacToe {
    fn draw_quad(&self, ctx: &Context, texture: &Texture, offset: Vec2, dim: f32) -> Result<()> {
        let _texture = texture.bind(0);
        self.program.set_uniform_at(self.uniforms.offset, &offset)?;
        self.program.set_uniform_at(self.uniforms.dim, &dim)?;
        ctx.draw_arrays(Primitive::Triangles, 0, QUAD_UV.len())?;
        Ok(())
    }
}

impl Scene for TicTacToe {
    const TITLE: &'static str = "Tic Tac Toe";
    const SIZE: (u32, u32) = (400, 400);

    fn init(ctx: &Context, config: &Config) -> Result<Self> {
        let art = Art::load(ctx, config)?;

        let vertex = load_shader!(ctx, Vertex, "../../../shaders/tictactoe/tictactoe.vert")?;
        let fragment = load_shader!(ctx, Fragment, "../../../shaders/tictactoe/tictactoe.frag")?;
        let program = Program::new(ctx, &vertex, &fragment)?;
        let uniforms = Uniforms {
            texture: program.uniform_location("the_texture")?,
            offset: program.uniform_location("offset")?,
            scale: program.uniform_location("scale")?,
            dim: program.uniform_location("dim")?,
        };

        let positions = Buffer::with_data(ctx, &shape::quad(), BufferUsage::StaticDraw)?;
        let uvs = Buffer::with_data(ctx, &QUAD_UV, BufferUsage::StaticDraw)?;
        let vao = VertexArray::new(ctx)?;
        vao.attribute(program.attribute_index("pos")?)
            .enable()?
            .set_buffer(&positions)?;
        vao.attribute(program.attribute_index("uv")?)
            .enable()?
            .set_buffer(&uvs)?;

        Ok(Self {
            board: Board::new(),
            art,
            program,
            uniforms,
            vao,
            _positions: positions,
            _uvs: uvs,
        })
    }

    fn render(&mut self, ctx: &Context, _frame: &FrameInfo) -> Result<()> {
        let _program = self.program.bind();
        let _vao = self.vao.bind();
        self.program.set_uniform_at(self.uniforms.texture, &0i32)?;

        if let Some(outcome) = self.board.outcome() {
            self.program
                .set_uniform_at(self.uniforms.scale, &Vec2::splat(BANNER_SCALE))?;
            return self.draw_quad(ctx, self.art.banner(outcome), Vec2::ZERO, 1.0);
        }

        self.program
            .set_uniform_at(self.uniforms.scale, &Vec2::splat(TILE_SCALE))?;
        for y in 0..3 {
            for x in 0..3 {
                let offset = Vec2::new((x as f32 - 1.0) / 2.0, (y as f32 - 1.0) / 2.0);
                let dim = if (x, y) != self.board.cursor() {
                    1.0
                } else if self.board.is_bad() {
                    0.25
                } else {
                    0.5
                };
                let texture = self.art.tile(self.board.cell(x, y));
                self.draw_quad(ctx, texture, offset, dim)?;
            }
        }
        Ok(())
    }

    fn key_event(&mut self, key: KeyCode, state: ElementState) {
        let board = &mut self.board;
        match (key, state) {
            (KeyCode::KeyW, ElementState::Pressed) => board.move_cursor(0, 1),
            (KeyCode::KeyA, ElementState::Pressed) => board.move_cursor(-1, 0),
            (KeyCode::KeyS, ElementState::Pressed) => board.move_cursor(0, -1),
            (KeyCode::KeyD, ElementState::Pressed) => board.move_cursor(1, 0),
            (KeyCode::Space, ElementState::Pressed) => {
                board.select();
                log::debug!("Board:\n{}", board);
                match board.outcome() {
                    Some(Outcome::Won(mark)) => log::info!("{:?} wins", mark),
                    Some(Outcome::Tie) => log::info!("Tie"),
                    None => {}
                }
            }
            (KeyCode::Space, ElementState::Released) => board.deselect(),
            _ => {}
        }
    }
}

fn main() -> Result<()> {
    app::run::<TicTacToe>()
}
