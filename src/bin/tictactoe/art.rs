// Procedural stand-ins for the tile and message images, used when the
// PNGs aren't in the assets directory.

use glazy::Rgba8;

use crate::game::{Mark, Outcome};

pub const TILE_SIZE: u32 = 64;
pub const BANNER_SIZE: (u32, u32) = (128, 64);

const PAPER: Rgba8 = Rgba8::new(235, 230, 215, 255);
const BORDER: Rgba8 = Rgba8::new(60, 55, 50, 255);
const X_INK: Rgba8 = Rgba8::new(200, 40, 40, 255);
const O_INK: Rgba8 = Rgba8::new(40, 80, 200, 255);
const WIN_BACKDROP: Rgba8 = Rgba8::new(250, 210, 80, 255);
const TIE_BACKDROP: Rgba8 = Rgba8::new(170, 170, 170, 255);

struct Canvas {
    width: u32,
    height: u32,
    texels: Vec<Rgba8>,
}

impl Canvas {
    fn new(width: u32, height: u32, fill: Rgba8) -> Self {
        Self {
            width,
            height,
            texels: vec![fill; (width * height) as usize],
        }
    }

    fn paint(&mut self, mut f: impl FnMut(u32, u32) -> Option<Rgba8>) {
        for y in 0..self.height {
            for x in 0..self.width {
                if let Some(texel) = f(x, y) {
                    self.texels[(y * self.width + x) as usize] = texel;
                }
            }
        }
    }

    fn border(&mut self, thickness: u32, color: Rgba8) {
        let (w, h) = (self.width, self.height);
        self.paint(|x, y| {
            let edge = x < thickness || y < thickness || x >= w - thickness || y >= h - thickness;
            edge.then_some(color)
        });
    }

    /// Draw `mark` in the square of side `size` whose corner is at (left, top).
    fn mark(&mut self, mark: Mark, left: u32, top: u32, size: u32) {
        let half = size as f32 / 2.0;
        let stroke = size as f32 * 0.08;
        let (cx, cy) = (left as f32 + half, top as f32 + half);
        self.paint(|x, y| {
            let (dx, dy) = (x as f32 + 0.5 - cx, y as f32 + 0.5 - cy);
            let hit = match mark {
                Mark::X => {
                    let reach = half * 0.65;
                    dx.abs() <= reach
                        && dy.abs() <= reach
                        && ((dx - dy).abs() <= stroke || (dx + dy).abs() <= stroke)
                }
                Mark::O => {
                    let r = (dx * dx + dy * dy).sqrt();
                    (r - half * 0.55).abs() <= stroke
                }
            };
            let ink = match mark {
                Mark::X => X_INK,
                Mark::O => O_INK,
            };
            hit.then_some(ink)
        });
    }
}

/// A board tile, blank or carrying a mark.
pub fn tile(mark: Option<Mark>) -> Vec<Rgba8> {
    let mut canvas = Canvas::new(TILE_SIZE, TILE_SIZE, PAPER);
    canvas.border(3, BORDER);
    if let Some(mark) = mark {
        canvas.mark(mark, 0, 0, TILE_SIZE);
    }
    canvas.texels
}

/// End-of-game message: the winner's mark, or both marks for a tie.
pub fn banner(outcome: Outcome) -> Vec<Rgba8> {
    let (width, height) = BANNER_SIZE;
    let backdrop = match outcome {
        Outcome::Won(_) => WIN_BACKDROP,
        Outcome::Tie => TIE_BACKDROP,
    };
    let mut canvas = Canvas::new(width, height, backdrop);
    canvas.border(4, BORDER);
    match outcome {
        Outcome::Won(mark) => canvas.mark(mark, (width - height) / 2, 0, height),
        Outcome::Tie => {
            canvas.mark(Mark::X, 0, 0, height);
            canvas.mark(Mark::O, width - height, 0, height);
        }
    }
    canvas.texels
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(texels: &[Rgba8], width: u32, x: u32, y: u32) -> Rgba8 {
        texels[(y * width + x) as usize]
    }

    #[test]
    fn tiles_have_a_border_and_paper_inside() {
        let blank = tile(None);
        assert_eq!(blank.len(), (TILE_SIZE * TILE_SIZE) as usize);
        assert_eq!(at(&blank, TILE_SIZE, 0, 0), BORDER);
        assert_eq!(at(&blank, TILE_SIZE, 32, 32), PAPER);
    }

    #[test]
    fn x_crosses_the_centre_and_o_leaves_it_empty() {
        let x = tile(Some(Mark::X));
        assert_eq!(at(&x, TILE_SIZE, 32, 32), X_INK);
        let o = tile(Some(Mark::O));
        assert_eq!(at(&o, TILE_SIZE, 32, 32), PAPER);
        assert!(o.contains(&O_INK));
    }

    #[test]
    fn banners_show_the_outcome() {
        let (w, h) = BANNER_SIZE;
        let won = banner(Outcome::Won(Mark::O));
        assert_eq!(won.len(), (w * h) as usize);
        assert!(won.contains(&O_INK));
        assert!(!won.contains(&X_INK));
        let tie = banner(Outcome::Tie);
        assert!(tie.contains(&X_INK) && tie.contains(&O_INK));
        assert_eq!(at(&tie, w, w / 2, h / 2), TIE_BACKDROP);
    }
}
