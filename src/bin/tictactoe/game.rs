// Tic-tac-toe rules, independent of rendering

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mark {
    X,
    O,
}

impl Mark {
    fn other(self) -> Self {
        match self {
            Mark::X => Mark::O,
            Mark::O => Mark::X,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Won(Mark),
    Tie,
}

/// A 3x3 board indexed `[x][y]`, with (0, 0) bottom left, plus the cursor
/// the players move around.
#[derive(Debug, Clone)]
pub struct Board {
    cells: [[Option<Mark>; 3]; 3],
    cursor: (usize, usize),
    bad: bool,
    turn: Mark,
    outcome: Option<Outcome>,
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    pub fn new() -> Self {
        Self {
            cells: [[None; 3]; 3],
            cursor: (0, 0),
            bad: false,
            turn: Mark::X,
            outcome: None,
        }
    }

    pub fn cell(&self, x: usize, y: usize) -> Option<Mark> {
        self.cells[x][y]
    }

    pub fn cursor(&self) -> (usize, usize) {
        self.cursor
    }

    /// True while the player holds select on an occupied tile.
    pub fn is_bad(&self) -> bool {
        self.bad
    }

    pub fn turn(&self) -> Mark {
        self.turn
    }

    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    pub fn won(&self, mark: Mark) -> bool {
        let at = |x: usize, y: usize| self.cells[x][y] == Some(mark);
        let column = (0..3).any(|x| (0..3).all(|y| at(x, y)));
        let row = (0..3).any(|y| (0..3).all(|x| at(x, y)));
        let diagonal = (0..3).all(|i| at(i, i));
        let anti_diagonal = (0..3).all(|i| at(i, 2 - i));
        column || row || diagonal || anti_diagonal
    }

    pub fn is_full(&self) -> bool {
        self.cells.iter().flatten().all(Option::is_some)
    }

    /// Mark the tile under the cursor. After the game has ended this
    /// clears the board for the next round instead.
    pub fn select(&mut self) {
        if self.outcome.is_some() {
            self.cells = [[None; 3]; 3];
            self.outcome = None;
            return;
        }

        let (x, y) = self.cursor;
        if self.cells[x][y].is_some() {
            self.bad = true;
            return;
        }

        self.cells[x][y] = Some(self.turn);
        if self.won(self.turn) {
            self.outcome = Some(Outcome::Won(self.turn));
        } else if self.is_full() {
            self.outcome = Some(Outcome::Tie);
        } else {
            self.turn = self.turn.other();
        }
    }

    pub fn deselect(&mut self) {
        self.bad = false;
    }

    /// Move the cursor, clamped to the board.
    pub fn move_cursor(&mut self, dx: i32, dy: i32) {
        let clamp = |v: usize, d: i32| (v as i32 + d).clamp(0, 2) as usize;
        self.cursor = (clamp(self.cursor.0, dx), clamp(self.cursor.1, dy));
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for y in (0..3).rev() {
            for x in 0..3 {
                let c = match self.cells[x][y] {
                    Some(Mark::X) => 'x',
                    Some(Mark::O) => 'o',
                    None => ' ',
                };
                write!(f, "[{}]", c)?;
            }
            if y > 0 {
                writeln!(f)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn play(board: &mut Board, moves: &[(usize, usize)]) {
        for &(x, y) in moves {
            let (cx, cy) = board.cursor();
            board.move_cursor(x as i32 - cx as i32, y as i32 - cy as i32);
            board.select();
            board.deselect();
        }
    }

    #[test]
    fn turns_alternate() {
        let mut board = Board::new();
        assert_eq!(board.turn(), Mark::X);
        play(&mut board, &[(1, 1)]);
        assert_eq!(board.cell(1, 1), Some(Mark::X));
        assert_eq!(board.turn(), Mark::O);
    }

    #[test]
    fn column_row_and_diagonal_wins() {
        let mut board = Board::new();
        play(&mut board, &[(0, 0), (1, 0), (0, 1), (1, 1), (0, 2)]);
        assert_eq!(board.outcome(), Some(Outcome::Won(Mark::X)));

        let mut board = Board::new();
        play(&mut board, &[(0, 0), (0, 1), (2, 2), (1, 1), (2, 0), (2, 1)]);
        assert_eq!(board.outcome(), Some(Outcome::Won(Mark::O)));

        let mut board = Board::new();
        play(&mut board, &[(0, 2), (0, 0), (1, 1), (1, 0), (2, 0)]);
        assert_eq!(board.outcome(), Some(Outcome::Won(Mark::X)));
    }

    #[test]
    fn full_board_without_line_is_a_tie() {
        let mut board = Board::new();
        // x o x / x o o / o x x, filled in an order that never wins early
        play(
            &mut board,
            &[
                (0, 2), (1, 2), (2, 2),
                (1, 1), (0, 1), (2, 1),
                (1, 0), (0, 0), (2, 0),
            ],
        );
        assert!(board.is_full());
        assert_eq!(board.outcome(), Some(Outcome::Tie));
        assert!(!board.won(Mark::X));
        assert!(!board.won(Mark::O));
    }

    #[test]
    fn selecting_taken_tile_flags_bad_until_release() {
        let mut board = Board::new();
        board.select();
        board.select();
        assert!(board.is_bad());
        assert_eq!(board.turn(), Mark::O);
        board.deselect();
        assert!(!board.is_bad());
    }

    #[test]
    fn cursor_is_clamped() {
        let mut board = Board::new();
        board.move_cursor(-1, -1);
        assert_eq!(board.cursor(), (0, 0));
        board.move_cursor(5, 1);
        assert_eq!(board.cursor(), (2, 1));
        board.move_cursor(0, 1);
        board.move_cursor(0, 1);
        assert_eq!(board.cursor(), (2, 2));
    }

    #[test]
    fn select_after_game_end_clears_board() {
        let mut board = Board::new();
        play(&mut board, &[(0, 0), (1, 0), (0, 1), (1, 1), (0, 2)]);
        assert!(board.outcome().is_some());
        board.select();
        assert_eq!(board.outcome(), None);
        assert!((0..3).all(|x| (0..3).all(|y| board.cell(x, y).is_none())));
    }

    #[test]
    fn display_draws_top_row_first() {
        let mut board = Board::new();
        play(&mut board, &[(0, 2), (2, 0)]);
        assert_eq!(board.to_string(), "[x][ ][ ]\n[ ][ ][ ]\n[ ][ ][o]");
    }
}
