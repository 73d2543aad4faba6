use anyhow::Result;
use crossterm::{
    cursor::MoveTo,
    style::{style, Attribute, Color, PrintStyledContent},
    QueueableCommand,
};

use std::io::{stdout, Write};

use connect_n::{Cell, GameSession};

/// Draws the board of `session` below the cursor, highlighting a winning line
pub fn display(session: &GameSession) -> Result<()> {
    let board = session.board_snapshot();
    let winning_cells = session.winning_cells();
    let rows = board.len() as u16;
    let columns = board.first().map(|row| row.len()).unwrap_or(0) as u16;

    let mut stdout = stdout();

    // column labels, then room for the board
    let labels: String = (1..=columns)
        .map(|x| std::char::from_digit(x as u32 % 36, 36).unwrap_or('?'))
        .collect();
    stdout.queue(PrintStyledContent(style(labels + "\n")))?;
    for _ in 0..rows {
        stdout.queue(PrintStyledContent(style("\n")))?;
    }
    stdout.flush()?;

    let (origin_x, origin_y) = crossterm::cursor::position()?;

    for (row, cells) in board.iter().enumerate() {
        for (column, cell) in cells.iter().enumerate() {
            let (pos_x, pos_y) = (origin_x + column as u16, origin_y - rows + row as u16);
            let symbol = if winning_cells.contains(&(row, column)) {
                "@"
            } else {
                "O"
            };

            stdout
                .queue(MoveTo(pos_x, pos_y))?
                .queue(PrintStyledContent(
                    style(symbol)
                        .attribute(Attribute::Bold)
                        .on(Color::DarkBlue)
                        .with(match cell {
                            Cell::Red => Color::Red,
                            Cell::Yellow => Color::Yellow,
                            Cell::Empty => Color::DarkBlue,
                        }),
                ))?;
        }
    }
    stdout
        .queue(MoveTo(origin_x + columns, origin_y))?
        .queue(PrintStyledContent(style("\n")))?;
    stdout.flush()?;
    Ok(())
}
