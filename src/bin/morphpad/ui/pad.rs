//! Morph pad widget: nodes, requested cursor and smoothed cursor

use ratatui::{
    layout::Rect,
    style::{Color, Style, Stylize},
    symbols,
    text::Line,
    widgets::{
        canvas::{Canvas, Circle, Points},
        Block, Borders,
    },
    Frame,
};

use super::state::{NodeInfo, PadSnapshot};

/// Node colours, by slot
pub const NODE_COLORS: [Color; 4] = [Color::Yellow, Color::Magenta, Color::Cyan, Color::Green];

pub fn render_pad(
    frame: &mut Frame,
    area: Rect,
    nodes: &[NodeInfo],
    target: (f32, f32),
    snapshot: &PadSnapshot,
) {
    let title = format!(" Pad ({}) ", snapshot.mode);

    let canvas = Canvas::default()
        .block(Block::default().title(title).borders(Borders::ALL))
        .marker(symbols::Marker::Braille)
        .x_bounds([-0.05, 1.05])
        .y_bounds([-0.05, 1.05])
        .paint(|ctx| {
            for (slot, node) in nodes.iter().enumerate() {
                let color = NODE_COLORS[slot % NODE_COLORS.len()];
                // Ring radius grows with the node's weight
                let weight = snapshot.weights.get(slot).copied().unwrap_or(0.0) as f64;
                ctx.draw(&Circle {
                    x: node.x as f64,
                    y: node.y as f64,
                    radius: 0.02 + 0.08 * weight,
                    color,
                });
                ctx.print(
                    node.x as f64,
                    node.y as f64,
                    Line::from(node.kind.name()).fg(color),
                );
            }
            ctx.layer();
            ctx.draw(&Points {
                coords: &[(target.0 as f64, target.1 as f64)],
                color: Color::DarkGray,
            });
            ctx.draw(&Points {
                coords: &[(snapshot.cursor.0 as f64, snapshot.cursor.1 as f64)],
                color: Color::White,
            });
        });

    frame.render_widget(canvas, area);
}

/// Style for the status line: highlighted while the smoother is moving
pub fn status_style(snapshot: &PadSnapshot) -> Style {
    if snapshot.smoothing {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::Gray)
    }
}
