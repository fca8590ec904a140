//! Weight bars, one gauge per active node

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    widgets::{Block, Borders, Gauge},
    Frame,
};

use super::{
    pad::NODE_COLORS,
    state::{NodeInfo, PadSnapshot},
};

pub fn render_weights(frame: &mut Frame, area: Rect, nodes: &[NodeInfo], snapshot: &PadSnapshot) {
    let block = Block::default().title(" Weights ").borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![Constraint::Length(1); nodes.len()])
        .split(inner);

    for (slot, (node, row)) in nodes.iter().zip(rows.iter()).enumerate() {
        let weight = snapshot.weights.get(slot).copied().unwrap_or(0.0).clamp(0.0, 1.0);
        let gauge = Gauge::default()
            .gauge_style(Style::default().fg(NODE_COLORS[slot % NODE_COLORS.len()]))
            .ratio(weight as f64)
            .label(format!("{:<16} {:>5.1}%", node.kind.name(), weight * 100.0));
        frame.render_widget(gauge, *row);
    }
}
