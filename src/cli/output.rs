//! Output formatting utilities for CLI.

use std::fmt::Write as _;

use black_forest::game::{
    Layout, MarkerTag, ResourceKind, StructureKind, Team, WorldView, Zone,
};
use black_forest::geometry::Vector2D;
use black_forest::simulation::MatchResult;

/// Format a match result as human-readable text.
pub(super) fn format_match_text(result: &MatchResult) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "Match Result (seed: {})", result.seed);
    match result.winner {
        Some(team) => {
            let _ = writeln!(output, "  Winner: {team}");
        }
        None => output.push_str("  Winner: Draw\n"),
    }
    let _ = writeln!(output, "  Ticks: {}", result.ticks);
    let _ = writeln!(output, "  Events: {}\n", result.events);

    for team in Team::ALL {
        let _ = writeln!(
            output,
            "  {team}: {} wood, {} deaths",
            result.wood.get(team),
            result.deaths.get(team)
        );
    }

    output
}

/// Plain-text dump of the grid, one character per cell.
///
/// Legend: `#` border, `~` river, `W` wall, `G`/`g` standing/destroyed gate,
/// `=` bridge, `T`/`,` standing/felled tree, `h` half marker, `b` staging
/// marker, `p` princess, `R`/`B` agents, `x` dead agent.
pub(super) fn format_map(view: &WorldView<'_>) -> String {
    let grid = view.grid();
    let layout = *view.layout();
    let mut output = String::new();
    for y in 0..grid.height() {
        for x in 0..grid.width() {
            output.push(glyph(view, &layout, Vector2D::new(x, y)));
        }
        output.push('\n');
    }
    output
}

fn glyph(view: &WorldView<'_>, layout: &Layout, position: Vector2D) -> char {
    let Some(cell) = view.cell(position) else {
        return ' ';
    };
    if let Some(agent) = cell.agent.as_deref().and_then(|n| view.agent(n).ok()) {
        return match (agent.is_alive(), agent.team) {
            (false, _) => 'x',
            (true, Team::Red) => 'R',
            (true, Team::Blue) => 'B',
        };
    }
    if let Some(resource) = cell.resource.as_deref().and_then(|n| view.resource(n).ok()) {
        return match resource.kind {
            ResourceKind::Princess => 'p',
        };
    }
    if let Some(structure) = cell.structure.as_deref().and_then(|n| view.structure(n).ok()) {
        return match structure.kind {
            StructureKind::Gate if structure.is_destroyed() => 'g',
            StructureKind::Gate => 'G',
            StructureKind::Wall => 'W',
            StructureKind::Bridge { .. } => '=',
            StructureKind::Tree if structure.hp == 0 => ',',
            StructureKind::Tree => 'T',
            StructureKind::Empty { tag } => match tag {
                MarkerTag::Half => 'h',
                MarkerTag::BaseRed | MarkerTag::BaseBlue => 'b',
                MarkerTag::PrincessRed | MarkerTag::PrincessBlue => '.',
            },
        };
    }
    match cell.zone {
        Zone::OutOfMap if is_river_cell(layout, position) => '~',
        Zone::OutOfMap => '#',
        Zone::Battlefield | Zone::BlueBase | Zone::RedBase => ' ',
    }
}

fn is_river_cell(layout: &Layout, position: Vector2D) -> bool {
    let interior = position.x > 0
        && position.y > 0
        && position.x < layout.width - 1
        && position.y < layout.height - 1;
    interior && (position.x - layout.river_center).abs() <= 1
}
