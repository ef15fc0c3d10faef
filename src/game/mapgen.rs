//! Map generation.
//!
//! The zone layout is fixed by the dimensions; only princess rows and tree
//! placement draw from the seeded RNG, so a seed always yields the same map.
//!
//! ```text
//!   ########################################
//!   #                  ~~~                 #
//!   #       T          ~~~          T      #
//!   #WWWWWW            ~~~           WWWWWW#
//!   #    pW            .h.           W     #
//!   #     Gb           .h.          bG     #
//!   #     W   T        .h.       T   Wp    #
//!   #     W            ~~~           W     #
//!   #     Gb           ~~~          bG     #
//!   #     W            ===           W     #
//!   #WWWWWW            ===           WWWWWW#
//!   #         T        ~~~     T           #
//!   ########################################
//! ```
//!
//! `#` border, `~` river, `h` half markers, `=` bridge, `W` walls, `G` gates,
//! `b` staging markers, `p` captive princesses, `T` trees.

use rand::Rng;
use rand::SeedableRng;
use tracing::debug;

use crate::error::MapGenError;
use crate::game::entity::{MapStructure, MarkerTag, Resource, StructureClass, Team};
use crate::game::map::{SpatialGrid, Zone};
use crate::game::registry::EntityMap;
use crate::geometry::Vector2D;

/// Seeded RNG used by the world and the generator.
pub type GameRng = rand_chacha::ChaCha8Rng;

/// Smallest width that fits bases, approaches and the river.
pub const MIN_WIDTH: i32 = 24;

/// Smallest height that keeps the land passage and bridge apart.
pub const MIN_HEIGHT: i32 = 12;

/// One tree per this many cells of map area.
const TREE_DENSITY_DIVISOR: i32 = 33;

/// Placement attempts per tree before giving up on it.
const TREE_ATTEMPTS: u32 = 64;

/// Zone geometry derived from the map dimensions.
///
/// Blue owns the western base, red the eastern one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    /// Map width.
    pub width: i32,
    /// Map height.
    pub height: i32,
    /// Base width in columns, including the inner wall column.
    pub base_width: i32,
    /// First base row (wall).
    pub base_top: i32,
    /// Last base row (wall).
    pub base_bottom: i32,
    /// Centre column of the river.
    pub river_center: i32,
    /// Centre row of the three-row land passage.
    pub passage_row: i32,
    /// Top row of the two-row bridge.
    pub bridge_row: i32,
}

impl Layout {
    /// Derive the layout for `width × height`.
    ///
    /// # Errors
    ///
    /// [`MapGenError::InvalidDimensions`] below [`MIN_WIDTH`] × [`MIN_HEIGHT`].
    pub const fn new(width: i32, height: i32) -> Result<Self, MapGenError> {
        if width < MIN_WIDTH || height < MIN_HEIGHT {
            return Err(MapGenError::InvalidDimensions {
                width,
                height,
                min_width: MIN_WIDTH,
                min_height: MIN_HEIGHT,
            });
        }
        Ok(Self {
            width,
            height,
            base_width: width / 6,
            base_top: height / 4,
            base_bottom: height - 1 - height / 4,
            river_center: width / 2,
            passage_row: height / 3,
            bridge_row: 2 * height / 3,
        })
    }

    /// Column holding `team`'s gates.
    #[must_use]
    pub const fn inner_column(&self, team: Team) -> i32 {
        match team {
            Team::Blue => self.base_width,
            Team::Red => self.width - 1 - self.base_width,
        }
    }

    /// Horizontal step from `team`'s inner column into its base.
    #[must_use]
    pub const fn inward(team: Team) -> i32 {
        match team {
            Team::Blue => -1,
            Team::Red => 1,
        }
    }

    /// First and last column of `team`'s base.
    #[must_use]
    pub const fn base_columns(&self, team: Team) -> (i32, i32) {
        match team {
            Team::Blue => (1, self.base_width),
            Team::Red => (self.width - 1 - self.base_width, self.width - 2),
        }
    }

    /// Rows of the two gates on each inner column.
    #[must_use]
    pub const fn gate_rows(&self) -> [i32; 2] {
        let span = self.base_bottom - self.base_top;
        [self.base_top + span / 3, self.base_bottom - span / 3]
    }

    /// Map half containing column `x`; `None` on the river's centre column.
    #[must_use]
    pub const fn side_of(&self, x: i32) -> Option<Team> {
        if x < self.river_center {
            Some(Team::Blue)
        } else if x > self.river_center {
            Some(Team::Red)
        } else {
            None
        }
    }

    fn is_border(&self, position: Vector2D) -> bool {
        position.x == 0
            || position.y == 0
            || position.x == self.width - 1
            || position.y == self.height - 1
    }

    fn is_river(&self, position: Vector2D) -> bool {
        (position.x - self.river_center).abs() <= 1
    }

    fn is_passage_row(&self, y: i32) -> bool {
        (y - self.passage_row).abs() <= 1
    }

    fn is_bridge_row(&self, y: i32) -> bool {
        y == self.bridge_row || y == self.bridge_row + 1
    }

    fn base_team(&self, position: Vector2D) -> Option<Team> {
        if position.y < self.base_top || position.y > self.base_bottom {
            return None;
        }
        Team::ALL.into_iter().find(|&team| {
            let (first, last) = self.base_columns(team);
            position.x >= first && position.x <= last
        })
    }
}

/// Output of [`generate_map`]: a populated grid plus the entities it references.
#[derive(Debug, Clone)]
pub struct GeneratedMap {
    /// Zoned grid with structures and resources placed.
    pub grid: SpatialGrid,
    /// Zone geometry.
    pub layout: Layout,
    /// Every structure referenced by the grid.
    pub structures: EntityMap<MapStructure>,
    /// Both princesses.
    pub resources: EntityMap<Resource>,
}

/// Generate the map for `width × height` from `seed`.
///
/// # Errors
///
/// Returns an error if the dimensions are too small or a fixed structure
/// cannot be placed.
pub fn generate_map(seed: u64, width: i32, height: i32) -> Result<GeneratedMap, MapGenError> {
    let layout = Layout::new(width, height)?;
    let mut rng = GameRng::seed_from_u64(seed);

    let grid = SpatialGrid::new(width, height, Zone::Battlefield).ok_or(
        MapGenError::InvalidDimensions {
            width,
            height,
            min_width: MIN_WIDTH,
            min_height: MIN_HEIGHT,
        },
    )?;
    let mut generated = GeneratedMap {
        grid,
        layout,
        structures: EntityMap::new(),
        resources: EntityMap::new(),
    };

    assign_zones(&mut generated);
    place_river_crossings(&mut generated)?;
    for team in Team::ALL {
        place_base_defences(&mut generated, team)?;
    }
    for team in Team::ALL {
        place_princess(&mut generated, team, &mut rng)?;
    }
    let trees = place_trees(&mut generated, &mut rng)?;

    debug!(
        seed,
        width,
        height,
        structures = generated.structures.len(),
        trees,
        "map generated"
    );
    Ok(generated)
}

/// Border and river become out-of-map; base rectangles get their zones.
fn assign_zones(map: &mut GeneratedMap) {
    let layout = map.layout;
    for y in 0..layout.height {
        for x in 0..layout.width {
            let position = Vector2D::new(x, y);
            let zone = if layout.is_border(position) {
                Zone::OutOfMap
            } else if layout.is_river(position)
                && !layout.is_passage_row(y)
                && !layout.is_bridge_row(y)
            {
                Zone::OutOfMap
            } else if let Some(team) = layout.base_team(position) {
                Zone::base_of(team)
            } else {
                Zone::Battlefield
            };
            map.grid.set_zone(position, zone);
        }
    }
}

fn add_structure(
    map: &mut GeneratedMap,
    structure: MapStructure,
    cells: &[Vector2D],
) -> Result<(), MapGenError> {
    for &cell in cells {
        map.grid
            .place_structure(cell, &structure.name)
            .map_err(|e| MapGenError::Placement(e.to_string()))?;
    }
    map.structures.insert(structure.name.clone(), structure);
    Ok(())
}

/// `half` markers across the land passage and a 3×2 bridge at two-thirds height.
fn place_river_crossings(map: &mut GeneratedMap) -> Result<(), MapGenError> {
    let layout = map.layout;
    for (i, dy) in (-1..=1).enumerate() {
        let position = Vector2D::new(layout.river_center, layout.passage_row + dy);
        let marker = MapStructure::marker(format!("half_{}", i + 1), MarkerTag::Half, position);
        add_structure(map, marker, &[position])?;
    }

    let anchor = Vector2D::new(layout.river_center - 1, layout.bridge_row);
    let cells: Vec<Vector2D> = (0..2)
        .flat_map(|dy| (0..3).map(move |dx| anchor + Vector2D::new(dx, dy)))
        .collect();
    add_structure(map, MapStructure::bridge("bridge", anchor, 3, 2), &cells)
}

/// Walls on the base's top row, bottom row and inner column, two gates, and
/// a staging marker outside each gate.
fn place_base_defences(map: &mut GeneratedMap, team: Team) -> Result<(), MapGenError> {
    let layout = map.layout;
    let inner = layout.inner_column(team);
    let (first, last) = layout.base_columns(team);
    let gate_rows = layout.gate_rows();
    let suffix = team.suffix();

    for (i, &row) in gate_rows.iter().enumerate() {
        let position = Vector2D::new(inner, row);
        let gate = MapStructure::gate(format!("gate_{suffix}{}", i + 1), team, position);
        add_structure(map, gate, &[position])?;

        let outside = Vector2D::new(inner - Layout::inward(team), row);
        let marker = MapStructure::marker(
            format!("base_{suffix}_{}", i + 1),
            MarkerTag::base(team),
            outside,
        );
        add_structure(map, marker, &[outside])?;
    }

    let mut wall_cells = Vec::new();
    for x in first..=last {
        wall_cells.push(Vector2D::new(x, layout.base_top));
        wall_cells.push(Vector2D::new(x, layout.base_bottom));
    }
    for y in layout.base_top + 1..layout.base_bottom {
        if !gate_rows.contains(&y) {
            wall_cells.push(Vector2D::new(inner, y));
        }
    }
    for position in wall_cells {
        let wall = MapStructure::wall(
            format!("wall_{suffix}_{}_{}", position.x, position.y),
            position,
        );
        add_structure(map, wall, &[position])?;
    }
    Ok(())
}

/// `team`'s princess is held one cell inside the opposing base's inner
/// column, on a random non-gate row, on top of its holding marker.
fn place_princess(
    map: &mut GeneratedMap,
    team: Team,
    rng: &mut GameRng,
) -> Result<(), MapGenError> {
    let layout = map.layout;
    let holder = team.opponent();
    let x = layout.inner_column(holder) + Layout::inward(holder);
    let gate_rows = layout.gate_rows();
    let rows: Vec<i32> = (layout.base_top + 1..layout.base_bottom)
        .filter(|row| !gate_rows.contains(row))
        .collect();
    if rows.is_empty() {
        return Err(MapGenError::Placement(format!(
            "no free row for the {team} princess"
        )));
    }
    let position = Vector2D::new(x, rows[rng.gen_range(0..rows.len())]);

    let tag = MarkerTag::princess_hold(team);
    add_structure(map, MapStructure::marker(tag.label(), tag, position), &[position])?;

    let princess = Resource::princess(format!("princess_{}", team.suffix()), team, position);
    map.grid
        .place_resource(position, &princess.name, &map.structures)
        .map_err(|e| MapGenError::Placement(e.to_string()))?;
    map.resources.insert(princess.name.clone(), princess);
    Ok(())
}

/// Inclusive rectangle `(x0, y0, x1, y1)`.
type Band = (i32, i32, i32, i32);

/// North/south × west/east bands, clear of the base approaches and the river.
fn tree_bands(layout: &Layout) -> Vec<Band> {
    let west = (layout.base_width + 3, layout.river_center - 3);
    let east = (
        layout.river_center + 3,
        layout.width - layout.base_width - 4,
    );
    let north = (1, layout.height / 2 - 2);
    let south = (layout.height / 2 + 2, layout.height - 2);
    [
        (west.0, north.0, west.1, north.1),
        (west.0, south.0, west.1, south.1),
        (east.0, north.0, east.1, north.1),
        (east.0, south.0, east.1, south.1),
    ]
    .into_iter()
    .filter(|&(x0, y0, x1, y1)| x0 <= x1 && y0 <= y1)
    .collect()
}

/// Scatter trees round-robin over the bands; a cell is rejected if any of
/// its eight neighbours already holds a tree. Returns how many were placed.
fn place_trees(map: &mut GeneratedMap, rng: &mut GameRng) -> Result<usize, MapGenError> {
    let layout = map.layout;
    let bands = tree_bands(&layout);
    if bands.is_empty() {
        return Ok(0);
    }
    let target = (layout.width * layout.height / TREE_DENSITY_DIVISOR).max(0);
    let mut placed = 0;

    for i in 0..target {
        #[allow(clippy::cast_sign_loss)]
        let (x0, y0, x1, y1) = bands[i as usize % bands.len()];
        for _ in 0..TREE_ATTEMPTS {
            let position = Vector2D::new(rng.gen_range(x0..=x1), rng.gen_range(y0..=y1));
            if !can_hold_tree(map, position) {
                continue;
            }
            let tree = MapStructure::tree(format!("tree_{placed}"), position);
            add_structure(map, tree, &[position])?;
            placed += 1;
            break;
        }
    }
    Ok(placed)
}

fn can_hold_tree(map: &GeneratedMap, position: Vector2D) -> bool {
    let free = map.grid.get(position).is_some_and(|cell| {
        cell.zone == Zone::Battlefield && cell.structure.is_none() && cell.resource.is_none()
    });
    free && position.surrounding().iter().all(|&around| {
        map.grid
            .get(around)
            .and_then(|cell| cell.structure.as_deref())
            .and_then(|name| map.structures.get(name))
            .is_none_or(|s| s.kind.class() != StructureClass::Tree)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::entity::StructureKind;

    fn count_class(map: &GeneratedMap, class: StructureClass) -> usize {
        map.structures
            .values()
            .filter(|s| s.kind.class() == class)
            .count()
    }

    #[test]
    fn test_layout_dimensions_40x15() {
        let layout = Layout::new(40, 15).unwrap();
        assert_eq!(layout.base_width, 6);
        assert_eq!((layout.base_top, layout.base_bottom), (3, 11));
        assert_eq!(layout.inner_column(Team::Blue), 6);
        assert_eq!(layout.inner_column(Team::Red), 33);
        assert_eq!(layout.gate_rows(), [5, 9]);
        assert_eq!(layout.river_center, 20);
        assert_eq!(layout.side_of(3), Some(Team::Blue));
        assert_eq!(layout.side_of(20), None);
        assert_eq!(layout.side_of(30), Some(Team::Red));
    }

    #[test]
    fn test_too_small_rejected() {
        assert!(matches!(
            generate_map(1, 10, 10),
            Err(MapGenError::InvalidDimensions { .. })
        ));
        assert!(Layout::new(MIN_WIDTH, MIN_HEIGHT).is_ok());
    }

    #[test]
    fn test_generation_determinism() {
        let a = generate_map(12345, 40, 15).unwrap();
        let b = generate_map(12345, 40, 15).unwrap();
        assert_eq!(a.grid.cells(), b.grid.cells());
        assert_eq!(a.structures, b.structures);
        assert_eq!(a.resources, b.resources);
    }

    #[test]
    fn test_zones() {
        let map = generate_map(7, 40, 15).unwrap();
        let zone = |x, y| map.grid.cell(x, y).unwrap().zone;
        assert_eq!(zone(0, 7), Zone::OutOfMap);
        assert_eq!(zone(39, 7), Zone::OutOfMap);
        assert_eq!(zone(3, 7), Zone::BlueBase);
        assert_eq!(zone(36, 7), Zone::RedBase);
        assert_eq!(zone(3, 1), Zone::Battlefield);
        assert_eq!(zone(10, 7), Zone::Battlefield);
        // River is impassable except at the land passage and bridge rows.
        assert_eq!(zone(19, 2), Zone::OutOfMap);
        assert_eq!(zone(21, 8), Zone::OutOfMap);
        assert_eq!(zone(20, 5), Zone::Battlefield);
        assert_eq!(zone(20, 10), Zone::Battlefield);
        assert_eq!(zone(21, 11), Zone::Battlefield);
    }

    #[test]
    fn test_fixed_structures() {
        let map = generate_map(7, 40, 15).unwrap();
        assert_eq!(count_class(&map, StructureClass::Gate), 4);
        assert_eq!(count_class(&map, StructureClass::Bridge), 1);

        let tags: Vec<MarkerTag> = map.structures.values().filter_map(MapStructure::marker_tag).collect();
        assert_eq!(tags.iter().filter(|&&t| t == MarkerTag::Half).count(), 3);
        assert_eq!(tags.iter().filter(|&&t| t == MarkerTag::BaseBlue).count(), 2);
        assert_eq!(tags.iter().filter(|&&t| t == MarkerTag::BaseRed).count(), 2);
        assert_eq!(tags.iter().filter(|&&t| t == MarkerTag::PrincessBlue).count(), 1);
        assert_eq!(tags.iter().filter(|&&t| t == MarkerTag::PrincessRed).count(), 1);

        // Gates sit on the inner column with a staging marker outside.
        let gate = &map.structures["gate_b1"];
        assert_eq!(gate.position(), Vector2D::new(6, 5));
        let outside = map.grid.cell(7, 5).unwrap();
        assert_eq!(outside.structure.as_deref(), Some("base_b_1"));

        // The bridge covers six cells.
        let bridge_cells = map
            .grid
            .cells()
            .iter()
            .filter(|c| c.structure.as_deref() == Some("bridge"))
            .count();
        assert_eq!(bridge_cells, 6);
        assert!(matches!(
            map.structures["bridge"].kind,
            StructureKind::Bridge { .. }
        ));
    }

    #[test]
    fn test_princesses_held_in_opposing_base() {
        let map = generate_map(99, 40, 15).unwrap();
        let blue = &map.resources["princess_b"];
        let red = &map.resources["princess_r"];
        assert_eq!(blue.position().x, 34);
        assert_eq!(red.position().x, 5);
        assert_eq!(map.grid.get(blue.position()).unwrap().zone, Zone::RedBase);
        assert_eq!(map.grid.get(red.position()).unwrap().zone, Zone::BlueBase);

        let cell = map.grid.get(blue.position()).unwrap();
        assert_eq!(cell.structure.as_deref(), Some("empty_pb"));
        assert_eq!(cell.resource.as_deref(), Some("princess_b"));
        assert!(!map.layout.gate_rows().contains(&blue.position().y));
    }

    #[test]
    fn test_trees_spaced_and_on_battlefield() {
        for seed in 0..10 {
            let map = generate_map(seed, 40, 15).unwrap();
            let trees: Vec<Vector2D> = map
                .structures
                .values()
                .filter(|s| s.kind.class() == StructureClass::Tree)
                .map(MapStructure::position)
                .collect();
            assert!(!trees.is_empty());
            assert!(trees.len() <= 600 / 33);
            for &a in &trees {
                assert_eq!(map.grid.get(a).unwrap().zone, Zone::Battlefield);
                for &b in &trees {
                    if a != b {
                        assert!(a.chebyshev_distance(b) > 1, "trees {a} and {b} touch");
                    }
                }
            }
        }
    }

    #[test]
    fn test_minimum_map_generates() {
        let map = generate_map(3, MIN_WIDTH, MIN_HEIGHT).unwrap();
        assert_eq!(count_class(&map, StructureClass::Gate), 4);
        assert_eq!(map.resources.len(), 2);
    }
}
