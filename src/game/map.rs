//! Spatial grid: zones, cells and the occupancy invariant.
//!
//! A cell holds at most one of {structure, resource, agent}, except that a
//! structure walkable for the newcomer may share its cell with one agent or
//! one resource. Cells store occupant names; the entities themselves live in
//! the registries.

use serde::Serialize;

use crate::error::{WorldError, WorldResult};
use crate::game::entity::{
    Agent, MapStructure, Resource, ResourceKind, Role, StructureClass, Team,
};
use crate::game::registry::EntityMap;
use crate::geometry::Vector2D;

/// Coarse terrain classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Zone {
    /// Blue team's base.
    BlueBase,
    /// Red team's base.
    RedBase,
    /// Open ground between the bases.
    Battlefield,
    /// Border and river; never enterable.
    OutOfMap,
}

impl Zone {
    /// Base zone of `team`.
    #[must_use]
    pub const fn base_of(team: Team) -> Self {
        match team {
            Team::Red => Zone::RedBase,
            Team::Blue => Zone::BlueBase,
        }
    }

    /// Owning team of a base zone.
    #[must_use]
    pub const fn owner(self) -> Option<Team> {
        match self {
            Zone::RedBase => Some(Team::Red),
            Zone::BlueBase => Some(Team::Blue),
            Zone::Battlefield | Zone::OutOfMap => None,
        }
    }
}

/// A single grid cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Cell {
    /// Position of this cell.
    pub position: Vector2D,
    /// Terrain zone.
    pub zone: Zone,
    /// Structure covering this cell.
    pub structure: Option<String>,
    /// Resource lying on this cell.
    pub resource: Option<String>,
    /// Agent standing on this cell.
    pub agent: Option<String>,
}

impl Cell {
    /// An empty cell.
    #[must_use]
    pub const fn new(position: Vector2D, zone: Zone) -> Self {
        Self {
            position,
            zone,
            structure: None,
            resource: None,
            agent: None,
        }
    }

    /// Name of whichever occupant blocks a newcomer, checked agent first.
    fn blocker(&self) -> Option<&str> {
        self.agent.as_deref().or(self.resource.as_deref())
    }
}

/// Read-only access to the three registries, used to evaluate cell filters.
#[derive(Debug, Clone, Copy)]
pub struct Occupants<'a> {
    /// Structure registry contents.
    pub structures: &'a EntityMap<MapStructure>,
    /// Agent registry contents.
    pub agents: &'a EntityMap<Agent>,
    /// Resource registry contents.
    pub resources: &'a EntityMap<Resource>,
}

type Predicate<'f, T> = Box<dyn Fn(&T) -> bool + 'f>;

/// Class plus optional predicate for one kind of occupant.
struct OccupantFilter<'f, C, T> {
    class: Option<C>,
    predicate: Option<Predicate<'f, T>>,
}

impl<C: PartialEq + Copy, T> OccupantFilter<'_, C, T> {
    fn accepts(&self, class: C, entity: &T) -> bool {
        self.class.is_none_or(|wanted| wanted == class)
            && self.predicate.as_ref().is_none_or(|p| p(entity))
    }
}

/// Query over cells: optional zone, structure, resource and agent components.
///
/// A cell matches when every present component matches. With
/// [`CellFilter::excluding`] the query returns the cells that do not match.
#[derive(Default)]
pub struct CellFilter<'f> {
    zone: Option<Zone>,
    structure: Option<OccupantFilter<'f, StructureClass, MapStructure>>,
    resource: Option<OccupantFilter<'f, ResourceKind, Resource>>,
    agent: Option<OccupantFilter<'f, Role, Agent>>,
    exclude: bool,
}

impl std::fmt::Debug for CellFilter<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CellFilter")
            .field("zone", &self.zone)
            .field("structure", &self.structure.as_ref().map(|s| s.class))
            .field("resource", &self.resource.as_ref().map(|r| r.class))
            .field("agent", &self.agent.as_ref().map(|a| a.class))
            .field("exclude", &self.exclude)
            .finish()
    }
}

impl<'f> CellFilter<'f> {
    /// A filter matching every cell.
    #[must_use]
    pub fn any() -> Self {
        Self::default()
    }

    /// Require the cell's zone.
    #[must_use]
    pub fn in_zone(mut self, zone: Zone) -> Self {
        self.zone = Some(zone);
        self
    }

    /// Require a structure of `class` (any class if `None`).
    #[must_use]
    pub fn with_structure_class(mut self, class: Option<StructureClass>) -> Self {
        self.structure = Some(OccupantFilter {
            class,
            predicate: None,
        });
        self
    }

    /// Require a structure of `class` satisfying `predicate`.
    #[must_use]
    pub fn with_structure(
        mut self,
        class: Option<StructureClass>,
        predicate: impl Fn(&MapStructure) -> bool + 'f,
    ) -> Self {
        self.structure = Some(OccupantFilter {
            class,
            predicate: Some(Box::new(predicate)),
        });
        self
    }

    /// Require a resource of `kind` satisfying `predicate`.
    #[must_use]
    pub fn with_resource(
        mut self,
        kind: Option<ResourceKind>,
        predicate: impl Fn(&Resource) -> bool + 'f,
    ) -> Self {
        self.resource = Some(OccupantFilter {
            class: kind,
            predicate: Some(Box::new(predicate)),
        });
        self
    }

    /// Require an agent of `role` satisfying `predicate`.
    #[must_use]
    pub fn with_agent(
        mut self,
        role: Option<Role>,
        predicate: impl Fn(&Agent) -> bool + 'f,
    ) -> Self {
        self.agent = Some(OccupantFilter {
            class: role,
            predicate: Some(Box::new(predicate)),
        });
        self
    }

    /// Invert the query: return the cells that fail to match.
    #[must_use]
    pub fn excluding(mut self) -> Self {
        self.exclude = true;
        self
    }

    fn matches(&self, cell: &Cell, occupants: &Occupants<'_>) -> bool {
        if self.zone.is_some_and(|zone| zone != cell.zone) {
            return false;
        }
        if let Some(filter) = &self.structure {
            let found = cell
                .structure
                .as_deref()
                .and_then(|name| occupants.structures.get(name));
            if !found.is_some_and(|s| filter.accepts(s.kind.class(), s)) {
                return false;
            }
        }
        if let Some(filter) = &self.resource {
            let found = cell
                .resource
                .as_deref()
                .and_then(|name| occupants.resources.get(name));
            if !found.is_some_and(|r| filter.accepts(r.kind, r)) {
                return false;
            }
        }
        if let Some(filter) = &self.agent {
            let found = cell
                .agent
                .as_deref()
                .and_then(|name| occupants.agents.get(name));
            if !found.is_some_and(|a| filter.accepts(a.role, a)) {
                return false;
            }
        }
        true
    }

    /// Whether `cell` belongs to the query result.
    #[must_use]
    pub fn selects(&self, cell: &Cell, occupants: &Occupants<'_>) -> bool {
        self.matches(cell, occupants) != self.exclude
    }
}

/// The battlefield grid.
#[derive(Debug, Clone)]
pub struct SpatialGrid {
    /// Width in cells.
    width: i32,
    /// Height in cells.
    height: i32,
    /// Cells in row-major order.
    cells: Vec<Cell>,
}

impl SpatialGrid {
    /// Create a grid with every cell in `zone`.
    ///
    /// Returns `None` if either dimension is not positive.
    #[must_use]
    pub fn new(width: i32, height: i32, zone: Zone) -> Option<Self> {
        if width <= 0 || height <= 0 {
            return None;
        }
        let cells = (0..height)
            .flat_map(|y| (0..width).map(move |x| Cell::new(Vector2D::new(x, y), zone)))
            .collect();
        Some(Self {
            width,
            height,
            cells,
        })
    }

    /// Width in cells.
    #[must_use]
    pub const fn width(&self) -> i32 {
        self.width
    }

    /// Height in cells.
    #[must_use]
    pub const fn height(&self) -> i32 {
        self.height
    }

    /// All cells in row-major order.
    #[must_use]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Whether `position` lies inside the grid.
    #[must_use]
    pub const fn is_inside(&self, position: Vector2D) -> bool {
        position.x >= 0 && position.y >= 0 && position.x < self.width && position.y < self.height
    }

    #[allow(clippy::cast_sign_loss)]
    fn index(&self, position: Vector2D) -> Option<usize> {
        if self.is_inside(position) {
            Some(position.y as usize * self.width as usize + position.x as usize)
        } else {
            None
        }
    }

    /// Cell at `position`, or `None` outside the grid.
    #[must_use]
    pub fn get(&self, position: Vector2D) -> Option<&Cell> {
        self.index(position).map(|idx| &self.cells[idx])
    }

    /// Cell at `(x, y)`, or `None` outside the grid.
    #[must_use]
    pub fn cell(&self, x: i32, y: i32) -> Option<&Cell> {
        self.get(Vector2D::new(x, y))
    }

    fn get_mut(&mut self, position: Vector2D) -> WorldResult<&mut Cell> {
        match self.index(position) {
            Some(idx) => Ok(&mut self.cells[idx]),
            None => Err(WorldError::OutOfBounds(position)),
        }
    }

    /// Set the zone of a cell. Returns `false` outside the grid.
    pub fn set_zone(&mut self, position: Vector2D, zone: Zone) -> bool {
        match self.get_mut(position) {
            Ok(cell) => {
                cell.zone = zone;
                true
            }
            Err(_) => false,
        }
    }

    /// Whether a newcomer of `team` would be blocked at `position`.
    ///
    /// Outside the grid counts as occupied. Pass `None` for resources.
    #[must_use]
    pub fn is_occupied(
        &self,
        position: Vector2D,
        structures: &EntityMap<MapStructure>,
        team: Option<Team>,
    ) -> bool {
        let Some(cell) = self.get(position) else {
            return true;
        };
        if cell.agent.is_some() || cell.resource.is_some() {
            return true;
        }
        cell.structure.as_deref().is_some_and(|name| {
            structures
                .get(name)
                .is_none_or(|s| !s.is_walkable_for(team))
        })
    }

    fn check_free(
        &self,
        position: Vector2D,
        structures: &EntityMap<MapStructure>,
        team: Option<Team>,
    ) -> WorldResult<()> {
        let cell = self.get(position).ok_or(WorldError::OutOfBounds(position))?;
        if let Some(occupant) = cell.blocker() {
            return Err(WorldError::CellOccupied {
                position,
                occupant: occupant.to_string(),
            });
        }
        if self.is_occupied(position, structures, team) {
            return Err(WorldError::CellOccupied {
                position,
                occupant: cell.structure.clone().unwrap_or_default(),
            });
        }
        Ok(())
    }

    /// Put an agent on a cell.
    ///
    /// # Errors
    ///
    /// [`WorldError::CellOccupied`] if the occupancy invariant would break.
    pub fn place_agent(
        &mut self,
        position: Vector2D,
        name: &str,
        team: Team,
        structures: &EntityMap<MapStructure>,
    ) -> WorldResult<()> {
        self.check_free(position, structures, Some(team))?;
        self.get_mut(position)?.agent = Some(name.to_string());
        Ok(())
    }

    /// Put a resource on a cell.
    ///
    /// # Errors
    ///
    /// [`WorldError::CellOccupied`] if the occupancy invariant would break.
    pub fn place_resource(
        &mut self,
        position: Vector2D,
        name: &str,
        structures: &EntityMap<MapStructure>,
    ) -> WorldResult<()> {
        self.check_free(position, structures, None)?;
        self.get_mut(position)?.resource = Some(name.to_string());
        Ok(())
    }

    /// Cover a cell with a structure. Only empty cells accept one.
    ///
    /// # Errors
    ///
    /// [`WorldError::CellOccupied`] if anything is already on the cell.
    pub fn place_structure(&mut self, position: Vector2D, name: &str) -> WorldResult<()> {
        let cell = self.get_mut(position)?;
        if let Some(occupant) = cell
            .structure
            .as_deref()
            .or(cell.agent.as_deref())
            .or(cell.resource.as_deref())
        {
            return Err(WorldError::CellOccupied {
                position,
                occupant: occupant.to_string(),
            });
        }
        cell.structure = Some(name.to_string());
        Ok(())
    }

    /// Remove `name` from the agent slot. Returns `false` if it was not there.
    pub fn clear_agent(&mut self, position: Vector2D, name: &str) -> bool {
        match self.get_mut(position) {
            Ok(cell) if cell.agent.as_deref() == Some(name) => {
                cell.agent = None;
                true
            }
            _ => false,
        }
    }

    /// Remove `name` from the resource slot. Returns `false` if it was not there.
    pub fn clear_resource(&mut self, position: Vector2D, name: &str) -> bool {
        match self.get_mut(position) {
            Ok(cell) if cell.resource.as_deref() == Some(name) => {
                cell.resource = None;
                true
            }
            _ => false,
        }
    }

    /// Cells selected by `filter`, in row-major order.
    #[must_use]
    pub fn cells_matching<'g>(
        &'g self,
        filter: &CellFilter<'_>,
        occupants: &Occupants<'_>,
    ) -> Vec<&'g Cell> {
        self.cells
            .iter()
            .filter(|cell| filter.selects(cell, occupants))
            .collect()
    }

    /// Selected cell nearest to `from` by Euclidean distance.
    ///
    /// Ties go to the first cell in row-major order.
    #[must_use]
    pub fn find_closest<'g>(
        &'g self,
        from: Vector2D,
        filter: &CellFilter<'_>,
        occupants: &Occupants<'_>,
    ) -> Option<&'g Cell> {
        let mut best: Option<(&Cell, i64)> = None;
        for cell in self.cells.iter().filter(|c| filter.selects(c, occupants)) {
            let distance = cell.position.distance_squared(from);
            if best.is_none_or(|(_, d)| distance < d) {
                best = Some((cell, distance));
            }
        }
        best.map(|(cell, _)| cell)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::entity::{MarkerTag, SpawnRequest};
    use crate::geometry::{Orientation, Pose};

    fn structures(list: Vec<MapStructure>) -> EntityMap<MapStructure> {
        list.into_iter().map(|s| (s.name.clone(), s)).collect()
    }

    #[test]
    fn test_grid_creation() {
        let grid = SpatialGrid::new(10, 5, Zone::Battlefield).unwrap();
        assert_eq!(grid.width(), 10);
        assert_eq!(grid.height(), 5);
        assert_eq!(grid.cells().len(), 50);
        assert_eq!(grid.cell(3, 2).unwrap().position, Vector2D::new(3, 2));
    }

    #[test]
    fn test_grid_rejects_zero_size() {
        assert!(SpatialGrid::new(0, 5, Zone::Battlefield).is_none());
        assert!(SpatialGrid::new(5, -1, Zone::Battlefield).is_none());
    }

    #[test]
    fn test_outside_is_none_and_occupied() {
        let grid = SpatialGrid::new(4, 4, Zone::Battlefield).unwrap();
        let none = EntityMap::new();
        assert!(grid.cell(-1, 0).is_none());
        assert!(grid.cell(4, 0).is_none());
        assert!(!grid.is_inside(Vector2D::new(0, 4)));
        assert!(grid.is_occupied(Vector2D::new(9, 9), &none, Some(Team::Red)));
    }

    #[test]
    fn test_gate_blocks_enemy_only() {
        let mut grid = SpatialGrid::new(4, 4, Zone::Battlefield).unwrap();
        let gate_pos = Vector2D::new(1, 1);
        let registry = structures(vec![MapStructure::gate("gate_b1", Team::Blue, gate_pos)]);
        grid.place_structure(gate_pos, "gate_b1").unwrap();

        assert!(!grid.is_occupied(gate_pos, &registry, Some(Team::Blue)));
        assert!(grid.is_occupied(gate_pos, &registry, Some(Team::Red)));

        let err = grid.place_agent(gate_pos, "warrior_r1", Team::Red, &registry);
        assert!(matches!(err, Err(WorldError::CellOccupied { .. })));
        grid.place_agent(gate_pos, "warrior_b1", Team::Blue, &registry).unwrap();
        assert_eq!(grid.get(gate_pos).unwrap().agent.as_deref(), Some("warrior_b1"));
    }

    #[test]
    fn test_second_agent_is_invariant_violation() {
        let mut grid = SpatialGrid::new(3, 3, Zone::Battlefield).unwrap();
        let none = EntityMap::new();
        let pos = Vector2D::new(1, 1);
        grid.place_agent(pos, "a", Team::Red, &none).unwrap();
        let err = grid.place_agent(pos, "b", Team::Red, &none).unwrap_err();
        assert!(matches!(err, WorldError::CellOccupied { occupant, .. } if occupant == "a"));
        assert!(grid.place_resource(pos, "princess_b", &none).is_err());
        assert!(grid.place_structure(pos, "wall").is_err());
    }

    #[test]
    fn test_resource_on_marker() {
        let mut grid = SpatialGrid::new(3, 3, Zone::Battlefield).unwrap();
        let pos = Vector2D::new(2, 2);
        let registry = structures(vec![MapStructure::marker(
            "empty_pb",
            MarkerTag::PrincessBlue,
            pos,
        )]);
        grid.place_structure(pos, "empty_pb").unwrap();
        grid.place_resource(pos, "princess_b", &registry).unwrap();
        assert!(grid.is_occupied(pos, &registry, Some(Team::Blue)));
        assert!(grid.clear_resource(pos, "princess_b"));
        assert!(!grid.clear_resource(pos, "princess_b"));
        assert!(!grid.is_occupied(pos, &registry, Some(Team::Blue)));
    }

    #[test]
    fn test_cells_matching_include_and_exclude() {
        let mut grid = SpatialGrid::new(3, 2, Zone::Battlefield).unwrap();
        grid.set_zone(Vector2D::new(0, 0), Zone::BlueBase);
        grid.set_zone(Vector2D::new(0, 1), Zone::BlueBase);
        let registry = structures(vec![MapStructure::tree("tree_0", Vector2D::new(2, 1))]);
        grid.place_structure(Vector2D::new(2, 1), "tree_0").unwrap();
        let agents = EntityMap::new();
        let resources = EntityMap::new();
        let occupants = Occupants {
            structures: &registry,
            agents: &agents,
            resources: &resources,
        };

        let base = grid.cells_matching(&CellFilter::any().in_zone(Zone::BlueBase), &occupants);
        let positions: Vec<_> = base.iter().map(|c| c.position).collect();
        assert_eq!(positions, vec![Vector2D::new(0, 0), Vector2D::new(0, 1)]);

        let not_base = grid.cells_matching(
            &CellFilter::any().in_zone(Zone::BlueBase).excluding(),
            &occupants,
        );
        assert_eq!(not_base.len(), 4);

        let trees = grid.cells_matching(
            &CellFilter::any().with_structure(Some(StructureClass::Tree), |s| s.hp > 0),
            &occupants,
        );
        assert_eq!(trees.len(), 1);
        let walls = grid.cells_matching(
            &CellFilter::any().with_structure_class(Some(StructureClass::Wall)),
            &occupants,
        );
        assert!(walls.is_empty());
    }

    #[test]
    fn test_agent_filter() {
        let mut grid = SpatialGrid::new(3, 3, Zone::Battlefield).unwrap();
        let none = EntityMap::new();
        let request = SpawnRequest::new("priest_r1", Role::Priest, Team::Red);
        let agent = Agent::new(&request, Pose::new(Vector2D::new(1, 1), Orientation::West));
        grid.place_agent(agent.position(), &agent.name, agent.team, &none).unwrap();
        let agents: EntityMap<Agent> = [(agent.name.clone(), agent)].into_iter().collect();
        let resources = EntityMap::new();
        let occupants = Occupants {
            structures: &none,
            agents: &agents,
            resources: &resources,
        };

        let priests = grid.cells_matching(
            &CellFilter::any().with_agent(Some(Role::Priest), |a| a.team == Team::Red),
            &occupants,
        );
        assert_eq!(priests.len(), 1);
        let warriors = grid.cells_matching(
            &CellFilter::any().with_agent(Some(Role::Warrior), |_| true),
            &occupants,
        );
        assert!(warriors.is_empty());
    }

    #[test]
    fn test_find_closest_tie_breaks_in_scan_order() {
        let grid = SpatialGrid::new(5, 5, Zone::Battlefield).unwrap();
        let none = EntityMap::new();
        let agents = EntityMap::new();
        let resources = EntityMap::new();
        let occupants = Occupants {
            structures: &none,
            agents: &agents,
            resources: &resources,
        };
        let corners = |c: &Cell| {
            (c.position.x == 0 || c.position.x == 4) && (c.position.y == 0 || c.position.y == 4)
        };
        let corner_positions: Vec<Vector2D> = grid
            .cells()
            .iter()
            .filter(|c| corners(c))
            .map(|c| c.position)
            .collect();
        assert_eq!(corner_positions.len(), 4);

        // The cell under the query point wins outright.
        let filter = CellFilter::any().in_zone(Zone::Battlefield);
        let closest = grid.find_closest(Vector2D::new(2, 2), &filter, &occupants).unwrap();
        assert_eq!(closest.position, Vector2D::new(2, 2));

        // All four corners are equidistant from the centre; the first scanned wins.
        let mut grid = grid;
        for position in corner_positions {
            grid.set_zone(position, Zone::RedBase);
        }
        let filter = CellFilter::any().in_zone(Zone::RedBase);
        let closest = grid.find_closest(Vector2D::new(2, 2), &filter, &occupants).unwrap();
        assert_eq!(closest.position, Vector2D::new(0, 0));
        let closest = grid.find_closest(Vector2D::new(3, 3), &filter, &occupants).unwrap();
        assert_eq!(closest.position, Vector2D::new(4, 4));
    }
}
