//! The world aggregate.
//!
//! Lock order for every multi-lock operation:
//!
//! ```text
//! grid ─► structures ─► agents ─► resources      (rng, events: leaf mutexes)
//! ```
//!
//! Readers take a [`WorldView`], which holds all four read guards at once, so
//! a query never observes an agent half-moved or a princess both carried and
//! on the ground.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{
    Mutex, MutexGuard, OnceLock, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard,
};

use rand::SeedableRng;
use tracing::{debug, info};

use crate::config::GameConfig;
use crate::error::{WorldError, WorldResult};
use crate::game::economy::WoodStock;
use crate::game::entity::{
    Agent, MapStructure, Resource, ResourceKind, Role, SpawnRequest, StructureClass, Team,
};
use crate::game::events::WorldEvent;
use crate::game::map::{Cell, CellFilter, Occupants, SpatialGrid, Zone};
use crate::game::mapgen::{generate_map, GameRng, GeneratedMap, Layout};
use crate::game::registry::{EntityMap, Registry};
use crate::geometry::{Pose, Vector2D};
use crate::objective::AgentState;

/// Offset mixed into the seed so world draws differ from map generation draws.
const WORLD_RNG_STREAM: u64 = 0x9e37_79b9_7f4a_7c15;

/// Shared battle state. `Send + Sync`; share it as `Arc<World>`.
#[derive(Debug)]
pub struct World {
    grid: RwLock<SpatialGrid>,
    pub(crate) structures: Registry<MapStructure>,
    pub(crate) agents: Registry<Agent>,
    pub(crate) resources: Registry<Resource>,
    pub(crate) wood: WoodStock,
    win: OnceLock<Team>,
    layout: Layout,
    config: GameConfig,
    tick: AtomicU64,
    rng: Mutex<GameRng>,
    events: Mutex<Vec<WorldEvent>>,
}

/// Consistent read-only snapshot of grid and registries.
#[derive(Debug)]
pub struct WorldView<'a> {
    grid: RwLockReadGuard<'a, SpatialGrid>,
    structures: RwLockReadGuard<'a, EntityMap<MapStructure>>,
    agents: RwLockReadGuard<'a, EntityMap<Agent>>,
    resources: RwLockReadGuard<'a, EntityMap<Resource>>,
    layout: &'a Layout,
}

/// Guards for operations that move agents or resources.
#[derive(Debug)]
pub(crate) struct WorldWrite<'a> {
    pub(crate) grid: RwLockWriteGuard<'a, SpatialGrid>,
    pub(crate) structures: RwLockReadGuard<'a, EntityMap<MapStructure>>,
    pub(crate) agents: RwLockWriteGuard<'a, EntityMap<Agent>>,
    pub(crate) resources: RwLockWriteGuard<'a, EntityMap<Resource>>,
}

/// What one call to [`World::step`] did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepReport {
    /// Tick after advancing.
    pub tick: u64,
    /// Agents that fell and were sent back to base as dead.
    pub respawned: Vec<String>,
    /// Agents whose respawn delay elapsed.
    pub reset: Vec<String>,
    /// Trees that grew back.
    pub regrown: Vec<String>,
}

impl World {
    /// Generate a fresh map from `config` and wrap it in a world.
    ///
    /// # Errors
    ///
    /// [`WorldError::MapGen`] if the dimensions are unusable.
    pub fn generate(config: &GameConfig) -> WorldResult<Self> {
        let map = generate_map(config.seed, config.width, config.height)?;
        info!(
            seed = config.seed,
            width = config.width,
            height = config.height,
            "world generated"
        );
        Ok(Self::from_map(map, config))
    }

    /// Wrap an already built map.
    #[must_use]
    pub fn from_map(map: GeneratedMap, config: &GameConfig) -> Self {
        Self {
            grid: RwLock::new(map.grid),
            structures: Registry::with_entries("structures", map.structures),
            agents: Registry::new("agents"),
            resources: Registry::with_entries("resources", map.resources),
            wood: WoodStock::default(),
            win: OnceLock::new(),
            layout: map.layout,
            config: *config,
            tick: AtomicU64::new(0),
            rng: Mutex::new(GameRng::seed_from_u64(config.seed ^ WORLD_RNG_STREAM)),
            events: Mutex::new(Vec::new()),
        }
    }

    /// Zone geometry.
    #[must_use]
    pub const fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Configuration the world was built with.
    #[must_use]
    pub const fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Current tick.
    #[must_use]
    pub fn tick(&self) -> u64 {
        self.tick.load(Ordering::SeqCst)
    }

    /// Winning team, once decided.
    #[must_use]
    pub fn winner(&self) -> Option<Team> {
        self.win.get().copied()
    }

    /// Set the winner if none is set yet. Returns the winner in effect.
    pub(crate) fn declare_winner(&self, team: Team) -> Team {
        let mut first = false;
        let winner = *self.win.get_or_init(|| {
            first = true;
            team
        });
        if first {
            info!(%winner, tick = self.tick(), "win declared");
            self.emit(WorldEvent::WinDeclared { team: winner });
        }
        winner
    }

    pub(crate) fn grid_read(&self) -> WorldResult<RwLockReadGuard<'_, SpatialGrid>> {
        self.grid.read().map_err(|_| WorldError::LockPoisoned("grid"))
    }

    fn grid_write(&self) -> WorldResult<RwLockWriteGuard<'_, SpatialGrid>> {
        self.grid.write().map_err(|_| WorldError::LockPoisoned("grid"))
    }

    /// Take a consistent snapshot for queries.
    ///
    /// # Errors
    ///
    /// [`WorldError::LockPoisoned`] if any lock is poisoned.
    pub fn view(&self) -> WorldResult<WorldView<'_>> {
        let grid = self.grid_read()?;
        let structures = self.structures.read()?;
        let agents = self.agents.read()?;
        let resources = self.resources.read()?;
        Ok(WorldView {
            grid,
            structures,
            agents,
            resources,
            layout: &self.layout,
        })
    }

    pub(crate) fn write_set(&self) -> WorldResult<WorldWrite<'_>> {
        let grid = self.grid_write()?;
        let structures = self.structures.read()?;
        let agents = self.agents.write()?;
        let resources = self.resources.write()?;
        Ok(WorldWrite {
            grid,
            structures,
            agents,
            resources,
        })
    }

    pub(crate) fn rng(&self) -> WorldResult<MutexGuard<'_, GameRng>> {
        self.rng.lock().map_err(|_| WorldError::LockPoisoned("rng"))
    }

    pub(crate) fn emit(&self, event: WorldEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }

    /// Hand all pending notifications to the caller.
    pub fn drain_events(&self) -> Vec<WorldEvent> {
        std::mem::take(&mut *self.events.lock().unwrap_or_else(PoisonError::into_inner))
    }

    /// Every agent, sorted by name.
    ///
    /// # Errors
    ///
    /// [`WorldError::LockPoisoned`] if the lock is poisoned.
    pub fn list_agents(&self) -> WorldResult<Vec<Agent>> {
        self.agents.get_all()
    }

    /// Snapshot of an agent, if registered.
    ///
    /// # Errors
    ///
    /// [`WorldError::LockPoisoned`] if the lock is poisoned.
    pub fn get_agent_by_name(&self, name: &str) -> WorldResult<Option<Agent>> {
        self.agents.get_by_name(name)
    }

    /// Snapshot of a structure, if registered.
    ///
    /// # Errors
    ///
    /// [`WorldError::LockPoisoned`] if the lock is poisoned.
    pub fn get_structure_by_name(&self, name: &str) -> WorldResult<Option<MapStructure>> {
        self.structures.get_by_name(name)
    }

    /// Snapshot of a resource, if registered.
    ///
    /// # Errors
    ///
    /// [`WorldError::LockPoisoned`] if the lock is poisoned.
    pub fn get_resource_by_name(&self, name: &str) -> WorldResult<Option<Resource>> {
        self.resources.get_by_name(name)
    }

    /// Whether an agent is registered.
    ///
    /// # Errors
    ///
    /// [`WorldError::LockPoisoned`] if the lock is poisoned.
    pub fn contains_agent(&self, name: &str) -> WorldResult<bool> {
        self.agents.contains(name)
    }

    /// Snapshot of the cell at `(x, y)`; `None` outside the grid.
    ///
    /// # Errors
    ///
    /// [`WorldError::LockPoisoned`] if the lock is poisoned.
    pub fn get_cell(&self, x: i32, y: i32) -> WorldResult<Option<Cell>> {
        Ok(self.grid_read()?.cell(x, y).cloned())
    }

    /// Snapshot of the cells selected by `filter`, in row-major order.
    ///
    /// # Errors
    ///
    /// [`WorldError::LockPoisoned`] if any lock is poisoned.
    pub fn cells_matching(&self, filter: &CellFilter<'_>) -> WorldResult<Vec<Cell>> {
        let view = self.view()?;
        Ok(view.cells_matching(filter).into_iter().cloned().collect())
    }

    /// Agents within Chebyshev `range` of `name`, sorted by name.
    ///
    /// # Errors
    ///
    /// [`WorldError::UnknownAgent`] or a poisoned lock.
    pub fn agents_neighboring(&self, name: &str, range: i32) -> WorldResult<Vec<Agent>> {
        let view = self.view()?;
        Ok(view
            .agents_neighboring(name, range)?
            .into_iter()
            .cloned()
            .collect())
    }

    /// Structures anchored within Chebyshev `range` of `position`.
    ///
    /// # Errors
    ///
    /// [`WorldError::LockPoisoned`] if any lock is poisoned.
    pub fn structures_in_range(
        &self,
        position: Vector2D,
        range: i32,
    ) -> WorldResult<Vec<MapStructure>> {
        let view = self.view()?;
        Ok(view
            .structures_in_range(position, range)
            .into_iter()
            .cloned()
            .collect())
    }

    /// Ground resources within Chebyshev `range` of `position`.
    ///
    /// # Errors
    ///
    /// [`WorldError::LockPoisoned`] if any lock is poisoned.
    pub fn resources_in_range(&self, position: Vector2D, range: i32) -> WorldResult<Vec<Resource>> {
        let view = self.view()?;
        Ok(view
            .resources_in_range(position, range)
            .into_iter()
            .cloned()
            .collect())
    }

    /// Record the state an agent has reached.
    ///
    /// # Errors
    ///
    /// [`WorldError::UnknownAgent`] or a poisoned lock.
    pub fn set_agent_state(&self, name: &str, state: AgentState) -> WorldResult<()> {
        let mut agents = self.agents.write()?;
        let agent = agents
            .get_mut(name)
            .ok_or_else(|| WorldError::UnknownAgent(name.to_string()))?;
        agent.state = state;
        Ok(())
    }

    /// Register a structure covering `cells`. Used while building custom maps.
    ///
    /// # Errors
    ///
    /// [`WorldError::DuplicateName`] or [`WorldError::CellOccupied`].
    pub fn add_structure(&self, structure: MapStructure, cells: &[Vector2D]) -> WorldResult<()> {
        let mut grid = self.grid_write()?;
        let mut structures = self.structures.write()?;
        if structures.contains_key(&structure.name) {
            return Err(WorldError::DuplicateName(structure.name));
        }
        for &cell in cells {
            grid.place_structure(cell, &structure.name)?;
        }
        structures.insert(structure.name.clone(), structure);
        Ok(())
    }

    /// Register a ground resource at its pose.
    ///
    /// # Errors
    ///
    /// [`WorldError::DuplicateName`] or [`WorldError::CellOccupied`].
    pub fn add_resource(&self, resource: Resource) -> WorldResult<()> {
        let mut set = self.write_set()?;
        if set.resources.contains_key(&resource.name) {
            return Err(WorldError::DuplicateName(resource.name));
        }
        set.grid
            .place_resource(resource.position(), &resource.name, &set.structures)?;
        set.resources.insert(resource.name.clone(), resource);
        Ok(())
    }

    /// Create an agent directly on `position` (bypassing the random base cell).
    ///
    /// # Errors
    ///
    /// [`WorldError::DuplicateName`] or [`WorldError::CellOccupied`].
    pub fn add_agent_at(&self, request: &SpawnRequest, position: Vector2D) -> WorldResult<()> {
        let mut set = self.write_set()?;
        if set.agents.contains_key(&request.name) {
            return Err(WorldError::DuplicateName(request.name.clone()));
        }
        set.grid
            .place_agent(position, &request.name, request.team, &set.structures)?;
        let agent = Agent::new(request, Pose::new(position, request.team.forward()));
        set.agents.insert(agent.name.clone(), agent);
        drop(set);
        self.emit(WorldEvent::AgentCreated {
            agent: request.name.clone(),
            position,
        });
        Ok(())
    }

    /// Advance the clock and run tick-driven lifecycle rules.
    ///
    /// Agents at zero HP are sent back to base as dead; dead agents whose
    /// delay elapsed are reset; destroyed trees whose delay elapsed regrow.
    ///
    /// # Errors
    ///
    /// Propagates world errors from the lifecycle operations.
    pub fn step(&self) -> WorldResult<StepReport> {
        let tick = self.tick.fetch_add(1, Ordering::SeqCst) + 1;

        let fallen = self
            .agents
            .names_where(|a| !a.is_alive() && a.respawn_at.is_none())?;
        let mut sent_back = Vec::with_capacity(fallen.len());
        for name in fallen {
            if self.spawn_agent(&name)? {
                sent_back.push(name);
            }
        }

        let due = self
            .agents
            .names_where(|a| a.respawn_at.is_some_and(|at| at <= tick))?;
        for name in &due {
            self.reset_agent(name)?;
        }

        let regrown = self.regrow_trees(tick)?;
        if !sent_back.is_empty() || !due.is_empty() || !regrown.is_empty() {
            debug!(
                tick,
                fallen = sent_back.len(),
                reset = due.len(),
                regrown = regrown.len(),
                "lifecycle step"
            );
        }
        Ok(StepReport {
            tick,
            respawned: sent_back,
            reset: due,
            regrown,
        })
    }

    fn regrow_trees(&self, tick: u64) -> WorldResult<Vec<String>> {
        let grid = self.grid_read()?;
        let mut structures = self.structures.write()?;
        let mut regrown = Vec::new();
        for tree in structures.values_mut() {
            if !tree.regrow_at.is_some_and(|at| at <= tick) {
                continue;
            }
            let free = grid
                .get(tree.position())
                .is_some_and(|cell| cell.agent.is_none() && cell.resource.is_none());
            if free {
                tree.hp = tree.max_hp;
                tree.regrow_at = None;
                regrown.push(tree.name.clone());
            }
        }
        drop(structures);
        drop(grid);
        regrown.sort();
        for tree in &regrown {
            self.emit(WorldEvent::TreeRegrown { tree: tree.clone() });
        }
        Ok(regrown)
    }
}

impl WorldView<'_> {
    /// The grid.
    #[must_use]
    pub fn grid(&self) -> &SpatialGrid {
        &self.grid
    }

    /// Zone geometry.
    #[must_use]
    pub const fn layout(&self) -> &Layout {
        self.layout
    }

    /// Registry contents for filter evaluation.
    #[must_use]
    pub fn occupants(&self) -> Occupants<'_> {
        Occupants {
            structures: &self.structures,
            agents: &self.agents,
            resources: &self.resources,
        }
    }

    /// Agent by name.
    ///
    /// # Errors
    ///
    /// [`WorldError::UnknownAgent`].
    pub fn agent(&self, name: &str) -> WorldResult<&Agent> {
        self.agents
            .get(name)
            .ok_or_else(|| WorldError::UnknownAgent(name.to_string()))
    }

    /// Structure by name.
    ///
    /// # Errors
    ///
    /// [`WorldError::UnknownStructure`].
    pub fn structure(&self, name: &str) -> WorldResult<&MapStructure> {
        self.structures
            .get(name)
            .ok_or_else(|| WorldError::UnknownStructure(name.to_string()))
    }

    /// Resource by name.
    ///
    /// # Errors
    ///
    /// [`WorldError::UnknownResource`].
    pub fn resource(&self, name: &str) -> WorldResult<&Resource> {
        self.resources
            .get(name)
            .ok_or_else(|| WorldError::UnknownResource(name.to_string()))
    }

    /// All agents, unordered.
    pub fn agents(&self) -> impl Iterator<Item = &Agent> {
        self.agents.values()
    }

    /// All structures, unordered.
    pub fn structures(&self) -> impl Iterator<Item = &MapStructure> {
        self.structures.values()
    }

    /// All resources, unordered.
    pub fn resources(&self) -> impl Iterator<Item = &Resource> {
        self.resources.values()
    }

    /// Cell at `position`.
    #[must_use]
    pub fn cell(&self, position: Vector2D) -> Option<&Cell> {
        self.grid.get(position)
    }

    /// Zone at `position`.
    #[must_use]
    pub fn zone_at(&self, position: Vector2D) -> Option<Zone> {
        self.grid.get(position).map(|cell| cell.zone)
    }

    /// Structure covering `position`.
    #[must_use]
    pub fn structure_at(&self, position: Vector2D) -> Option<&MapStructure> {
        self.grid
            .get(position)
            .and_then(|cell| cell.structure.as_deref())
            .and_then(|name| self.structures.get(name))
    }

    /// Whether `position` is a bridge cell.
    #[must_use]
    pub fn is_on_bridge(&self, position: Vector2D) -> bool {
        self.structure_at(position)
            .is_some_and(|s| s.kind.class() == StructureClass::Bridge)
    }

    /// Whether an agent of `team` could step onto `position`.
    #[must_use]
    pub fn is_enterable(&self, position: Vector2D, team: Team) -> bool {
        self.zone_at(position).is_some_and(|zone| zone != Zone::OutOfMap)
            && !self.grid.is_occupied(position, &self.structures, Some(team))
    }

    /// Cells selected by `filter`, in row-major order.
    #[must_use]
    pub fn cells_matching(&self, filter: &CellFilter<'_>) -> Vec<&Cell> {
        self.grid.cells_matching(filter, &self.occupants())
    }

    /// Selected cell nearest to `from` (Euclidean, first in scan order on ties).
    #[must_use]
    pub fn find_closest(&self, from: Vector2D, filter: &CellFilter<'_>) -> Option<&Cell> {
        self.grid.find_closest(from, filter, &self.occupants())
    }

    /// Agents within Chebyshev `range` of `name`, sorted by name.
    ///
    /// A priest and a same-team agent at full HP are never neighbours of
    /// each other.
    ///
    /// # Errors
    ///
    /// [`WorldError::UnknownAgent`].
    pub fn agents_neighboring(&self, name: &str, range: i32) -> WorldResult<Vec<&Agent>> {
        let center = self.agent(name)?;
        let mut found: Vec<&Agent> = self
            .agents
            .values()
            .filter(|other| other.name != center.name)
            .filter(|other| other.position().is_within(center.position(), range))
            .filter(|other| !is_wasted_heal_pair(center, other))
            .collect();
        found.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(found)
    }

    /// Structures anchored within Chebyshev `range` of `position`, sorted by name.
    #[must_use]
    pub fn structures_in_range(&self, position: Vector2D, range: i32) -> Vec<&MapStructure> {
        let mut found: Vec<&MapStructure> = self
            .structures
            .values()
            .filter(|s| s.position().is_within(position, range))
            .collect();
        found.sort_by(|a, b| a.name.cmp(&b.name));
        found
    }

    /// Ground (not carried) resources within Chebyshev `range` of `position`.
    #[must_use]
    pub fn resources_in_range(&self, position: Vector2D, range: i32) -> Vec<&Resource> {
        let mut found: Vec<&Resource> = self
            .resources
            .values()
            .filter(|r| !r.is_carried() && r.position().is_within(position, range))
            .collect();
        found.sort_by(|a, b| a.name.cmp(&b.name));
        found
    }

    /// The princess belonging to `team`.
    #[must_use]
    pub fn princess_of(&self, team: Team) -> Option<&Resource> {
        self.resources
            .values()
            .find(|r| r.kind == ResourceKind::Princess && r.team == Some(team))
    }
}

fn is_wasted_heal_pair(center: &Agent, other: &Agent) -> bool {
    center.team == other.team
        && ((other.role == Role::Priest && center.is_full_hp())
            || (center.role == Role::Priest && other.is_full_hp()))
}
