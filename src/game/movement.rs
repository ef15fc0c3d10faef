//! Agent placement, movement and princess carrying.

use rand::Rng;
use rand::seq::SliceRandom;
use tracing::{debug, warn};

use crate::error::{WorldError, WorldResult};
use crate::game::entity::{Agent, MapStructure, SpawnRequest, Team};
use crate::game::events::WorldEvent;
use crate::game::map::{SpatialGrid, Zone};
use crate::game::registry::EntityMap;
use crate::game::state::{World, WorldWrite};
use crate::geometry::{Direction, Orientation, Pose, Vector2D};
use crate::objective::AgentState;

/// Nearest cell a resource may be put down on.
///
/// `vacating` names an agent about to leave its cell; `reserved` is a cell
/// about to be taken. Ties go to the first cell in row-major order.
fn landing_cell(
    grid: &SpatialGrid,
    structures: &EntityMap<MapStructure>,
    around: Vector2D,
    reach: Option<i32>,
    vacating: Option<&str>,
    reserved: Option<Vector2D>,
) -> Option<Vector2D> {
    let mut best: Option<(Vector2D, i64)> = None;
    for cell in grid.cells() {
        if cell.zone == Zone::OutOfMap || cell.resource.is_some() {
            continue;
        }
        if reserved == Some(cell.position) {
            continue;
        }
        if cell.agent.is_some() && cell.agent.as_deref() != vacating {
            continue;
        }
        if reach.is_some_and(|r| !cell.position.is_within(around, r)) {
            continue;
        }
        let walkable = cell.structure.as_deref().is_none_or(|name| {
            structures
                .get(name)
                .is_some_and(|s| s.is_walkable_for(None))
        });
        if !walkable {
            continue;
        }
        let distance = cell.position.distance_squared(around);
        if best.is_none_or(|(_, d)| distance < d) {
            best = Some((cell.position, distance));
        }
    }
    best.map(|(position, _)| position)
}

impl World {
    /// Random empty cell (no structure, agent or resource) in `team`'s base.
    fn free_base_cell(&self, grid: &SpatialGrid, team: Team) -> WorldResult<Option<Vector2D>> {
        let zone = Zone::base_of(team);
        let candidates: Vec<Vector2D> = grid
            .cells()
            .iter()
            .filter(|c| c.zone == zone)
            .filter(|c| c.structure.is_none() && c.agent.is_none() && c.resource.is_none())
            .map(|c| c.position)
            .collect();
        let mut rng = self.rng()?;
        Ok(candidates.choose(&mut *rng).copied())
    }

    /// Create the agent named in `request` if it does not exist yet.
    ///
    /// New agents appear on a random free cell of their base. Returns
    /// `Ok(true)` if an agent was created.
    ///
    /// # Errors
    ///
    /// [`WorldError::BaseFull`] if the base has no free cell.
    pub fn ensure_agent(&self, request: &SpawnRequest) -> WorldResult<bool> {
        let mut set = self.write_set()?;
        if set.agents.contains_key(&request.name) {
            return Ok(false);
        }
        let position = self
            .free_base_cell(&set.grid, request.team)?
            .ok_or(WorldError::BaseFull(request.team))?;
        set.grid
            .place_agent(position, &request.name, request.team, &set.structures)?;
        let agent = Agent::new(request, Pose::new(position, request.team.forward()));
        set.agents.insert(agent.name.clone(), agent);
        drop(set);

        debug!(agent = %request.name, role = request.role.label(), team = %request.team, %position, "agent created");
        self.emit(WorldEvent::AgentCreated {
            agent: request.name.clone(),
            position,
        });
        Ok(true)
    }

    /// Send an agent back to a random free cell of its base.
    ///
    /// An agent at zero HP becomes `dead` and waits `respawn_ticks` before
    /// [`World::reset_agent`]; any other agent restarts at `spawn`. A carried
    /// princess is put down on the vacated cell, or the nearest free cell.
    /// Returns `Ok(false)` if the base is full.
    ///
    /// # Errors
    ///
    /// [`WorldError::UnknownAgent`] or a poisoned lock.
    pub fn spawn_agent(&self, name: &str) -> WorldResult<bool> {
        let mut set = self.write_set()?;
        let agent = set
            .agents
            .get(name)
            .ok_or_else(|| WorldError::UnknownAgent(name.to_string()))?;
        let (old, team, dead, carried) = (
            agent.position(),
            agent.team,
            !agent.is_alive(),
            agent.carried.clone(),
        );

        let Some(target) = self.free_base_cell(&set.grid, team)? else {
            warn!(agent = name, %team, "base full, spawn postponed");
            return Ok(false);
        };
        let landing = match &carried {
            Some(_) => {
                let Some(cell) =
                    landing_cell(&set.grid, &set.structures, old, None, Some(name), Some(target))
                else {
                    warn!(agent = name, "no cell to drop princess, spawn postponed");
                    return Ok(false);
                };
                Some(cell)
            }
            None => None,
        };

        set.grid.clear_agent(old, name);
        set.grid.place_agent(target, name, team, &set.structures)?;
        let dropped = match (carried, landing) {
            (Some(princess), Some(cell)) => {
                put_down(&mut set, &princess, cell)?;
                Some((princess, cell))
            }
            _ => None,
        };

        let respawn_at = self.tick().saturating_add(self.config().respawn_ticks);
        if let Some(agent) = set.agents.get_mut(name) {
            agent.pose = Pose::new(target, team.forward());
            agent.carried = None;
            if dead {
                agent.state = AgentState::Dead;
                agent.respawn_at = Some(respawn_at);
            } else {
                agent.state = AgentState::Spawn;
                agent.respawn_at = None;
            }
        }
        drop(set);

        debug!(agent = name, %target, dead, "agent spawned");
        if let Some((princess, position)) = dropped {
            self.emit(WorldEvent::PrincessDropped { princess, position });
        }
        self.emit(WorldEvent::AgentRespawned {
            agent: name.to_string(),
            position: target,
            dead,
        });
        Ok(true)
    }

    /// Restore full HP and restart the agent at `spawn`.
    ///
    /// # Errors
    ///
    /// [`WorldError::UnknownAgent`] or a poisoned lock.
    pub fn reset_agent(&self, name: &str) -> WorldResult<()> {
        let mut agents = self.agents.write()?;
        let agent = agents
            .get_mut(name)
            .ok_or_else(|| WorldError::UnknownAgent(name.to_string()))?;
        agent.hp = agent.max_hp;
        agent.state = AgentState::Spawn;
        agent.respawn_at = None;
        drop(agents);

        debug!(agent = name, "agent reset");
        self.emit(WorldEvent::AgentReset {
            agent: name.to_string(),
        });
        Ok(())
    }

    /// Move an agent (and its princess) to `target`, facing `orientation`.
    ///
    /// Fails (`Ok(false)`) outside the grid, out of map, onto an occupied
    /// cell, or for a dead agent.
    ///
    /// # Errors
    ///
    /// [`WorldError::UnknownAgent`] or a poisoned lock.
    pub fn move_agent(
        &self,
        name: &str,
        target: Vector2D,
        orientation: Orientation,
    ) -> WorldResult<bool> {
        let mut set = self.write_set()?;
        let moved = move_locked(&mut set, name, Pose::new(target, orientation))?;
        drop(set);
        Ok(self.after_move(name, moved))
    }

    /// Turn towards `direction` relative to the current facing and walk
    /// `step` cells. [`Direction::Random`] draws one of the four turns.
    ///
    /// A step whose destination overflows the coordinate range fails like
    /// any other unreachable cell.
    ///
    /// # Errors
    ///
    /// [`WorldError::UnknownAgent`] or a poisoned lock.
    pub fn move_agent_step(&self, name: &str, step: i32, direction: Direction) -> WorldResult<bool> {
        let direction = match direction {
            Direction::Random => {
                let mut rng = self.rng()?;
                Direction::CONCRETE[rng.gen_range(0..Direction::CONCRETE.len())]
            }
            concrete => concrete,
        };
        let mut set = self.write_set()?;
        let pose = set
            .agents
            .get(name)
            .ok_or_else(|| WorldError::UnknownAgent(name.to_string()))?
            .pose;
        let Some(target) = pose.stepped(step, direction) else {
            return Ok(false);
        };
        let moved = move_locked(&mut set, name, target)?;
        drop(set);
        Ok(self.after_move(name, moved))
    }

    fn after_move(&self, name: &str, moved: Option<(Vector2D, Vector2D)>) -> bool {
        let Some((from, to)) = moved else {
            return false;
        };
        debug!(agent = name, %from, %to, "agent moved");
        self.emit(WorldEvent::AgentMoved {
            agent: name.to_string(),
            from,
            to,
        });
        true
    }

    /// Take a ground princess. Fails if it is already carried, or the agent
    /// is dead or already carrying.
    ///
    /// # Errors
    ///
    /// Unknown names or a poisoned lock.
    pub fn pick_up_princess(&self, name: &str, princess: &str) -> WorldResult<bool> {
        self.lift_princess(name, princess, None)
    }

    /// [`World::pick_up_princess`], refused when she lies farther than `reach`.
    pub(crate) fn lift_princess(
        &self,
        name: &str,
        princess: &str,
        reach: Option<i32>,
    ) -> WorldResult<bool> {
        let mut set = self.write_set()?;
        let agent = set
            .agents
            .get(name)
            .ok_or_else(|| WorldError::UnknownAgent(name.to_string()))?;
        let (pose, can_carry) = (agent.pose, agent.is_alive() && !agent.is_carrying());
        let resource = set
            .resources
            .get_mut(princess)
            .ok_or_else(|| WorldError::UnknownResource(princess.to_string()))?;
        if !can_carry || resource.is_carried() {
            return Ok(false);
        }
        if reach.is_some_and(|range| !resource.position().is_within(pose.position, range)) {
            return Ok(false);
        }
        let ground = resource.position();
        resource.carried_by = Some(name.to_string());
        resource.pose = pose;
        set.grid.clear_resource(ground, princess);
        if let Some(agent) = set.agents.get_mut(name) {
            agent.carried = Some(princess.to_string());
        }
        drop(set);

        debug!(agent = name, princess, "princess picked up");
        self.emit(WorldEvent::PrincessPickedUp {
            princess: princess.to_string(),
            carrier: name.to_string(),
        });
        Ok(true)
    }

    /// Put the carried princess on the nearest free cell next to the agent.
    ///
    /// Fails if the agent carries nothing or every neighbouring cell is taken.
    ///
    /// # Errors
    ///
    /// [`WorldError::UnknownAgent`] or a poisoned lock.
    pub fn drop_princess(&self, name: &str) -> WorldResult<bool> {
        let mut set = self.write_set()?;
        let agent = set
            .agents
            .get(name)
            .ok_or_else(|| WorldError::UnknownAgent(name.to_string()))?;
        let Some(princess) = agent.carried.clone() else {
            return Ok(false);
        };
        let Some(cell) = landing_cell(&set.grid, &set.structures, agent.position(), Some(1), None, None)
        else {
            return Ok(false);
        };
        put_down(&mut set, &princess, cell)?;
        if let Some(agent) = set.agents.get_mut(name) {
            agent.carried = None;
        }
        drop(set);

        debug!(agent = name, %princess, %cell, "princess dropped");
        self.emit(WorldEvent::PrincessDropped {
            princess,
            position: cell,
        });
        Ok(true)
    }
}

/// Relocate under an already held write set. Returns `(from, to)` on success.
fn move_locked(
    set: &mut WorldWrite<'_>,
    name: &str,
    pose: Pose,
) -> WorldResult<Option<(Vector2D, Vector2D)>> {
    let agent = set
        .agents
        .get(name)
        .ok_or_else(|| WorldError::UnknownAgent(name.to_string()))?;
    let (from, team, carried) = (agent.position(), agent.team, agent.carried.clone());
    if !agent.is_alive() {
        return Ok(None);
    }
    let target = pose.position;
    if set
        .grid
        .get(target)
        .is_none_or(|cell| cell.zone == Zone::OutOfMap)
    {
        return Ok(None);
    }
    if set.grid.is_occupied(target, &set.structures, Some(team)) {
        return Ok(None);
    }

    set.grid.clear_agent(from, name);
    set.grid.place_agent(target, name, team, &set.structures)?;
    if let Some(agent) = set.agents.get_mut(name) {
        agent.pose = pose;
    }
    if let Some(resource) = carried.and_then(|p| set.resources.get_mut(&p)) {
        resource.pose = pose;
    }
    Ok(Some((from, target)))
}

/// Release a carried princess onto `cell`.
fn put_down(set: &mut WorldWrite<'_>, princess: &str, cell: Vector2D) -> WorldResult<()> {
    set.grid.place_resource(cell, princess, &set.structures)?;
    if let Some(resource) = set.resources.get_mut(princess) {
        resource.carried_by = None;
        resource.pose = resource.pose.at(cell);
    }
    Ok(())
}
