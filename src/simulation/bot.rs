//! Scripted stand-in for the external agent runtime.
//!
//! Each tick a bot reads its objective, then submits the first applicable
//! action from a fixed priority list:
//!
//! 1. priest heals the most injured ally in range
//! 2. attack the nearest living enemy in range
//! 3. pick up an adjacent princess lying outside the own base
//! 4. gatherer chops an adjacent tree while the stock is short
//! 5. gatherer repairs an adjacent destroyed own gate
//! 6. drop a captured enemy princess at her holding cell
//! 7. adopt the objective state once its target is reached
//! 8. break an enemy gate standing on the path
//! 9. step greedily toward the target, or wander when blocked

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::{trace, warn};

use crate::error::{WorldError, WorldResult};
use crate::game::{
    Action, ActionHandler, ActionRequest, Agent, GameRng, MarkerTag, ResourceKind, Role,
    SpawnRequest, StructureClass, StructureKind, TOUCH_RANGE, WOOD_STOCKPILE, World, WorldView,
    Zone,
};
use crate::geometry::{Orientation, Vector2D};
use crate::objective::{AgentState, Objective};

/// Chance that a scripted attack is a critical hit.
pub const CRIT_CHANCE: f64 = 0.1;

/// Per-agent decision maker with its own random stream.
#[derive(Debug, Clone)]
pub struct Bot {
    request: SpawnRequest,
    rng: GameRng,
    /// Land-or-bridge choice, kept while the agent stands at `choose_path`.
    route: Option<Objective>,
}

impl Bot {
    /// Bot for `request`, drawing from stream `stream` of `seed`.
    #[must_use]
    pub fn new(request: SpawnRequest, seed: u64, stream: u64) -> Self {
        let mut rng = GameRng::seed_from_u64(seed);
        rng.set_stream(stream);
        Self {
            request,
            rng,
            route: None,
        }
    }

    /// Name of the driven agent.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.request.name
    }

    /// Identity sent with every action.
    #[must_use]
    pub const fn request(&self) -> &SpawnRequest {
        &self.request
    }

    /// Decide and submit one action. Returns whether it took effect.
    ///
    /// A [`WorldError::CellOccupied`] race aborts only this action.
    ///
    /// # Errors
    ///
    /// Any other world error.
    pub fn act(&mut self, handler: &ActionHandler) -> WorldResult<bool> {
        let Some(action) = self.decide(handler.world())? else {
            return Ok(false);
        };
        let request = ActionRequest::new(self.request.clone(), action);
        match handler.handle(&request) {
            Err(WorldError::CellOccupied { position, occupant }) => {
                warn!(agent = self.name(), %position, occupant, "action lost an occupancy race");
                Ok(false)
            }
            other => other,
        }
    }

    /// Pick the next action without submitting it. `None` means idle.
    ///
    /// # Errors
    ///
    /// A poisoned lock.
    pub fn decide(&mut self, world: &World) -> WorldResult<Option<Action>> {
        let Some(agent) = world.get_agent_by_name(self.name())? else {
            return Ok(Some(Action::Spawn));
        };
        if !agent.is_alive() {
            return Ok(None);
        }
        let objective = self.objective(world, agent.state)?;
        if matches!(
            objective.state,
            AgentState::MyTeamWon | AgentState::MyTeamLost
        ) {
            return Ok(None);
        }

        let view = world.view()?;
        let agent = view.agent(self.name())?;
        if !agent.is_alive() {
            return Ok(None);
        }
        let action = self.choose(world, &view, agent, objective);
        trace!(agent = self.name(), ?objective, ?action, "bot decision");
        Ok(action)
    }

    fn objective(&mut self, world: &World, state: AgentState) -> WorldResult<Objective> {
        let fresh = world.closest_objective_with(&self.request.name, &mut self.rng)?;
        let route_choice = state == AgentState::ChoosePath
            && matches!(
                fresh.state,
                AgentState::TowardsLandPassage | AgentState::TowardsBridge
            );
        if !route_choice {
            self.route = None;
            return Ok(fresh);
        }
        Ok(*self.route.get_or_insert(fresh))
    }

    fn choose(
        &mut self,
        world: &World,
        view: &WorldView<'_>,
        agent: &Agent,
        objective: Objective,
    ) -> Option<Action> {
        if let Some(action) = heal(view, agent) {
            return Some(action);
        }
        if let Some(target) = nearest_enemy(view, agent) {
            return Some(Action::Attack {
                target,
                crit: self.rng.gen_bool(CRIT_CHANCE),
            });
        }
        if let Some(action) = pick_up(view, agent) {
            return Some(action);
        }
        if let Some(action) = gather_or_repair(world, view, agent) {
            return Some(action);
        }
        if drop_at_hold(view, agent) {
            return Some(Action::Drop);
        }

        let Some(target) = objective.target else {
            return adopt(agent, objective);
        };
        if is_reached(view, agent, target) {
            return adopt(agent, objective);
        }
        self.walk(view, agent, target)
    }

    /// Greedy step: the neighbouring cell that brings the agent closest to
    /// `target` in Euclidean distance. An enemy gate in the way is attacked.
    fn walk(&mut self, view: &WorldView<'_>, agent: &Agent, target: Vector2D) -> Option<Action> {
        let position = agent.position();
        let here = position.distance_squared(target);
        let best = Orientation::ALL
            .into_iter()
            .map(|orientation| (orientation, position + orientation.unit()))
            .filter(|&(_, next)| {
                next.distance_squared(target) < here
                    && (view.is_enterable(next, agent.team)
                        || enemy_gate(view, agent, next).is_some())
            })
            .min_by_key(|&(_, next)| next.distance_squared(target));

        let Some((orientation, next)) = best else {
            return self.wander(view, agent);
        };
        if let Some(gate) = enemy_gate(view, agent, next) {
            return Some(Action::AttackGate { gate });
        }
        let slip = match view.structure_at(next).map(|s| s.kind) {
            Some(StructureKind::Bridge { slip_probability }) => slip_probability.clamp(0.0, 1.0),
            _ => 0.0,
        };
        if slip > 0.0 && self.rng.gen_bool(slip) {
            trace!(agent = self.name(), %next, "slipped on the bridge");
            return None;
        }
        Some(Action::MoveTo {
            target: next,
            orientation,
        })
    }

    fn wander(&mut self, view: &WorldView<'_>, agent: &Agent) -> Option<Action> {
        let open: Vec<(Orientation, Vector2D)> = Orientation::ALL
            .into_iter()
            .map(|orientation| (orientation, agent.position() + orientation.unit()))
            .filter(|&(_, next)| view.is_enterable(next, agent.team))
            .collect();
        open.choose(&mut self.rng)
            .map(|&(orientation, target)| Action::MoveTo {
                target,
                orientation,
            })
    }
}

/// Name of a standing enemy gate at `position`.
fn enemy_gate(view: &WorldView<'_>, agent: &Agent, position: Vector2D) -> Option<String> {
    view.structure_at(position)
        .filter(|s| {
            s.kind.class() == StructureClass::Gate
                && s.team != Some(agent.team)
                && !s.is_destroyed()
        })
        .map(|gate| gate.name.clone())
}

fn heal(view: &WorldView<'_>, agent: &Agent) -> Option<Action> {
    if agent.role != Role::Priest {
        return None;
    }
    view.agents_neighboring(&agent.name, agent.attack_range)
        .ok()?
        .into_iter()
        .filter(|other| other.team == agent.team && other.is_alive() && !other.is_full_hp())
        .min_by_key(|other| other.hp)
        .map(|patient| Action::Heal {
            target: patient.name.clone(),
        })
}

fn nearest_enemy(view: &WorldView<'_>, agent: &Agent) -> Option<String> {
    view.agents_neighboring(&agent.name, agent.attack_range)
        .ok()?
        .into_iter()
        .filter(|other| other.team != agent.team && other.is_alive())
        .min_by_key(|other| other.position().distance_squared(agent.position()))
        .map(|enemy| enemy.name.clone())
}

/// Either princess may be taken once she lies outside the own base.
fn pick_up(view: &WorldView<'_>, agent: &Agent) -> Option<Action> {
    if agent.is_carrying() {
        return None;
    }
    let own_base = Some(Zone::base_of(agent.team));
    view.resources_in_range(agent.position(), TOUCH_RANGE)
        .into_iter()
        .find(|r| r.kind == ResourceKind::Princess && view.zone_at(r.position()) != own_base)
        .map(|princess| Action::PickUp {
            princess: princess.name.clone(),
        })
}

fn gather_or_repair(world: &World, view: &WorldView<'_>, agent: &Agent) -> Option<Action> {
    if agent.role != Role::Gatherer {
        return None;
    }
    let wood = world.wood_amount(agent.team);
    let nearby = view.structures_in_range(agent.position(), TOUCH_RANGE);
    if wood < WOOD_STOCKPILE {
        let tree = nearby
            .iter()
            .find(|s| s.kind.class() == StructureClass::Tree && s.hp > 0);
        if let Some(tree) = tree {
            return Some(Action::AttackTree {
                tree: tree.name.clone(),
            });
        }
    }
    if world.is_enough_wood(agent.team) {
        let gate = nearby
            .iter()
            .find(|s| s.is_repairable() && s.team == Some(agent.team) && s.is_destroyed());
        if let Some(gate) = gate {
            return Some(Action::RepairGate {
                gate: gate.name.clone(),
            });
        }
    }
    None
}

/// Carrying the enemy princess, inside the own base, next to her holding cell.
fn drop_at_hold(view: &WorldView<'_>, agent: &Agent) -> bool {
    let Some(princess) = agent.carried.as_deref().and_then(|n| view.resource(n).ok()) else {
        return false;
    };
    if princess.team == Some(agent.team)
        || view.zone_at(agent.position()) != Some(Zone::base_of(agent.team))
    {
        return false;
    }
    let hold = MarkerTag::princess_hold(agent.team.opponent());
    view.structures_in_range(agent.position(), TOUCH_RANGE)
        .iter()
        .any(|s| s.marker_tag() == Some(hold))
}

/// On the target, or next to it when it cannot be entered.
fn is_reached(view: &WorldView<'_>, agent: &Agent, target: Vector2D) -> bool {
    let position = agent.position();
    position == target
        || (position.is_within(target, 1) && !view.is_enterable(target, agent.team))
}

fn adopt(agent: &Agent, objective: Objective) -> Option<Action> {
    (agent.state != objective.state).then_some(Action::SetState {
        state: objective.state,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::game::fixtures::{open_world, put, set_hp};
    use crate::game::{MapStructure, Resource, Team};

    fn bot(name: &str, role: Role, team: Team) -> Bot {
        Bot::new(SpawnRequest::new(name, role, team), 7, 0)
    }

    #[test]
    fn test_unknown_agent_spawns_first() {
        let world = open_world();
        let mut bot = bot("warrior_b1", Role::Warrior, Team::Blue);
        assert_eq!(bot.decide(&world).unwrap(), Some(Action::Spawn));
    }

    #[test]
    fn test_dead_agent_idles() {
        let world = open_world();
        put(&world, "warrior_b1", Role::Warrior, Team::Blue, 10, 7);
        set_hp(&world, "warrior_b1", 0);
        let mut bot = bot("warrior_b1", Role::Warrior, Team::Blue);
        assert_eq!(bot.decide(&world).unwrap(), None);
    }

    #[test]
    fn test_attacks_adjacent_enemy() {
        let world = open_world();
        put(&world, "warrior_b1", Role::Warrior, Team::Blue, 10, 7);
        put(&world, "warrior_r1", Role::Warrior, Team::Red, 11, 7);
        let mut bot = bot("warrior_b1", Role::Warrior, Team::Blue);
        let action = bot.decide(&world).unwrap();
        assert!(matches!(action, Some(Action::Attack { target, .. }) if target == "warrior_r1"));
    }

    #[test]
    fn test_priest_heals_before_attacking() {
        let world = open_world();
        put(&world, "priest_b1", Role::Priest, Team::Blue, 10, 7);
        put(&world, "warrior_b1", Role::Warrior, Team::Blue, 11, 7);
        put(&world, "warrior_r1", Role::Warrior, Team::Red, 9, 7);
        set_hp(&world, "warrior_b1", 30);
        let mut bot = bot("priest_b1", Role::Priest, Team::Blue);
        assert_eq!(
            bot.decide(&world).unwrap(),
            Some(Action::Heal {
                target: "warrior_b1".to_string()
            })
        );
    }

    #[test]
    fn test_picks_up_princess_outside_own_base() {
        let world = open_world();
        put(&world, "warrior_r1", Role::Warrior, Team::Red, 15, 7);
        world
            .add_resource(Resource::princess("princess_b", Team::Blue, Vector2D::new(16, 7)))
            .unwrap();
        let mut bot = bot("warrior_r1", Role::Warrior, Team::Red);
        assert_eq!(
            bot.decide(&world).unwrap(),
            Some(Action::PickUp {
                princess: "princess_b".to_string()
            })
        );
    }

    #[test]
    fn test_gatherer_chops_adjacent_tree() {
        let world = open_world();
        put(&world, "gatherer_b1", Role::Gatherer, Team::Blue, 12, 7);
        let tree = Vector2D::new(12, 6);
        world
            .add_structure(MapStructure::tree("tree_0", tree), &[tree])
            .unwrap();
        let mut bot = bot("gatherer_b1", Role::Gatherer, Team::Blue);
        assert_eq!(
            bot.decide(&world).unwrap(),
            Some(Action::AttackTree {
                tree: "tree_0".to_string()
            })
        );
    }

    #[test]
    fn test_breaks_enemy_gate_on_path() {
        let world = open_world();
        for y in 4..=10 {
            let position = Vector2D::new(33, y);
            if y == 7 {
                world
                    .add_structure(MapStructure::gate("gate_r1", Team::Red, position), &[position])
                    .unwrap();
            } else {
                world
                    .add_structure(MapStructure::wall(format!("wall_{y}"), position), &[position])
                    .unwrap();
            }
        }
        put(&world, "warrior_b1", Role::Warrior, Team::Blue, 32, 7);
        world
            .set_agent_state("warrior_b1", AgentState::EnemyGateReached)
            .unwrap();
        world
            .add_resource(Resource::princess("princess_b", Team::Blue, Vector2D::new(36, 7)))
            .unwrap();
        let mut bot = bot("warrior_b1", Role::Warrior, Team::Blue);
        assert_eq!(
            bot.decide(&world).unwrap(),
            Some(Action::AttackGate {
                gate: "gate_r1".to_string()
            })
        );
    }

    #[test]
    fn test_adopts_state_once_reached() {
        let world = open_world();
        let gate = Vector2D::new(6, 5);
        world
            .add_structure(MapStructure::gate("gate_b1", Team::Blue, gate), &[gate])
            .unwrap();
        put(&world, "warrior_b1", Role::Warrior, Team::Blue, 6, 5);
        let mut bot = bot("warrior_b1", Role::Warrior, Team::Blue);
        assert_eq!(
            bot.decide(&world).unwrap(),
            Some(Action::SetState {
                state: AgentState::ExitFromAllyBase
            })
        );
    }

    #[test]
    fn test_walks_toward_target() {
        let world = open_world();
        let gate = Vector2D::new(6, 5);
        world
            .add_structure(MapStructure::gate("gate_b1", Team::Blue, gate), &[gate])
            .unwrap();
        put(&world, "warrior_b1", Role::Warrior, Team::Blue, 3, 5);
        let handler = ActionHandler::new(Arc::new(world));
        let mut bot = bot("warrior_b1", Role::Warrior, Team::Blue);
        assert!(bot.act(&handler).unwrap());
        let agent = handler
            .world()
            .get_agent_by_name("warrior_b1")
            .unwrap()
            .unwrap();
        assert_eq!(agent.position(), Vector2D::new(4, 5));
        assert_eq!(agent.pose.orientation, Orientation::East);
    }

    #[test]
    fn test_greedy_step_sidesteps_a_wall() {
        let world = open_world();
        let wall = Vector2D::new(11, 7);
        world
            .add_structure(MapStructure::wall("wall_0", wall), &[wall])
            .unwrap();
        put(&world, "warrior_b1", Role::Warrior, Team::Blue, 10, 7);
        let view = world.view().unwrap();
        let agent = view.agent("warrior_b1").unwrap();
        let mut bot = bot("warrior_b1", Role::Warrior, Team::Blue);
        let action = bot.walk(&view, agent, Vector2D::new(14, 6));
        assert_eq!(
            action,
            Some(Action::MoveTo {
                target: Vector2D::new(10, 6),
                orientation: Orientation::North,
            })
        );
    }

    #[test]
    fn test_route_choice_is_kept() {
        let world = World::generate(&crate::config::GameConfig::default()).unwrap();
        world
            .add_agent_at(
                &SpawnRequest::new("archer_b1", Role::Archer, Team::Blue),
                Vector2D::new(8, 7),
            )
            .unwrap();
        world
            .set_agent_state("archer_b1", AgentState::ChoosePath)
            .unwrap();
        let mut bot = bot("archer_b1", Role::Archer, Team::Blue);
        let first = bot.objective(&world, AgentState::ChoosePath).unwrap();
        for _ in 0..20 {
            assert_eq!(bot.objective(&world, AgentState::ChoosePath).unwrap(), first);
        }
    }
}
