//! Agents, map structures and resources.
//!
//! Roles and structure kinds are closed enums; capabilities (breakable,
//! repairable, walkable) are derived from the variant.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::geometry::{Orientation, Pose, Vector2D};
use crate::objective::AgentState;

/// Gate hit points.
pub const GATE_MAX_HP: u32 = 100;

/// Tree hit points.
pub const TREE_MAX_HP: u32 = 20;

/// Default slip probability of a bridge.
pub const BRIDGE_SLIP_PROBABILITY: f64 = 0.1;

/// Anything stored in a registry.
pub trait Named {
    /// Unique registry key.
    fn name(&self) -> &str;
}

/// One of the two sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Team {
    /// Owns the eastern base.
    Red,
    /// Owns the western base.
    Blue,
}

impl Team {
    /// Both teams.
    pub const ALL: [Team; 2] = [Team::Red, Team::Blue];

    /// The other team.
    #[must_use]
    pub const fn opponent(self) -> Self {
        match self {
            Team::Red => Team::Blue,
            Team::Blue => Team::Red,
        }
    }

    /// Single-letter suffix used in generated names (`r` / `b`).
    #[must_use]
    pub const fn suffix(self) -> char {
        match self {
            Team::Red => 'r',
            Team::Blue => 'b',
        }
    }

    /// Facing of a freshly spawned agent: towards the enemy base.
    #[must_use]
    pub const fn forward(self) -> Orientation {
        match self {
            Team::Red => Orientation::West,
            Team::Blue => Orientation::East,
        }
    }
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Team::Red => write!(f, "red"),
            Team::Blue => write!(f, "blue"),
        }
    }
}

/// Agent role. Fixed for the lifetime of an agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Melee fighter.
    Warrior,
    /// Ranged fighter.
    Archer,
    /// Heals allies instead of hitting hard.
    Priest,
    /// Harvests wood and repairs gates.
    Gatherer,
}

/// Per-role base statistics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoleStats {
    /// Maximum (and initial) hit points.
    pub max_hp: u32,
    /// Chebyshev reach for attacks and heals.
    pub attack_range: i32,
    /// Damage per hit.
    pub attack_power: u32,
    /// HP restored per heal. Zero for non-healers.
    pub heal_power: u32,
    /// Probability of choosing the land passage over the bridge.
    pub land_probability: f64,
}

impl Role {
    /// All roles.
    pub const ALL: [Role; 4] = [Role::Warrior, Role::Archer, Role::Priest, Role::Gatherer];

    /// Base statistics for this role.
    #[must_use]
    pub const fn stats(self) -> RoleStats {
        match self {
            Role::Warrior => RoleStats {
                max_hp: 100,
                attack_range: 1,
                attack_power: 10,
                heal_power: 0,
                land_probability: 0.5,
            },
            Role::Archer => RoleStats {
                max_hp: 80,
                attack_range: 3,
                attack_power: 8,
                heal_power: 0,
                land_probability: 0.7,
            },
            Role::Priest => RoleStats {
                max_hp: 70,
                attack_range: 2,
                attack_power: 4,
                heal_power: 15,
                land_probability: 0.3,
            },
            Role::Gatherer => RoleStats {
                max_hp: 60,
                attack_range: 1,
                attack_power: 5,
                heal_power: 0,
                land_probability: 0.5,
            },
        }
    }

    /// Warriors, archers and priests share the soldier objective table.
    #[must_use]
    pub const fn is_soldier(self) -> bool {
        !matches!(self, Role::Gatherer)
    }

    /// Lower-case label used in generated names.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Role::Warrior => "warrior",
            Role::Archer => "archer",
            Role::Priest => "priest",
            Role::Gatherer => "gatherer",
        }
    }
}

/// Request to create an agent. The name is a key only; role and team come
/// from the request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SpawnRequest {
    /// Unique agent name.
    pub name: String,
    /// Role of the new agent.
    pub role: Role,
    /// Team of the new agent.
    pub team: Team,
}

impl SpawnRequest {
    /// Create a spawn request.
    #[must_use]
    pub fn new(name: impl Into<String>, role: Role, team: Team) -> Self {
        Self {
            name: name.into(),
            role,
            team,
        }
    }
}

/// A simulated unit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Agent {
    /// Unique name.
    pub name: String,
    /// Role.
    pub role: Role,
    /// Team.
    pub team: Team,
    /// Current hit points. Zero means dead until respawn.
    pub hp: u32,
    /// Maximum hit points.
    pub max_hp: u32,
    /// Chebyshev reach for attacks and heals.
    pub attack_range: i32,
    /// Damage per hit.
    pub attack_power: u32,
    /// HP restored per heal.
    pub heal_power: u32,
    /// Probability of choosing the land passage.
    pub land_probability: f64,
    /// Position and facing.
    pub pose: Pose,
    /// Current objective state.
    pub state: AgentState,
    /// Name of the carried princess, if any.
    pub carried: Option<String>,
    /// Tick at which a dead agent is reset.
    pub respawn_at: Option<u64>,
}

impl Agent {
    /// Build an agent from its role's base statistics (the role factory).
    #[must_use]
    pub fn new(request: &SpawnRequest, pose: Pose) -> Self {
        let stats = request.role.stats();
        Self {
            name: request.name.clone(),
            role: request.role,
            team: request.team,
            hp: stats.max_hp,
            max_hp: stats.max_hp,
            attack_range: stats.attack_range,
            attack_power: stats.attack_power,
            heal_power: stats.heal_power,
            land_probability: stats.land_probability,
            pose,
            state: AgentState::Spawn,
            carried: None,
            respawn_at: None,
        }
    }

    /// Current grid position.
    #[must_use]
    pub const fn position(&self) -> Vector2D {
        self.pose.position
    }

    /// Whether the agent has hit points left.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.hp > 0
    }

    /// Whether the agent is at full health.
    #[must_use]
    pub const fn is_full_hp(&self) -> bool {
        self.hp >= self.max_hp
    }

    /// Whether the agent is currently carrying a princess.
    #[must_use]
    pub const fn is_carrying(&self) -> bool {
        self.carried.is_some()
    }
}

impl Named for Agent {
    fn name(&self) -> &str {
        &self.name
    }
}

/// Tag of an `Empty` waypoint marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MarkerTag {
    /// River crossing on the land passage (`half`).
    Half,
    /// Staging cell outside a red gate (`base_r`).
    BaseRed,
    /// Staging cell outside a blue gate (`base_b`).
    BaseBlue,
    /// Holding cell of the red princess (`empty_pr`).
    PrincessRed,
    /// Holding cell of the blue princess (`empty_pb`).
    PrincessBlue,
}

impl MarkerTag {
    /// Staging marker outside `team`'s gates.
    #[must_use]
    pub const fn base(team: Team) -> Self {
        match team {
            Team::Red => MarkerTag::BaseRed,
            Team::Blue => MarkerTag::BaseBlue,
        }
    }

    /// Holding marker of `team`'s princess.
    #[must_use]
    pub const fn princess_hold(team: Team) -> Self {
        match team {
            Team::Red => MarkerTag::PrincessRed,
            Team::Blue => MarkerTag::PrincessBlue,
        }
    }

    /// Waypoint label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            MarkerTag::Half => "half",
            MarkerTag::BaseRed => "base_r",
            MarkerTag::BaseBlue => "base_b",
            MarkerTag::PrincessRed => "empty_pr",
            MarkerTag::PrincessBlue => "empty_pb",
        }
    }
}

/// Structure variant with its variant-specific data.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum StructureKind {
    /// Team-owned, blocks the enemy team until destroyed, repairable.
    Gate,
    /// Indestructible obstacle.
    Wall,
    /// Walkable river crossing.
    Bridge {
        /// Chance of slipping, consumed by the agent layer.
        slip_probability: f64,
    },
    /// Breakable; yields one wood when destroyed.
    Tree,
    /// Walkable waypoint marker.
    Empty {
        /// Waypoint tag.
        tag: MarkerTag,
    },
}

/// Structure class used by cell filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StructureClass {
    /// [`StructureKind::Gate`].
    Gate,
    /// [`StructureKind::Wall`].
    Wall,
    /// [`StructureKind::Bridge`].
    Bridge,
    /// [`StructureKind::Tree`].
    Tree,
    /// [`StructureKind::Empty`].
    Empty,
}

impl StructureKind {
    /// Class of this kind, without variant data.
    #[must_use]
    pub const fn class(self) -> StructureClass {
        match self {
            StructureKind::Gate => StructureClass::Gate,
            StructureKind::Wall => StructureClass::Wall,
            StructureKind::Bridge { .. } => StructureClass::Bridge,
            StructureKind::Tree => StructureClass::Tree,
            StructureKind::Empty { .. } => StructureClass::Empty,
        }
    }
}

/// A static map element.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapStructure {
    /// Unique name.
    pub name: String,
    /// Variant.
    pub kind: StructureKind,
    /// Owning team; `None` for neutral structures.
    pub team: Option<Team>,
    /// Current hit points.
    pub hp: u32,
    /// Maximum hit points. Zero for indestructible structures.
    pub max_hp: u32,
    /// Informational footprint width.
    pub width: i32,
    /// Informational footprint height.
    pub height: i32,
    /// Anchor pose (top-left cell of the footprint).
    pub pose: Pose,
    /// Tick at which a destroyed tree grows back.
    pub regrow_at: Option<u64>,
}

impl MapStructure {
    fn with_kind(name: impl Into<String>, kind: StructureKind, position: Vector2D) -> Self {
        Self {
            name: name.into(),
            kind,
            team: None,
            hp: 0,
            max_hp: 0,
            width: 1,
            height: 1,
            pose: Pose::new(position, Orientation::North),
            regrow_at: None,
        }
    }

    /// A full-health gate owned by `team`.
    #[must_use]
    pub fn gate(name: impl Into<String>, team: Team, position: Vector2D) -> Self {
        Self {
            team: Some(team),
            hp: GATE_MAX_HP,
            max_hp: GATE_MAX_HP,
            ..Self::with_kind(name, StructureKind::Gate, position)
        }
    }

    /// A wall segment.
    #[must_use]
    pub fn wall(name: impl Into<String>, position: Vector2D) -> Self {
        Self::with_kind(name, StructureKind::Wall, position)
    }

    /// A bridge anchored at `position` covering `width × height` cells.
    #[must_use]
    pub fn bridge(name: impl Into<String>, position: Vector2D, width: i32, height: i32) -> Self {
        Self {
            width,
            height,
            ..Self::with_kind(
                name,
                StructureKind::Bridge {
                    slip_probability: BRIDGE_SLIP_PROBABILITY,
                },
                position,
            )
        }
    }

    /// A full-grown tree.
    #[must_use]
    pub fn tree(name: impl Into<String>, position: Vector2D) -> Self {
        Self {
            hp: TREE_MAX_HP,
            max_hp: TREE_MAX_HP,
            ..Self::with_kind(name, StructureKind::Tree, position)
        }
    }

    /// A waypoint marker.
    #[must_use]
    pub fn marker(name: impl Into<String>, tag: MarkerTag, position: Vector2D) -> Self {
        Self::with_kind(name, StructureKind::Empty { tag }, position)
    }

    /// Anchor position.
    #[must_use]
    pub const fn position(&self) -> Vector2D {
        self.pose.position
    }

    /// Whether attacks can lower its HP.
    #[must_use]
    pub const fn is_breakable(&self) -> bool {
        matches!(self.kind, StructureKind::Gate | StructureKind::Tree)
    }

    /// Whether wood can restore it.
    #[must_use]
    pub const fn is_repairable(&self) -> bool {
        matches!(self.kind, StructureKind::Gate)
    }

    /// Breakable and at zero HP.
    #[must_use]
    pub const fn is_destroyed(&self) -> bool {
        self.is_breakable() && self.hp == 0
    }

    /// Whether something belonging to `team` may share its cell.
    ///
    /// Resources pass `None`: a standing gate admits only its own team.
    #[must_use]
    pub fn is_walkable_for(&self, team: Option<Team>) -> bool {
        match self.kind {
            StructureKind::Gate => self.hp == 0 || (team.is_some() && team == self.team),
            StructureKind::Wall => false,
            StructureKind::Bridge { .. } | StructureKind::Empty { .. } => true,
            StructureKind::Tree => self.hp == 0,
        }
    }

    /// Marker tag, for `Empty` structures.
    #[must_use]
    pub const fn marker_tag(&self) -> Option<MarkerTag> {
        match self.kind {
            StructureKind::Empty { tag } => Some(tag),
            _ => None,
        }
    }
}

impl Named for MapStructure {
    fn name(&self) -> &str {
        &self.name
    }
}

/// Resource variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ResourceKind {
    /// A team's princess; the object of capture and rescue.
    Princess,
}

/// A carryable item.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resource {
    /// Unique name.
    pub name: String,
    /// Variant.
    pub kind: ResourceKind,
    /// Owning team.
    pub team: Option<Team>,
    /// Position; tracks the carrier while carried.
    pub pose: Pose,
    /// Name of the carrying agent.
    pub carried_by: Option<String>,
}

impl Resource {
    /// A princess belonging to `team`, standing at `position`.
    #[must_use]
    pub fn princess(name: impl Into<String>, team: Team, position: Vector2D) -> Self {
        Self {
            name: name.into(),
            kind: ResourceKind::Princess,
            team: Some(team),
            pose: Pose::new(position, Orientation::North),
            carried_by: None,
        }
    }

    /// Current position.
    #[must_use]
    pub const fn position(&self) -> Vector2D {
        self.pose.position
    }

    /// Whether an agent holds it. Carried resources are off the grid and not targetable.
    #[must_use]
    pub const fn is_carried(&self) -> bool {
        self.carried_by.is_some()
    }
}

impl Named for Resource {
    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agent_from_role_stats() {
        let request = SpawnRequest::new("archer_b1", Role::Archer, Team::Blue);
        let agent = Agent::new(&request, Pose::new(Vector2D::new(1, 1), Orientation::East));
        assert_eq!(agent.hp, 80);
        assert_eq!(agent.max_hp, 80);
        assert_eq!(agent.attack_range, 3);
        assert_eq!(agent.state, AgentState::Spawn);
        assert!(agent.is_alive());
        assert!(agent.is_full_hp());
        assert!(!agent.is_carrying());
    }

    #[test]
    fn test_only_priest_heals() {
        for role in Role::ALL {
            assert_eq!(role.stats().heal_power > 0, role == Role::Priest);
        }
        assert!(!Role::Gatherer.is_soldier());
        assert!(Role::Warrior.is_soldier());
    }

    #[test]
    fn test_gate_blocks_enemy_only() {
        let mut gate = MapStructure::gate("gate_b1", Team::Blue, Vector2D::new(6, 5));
        assert!(gate.is_walkable_for(Some(Team::Blue)));
        assert!(!gate.is_walkable_for(Some(Team::Red)));
        assert!(!gate.is_walkable_for(None));
        assert!(!gate.is_destroyed());

        gate.hp = 0;
        assert!(gate.is_destroyed());
        assert!(gate.is_walkable_for(Some(Team::Red)));
        assert!(gate.is_walkable_for(None));
    }

    #[test]
    fn test_structure_capabilities() {
        let wall = MapStructure::wall("wall", Vector2D::new(0, 0));
        assert!(!wall.is_breakable());
        assert!(!wall.is_destroyed());
        assert!(!wall.is_walkable_for(Some(Team::Red)));

        let bridge = MapStructure::bridge("bridge", Vector2D::new(0, 0), 3, 2);
        assert!(bridge.is_walkable_for(None));
        assert_eq!((bridge.width, bridge.height), (3, 2));

        let mut tree = MapStructure::tree("tree_0", Vector2D::new(0, 0));
        assert!(tree.is_breakable());
        assert!(!tree.is_repairable());
        assert!(!tree.is_walkable_for(Some(Team::Blue)));
        tree.hp = 0;
        assert!(tree.is_walkable_for(Some(Team::Blue)));

        let marker = MapStructure::marker("half_1", MarkerTag::Half, Vector2D::new(0, 0));
        assert_eq!(marker.marker_tag(), Some(MarkerTag::Half));
        assert!(marker.is_walkable_for(None));
    }

    #[test]
    fn test_marker_labels() {
        assert_eq!(MarkerTag::base(Team::Red).label(), "base_r");
        assert_eq!(MarkerTag::base(Team::Blue).label(), "base_b");
        assert_eq!(MarkerTag::princess_hold(Team::Red).label(), "empty_pr");
        assert_eq!(MarkerTag::princess_hold(Team::Blue).label(), "empty_pb");
        assert_eq!(MarkerTag::Half.label(), "half");
    }

    #[test]
    fn test_team_helpers() {
        assert_eq!(Team::Red.opponent(), Team::Blue);
        assert_eq!(Team::Blue.suffix(), 'b');
        assert_eq!(Team::Blue.forward(), Orientation::East);
        assert_eq!(Team::Red.to_string(), "red");
    }
}
