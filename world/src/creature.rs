//! Creature state machine driven by physics contacts.

use glam::Vec2;
use simple_lemmings_core::{CreaturePhase, CreatureSnapshot, CreatureTuning, DeathCause, Facing};

/// Phase change produced by a contact, tick or hazard.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum Transition {
    /// The last ground contact was lost.
    Fell { origin_height: f32 },
    /// The creature touched ground and survived.
    Landed { fall_height: f32, protected: bool },
    /// The creature entered the terminal phase.
    Killed(DeathCause),
}

/// Walk/fall/land/die automaton of the single creature.
#[derive(Clone, Debug)]
pub(crate) struct Creature {
    position: Vec2,
    velocity: Vec2,
    facing: Facing,
    phase: CreaturePhase,
    ground_contacts: u32,
    fall_origin_height: f32,
    fall_protection: bool,
    stairs_contacts: u32,
    mirrored: bool,
}

impl Creature {
    /// Creates a grounded creature with no contacts registered yet.
    pub(crate) fn spawn(position: Vec2, facing: Facing) -> Self {
        Self {
            position,
            velocity: Vec2::ZERO,
            facing,
            phase: CreaturePhase::Grounded,
            ground_contacts: 0,
            fall_origin_height: position.y,
            fall_protection: false,
            stairs_contacts: 0,
            mirrored: false,
        }
    }

    pub(crate) fn is_dead(&self) -> bool {
        self.phase == CreaturePhase::Dead
    }

    pub(crate) fn position(&self) -> Vec2 {
        self.position
    }

    pub(crate) fn snapshot(&self) -> CreatureSnapshot {
        CreatureSnapshot {
            position: self.position,
            velocity: self.velocity,
            facing: self.facing,
            phase: self.phase,
            ground_contacts: self.ground_contacts,
            fall_protection: self.fall_protection,
            climbing_slope: self.stairs_contacts > 0,
            mirrored: self.mirrored,
        }
    }

    /// Registers a new overlapping ground collider.
    pub(crate) fn ground_contact_began(&mut self, tuning: &CreatureTuning) -> Option<Transition> {
        if self.is_dead() {
            return None;
        }
        self.ground_contacts = self.ground_contacts.saturating_add(1);
        if self.ground_contacts != 1 || self.phase != CreaturePhase::Falling {
            return None;
        }
        Some(self.land(tuning))
    }

    /// Registers the loss of an overlapping ground collider.
    pub(crate) fn ground_contact_ended(&mut self) -> Option<Transition> {
        if self.is_dead() {
            return None;
        }
        let Some(remaining) = self.ground_contacts.checked_sub(1) else {
            tracing::debug!(
                target: "world::creature",
                "ground contact ended with no contact registered"
            );
            return None;
        };
        self.ground_contacts = remaining;
        if remaining == 0 && self.phase == CreaturePhase::Grounded {
            return Some(self.begin_fall());
        }
        None
    }

    /// Starts a fall when the creature stands on nothing, e.g. after spawning mid-air.
    pub(crate) fn settle(&mut self) -> Option<Transition> {
        if self.phase == CreaturePhase::Grounded && self.ground_contacts == 0 {
            return Some(self.begin_fall());
        }
        None
    }

    /// Moves the creature into the terminal phase. Dead creatures stay silent.
    pub(crate) fn kill(&mut self, cause: DeathCause) -> Option<Transition> {
        if self.is_dead() {
            return None;
        }
        self.phase = CreaturePhase::Dead;
        self.velocity = Vec2::ZERO;
        Some(Transition::Killed(cause))
    }

    /// Reverses the walking direction. Returns the new facing unless dead.
    pub(crate) fn turn(&mut self) -> Option<Facing> {
        if self.is_dead() {
            return None;
        }
        self.facing = self.facing.flipped();
        self.velocity.x = 0.0;
        self.mirrored = !self.mirrored;
        Some(self.facing)
    }

    /// Equips fall protection. Returns `true` only when it was not already equipped.
    pub(crate) fn equip_fall_protection(&mut self) -> bool {
        if self.is_dead() || self.fall_protection {
            return false;
        }
        self.fall_protection = true;
        true
    }

    /// Registers a stair slope overlap starting or ending.
    pub(crate) fn stairs_contact(&mut self, began: bool) {
        if self.is_dead() {
            return;
        }
        if began {
            self.stairs_contacts = self.stairs_contacts.saturating_add(1);
        } else if let Some(remaining) = self.stairs_contacts.checked_sub(1) {
            self.stairs_contacts = remaining;
        } else {
            tracing::debug!(
                target: "world::creature",
                "stairs contact ended with no contact registered"
            );
        }
    }

    /// Accepts the body state resolved by the physics collaborator.
    pub(crate) fn sync_body(&mut self, position: Vec2, velocity: Vec2) {
        if !self.is_dead() {
            self.position = position;
            self.velocity = velocity;
        }
    }

    /// Velocity the creature requests for the next physics step.
    pub(crate) fn motion_intent(&mut self, tuning: &CreatureTuning, dt: f32) -> Vec2 {
        let intent = match self.phase {
            CreaturePhase::Grounded => {
                let lift = if self.stairs_contacts > 0 {
                    tuning.climb_assist
                } else {
                    0.0
                };
                Vec2::new(tuning.walk_speed * self.facing.sign(), lift)
            }
            CreaturePhase::Falling => {
                let mut vertical = self.velocity.y - tuning.gravity * dt;
                let mut horizontal = self.velocity.x;
                if self.fall_protection {
                    let limit = tuning.protected_fall_speed;
                    vertical = vertical.clamp(-limit, limit);
                    horizontal *= (1.0 - tuning.protected_drag * dt).max(0.0);
                }
                Vec2::new(horizontal, vertical)
            }
            CreaturePhase::Dead => Vec2::ZERO,
        };
        self.velocity = intent;
        intent
    }

    fn begin_fall(&mut self) -> Transition {
        self.phase = CreaturePhase::Falling;
        self.fall_origin_height = self.position.y;
        Transition::Fell {
            origin_height: self.fall_origin_height,
        }
    }

    fn land(&mut self, tuning: &CreatureTuning) -> Transition {
        let fall_height = self.fall_origin_height - self.position.y;
        if self.fall_protection {
            self.fall_protection = false;
            self.phase = CreaturePhase::Grounded;
            return Transition::Landed {
                fall_height,
                protected: true,
            };
        }
        if fall_height >= tuning.deadly_height {
            self.phase = CreaturePhase::Dead;
            self.velocity = Vec2::ZERO;
            return Transition::Killed(DeathCause::FatalFall {
                height: fall_height,
            });
        }
        self.phase = CreaturePhase::Grounded;
        Transition::Landed {
            fall_height,
            protected: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Binary-exact threshold so boundary arithmetic is exact in f32.
    fn tuning() -> CreatureTuning {
        CreatureTuning {
            deadly_height: 2.5,
            ..CreatureTuning::default()
        }
    }

    fn grounded_at(height: f32) -> Creature {
        let mut creature = Creature::spawn(Vec2::new(0.5, height), Facing::Right);
        assert_eq!(creature.ground_contact_began(&tuning()), None);
        creature
    }

    fn fall_and_land(creature: &mut Creature, drop: f32) -> Option<Transition> {
        let start = creature.position();
        assert!(matches!(
            creature.ground_contact_ended(),
            Some(Transition::Fell { .. })
        ));
        creature.sync_body(start - Vec2::new(0.0, drop), Vec2::ZERO);
        creature.ground_contact_began(&tuning())
    }

    #[test]
    fn falling_from_deadly_height_kills() {
        let tuning = tuning();
        let mut creature = grounded_at(10.0);
        let transition = fall_and_land(&mut creature, tuning.deadly_height);
        assert_eq!(
            transition,
            Some(Transition::Killed(DeathCause::FatalFall {
                height: tuning.deadly_height
            }))
        );
        assert!(creature.is_dead());
    }

    #[test]
    fn falling_just_below_deadly_height_lands() {
        let tuning = tuning();
        let mut creature = grounded_at(10.0);
        let drop = tuning.deadly_height - 1.0 / 64.0;
        let transition = fall_and_land(&mut creature, drop);
        assert!(matches!(
            transition,
            Some(Transition::Landed {
                protected: false,
                ..
            })
        ));
        assert_eq!(creature.snapshot().phase, CreaturePhase::Grounded);
    }

    #[test]
    fn straddling_two_tiles_does_not_fall_until_both_are_lost() {
        let tuning = CreatureTuning::default();
        let mut creature = grounded_at(3.0);
        assert_eq!(creature.ground_contact_began(&tuning), None);
        assert_eq!(creature.snapshot().ground_contacts, 2);

        assert_eq!(creature.ground_contact_ended(), None);
        assert_eq!(creature.snapshot().phase, CreaturePhase::Grounded);

        assert_eq!(
            creature.ground_contact_ended(),
            Some(Transition::Fell { origin_height: 3.0 })
        );
        assert_eq!(creature.snapshot().phase, CreaturePhase::Falling);
    }

    #[test]
    fn protection_absorbs_one_fatal_fall() {
        let tuning = tuning();
        let mut creature = grounded_at(20.0);
        assert!(creature.equip_fall_protection());
        assert!(!creature.equip_fall_protection());

        let transition = fall_and_land(&mut creature, tuning.deadly_height * 5.0);
        assert!(matches!(
            transition,
            Some(Transition::Landed {
                protected: true,
                ..
            })
        ));
        assert!(!creature.snapshot().fall_protection);

        let transition = fall_and_land(&mut creature, tuning.deadly_height * 5.0);
        assert!(matches!(transition, Some(Transition::Killed(_))));
    }

    #[test]
    fn dead_creature_ignores_everything() {
        let tuning = CreatureTuning::default();
        let mut creature = grounded_at(1.0);
        assert_eq!(
            creature.kill(DeathCause::DamagingTile),
            Some(Transition::Killed(DeathCause::DamagingTile))
        );
        assert_eq!(creature.kill(DeathCause::BelowFloor), None);
        assert_eq!(creature.turn(), None);
        assert!(!creature.equip_fall_protection());
        assert_eq!(creature.ground_contact_ended(), None);
        assert_eq!(creature.ground_contact_began(&tuning), None);
        assert_eq!(creature.motion_intent(&tuning, 0.1), Vec2::ZERO);
        creature.sync_body(Vec2::new(9.0, 9.0), Vec2::ONE);
        assert_eq!(creature.position(), Vec2::new(0.5, 1.0));
    }

    #[test]
    fn turn_flips_facing_and_zeroes_horizontal_velocity() {
        let tuning = CreatureTuning::default();
        let mut creature = grounded_at(1.0);
        let _ = creature.motion_intent(&tuning, 0.1);
        assert_eq!(creature.turn(), Some(Facing::Left));

        let snapshot = creature.snapshot();
        assert_eq!(snapshot.velocity.x, 0.0);
        assert!(snapshot.mirrored);

        let intent = creature.motion_intent(&tuning, 0.1);
        assert_eq!(intent.x, -tuning.walk_speed);
    }

    #[test]
    fn grounded_intent_climbs_on_slopes() {
        let tuning = CreatureTuning::default();
        let mut creature = grounded_at(1.0);
        assert_eq!(creature.motion_intent(&tuning, 0.1).y, 0.0);
        creature.stairs_contact(true);
        assert_eq!(creature.motion_intent(&tuning, 0.1).y, tuning.climb_assist);
    }

    #[test]
    fn overlapping_stairs_keep_the_climb_until_the_last_one_ends() {
        let tuning = CreatureTuning::default();
        let mut creature = grounded_at(1.0);
        creature.stairs_contact(true);
        creature.stairs_contact(true);
        creature.stairs_contact(false);
        assert!(creature.snapshot().climbing_slope);
        assert_eq!(creature.motion_intent(&tuning, 0.1).y, tuning.climb_assist);

        creature.stairs_contact(false);
        assert!(!creature.snapshot().climbing_slope);
        creature.stairs_contact(false);
        assert_eq!(creature.motion_intent(&tuning, 0.1).y, 0.0);
    }

    #[test]
    fn protected_fall_is_clamped_and_dragged() {
        let tuning = CreatureTuning::default();
        let mut creature = grounded_at(10.0);
        let _ = creature.motion_intent(&tuning, 0.1);
        let _ = creature.ground_contact_ended();
        assert!(creature.equip_fall_protection());

        let mut intent = Vec2::ZERO;
        for _ in 0..20 {
            intent = creature.motion_intent(&tuning, 0.1);
        }
        assert_eq!(intent.y, -tuning.protected_fall_speed);
        assert!(intent.x.abs() < tuning.walk_speed);
    }

    #[test]
    fn unprotected_fall_accelerates() {
        let tuning = CreatureTuning::default();
        let mut creature = grounded_at(10.0);
        let _ = creature.ground_contact_ended();
        let first = creature.motion_intent(&tuning, 0.1);
        let second = creature.motion_intent(&tuning, 0.1);
        assert!(second.y < first.y);
        assert!(second.y < -tuning.protected_fall_speed);
    }

    #[test]
    fn creature_spawned_in_air_starts_falling_on_settle() {
        let mut creature = Creature::spawn(Vec2::new(0.5, 4.0), Facing::Left);
        assert_eq!(
            creature.settle(),
            Some(Transition::Fell { origin_height: 4.0 })
        );
        assert_eq!(creature.settle(), None);
    }
}
