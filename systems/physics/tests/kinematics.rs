use std::time::Duration;

use glam::Vec2;
use simple_lemmings_core::{
    cell_containing, Action, CellCoord, Command, CreaturePhase, CreatureTuning, DeathCause, Event,
    LevelDescription, Trigger,
};
use simple_lemmings_system_physics::Physics;
use simple_lemmings_world::{self as world, query, World};

const STEP: Duration = Duration::from_millis(50);

struct Harness {
    world: World,
    physics: Physics,
    log: Vec<Event>,
}

impl Harness {
    fn new(description: &LevelDescription) -> Self {
        Self {
            world: World::from_description(description, CreatureTuning::default())
                .expect("level builds"),
            physics: Physics::default(),
            log: Vec::new(),
        }
    }

    fn submit(&mut self, command: Command) {
        let mut pending = Vec::new();
        world::apply(&mut self.world, command, &mut pending);
        while !pending.is_empty() {
            self.log.extend(pending.iter().cloned());
            let mut commands = Vec::new();
            self.physics.handle(&pending, &self.world, &mut commands);
            pending.clear();
            for command in commands {
                world::apply(&mut self.world, command, &mut pending);
            }
        }
    }

    fn run_until<F>(&mut self, max_ticks: usize, done: F) -> bool
    where
        F: Fn(&Event) -> bool,
    {
        for _ in 0..max_ticks {
            self.submit(Command::Tick { dt: STEP });
            if self.log.iter().any(&done) {
                return true;
            }
        }
        false
    }

    fn count<F>(&self, predicate: F) -> usize
    where
        F: Fn(&Event) -> bool,
    {
        self.log.iter().filter(|event| predicate(event)).count()
    }
}

fn level(rows: &[&str], spawn: CellCoord) -> LevelDescription {
    let mut description = LevelDescription::sample();
    description.name = "test".to_owned();
    description.structural = rows.iter().map(|row| (*row).to_owned()).collect();
    description.detail.clear();
    description.spawn = spawn;
    description.checkpoints.clear();
    description
}

fn corridor() -> LevelDescription {
    level(
        &[
            "..............",
            "#.............",
            "#.......#...P.",
            "##############",
        ],
        CellCoord::new(2, 1),
    )
}

fn drop_shaft() -> LevelDescription {
    let mut rows = vec!["....."; 13];
    rows.push("#####");
    level(&rows, CellCoord::new(2, 13))
}

fn open_floor() -> LevelDescription {
    level(
        &["........", "........", "........", "########"],
        CellCoord::new(1, 1),
    )
}

fn is_terminal(event: &Event) -> bool {
    matches!(event, Event::CreatureKilled { .. } | Event::CreatureSaved)
}

#[test]
fn walker_falls_into_the_spike_pit() {
    let mut harness = Harness::new(&LevelDescription::sample());
    harness.submit(Command::SpawnCreature);

    assert!(harness.run_until(400, is_terminal));
    assert!(harness
        .log
        .iter()
        .any(|event| matches!(event, Event::CreatureFell { .. })));
    assert_eq!(
        harness.count(|event| matches!(event, Event::CreatureKilled { .. })),
        1
    );
    assert!(harness.log.contains(&Event::CreatureKilled {
        cause: DeathCause::DamagingTile
    }));
}

#[test]
fn walker_turns_between_walls() {
    let mut harness = Harness::new(&corridor());
    harness.submit(Command::SpawnCreature);

    assert!(!harness.run_until(400, is_terminal));
    assert!(harness.count(|event| matches!(event, Event::CreatureTurned { .. })) >= 2);
    let creature = query::creature(&harness.world).expect("creature alive");
    assert!(creature.position.x > 1.0 && creature.position.x < 8.0);
}

#[test]
fn stairs_carry_the_walker_over_the_block_to_the_portal() {
    let mut harness = Harness::new(&corridor());
    harness.submit(Command::Intervene {
        cell: CellCoord::new(7, 1),
        action: Action::BuildRightStairs,
    });
    assert!(matches!(
        harness.log.first(),
        Some(Event::InterventionApplied { .. })
    ));
    harness.submit(Command::SpawnCreature);

    assert!(harness.run_until(600, is_terminal));
    assert!(harness.log.contains(&Event::CreatureSaved));
    assert!(query::creature(&harness.world).is_none());
    assert!(harness.physics.body_position().is_none());
}

#[test]
fn unprotected_drop_from_the_shaft_is_fatal() {
    let mut harness = Harness::new(&drop_shaft());
    harness.submit(Command::SpawnCreature);

    assert!(harness.run_until(400, is_terminal));
    let fatal = harness.log.iter().any(|event| {
        matches!(
            event,
            Event::CreatureKilled {
                cause: DeathCause::FatalFall { height }
            } if *height >= 10.5
        )
    });
    assert!(fatal, "log: {:?}", harness.log);
}

#[test]
fn umbrella_softens_the_shaft_drop() {
    let mut harness = Harness::new(&drop_shaft());
    harness.submit(Command::Intervene {
        cell: CellCoord::new(2, 12),
        action: Action::PlaceUmbrella,
    });
    harness.submit(Command::SpawnCreature);

    let landed = |event: &Event| matches!(event, Event::CreatureLanded { .. });
    assert!(harness.run_until(400, landed));
    assert!(harness.log.contains(&Event::FallProtectionEquipped));
    assert!(harness.log.iter().any(|event| matches!(
        event,
        Event::CreatureLanded {
            protected: true,
            fall_height,
        } if *fall_height >= 10.5
    )));
    assert_eq!(harness.count(is_terminal), 0);
}

#[test]
fn breaking_the_block_underfoot_starts_a_fall() {
    let mut description = LevelDescription::sample();
    description.spawn = CellCoord::new(5, 4);
    let mut harness = Harness::new(&description);
    harness.submit(Command::SpawnCreature);
    harness.log.clear();

    harness.submit(Command::Intervene {
        cell: CellCoord::new(5, 3),
        action: Action::Break,
    });

    assert!(harness
        .log
        .contains(&Event::CreatureFell { origin_height: 4.0 }));
}

#[test]
fn stair_ending_in_air_keeps_contact_until_its_top() {
    let mut harness = Harness::new(&open_floor());
    harness.submit(Command::Intervene {
        cell: CellCoord::new(3, 1),
        action: Action::BuildRightStairs,
    });
    harness.submit(Command::SpawnCreature);
    harness.submit(Command::TriggerEntered {
        trigger: Trigger::Umbrella,
    });
    assert!(harness.log.contains(&Event::FallProtectionEquipped));

    let mut climbed = false;
    let mut top_reached = false;
    for _ in 0..200 {
        harness.submit(Command::Tick { dt: STEP });
        let creature = query::creature(&harness.world).expect("creature alive");
        if creature.position.x >= 4.0 {
            top_reached = true;
            break;
        }
        climbed |= creature.climbing_slope;
        let falls = harness.count(|event| matches!(event, Event::CreatureFell { .. }));
        assert_eq!(falls, 0);
        assert_eq!(creature.phase, CreaturePhase::Grounded);
        assert!(creature.fall_protection, "log: {:?}", harness.log);
    }
    assert!(top_reached);
    assert!(climbed);
}

#[test]
fn umbrella_placed_around_a_falling_body_is_picked_up() {
    let mut harness = Harness::new(&drop_shaft());
    harness.submit(Command::SpawnCreature);

    let mut centre = None;
    for _ in 0..100 {
        harness.submit(Command::Tick { dt: STEP });
        let creature = query::creature(&harness.world).expect("creature alive");
        if creature.position.y < 11.0 {
            centre = cell_containing(creature.position + Vec2::new(0.0, 0.4));
            break;
        }
    }
    let cell = centre.expect("creature is falling through the shaft");
    harness.submit(Command::Intervene {
        cell,
        action: Action::PlaceUmbrella,
    });
    assert!(harness.log.contains(&Event::FallProtectionEquipped));

    let landed = |event: &Event| matches!(event, Event::CreatureLanded { .. });
    assert!(harness.run_until(400, landed));
    assert!(harness.log.iter().any(|event| matches!(
        event,
        Event::CreatureLanded {
            protected: true,
            ..
        }
    )));
    assert_eq!(harness.count(is_terminal), 0);
}
