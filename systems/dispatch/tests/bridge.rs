use simple_lemmings_core::{Action, CellCoord, CreatureTuning, Event, LevelDescription, Rejection};
use simple_lemmings_system_dispatch::{dispatch, dispatch_decision, AgentDecision, Dispatch};
use simple_lemmings_world::{query, World};

fn sample_world() -> World {
    World::from_description(&LevelDescription::sample(), CreatureTuning::default())
        .expect("sample level")
}

#[test]
fn legal_break_is_applied_and_reported() {
    let mut world = sample_world();
    let mut events = Vec::new();
    let cell = CellCoord::new(5, 3);

    let result = dispatch(&mut world, cell, Action::Break.index(), &mut events).expect("legal");

    let Dispatch::Applied(outcome) = result else {
        panic!("expected an applied intervention");
    };
    assert_eq!(outcome.action, Action::Break);
    assert_eq!(outcome.touched, vec![cell, CellCoord::new(5, 4)]);
    assert_eq!(events, vec![Event::InterventionApplied { outcome }]);
    assert!(query::grid(&world).structural_at(cell).is_none());
}

#[test]
fn stale_redispatch_is_rejected_without_mutation() {
    let mut world = sample_world();
    let mut events = Vec::new();
    let cell = CellCoord::new(9, 6);
    let decision = AgentDecision::new(cell, Action::PlaceUmbrella.index());

    let first = dispatch_decision(&mut world, decision, &mut events).expect("legal");
    assert!(matches!(first, Dispatch::Applied(_)));
    let placed = query::placed_at(&world, cell);

    let second = dispatch_decision(&mut world, decision, &mut events);
    assert_eq!(
        second,
        Err(Rejection::IllegalAction {
            cell,
            action: Action::PlaceUmbrella,
        })
    );
    assert_eq!(query::placed_at(&world, cell), placed);
}

#[test]
fn out_of_bounds_cells_are_illegal() {
    let mut world = sample_world();
    let mut events = Vec::new();
    let cell = CellCoord::new(40, 2);
    let result = dispatch(&mut world, cell, Action::PlaceUmbrella.index(), &mut events);
    assert_eq!(
        result,
        Err(Rejection::IllegalAction {
            cell,
            action: Action::PlaceUmbrella,
        })
    );
}

#[test]
fn indexes_beyond_the_action_set_are_unknown() {
    let mut world = sample_world();
    let mut events = Vec::new();
    let result = dispatch(&mut world, CellCoord::new(0, 0), 7, &mut events);
    assert_eq!(result, Err(Rejection::UnknownAction { index: 7 }));
    assert!(events.is_empty());
}
