use memory_maze::grid::START;
use memory_maze::path;
use memory_maze::{
    Choice, Ending, GameSession, GridDims, Heading, Interaction, Pos, Resolution, SessionError,
    Tile,
};

fn big_session(seed: u64) -> GameSession {
    GameSession::new(GridDims::from_viewport(41, 31), seed)
}

fn stand_on(session: &mut GameSession, pos: Pos) {
    assert!(session.set_player(pos.x as f32 + 0.5, pos.y as f32 + 0.5));
    session.update(0.016, Heading::STILL);
}

fn resolve_node(session: &mut GameSession, node: Pos, choice: Choice) -> Resolution {
    stand_on(session, node);
    match session.interact() {
        Ok(Interaction::Decision(pending)) => assert_eq!(pending.cell, node),
        other => panic!("expected a decision at {node}, got {other:?}"),
    }
    session.decide(choice).unwrap()
}

/// Walk cell by cell along the shortest route using frame updates.
fn walk_to(session: &mut GameSession, target: Pos) {
    let from = session.player_cell().unwrap();
    let route = path::shortest_path(session.grid(), from, target).unwrap();
    for next in route.into_iter().skip(1) {
        let cur = session.player_cell().unwrap();
        let heading = Heading::new(
            next.x as i8 - cur.x as i8,
            next.y as i8 - cur.y as i8,
        );
        for _ in 0..20 {
            if session.player_cell() == Some(next) {
                break;
            }
            session.update(0.05, heading);
        }
        assert_eq!(session.player_cell(), Some(next));
    }
}

#[test]
fn large_mazes_have_five_nodes() {
    for seed in 0..10 {
        let s = big_session(seed);
        assert_eq!(s.grid().positions_of(Tile::FragmentNode).len(), 5);
    }
}

#[test]
fn three_faced_fragments_open_the_exit_and_walking_out_escapes() {
    let mut s = big_session(77);
    let nodes = s.grid().positions_of(Tile::FragmentNode);
    for node in nodes.iter().take(3) {
        assert!(matches!(
            resolve_node(&mut s, *node, Choice::Face),
            Resolution::Resolved(_)
        ));
    }
    assert!(!s.narrative().exit_locked);
    assert_eq!(s.narrative().truth, 3);
    assert_eq!(s.ending(), None);

    let exit = s.grid().find_exit().unwrap();
    walk_to(&mut s, exit);
    assert_eq!(s.ending(), Some(Ending::Escape));
    assert!(s.is_paused());
    assert_eq!(s.interact(), Err(SessionError::RoundOver));
}

#[test]
fn locked_exit_lets_the_player_walk_over_it() {
    let mut s = big_session(3);
    let exit = s.grid().find_exit().unwrap();
    walk_to(&mut s, exit);
    assert_eq!(s.player_cell(), Some(exit));
    assert_eq!(s.ending(), None);
}

#[test]
fn facing_every_fragment_reaches_the_true_ending() {
    let mut s = big_session(21);
    let nodes = s.grid().positions_of(Tile::FragmentNode);
    for node in &nodes {
        resolve_node(&mut s, *node, Choice::Face);
    }
    assert_eq!(s.narrative().truth, 5);
    assert_eq!(s.ending(), Some(Ending::True));

    s.update(0.05, Heading::new(1, 0));
    assert_eq!(s.ending(), Some(Ending::True));
}

#[test]
fn ignoring_fragments_reshapes_the_maze_but_keeps_a_way_out() {
    let mut s = big_session(5);
    let nodes = s.grid().positions_of(Tile::FragmentNode);
    let before = s.grid().clone();
    let mut ignored = 0;
    for node in &nodes {
        // A mutation may seal off nodes the player has not reached yet.
        let here = s.player_cell().unwrap();
        if !path::is_reachable(s.grid(), here, *node) {
            continue;
        }
        walk_to(&mut s, *node);
        match s.interact() {
            Ok(Interaction::Decision(_)) => {}
            other => panic!("expected a decision at {node}, got {other:?}"),
        }
        let Resolution::Resolved(outcome) = s.decide(Choice::Ignore).unwrap() else {
            panic!("expected resolution");
        };
        ignored += 1;
        assert!(outcome.mutation.is_some());
        let exit = s.grid().find_exit().unwrap();
        assert!(path::is_reachable(s.grid(), *node, exit));
    }
    assert!(ignored >= 1);
    assert_ne!(*s.grid(), before);
    assert_eq!(s.narrative().doubt, ignored);
    assert_eq!(s.narrative().truth, 0);
    assert!(s.narrative().exit_locked);
    assert_eq!(s.ending(), None);
}

#[test]
fn resolved_nodes_stay_resolved() {
    let mut s = big_session(9);
    let node = s.grid().positions_of(Tile::FragmentNode)[0];
    resolve_node(&mut s, node, Choice::Ignore);
    let doubt = s.narrative().doubt;

    assert_eq!(s.interact(), Ok(Interaction::AlreadyResolved));
    assert_eq!(s.decide(Choice::Face), Err(SessionError::NoPendingDecision));
    assert_eq!(s.narrative().doubt, doubt);
    assert_eq!(s.narrative().truth, 0);
}

#[test]
fn replay_after_an_ending_starts_over() {
    let mut s = big_session(31);
    let nodes = s.grid().positions_of(Tile::FragmentNode);
    for node in &nodes {
        resolve_node(&mut s, *node, Choice::Face);
    }
    assert!(s.ending().is_some());
    let old = s.grid().clone();

    s.reset();
    assert_eq!(s.ending(), None);
    assert_eq!(s.player_cell(), Some(START));
    assert!(s.narrative().visited.is_empty());
    assert_ne!(*s.grid(), old);
    assert!(!s.is_paused());
}
