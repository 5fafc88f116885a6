use battleship_server::{
    apply_shot, can_place, check_placement, check_winner, place, place_fleet, Board, Cell,
    Orientation, Placement, PlacementError, ShotOutcome, BOARD_SIZE, SHIPS, TOTAL_SHIP_CELLS,
};
use rand::rngs::SmallRng;
use rand::SeedableRng;

#[test]
fn test_place_and_sink_single_ship() {
    let mut board = Board::new(BOARD_SIZE);
    let cruiser = Placement::new(0, 0, 3, Orientation::Horizontal);
    assert!(can_place(&board, &cruiser));
    place(&mut board, &cruiser).unwrap();
    assert_eq!(board.count(Cell::Ship), 3);

    // touching the bow is not allowed, a full row gap is
    let touching = Placement::new(0, 3, 2, Orientation::Horizontal);
    assert_eq!(
        check_placement(&board, &touching),
        Err(PlacementError::Adjacent)
    );
    let clear = Placement::new(2, 0, 2, Orientation::Horizontal);
    assert!(can_place(&board, &clear));
    let single_touching = Placement::new(0, 3, 1, Orientation::Horizontal);
    assert!(!can_place(&board, &single_touching));
    assert_eq!(
        check_placement(&board, &single_touching),
        Err(PlacementError::Adjacent)
    );
    let single_clear = Placement::new(2, 0, 1, Orientation::Vertical);
    assert!(can_place(&board, &single_clear));

    assert_eq!(apply_shot(&mut board, 0, 0), ShotOutcome::Hit);
    assert_eq!(apply_shot(&mut board, 0, 0), ShotOutcome::AlreadyHit);
    assert_eq!(apply_shot(&mut board, 5, 5), ShotOutcome::Miss);
    assert_eq!(apply_shot(&mut board, 5, 5), ShotOutcome::AlreadyHit);
    assert!(!check_winner(&board));

    assert_eq!(apply_shot(&mut board, 0, 1), ShotOutcome::Hit);
    assert_eq!(apply_shot(&mut board, 0, 2), ShotOutcome::Hit);
    assert!(check_winner(&board));
}

#[test]
fn test_placement_errors_in_rule_order() {
    let mut board = Board::new(BOARD_SIZE);
    assert_eq!(
        check_placement(&board, &Placement::new(0, 0, 0, Orientation::Horizontal)),
        Err(PlacementError::InvalidLength)
    );
    assert_eq!(
        check_placement(&board, &Placement::new(0, 0, 11, Orientation::Vertical)),
        Err(PlacementError::InvalidLength)
    );
    assert_eq!(
        check_placement(&board, &Placement::new(0, 8, 3, Orientation::Horizontal)),
        Err(PlacementError::OutOfBounds)
    );
    assert_eq!(
        check_placement(&board, &Placement::new(-1, 0, 2, Orientation::Vertical)),
        Err(PlacementError::OutOfBounds)
    );

    place(&mut board, &Placement::new(4, 4, 3, Orientation::Vertical)).unwrap();
    assert_eq!(
        check_placement(&board, &Placement::new(5, 2, 4, Orientation::Horizontal)),
        Err(PlacementError::Occupied)
    );
    // diagonal contact counts as touching
    assert_eq!(
        check_placement(&board, &Placement::new(7, 5, 2, Orientation::Horizontal)),
        Err(PlacementError::Adjacent)
    );
}

#[test]
fn test_failed_placement_leaves_board_untouched() {
    let mut board = Board::new(BOARD_SIZE);
    place(&mut board, &Placement::new(0, 0, 2, Orientation::Vertical)).unwrap();
    let before = board.clone();
    let err = place(&mut board, &Placement::new(1, 1, 3, Orientation::Horizontal)).unwrap_err();
    assert_eq!(err, PlacementError::Adjacent);
    assert_eq!(board, before);
}

#[test]
fn test_shot_out_of_bounds_is_invalid() {
    let mut board = Board::new(BOARD_SIZE);
    let before = board.clone();
    assert_eq!(apply_shot(&mut board, -1, 0), ShotOutcome::Invalid);
    assert_eq!(apply_shot(&mut board, 0, BOARD_SIZE as i32), ShotOutcome::Invalid);
    assert_eq!(board, before);
}

#[test]
fn test_empty_board_counts_as_defeated() {
    assert!(check_winner(&Board::new(BOARD_SIZE)));
}

#[test]
fn test_place_fleet_standard_ships() {
    let mut board = Board::new(BOARD_SIZE);
    let mut rng = SmallRng::seed_from_u64(42);
    let attempts = place_fleet(&mut board, &SHIPS, &mut rng).unwrap();
    assert!(attempts >= 1);
    assert_eq!(board.count(Cell::Ship), TOTAL_SHIP_CELLS);
    assert_eq!(board.count(Cell::Hit) + board.count(Cell::Miss), 0);
}

#[test]
fn test_place_fleet_replaces_previous_ships() {
    let mut board = Board::new(BOARD_SIZE);
    place(&mut board, &Placement::new(9, 0, 5, Orientation::Horizontal)).unwrap();
    let mut rng = SmallRng::seed_from_u64(7);
    place_fleet(&mut board, &SHIPS, &mut rng).unwrap();
    assert_eq!(board.count(Cell::Ship), TOTAL_SHIP_CELLS);
}

#[test]
fn test_place_fleet_impossible_board_fails_unchanged() {
    let mut board = Board::new(4);
    place(&mut board, &Placement::new(0, 0, 1, Orientation::Horizontal)).unwrap();
    let before = board.clone();
    let mut rng = SmallRng::seed_from_u64(1);
    assert!(place_fleet(&mut board, &SHIPS, &mut rng).is_err());
    assert_eq!(board, before);
}

#[test]
fn test_redacted_rows_hide_ships() {
    let mut board = Board::new(BOARD_SIZE);
    place(&mut board, &Placement::new(3, 3, 2, Orientation::Horizontal)).unwrap();
    apply_shot(&mut board, 3, 3);
    apply_shot(&mut board, 0, 0);
    let rows = board.redacted_rows();
    assert_eq!(rows[3][3], Cell::Hit);
    assert_eq!(rows[3][4], Cell::Empty);
    assert_eq!(rows[0][0], Cell::Miss);
    assert_eq!(board.rows()[3][4], Cell::Ship);
}
