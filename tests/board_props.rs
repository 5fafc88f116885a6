use battleship_server::{
    apply_shot, can_place, check_winner, place, place_fleet, Board, Cell, Orientation, Placement,
    ShotOutcome, BOARD_SIZE, SHIPS, TOTAL_SHIP_CELLS,
};
use proptest::prelude::*;
use rand::{rngs::SmallRng, SeedableRng};

const N: i32 = BOARD_SIZE as i32;

fn fleet_board(seed: u64) -> Board {
    let mut rng = SmallRng::seed_from_u64(seed);
    let mut board = Board::new(BOARD_SIZE);
    place_fleet(&mut board, &SHIPS, &mut rng).unwrap();
    board
}

fn orientation() -> impl Strategy<Value = Orientation> {
    prop_oneof![Just(Orientation::Horizontal), Just(Orientation::Vertical)]
}

fn ship_cells(board: &Board) -> Vec<(i32, i32)> {
    let mut cells = Vec::new();
    for r in 0..N {
        for c in 0..N {
            if board.get(r, c) == Some(Cell::Ship) {
                cells.push((r, c));
            }
        }
    }
    cells
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn placement_changes_only_footprint(
        seed in any::<u64>(),
        row in -2..N + 2,
        col in -2..N + 2,
        length in 0..7i32,
        orient in orientation(),
    ) {
        let mut board = Board::new(BOARD_SIZE);
        let mut rng = SmallRng::seed_from_u64(seed);
        place_fleet(&mut board, &SHIPS[..1], &mut rng).unwrap();

        let placement = Placement::new(row, col, length, orient);
        let before = board.clone();
        let allowed = can_place(&board, &placement);
        let placed = place(&mut board, &placement);
        prop_assert_eq!(allowed, placed.is_ok());

        let footprint: Vec<(i32, i32)> = placement.footprint().collect();
        for r in 0..N {
            for c in 0..N {
                let expected = if allowed && footprint.contains(&(r, c)) {
                    Some(Cell::Ship)
                } else {
                    before.get(r, c)
                };
                prop_assert_eq!(board.get(r, c), expected);
            }
        }
        if allowed {
            prop_assert!(!can_place(&board, &placement));
        }
    }

    #[test]
    fn fleet_ships_never_touch(seed in any::<u64>()) {
        let board = fleet_board(seed);
        let cells = ship_cells(&board);
        prop_assert_eq!(cells.len(), TOTAL_SHIP_CELLS);
        // straight ships have no diagonal neighbours of their own
        for &(r, c) in &cells {
            for (dr, dc) in [(-1, -1), (-1, 1), (1, -1), (1, 1)] {
                prop_assert_ne!(board.get(r + dr, c + dc), Some(Cell::Ship));
            }
        }
    }

    #[test]
    fn shot_is_idempotent(seed in any::<u64>(), row in 0..N, col in 0..N) {
        let mut board = fleet_board(seed);
        let first = apply_shot(&mut board, row, col);
        prop_assert!(matches!(first, ShotOutcome::Hit | ShotOutcome::Miss));
        let after_first = board.clone();
        prop_assert_eq!(apply_shot(&mut board, row, col), ShotOutcome::AlreadyHit);
        prop_assert_eq!(board, after_first);
    }

    #[test]
    fn winner_iff_every_ship_cell_hit(seed in any::<u64>(), keep in 0usize..17) {
        let mut board = fleet_board(seed);
        let cells = ship_cells(&board);
        for (i, &(r, c)) in cells.iter().enumerate() {
            if i != keep {
                prop_assert_eq!(apply_shot(&mut board, r, c), ShotOutcome::Hit);
            }
        }
        prop_assert!(!check_winner(&board));
        let (r, c) = cells[keep];
        prop_assert_eq!(apply_shot(&mut board, r, c), ShotOutcome::Hit);
        prop_assert!(check_winner(&board));
    }
}
