use super::ship::ShipDef;

pub const BOARD_SIZE: usize = 10;
pub const NUM_SHIPS: usize = 5;
pub const SHIPS: [ShipDef; NUM_SHIPS] = [
    ShipDef::new("Carrier", 5),
    ShipDef::new("Battleship", 4),
    ShipDef::new("Cruiser", 3),
    ShipDef::new("Submarine", 3),
    ShipDef::new("Destroyer", 2),
];

/// Total number of ship segments used in the standard configuration.
pub const TOTAL_SHIP_CELLS: usize = 5 + 4 + 3 + 3 + 2;

/// Random attempts allowed for a single ship before the fleet is restarted.
pub const MAX_SHIP_ATTEMPTS: usize = 100;

/// Whole-fleet restarts allowed before automatic placement gives up.
pub const MAX_FLEET_ATTEMPTS: usize = 100;
