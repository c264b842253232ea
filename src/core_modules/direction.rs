// THEORY:
// Every capture is tagged with the compass direction the camera was facing.
// Directions matter for two things only: they keep the per-direction results
// apart for display, and they let the fusion stage compare opposing sky
// sectors (North/South against East/West) to guess where weather is heading.

pub mod direction {
    use serde::{Deserialize, Serialize};
    use std::fmt;
    use std::str::FromStr;

    /// One of the four capture directions offered by the camera flow.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
    #[serde(rename_all = "lowercase")]
    pub enum Direction {
        North,
        East,
        South,
        West,
    }

    /// The compass axis a direction lies on.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum Axis {
        NorthSouth,
        EastWest,
    }

    impl Direction {
        /// Capture order used by the camera flow.
        pub const ALL: [Direction; 4] = [
            Direction::North,
            Direction::East,
            Direction::South,
            Direction::West,
        ];

        /// Compass bearing in degrees, clockwise from north.
        pub fn bearing_degrees(self) -> u16 {
            match self {
                Direction::North => 0,
                Direction::East => 90,
                Direction::South => 180,
                Direction::West => 270,
            }
        }

        pub fn axis(self) -> Axis {
            match self {
                Direction::North | Direction::South => Axis::NorthSouth,
                Direction::East | Direction::West => Axis::EastWest,
            }
        }
    }

    impl fmt::Display for Direction {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            let name = match self {
                Direction::North => "north",
                Direction::East => "east",
                Direction::South => "south",
                Direction::West => "west",
            };
            f.write_str(name)
        }
    }

    impl FromStr for Direction {
        type Err = String;

        fn from_str(s: &str) -> Result<Self, Self::Err> {
            match s.trim().to_ascii_lowercase().as_str() {
                "n" | "north" => Ok(Direction::North),
                "e" | "east" => Ok(Direction::East),
                "s" | "south" => Ok(Direction::South),
                "w" | "west" => Ok(Direction::West),
                other => Err(format!("unknown direction '{other}'")),
            }
        }
    }
}

pub use direction::{Axis, Direction};
