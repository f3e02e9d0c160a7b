use serde_repr::{Deserialize_repr, Serialize_repr};
use std::{convert::TryFrom, fmt};
use strum_macros::EnumIter;

#[derive(Deserialize_repr, Serialize_repr, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, EnumIter)]
#[repr(u8)]
pub enum Subdivision {
    #[default]
    Gold = 0,
    Silver = 1,
    Bronze = 2
}

impl Subdivision {
    pub fn offset(&self) -> u32 {
        *self as u32
    }

    /// Clamps out-of-range indices to [`Subdivision::Bronze`].
    pub fn from_index(index: i64) -> Subdivision {
        match index {
            i64::MIN..=0 => Subdivision::Gold,
            1 => Subdivision::Silver,
            _ => Subdivision::Bronze
        }
    }

    pub fn letter(&self) -> char {
        match self {
            Subdivision::Gold => 'G',
            Subdivision::Silver => 'S',
            Subdivision::Bronze => 'B'
        }
    }

    /// Store format accepts a digit or the first letter of the name.
    pub fn parse(value: &str) -> Option<Subdivision> {
        let first = value.trim().chars().next()?;
        match first.to_ascii_uppercase() {
            'G' => Some(Subdivision::Gold),
            'S' => Some(Subdivision::Silver),
            'B' => Some(Subdivision::Bronze),
            c if c.is_ascii_digit() => value.trim().parse::<i32>().ok().and_then(|v| Subdivision::try_from(v).ok()),
            _ => None
        }
    }
}

impl TryFrom<i32> for Subdivision {
    type Error = ();

    fn try_from(v: i32) -> Result<Self, Self::Error> {
        match v {
            0 => Ok(Subdivision::Gold),
            1 => Ok(Subdivision::Silver),
            2 => Ok(Subdivision::Bronze),
            _ => Err(())
        }
    }
}

impl fmt::Display for Subdivision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Subdivision::Gold => "Gold",
            Subdivision::Silver => "Silver",
            Subdivision::Bronze => "Bronze"
        };
        write!(f, "{}", name)
    }
}
