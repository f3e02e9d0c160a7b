use serde_repr::{Deserialize_repr, Serialize_repr};
use std::convert::TryFrom;

#[derive(Deserialize_repr, Serialize_repr, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum EventStatus {
    #[default]
    None = 0,
    Provisional = 1,
    Final = 2
}

impl EventStatus {
    /// `F` and `P` are the only recognised prefixes.
    pub fn parse(value: &str) -> Option<EventStatus> {
        match value.trim().trim_matches('"').chars().next()?.to_ascii_uppercase() {
            'F' => Some(EventStatus::Final),
            'P' => Some(EventStatus::Provisional),
            _ => None
        }
    }

    pub fn letter(&self) -> char {
        match self {
            EventStatus::Final => 'F',
            _ => 'P'
        }
    }

    pub fn is_final(&self) -> bool {
        *self == EventStatus::Final
    }
}

impl TryFrom<i32> for EventStatus {
    type Error = ();

    fn try_from(v: i32) -> Result<Self, Self::Error> {
        match v {
            0 => Ok(EventStatus::None),
            1 => Ok(EventStatus::Provisional),
            2 => Ok(EventStatus::Final),
            _ => Err(())
        }
    }
}
