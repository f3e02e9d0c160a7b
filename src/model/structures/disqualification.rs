use serde_repr::{Deserialize_repr, Serialize_repr};
use std::{convert::TryFrom, fmt};
use strum_macros::EnumIter;

/// Replay review state of a submission. The first three variants are not
/// disqualifications; everything from [`Disqualification::OffTrack`] on is.
#[derive(Deserialize_repr, Serialize_repr, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, EnumIter)]
#[repr(u8)]
pub enum Disqualification {
    /// Unchecked but assumed clean
    #[default]
    Ok = 0,
    /// Replay submitted, not yet checked
    Submitted = 1,
    Verified = 2,
    OffTrack = 3,
    Contact = 4,
    NoReplay = 5,
    /// Splits do not add up to the total
    TimeError = 6,
    NameViolation = 7,
    CustomViolation = 8
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplayFlag {
    Green,
    Red,
    Black
}

impl Disqualification {
    pub fn is_eligible(&self) -> bool {
        matches!(
            self,
            Disqualification::Ok | Disqualification::Submitted | Disqualification::Verified
        )
    }

    /// Maps the first letter of a `STATUS:`/`DISQ:` value. Unknown letters read as OK.
    pub fn from_code(value: &str) -> Disqualification {
        let first = value.trim().trim_matches('"').chars().next().map(|c| c.to_ascii_uppercase());
        match first {
            Some('O') => Disqualification::OffTrack,
            Some('C') => Disqualification::Contact,
            Some('R') => Disqualification::NoReplay,
            Some('T') => Disqualification::TimeError,
            Some('N') => Disqualification::NameViolation,
            Some('X') => Disqualification::CustomViolation,
            Some('S') | Some('U') => Disqualification::Submitted,
            Some('V') | Some('G') => Disqualification::Verified,
            _ => Disqualification::Ok
        }
    }

    /// Token written to the player store.
    pub fn code(&self) -> &'static str {
        match self {
            Disqualification::Ok => "OK",
            Disqualification::Submitted => "SUBMITTED",
            Disqualification::Verified => "VERIFIED",
            Disqualification::OffTrack => "OFFTRACK",
            Disqualification::Contact => "CONTACT",
            Disqualification::NoReplay => "REPLAY",
            Disqualification::TimeError => "TIMEERROR",
            Disqualification::NameViolation => "NAME_VIOLATION",
            Disqualification::CustomViolation => "X"
        }
    }

    pub fn flag(&self) -> Option<ReplayFlag> {
        match self {
            Disqualification::Verified => Some(ReplayFlag::Green),
            d if *d >= Disqualification::NoReplay => Some(ReplayFlag::Black),
            d if *d >= Disqualification::OffTrack => Some(ReplayFlag::Red),
            _ => None
        }
    }
}

impl TryFrom<i32> for Disqualification {
    type Error = ();

    fn try_from(v: i32) -> Result<Self, Self::Error> {
        match v {
            0 => Ok(Disqualification::Ok),
            1 => Ok(Disqualification::Submitted),
            2 => Ok(Disqualification::Verified),
            3 => Ok(Disqualification::OffTrack),
            4 => Ok(Disqualification::Contact),
            5 => Ok(Disqualification::NoReplay),
            6 => Ok(Disqualification::TimeError),
            7 => Ok(Disqualification::NameViolation),
            8 => Ok(Disqualification::CustomViolation),
            _ => Err(())
        }
    }
}

impl fmt::Display for Disqualification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Disqualification::Ok | Disqualification::Submitted => "",
            Disqualification::Verified => "(Verified)",
            Disqualification::OffTrack => "(Off Track)",
            Disqualification::Contact => "(Contact)",
            Disqualification::NoReplay => "(No Replay)",
            Disqualification::TimeError => "(Time Error)",
            Disqualification::NameViolation => "(Name Violation)",
            Disqualification::CustomViolation => "(Custom Violation)"
        };
        write!(f, "{}", text)
    }
}

#[cfg(test)]
mod tests {
    use super::{Disqualification, ReplayFlag};
    use strum::IntoEnumIterator;

    #[test]
    fn test_eligibility() {
        let eligible: Vec<_> = Disqualification::iter().filter(|d| d.is_eligible()).collect();
        assert_eq!(
            eligible,
            vec![Disqualification::Ok, Disqualification::Submitted, Disqualification::Verified]
        );
    }

    #[test]
    fn test_from_code() {
        assert_eq!(Disqualification::from_code("offtrack"), Disqualification::OffTrack);
        assert_eq!(Disqualification::from_code("Unverified"), Disqualification::Submitted);
        assert_eq!(Disqualification::from_code("green"), Disqualification::Verified);
        assert_eq!(Disqualification::from_code("X"), Disqualification::CustomViolation);
        assert_eq!(Disqualification::from_code("?"), Disqualification::Ok);
    }

    #[test]
    fn test_codes_read_back() {
        for dq in Disqualification::iter() {
            assert_eq!(Disqualification::from_code(dq.code()), dq);
        }
    }

    #[test]
    fn test_flags() {
        assert_eq!(Disqualification::Verified.flag(), Some(ReplayFlag::Green));
        assert_eq!(Disqualification::Contact.flag(), Some(ReplayFlag::Red));
        assert_eq!(Disqualification::NoReplay.flag(), Some(ReplayFlag::Black));
        assert_eq!(Disqualification::Submitted.flag(), None);
    }
}
