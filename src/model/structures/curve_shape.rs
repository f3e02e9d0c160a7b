use serde::Serialize;
use serde_repr::{Deserialize_repr, Serialize_repr};
use std::convert::TryFrom;
use strum_macros::EnumIter;
use thiserror::Error;

use crate::model::constants::{CURVE_POINTS, DIV_COUNT, DIV_IN_USE, MAX_TROPHY_ADJUST};

const DEFAULT_MULTIPLIERS: [f64; CURVE_POINTS] = [-0.5, 0.0, 1.0, 2.2, 3.5, 6.0, 8.0, 12.0, 18.0, 26.0];
const FLAT_MULTIPLIERS: [f64; CURVE_POINTS] = [-1.0, 0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0];
const STANDARD_MULTIPLIERS: [f64; CURVE_POINTS] = [-0.5, 0.0, 1.0, 2.5, 4.5, 7.0, 10.0, 13.5, 17.5, 22.0];
const HYBRID_MULTIPLIERS: [f64; CURVE_POINTS] = [-0.5, 0.0, 1.0, 2.75, 5.25, 8.5, 12.5, 17.75, 22.25, 29.0];
const DOUBLE_MULTIPLIERS: [f64; CURVE_POINTS] = [-0.5, 0.0, 1.0, 3.0, 6.0, 10.0, 15.0, 21.0, 28.0, 36.0];
const MULTIPLY_MULTIPLIERS: [f64; CURVE_POINTS] = [-0.5, 0.0, 1.0, 3.0, 7.0, 15.0, 31.0, 63.0, 127.0, 255.0];

const QUALIFIER_TROPHIES: [f64; 3] = [1.0 / 3.0 - 0.05, 2.0 / 3.0 - 0.05, 1.0];
const FLAT_TROPHIES: [f64; 3] = [1.0 / 3.0, 2.0 / 3.0, 1.0];
const STANDARD_TROPHIES: [f64; 3] = [0.3, 0.3 + 1.0 / 3.0, 1.0];
const TWELFTHS_TROPHIES: [f64; 3] = [3.0 / 12.0, 7.0 / 12.0, 12.0 / 12.0];

const ADJUST_SLOTS: usize = DIV_COUNT as usize + 1;

#[derive(Debug, Error, PartialEq)]
pub enum CurveError {
    #[error("gold trophy shift {value:.3} for division {division} must lie between -2/3 and 2/3")]
    TrophyAdjustOutOfRange { division: u32, value: f64 },
    #[error("division {0} is outside the curve")]
    DivisionOutOfRange(u32)
}

/// Selects the par multiplier and trophy fraction tables.
///
/// `Qualifier` is what an event gets when it names no shape: flat spacing with
/// gold and silver pulled slightly toward par.
#[derive(Deserialize_repr, Serialize_repr, Debug, Clone, Copy, PartialEq, Eq, Hash, Default, EnumIter)]
#[repr(u8)]
pub enum CurveShape {
    #[default]
    Qualifier = 0,
    Flat = 1,
    Standard = 2,
    Hybrid = 3,
    Double = 4,
    Multiply = 5,
    Custom = 6
}

impl CurveShape {
    pub fn from_letter(value: &str) -> Option<CurveShape> {
        match value.trim().chars().next()?.to_ascii_uppercase() {
            'F' => Some(CurveShape::Flat),
            'S' => Some(CurveShape::Standard),
            'H' => Some(CurveShape::Hybrid),
            'D' => Some(CurveShape::Double),
            'M' => Some(CurveShape::Multiply),
            'C' => Some(CurveShape::Custom),
            _ => None
        }
    }

    pub fn trophy_fractions(&self) -> [f64; 3] {
        match self {
            CurveShape::Qualifier => QUALIFIER_TROPHIES,
            CurveShape::Flat | CurveShape::Custom => FLAT_TROPHIES,
            CurveShape::Standard | CurveShape::Hybrid => STANDARD_TROPHIES,
            CurveShape::Double | CurveShape::Multiply => TWELFTHS_TROPHIES
        }
    }

    fn base_multipliers(&self) -> [f64; CURVE_POINTS] {
        match self {
            CurveShape::Qualifier | CurveShape::Flat => FLAT_MULTIPLIERS,
            CurveShape::Standard => STANDARD_MULTIPLIERS,
            CurveShape::Hybrid => HYBRID_MULTIPLIERS,
            CurveShape::Double => DOUBLE_MULTIPLIERS,
            CurveShape::Multiply => MULTIPLY_MULTIPLIERS,
            CurveShape::Custom => DEFAULT_MULTIPLIERS
        }
    }
}

impl TryFrom<i32> for CurveShape {
    type Error = ();

    fn try_from(v: i32) -> Result<Self, Self::Error> {
        match v {
            0 => Ok(CurveShape::Qualifier),
            1 => Ok(CurveShape::Flat),
            2 => Ok(CurveShape::Standard),
            3 => Ok(CurveShape::Hybrid),
            4 => Ok(CurveShape::Double),
            5 => Ok(CurveShape::Multiply),
            6 => Ok(CurveShape::Custom),
            _ => Err(())
        }
    }
}

/// The curve an event is rated against: a shape plus its custom multipliers
/// and the per-division gold/silver shift.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParCurve {
    pub shape: CurveShape,
    custom_multipliers: [f64; CURVE_POINTS],
    trophy_adjust: [f64; ADJUST_SLOTS]
}

impl Default for ParCurve {
    fn default() -> Self {
        ParCurve::new(CurveShape::default())
    }
}

impl ParCurve {
    pub fn new(shape: CurveShape) -> ParCurve {
        ParCurve {
            shape,
            custom_multipliers: DEFAULT_MULTIPLIERS,
            trophy_adjust: [0.0; ADJUST_SLOTS]
        }
    }

    pub fn multipliers(&self) -> [f64; CURVE_POINTS] {
        match self.shape {
            CurveShape::Custom => self.custom_multipliers,
            shape => shape.base_multipliers()
        }
    }

    /// Multiplier `k` of the curve. Points past the divisions in use are pushed
    /// out by a further `DIV_IN_USE` per division so the hidden divisions stay spread.
    pub fn point(&self, k: usize) -> f64 {
        let table = self.multipliers();
        let raw = table[k.min(CURVE_POINTS - 1)];
        let in_use = DIV_IN_USE as usize;

        if k >= in_use {
            raw + (in_use * (k - in_use)) as f64
        } else {
            raw
        }
    }

    pub fn trophy_fractions(&self) -> [f64; 3] {
        self.shape.trophy_fractions()
    }

    /// Overwrites the leading custom multipliers; missing values keep their default.
    pub fn set_custom_multipliers(&mut self, values: &[f64]) {
        for (slot, value) in self.custom_multipliers.iter_mut().zip(values) {
            *slot = *value;
        }
    }

    pub fn trophy_adjust(&self, division: u32) -> f64 {
        self.trophy_adjust.get(division as usize).copied().unwrap_or(0.0)
    }

    pub fn set_trophy_adjust(&mut self, division: u32, value: f64) -> Result<(), CurveError> {
        if !(value > -MAX_TROPHY_ADJUST && value < MAX_TROPHY_ADJUST) {
            return Err(CurveError::TrophyAdjustOutOfRange { division, value });
        }

        let slot = self
            .trophy_adjust
            .get_mut(division as usize)
            .ok_or(CurveError::DivisionOutOfRange(division))?;
        *slot = value;

        Ok(())
    }
}
