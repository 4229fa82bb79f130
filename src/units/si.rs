//! Predefined SI units.

use super::{BaseQuantity, Unit};
use crate::constants::PI;
use lazy_static::lazy_static;
use std::collections::HashMap;

lazy_static! {
    /// Unit for length [m].
    pub static ref METER: Unit = Unit::base(BaseQuantity::Length, "m");
    /// Unit for length [km].
    pub static ref KILOMETER: Unit = METER.scale(1e3).with_identifier("km");
    /// Unit for mass [kg].
    pub static ref KILOGRAM: Unit = Unit::base(BaseQuantity::Mass, "kg");
    /// Unit for time [s].
    pub static ref SECOND: Unit = Unit::base(BaseQuantity::Time, "s");
    /// Unit for electric current [A].
    pub static ref AMPERE: Unit = Unit::base(BaseQuantity::Current, "A");
    /// Unit for temperature [K].
    pub static ref KELVIN: Unit = Unit::base(BaseQuantity::Temperature, "K");
    /// Unit for temperature [°C].
    pub static ref CELSIUS: Unit = KELVIN.shift(273.15).with_identifier("Cel");
    /// Unit for amount of substance [mol].
    pub static ref MOLE: Unit = Unit::base(BaseQuantity::Amount, "mol");
    /// Unit for luminous intensity [cd].
    pub static ref CANDELA: Unit = Unit::base(BaseQuantity::Luminosity, "cd");
    /// Unit for plane angle [rad].
    pub static ref RADIAN: Unit = Unit::base(BaseQuantity::Angle, "rad");
    /// Unit for plane angle [deg].
    pub static ref DEGREE: Unit = RADIAN.scale(PI / 180.0).with_identifier("deg");

    static ref SYMBOLS: HashMap<&'static str, &'static Unit> = {
        let mut symbols: HashMap<&'static str, &'static Unit> = HashMap::new();
        symbols.insert("m", &*METER);
        symbols.insert("km", &*KILOMETER);
        symbols.insert("kg", &*KILOGRAM);
        symbols.insert("s", &*SECOND);
        symbols.insert("A", &*AMPERE);
        symbols.insert("K", &*KELVIN);
        symbols.insert("Cel", &*CELSIUS);
        symbols.insert("mol", &*MOLE);
        symbols.insert("cd", &*CANDELA);
        symbols.insert("rad", &*RADIAN);
        symbols.insert("deg", &*DEGREE);
        symbols.insert("degree", &*DEGREE);
        symbols
    };
}

/// Looks up a predefined unit by its symbol.
pub fn lookup(symbol: &str) -> Option<Unit> {
    SYMBOLS.get(symbol).map(|&unit| unit.clone())
}
