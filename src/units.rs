//! Measurement units for set components and coordinate systems.

pub mod si;

use crate::{ensure, error::Result, estimate::ErrorEstimate, fail};
use lazy_static::lazy_static;
use ndarray::{Array2, Axis};
use regex::Regex;
use std::fmt;

#[cfg(feature = "serialization")]
use serde::Serialize;

/// Floating-point precision to use for units.
#[allow(non_camel_case_types)]
pub type fun = f64;

/// Number of independent base quantities.
pub const N_BASE_QUANTITIES: usize = 8;

/// Independent physical quantities that units are built from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialization", derive(Serialize))]
pub enum BaseQuantity {
    Length = 0,
    Mass = 1,
    Time = 2,
    Current = 3,
    Temperature = 4,
    Amount = 5,
    Luminosity = 6,
    Angle = 7,
}

/// A unit of measurement.
///
/// A value `v` expressed in the unit corresponds to `v*scale + offset` in the
/// coherent SI unit with the same exponents of the base quantities.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serialization", derive(Serialize))]
pub struct Unit {
    exponents: [i8; N_BASE_QUANTITIES],
    scale: fun,
    offset: fun,
    identifier: Option<String>,
}

lazy_static! {
    static ref FACTOR_REGEX: Regex = Regex::new(r"^([A-Za-z_]+)(?:\^?(-?\d+))?$").unwrap();
}

impl Unit {
    /// Creates the unit of a dimensionless quantity.
    pub fn dimensionless() -> Self {
        Self {
            exponents: [0; N_BASE_QUANTITIES],
            scale: 1.0,
            offset: 0.0,
            identifier: None,
        }
    }

    /// Creates the coherent SI unit of the given base quantity.
    pub fn base(quantity: BaseQuantity, identifier: &str) -> Self {
        let mut exponents = [0; N_BASE_QUANTITIES];
        exponents[quantity as usize] = 1;
        Self {
            exponents,
            scale: 1.0,
            offset: 0.0,
            identifier: Some(identifier.to_string()),
        }
    }

    /// Parses a unit specification like `km/s`, `m^2 s^-1` or `kg*m/s^2`.
    ///
    /// Factors are separated by whitespace, `*` or `.`, and every factor after
    /// a `/` is inverted. Symbols are resolved through `si::lookup`.
    pub fn parse(specification: &str) -> Result<Self> {
        let trimmed = specification.trim();
        let mut unit = Self::dimensionless();
        if trimmed.is_empty() || trimmed == "1" {
            return Ok(unit);
        }
        let mut parts = trimmed.split('/');
        let numerator = parts.next().unwrap_or("");
        let denominators: Vec<_> = parts.collect();
        ensure!(
            denominators.len() <= 1,
            IncompatibleUnits,
            "unit specification {} has more than one '/'",
            specification
        );
        for (inverted, part) in std::iter::once((false, numerator))
            .chain(denominators.into_iter().map(|part| (true, part)))
        {
            for factor in part
                .split(|c: char| c.is_whitespace() || c == '*' || c == '.')
                .filter(|factor| !factor.is_empty() && *factor != "1")
            {
                let captures = match FACTOR_REGEX.captures(factor) {
                    Some(captures) => captures,
                    None => fail!(
                        IncompatibleUnits,
                        "invalid unit factor {} in {}",
                        factor,
                        specification
                    ),
                };
                let symbol = &captures[1];
                let factor_unit = match si::lookup(symbol) {
                    Some(factor_unit) => factor_unit,
                    None => fail!(IncompatibleUnits, "unknown unit symbol {}", symbol),
                };
                let mut power: i32 = match captures.get(2) {
                    Some(power) => power.as_str().parse().map_err(|_| {
                        crate::error::SetError::IncompatibleUnits(format!(
                            "invalid exponent in unit factor {}",
                            factor
                        ))
                    })?,
                    None => 1,
                };
                if inverted {
                    power = -power;
                }
                unit = unit.multiply(&factor_unit.pow(power)?)?;
            }
        }
        Ok(unit.with_identifier(trimmed))
    }

    /// Returns a copy of the unit with the given identifier.
    pub fn with_identifier(mut self, identifier: &str) -> Self {
        self.identifier = Some(identifier.to_string());
        self
    }

    /// Returns the unit whose values are `amount` times this unit's values.
    pub fn scale(&self, amount: fun) -> Self {
        Self {
            exponents: self.exponents,
            scale: self.scale * amount,
            offset: self.offset,
            identifier: None,
        }
    }

    /// Returns the unit whose zero lies at `offset` in this unit.
    pub fn shift(&self, offset: fun) -> Self {
        Self {
            exponents: self.exponents,
            scale: self.scale,
            offset: self.offset + offset * self.scale,
            identifier: None,
        }
    }

    /// Returns the product of the two units.
    ///
    /// Offsets do not survive multiplication; the product is formed from the
    /// underlying scaled units. Fails with `IncompatibleUnits` if an exponent
    /// leaves the range of `i8`.
    pub fn multiply(&self, other: &Self) -> Result<Self> {
        let mut exponents = self.exponents;
        for (exponent, &other_exponent) in exponents.iter_mut().zip(other.exponents.iter()) {
            *exponent = match exponent.checked_add(other_exponent) {
                Some(sum) => sum,
                None => fail!(
                    IncompatibleUnits,
                    "exponent overflow when multiplying {} by {}",
                    self,
                    other
                ),
            };
        }
        Ok(Self {
            exponents,
            scale: self.scale * other.scale,
            offset: 0.0,
            identifier: None,
        })
    }

    /// Returns the quotient of the two units.
    pub fn divide(&self, other: &Self) -> Result<Self> {
        self.multiply(&other.pow(-1)?)
    }

    /// Returns the unit raised to an integer power.
    ///
    /// Fails with `IncompatibleUnits` if an exponent leaves the range of `i8`.
    pub fn pow(&self, power: i32) -> Result<Self> {
        let mut exponents = self.exponents;
        for exponent in exponents.iter_mut() {
            *exponent = match i32::from(*exponent)
                .checked_mul(power)
                .and_then(|raised| i8::try_from(raised).ok())
            {
                Some(raised) => raised,
                None => fail!(
                    IncompatibleUnits,
                    "exponent overflow when raising {} to the power {}",
                    self,
                    power
                ),
            };
        }
        Ok(Self {
            exponents,
            scale: self.scale.powi(power),
            offset: 0.0,
            identifier: None,
        })
    }

    pub fn exponent(&self, quantity: BaseQuantity) -> i8 {
        self.exponents[quantity as usize]
    }

    pub fn identifier(&self) -> Option<&str> {
        self.identifier.as_deref()
    }

    pub fn is_dimensionless(&self) -> bool {
        self.exponents.iter().all(|&exponent| exponent == 0)
    }

    /// Whether values in the other unit can be converted into this unit.
    pub fn is_convertible(&self, other: &Self) -> bool {
        self.exponents == other.exponents
    }

    /// Converts a single value expressed in `that` unit into this unit.
    pub fn to_this_value(&self, value: fun, that: &Self) -> Result<fun> {
        ensure!(
            self.is_convertible(that),
            IncompatibleUnits,
            "{} is not convertible to {}",
            that,
            self
        );
        Ok(((value * that.scale + that.offset) - self.offset) / self.scale)
    }

    /// Converts values expressed in `that` unit into this unit.
    pub fn to_this(&self, values: &[fun], that: &Self) -> Result<Vec<fun>> {
        ensure!(
            self.is_convertible(that),
            IncompatibleUnits,
            "{} is not convertible to {}",
            that,
            self
        );
        if self == that {
            return Ok(values.to_vec());
        }
        Ok(values
            .iter()
            .map(|&value| ((value * that.scale + that.offset) - self.offset) / self.scale)
            .collect())
    }

    /// Converts values expressed in this unit into `that` unit.
    pub fn to_that(&self, values: &[fun], that: &Self) -> Result<Vec<fun>> {
        that.to_this(values, self)
    }

    /// Whether values can be converted between the two optional units.
    ///
    /// A missing unit means values are taken as they are, so it fits any unit.
    pub fn can_convert(unit_a: Option<&Self>, unit_b: Option<&Self>) -> bool {
        match (unit_a, unit_b) {
            (Some(unit_a), Some(unit_b)) => unit_a.is_convertible(unit_b),
            _ => true,
        }
    }

    /// Converts a component-major value array from `units_in` to `units_out`.
    ///
    /// Components where either unit is missing are left untouched.
    pub fn convert_tuple(
        values: &mut Array2<fun>,
        units_in: &[Option<Unit>],
        units_out: &[Option<Unit>],
    ) -> Result<()> {
        ensure!(
            units_in.len() == values.nrows() && units_out.len() == values.nrows(),
            DimensionMismatch,
            "unit counts {} and {} do not match tuple dimension {}",
            units_in.len(),
            units_out.len(),
            values.nrows()
        );
        for (mut row, (unit_in, unit_out)) in values
            .axis_iter_mut(Axis(0))
            .zip(units_in.iter().zip(units_out.iter()))
        {
            if let (Some(unit_in), Some(unit_out)) = (unit_in, unit_out) {
                if unit_in != unit_out {
                    let converted = unit_out.to_this(&row.to_vec(), unit_in)?;
                    row.iter_mut()
                        .zip(converted)
                        .for_each(|(value, converted)| *value = converted);
                }
            }
        }
        Ok(())
    }

    /// Converts values and their error estimate from `unit_in` to `unit_out`.
    ///
    /// When either unit is missing the values pass through unchanged. A
    /// converted error is the width of the converted interval spanned by
    /// `mean ± error/2`.
    pub fn transform_units(
        unit_out: Option<&Unit>,
        unit_in: Option<&Unit>,
        error_in: Option<&ErrorEstimate>,
        values: &[fun],
    ) -> Result<(Vec<fun>, Option<ErrorEstimate>)> {
        let (unit_out, unit_in) = match (unit_out, unit_in) {
            (Some(unit_out), Some(unit_in)) => (unit_out, unit_in),
            _ => return Ok((values.to_vec(), error_in.cloned())),
        };
        let new_values = unit_out.to_this(values, unit_in)?;
        let error_out = match error_in {
            Some(error_in) => {
                let half_error = 0.5 * error_in.error();
                let mean = error_in.mean();
                let bounds =
                    unit_out.to_this(&[mean - half_error, mean + half_error], unit_in)?;
                Some(ErrorEstimate::from_values(
                    &new_values,
                    (bounds[1] - bounds[0]).abs(),
                    Some(unit_out.clone()),
                ))
            }
            None => None,
        };
        Ok((new_values, error_out))
    }
}

impl PartialEq for Unit {
    fn eq(&self, other: &Self) -> bool {
        self.exponents == other.exponents
            && self.scale == other.scale
            && self.offset == other.offset
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if let Some(identifier) = &self.identifier {
            return write!(f, "{}", identifier);
        }
        const SYMBOLS: [&str; N_BASE_QUANTITIES] = ["m", "kg", "s", "A", "K", "mol", "cd", "rad"];
        let mut text = if self.scale == 1.0 {
            String::new()
        } else {
            format!("{}", self.scale)
        };
        for (symbol, &exponent) in SYMBOLS.iter().zip(self.exponents.iter()) {
            if exponent == 0 {
                continue;
            }
            if !text.is_empty() {
                text.push(' ');
            }
            text.push_str(symbol);
            if exponent != 1 {
                text.push_str(&format!("^{}", exponent));
            }
        }
        if self.offset != 0.0 {
            text.push_str(&format!(" @ {}", self.offset));
        }
        if text.is_empty() {
            text.push('1');
        }
        write!(f, "{}", text)
    }
}
