use std::fmt;
use std::ops::{Add, AddAssign, Div, Mul};

/// Transmit or received power, stored in the linear domain.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct Power {
    milliwatt: f64,
}

impl Power {
    pub fn from_dbm(dbm: f64) -> Self {
        Power { milliwatt: 10f64.powf(dbm / 10.0) }
    }

    pub fn from_mw(milliwatt: f64) -> Self {
        Power { milliwatt: milliwatt.max(0.0) }
    }

    pub fn zero() -> Self {
        Power { milliwatt: 0.0 }
    }

    pub fn get_mw(&self) -> f64 {
        self.milliwatt
    }

    pub fn get_dbm(&self) -> f64 {
        if self.milliwatt <= 0.0 {
            return f64::NEG_INFINITY;
        }
        10.0 * self.milliwatt.log10()
    }

    pub fn is_zero(&self) -> bool {
        self.milliwatt <= 0.0
    }
}

impl Add for Power {
    type Output = Power;

    fn add(self, rhs: Power) -> Power {
        Power { milliwatt: self.milliwatt + rhs.milliwatt }
    }
}

impl AddAssign for Power {
    fn add_assign(&mut self, rhs: Power) {
        self.milliwatt += rhs.milliwatt;
    }
}

impl Mul<f64> for Power {
    type Output = Power;

    fn mul(self, factor: f64) -> Power {
        Power::from_mw(self.milliwatt * factor)
    }
}

/// Power attenuated by a loss (e.g. pathloss), i.e. a subtraction in dB.
impl Div<Ratio> for Power {
    type Output = Power;

    fn div(self, loss: Ratio) -> Power {
        Power::from_mw(self.milliwatt / loss.get_factor())
    }
}

/// Carrier over interference yields the signal to interference ratio.
impl Div<Power> for Power {
    type Output = Ratio;

    fn div(self, rhs: Power) -> Ratio {
        if rhs.milliwatt <= 0.0 {
            return Ratio::from_db(f64::INFINITY);
        }
        Ratio::from_factor(self.milliwatt / rhs.milliwatt)
    }
}

impl fmt::Display for Power {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2} dBm", self.get_dbm())
    }
}

/// A dimensionless ratio such as SINR, pathloss or antenna gain, stored in dB.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct Ratio {
    db: f64,
}

impl Ratio {
    pub fn from_db(db: f64) -> Self {
        Ratio { db }
    }

    pub fn from_factor(factor: f64) -> Self {
        if factor <= 0.0 {
            return Ratio { db: f64::NEG_INFINITY };
        }
        Ratio { db: 10.0 * factor.log10() }
    }

    pub fn get_db(&self) -> f64 {
        self.db
    }

    pub fn get_factor(&self) -> f64 {
        10f64.powf(self.db / 10.0)
    }
}

impl fmt::Display for Ratio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2} dB", self.db)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_power_conversions() {
        let p = Power::from_dbm(30.0);
        assert!((p.get_mw() - 1000.0).abs() < 1e-9);
        assert!((Power::from_mw(1.0).get_dbm()).abs() < 1e-12);
        assert_eq!(Power::zero().get_dbm(), f64::NEG_INFINITY);
    }

    #[test]
    fn test_pathloss_and_sinr() {
        let rx = Power::from_dbm(20.0) / Ratio::from_db(100.0);
        assert!((rx.get_dbm() + 80.0).abs() < 1e-9);

        let sinr = rx / Power::from_dbm(-90.0);
        assert!((sinr.get_db() - 10.0).abs() < 1e-9);
    }
}
