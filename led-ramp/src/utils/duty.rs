use std::fmt::{Display, Formatter};

/// A duty cycle, in percent, always within `[0, 100]`.
///
/// The only way to build one is by clamping: values below 0 become 0, values above 100 become
/// 100 and everything in between is kept as is (fractions included, at `f64` precision). Building
/// a `DutyCycle` never fails.
///
/// # Example
/// ```
/// use led_ramp::utils::DutyCycle;
///
/// assert_eq!(DutyCycle::from(-5).as_percent(), 0.0);
/// assert_eq!(DutyCycle::from(150).as_percent(), 100.0);
/// assert_eq!(DutyCycle::from(42.5).as_percent(), 42.5);
/// assert_eq!(DutyCycle::from(37).to_string(), "37%");
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd)]
pub struct DutyCycle(f64);

impl DutyCycle {
    pub const MIN: DutyCycle = DutyCycle(0.0);
    pub const MAX: DutyCycle = DutyCycle(100.0);

    /// Clamps `value` into `[0, 100]`. `NaN` is considered as 0.
    pub fn clamped(value: f64) -> Self {
        match value.is_nan() {
            true => Self::MIN,
            // `-0.0` is normalized to `0.0`.
            false => Self(value.clamp(0.0, 100.0) + 0.0),
        }
    }

    /// Returns the duty cycle as a percentage.
    pub fn as_percent(&self) -> f64 {
        self.0
    }
}

impl Display for DutyCycle {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}%", self.0)
    }
}

macro_rules! impl_from_number {
    ($($variant:ty),*) => {
        $(
            impl From<$variant> for DutyCycle {
                fn from(value: $variant) -> Self {
                    Self::clamped(value as f64)
                }
            }
        )*
    };
}

// Any number type can be turned into a duty cycle.
impl_from_number!(u8, u16, u32, u64, usize, i8, i16, i32, i64, isize, f32, f64);
