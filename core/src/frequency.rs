//! Frequency tokens and their canonical monthly visit counts.
//!
//! The visit table is fixed: a token always maps to the same
//! constant regardless of calendar or facility. 4.33 is 52/12
//! rounded; every "Nx_week" entry is N × 4.33 rounded to cents.

use crate::keys::token_enum;

/// Visit count used for any token not in the table.
pub const DEFAULT_MONTHLY_VISITS: f64 = 4.33;

token_enum! {
    /// A service frequency.
    Frequency {
        OncePerWeek  => "1x_week" | "weekly" | "once_weekly",
        TwicePerWeek => "2x_week",
        ThricePerWeek => "3x_week",
        FourPerWeek  => "4x_week",
        FivePerWeek  => "5x_week" | "weekdays",
        SixPerWeek   => "6x_week",
        SevenPerWeek => "7x_week",
        Daily        => "daily",
        Biweekly     => "biweekly" | "bi_weekly" | "every_other_week",
        Monthly      => "monthly",
        Bimonthly    => "bimonthly" | "every_other_month",
        Quarterly    => "quarterly",
        SemiAnnual   => "semi_annual" | "semiannual",
        Annual       => "annual" | "annually" | "yearly",
    }
}

impl Frequency {
    /// Canonical monthly visits. `Other` gets the default.
    pub fn monthly_visits(&self) -> f64 {
        match self {
            Frequency::OncePerWeek   => 4.33,
            Frequency::TwicePerWeek  => 8.67,
            Frequency::ThricePerWeek => 13.0,
            Frequency::FourPerWeek   => 17.33,
            Frequency::FivePerWeek   => 21.67,
            Frequency::SixPerWeek    => 26.0,
            Frequency::SevenPerWeek  => 30.33,
            Frequency::Daily         => 30.0,
            Frequency::Biweekly      => 2.17,
            Frequency::Monthly       => 1.0,
            Frequency::Bimonthly     => 0.5,
            Frequency::Quarterly     => 0.33,
            Frequency::SemiAnnual    => 0.17,
            Frequency::Annual        => 0.08,
            Frequency::Other         => DEFAULT_MONTHLY_VISITS,
        }
    }
}

/// Token → monthly visits. Unknown tokens silently get
/// `DEFAULT_MONTHLY_VISITS`.
pub fn monthly_visits(token: &str) -> f64 {
    let frequency = Frequency::parse(token);
    if frequency == Frequency::Other {
        log::debug!("frequency: unknown token '{token}', using {DEFAULT_MONTHLY_VISITS}");
    }
    frequency.monthly_visits()
}
