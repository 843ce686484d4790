use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Flat surcharge for a couples session, in naira.
pub const COUPLES_SURCHARGE: i64 = 10_000;

/// Bookable slots, in the order the wizard offers them.
pub const TIME_SLOTS: [&str; 11] = [
    "12:00 PM", "1:00 PM", "2:00 PM", "3:00 PM", "4:00 PM", "5:00 PM",
    "6:00 PM", "7:00 PM", "8:00 PM", "9:00 PM", "10:00 PM",
];

/// Slots billed at the night rate (6 PM to 10 PM).
pub const EVENING_SLOTS: [&str; 5] = ["6:00 PM", "7:00 PM", "8:00 PM", "9:00 PM", "10:00 PM"];

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum PriceTier {
    #[default]
    Day,
    Night,
}

impl PriceTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            PriceTier::Day => "day",
            PriceTier::Night => "night",
        }
    }

    /// Tier implied by a wizard time slot, or `None` for a slot we don't offer.
    pub fn for_slot(slot: &str) -> Option<Self> {
        if EVENING_SLOTS.contains(&slot) {
            Some(PriceTier::Night)
        } else if TIME_SLOTS.contains(&slot) {
            Some(PriceTier::Day)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PhotoPackage {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    /// `None` means the price is quoted on request.
    pub day_price: Option<i64>,
    /// `None` means night sessions are not offered (or quoted on request).
    pub night_price: Option<i64>,
    pub duration: &'static str,
    pub features: &'static [&'static str],
    pub popular: bool,
}

impl PhotoPackage {
    pub fn price_for(&self, tier: PriceTier) -> Option<i64> {
        match tier {
            PriceTier::Day => self.day_price,
            PriceTier::Night => self.night_price,
        }
    }

    pub fn bookable_online(&self) -> bool {
        self.day_price.is_some()
    }

    pub fn offers_night(&self) -> bool {
        self.night_price.is_some()
    }
}

pub static PACKAGES: [PhotoPackage; 3] = [
    PhotoPackage {
        id: "basic",
        name: "LIFESTYLE SESSION - MOBILE",
        description: "Perfect for individual headshots and simple portraits",
        day_price: Some(35_000),
        night_price: None,
        duration: "45 minutes",
        features: &[
            "45 minutes photo session",
            "5 edited high-resolution photos",
            "Individual",
            "1 outfit change",
            "Basic retouching",
        ],
        popular: false,
    },
    PhotoPackage {
        id: "standard",
        name: "LIFESTYLE SESSION - CAMERA",
        description: "Great for couples, families, or small groups",
        day_price: Some(70_000),
        night_price: Some(85_000),
        duration: "45 minutes",
        features: &[
            "45 minutes photo session",
            "5 edited high-resolution photos",
            "Individual",
            "1 outfit change",
            "Professional retouching",
            "Custom photo book option",
        ],
        popular: true,
    },
    PhotoPackage {
        id: "premium",
        name: "ALL EVENTS",
        description: "Comprehensive session with multiple locations",
        day_price: None,
        night_price: None,
        duration: "3 hours",
        features: &[
            "Weddings",
            "Fashion shows",
            "Company parties",
            "Product launches",
            "Family portraits",
            "Anniversaries",
            "Engagement parties",
            "Bridal showers",
        ],
        popular: false,
    },
];

pub fn find_package(id: &str) -> Option<&'static PhotoPackage> {
    PACKAGES.iter().find(|p| p.id == id)
}

/// What selecting a time slot did to the draft's price tier.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TierChange {
    Upgraded,
    Reverted,
    Unchanged,
}

#[derive(Debug, Clone, Serialize)]
pub struct Quote {
    pub package_id: &'static str,
    pub package_name: &'static str,
    pub tier: PriceTier,
    pub couples: bool,
    pub price: Option<i64>,
    pub night_unavailable: bool,
}

/// In-progress wizard state for one booking: package, tier, slot and date.
#[derive(Debug, Clone)]
pub struct BookingDraft {
    package: &'static PhotoPackage,
    tier: PriceTier,
    couples: bool,
    time: Option<String>,
    date: Option<NaiveDate>,
}

impl BookingDraft {
    pub fn new(package_id: &str, couples: bool) -> Result<Self> {
        let package = find_package(package_id)
            .ok_or_else(|| AppError::NotFound(format!("Unknown package: {}", package_id)))?;

        Ok(Self {
            package,
            tier: PriceTier::Day,
            couples,
            time: None,
            date: None,
        })
    }

    /// Start from a tier chosen up front (the night toggle on the package list).
    pub fn with_tier(mut self, tier: PriceTier) -> Self {
        self.tier = tier;
        self
    }

    pub fn package(&self) -> &'static PhotoPackage {
        self.package
    }

    pub fn tier(&self) -> PriceTier {
        self.tier
    }

    pub fn time(&self) -> Option<&str> {
        self.time.as_deref()
    }

    pub fn date(&self) -> Option<NaiveDate> {
        self.date
    }

    /// Evening slots move the draft to the night tier and day slots move it back.
    pub fn select_time(&mut self, slot: &str) -> Result<TierChange> {
        let slot_tier = PriceTier::for_slot(slot)
            .ok_or_else(|| AppError::Validation(format!("Unknown time slot: {}", slot)))?;

        self.time = Some(slot.to_string());

        let change = match (self.tier, slot_tier) {
            (PriceTier::Day, PriceTier::Night) => TierChange::Upgraded,
            (PriceTier::Night, PriceTier::Day) => TierChange::Reverted,
            _ => TierChange::Unchanged,
        };
        self.tier = slot_tier;

        Ok(change)
    }

    /// Sessions can be booked from tomorrow onwards.
    pub fn select_date(&mut self, date: NaiveDate, today: NaiveDate) -> Result<()> {
        if date <= today {
            return Err(AppError::Validation(
                "Booking date must be in the future".to_string(),
            ));
        }
        self.date = Some(date);
        Ok(())
    }

    pub fn night_unavailable(&self) -> bool {
        self.tier == PriceTier::Night && self.package.bookable_online() && !self.package.offers_night()
    }

    pub fn price(&self) -> Option<i64> {
        let base = self.package.price_for(self.tier)?;
        Some(if self.couples { base + COUPLES_SURCHARGE } else { base })
    }

    pub fn quote(&self) -> Quote {
        Quote {
            package_id: self.package.id,
            package_name: self.package.name,
            tier: self.tier,
            couples: self.couples,
            price: self.price(),
            night_unavailable: self.night_unavailable(),
        }
    }

    /// Price to charge for a complete draft, or why it can't be booked online.
    pub fn checkout_price(&self) -> Result<i64> {
        if !self.package.bookable_online() {
            return Err(AppError::Validation(format!(
                "{} is priced on request; please contact the studio",
                self.package.name
            )));
        }
        if self.night_unavailable() {
            return Err(AppError::Validation(
                "Night session unavailable for this package. Please select a different time slot."
                    .to_string(),
            ));
        }
        if self.time.is_none() || self.date.is_none() {
            return Err(AppError::Validation(
                "Please select a date and time for your session".to_string(),
            ));
        }
        self.price()
            .ok_or_else(|| AppError::Internal("Package price missing for tier".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()
    }

    #[test]
    fn test_slot_tiers_match_table() {
        for slot in ["12:00 PM", "1:00 PM", "2:00 PM", "3:00 PM", "4:00 PM", "5:00 PM"] {
            assert_eq!(PriceTier::for_slot(slot), Some(PriceTier::Day), "{}", slot);
        }
        for slot in EVENING_SLOTS {
            assert_eq!(PriceTier::for_slot(slot), Some(PriceTier::Night), "{}", slot);
        }
        assert_eq!(PriceTier::for_slot("11:00 AM"), None);
    }

    #[test]
    fn test_evening_slot_upgrades_and_day_slot_reverts() {
        let mut draft = BookingDraft::new("standard", false).unwrap();
        assert_eq!(draft.price(), Some(70_000));

        assert_eq!(draft.select_time("7:00 PM").unwrap(), TierChange::Upgraded);
        assert_eq!(draft.tier(), PriceTier::Night);
        assert_eq!(draft.price(), Some(85_000));

        assert_eq!(draft.select_time("8:00 PM").unwrap(), TierChange::Unchanged);

        assert_eq!(draft.select_time("2:00 PM").unwrap(), TierChange::Reverted);
        assert_eq!(draft.tier(), PriceTier::Day);
        assert_eq!(draft.price(), Some(70_000));
    }

    #[test]
    fn test_couples_surcharge() {
        let mut draft = BookingDraft::new("standard", true).unwrap();
        draft.select_time("6:00 PM").unwrap();
        assert_eq!(draft.price(), Some(95_000));
    }

    #[test]
    fn test_basic_package_has_no_night_session() {
        let mut draft = BookingDraft::new("basic", false).unwrap();
        draft.select_date(NaiveDate::from_ymd_opt(2025, 3, 12).unwrap(), today()).unwrap();
        draft.select_time("9:00 PM").unwrap();
        assert!(draft.night_unavailable());
        assert!(draft.quote().price.is_none());
        assert!(matches!(draft.checkout_price(), Err(AppError::Validation(_))));

        draft.select_time("3:00 PM").unwrap();
        assert_eq!(draft.checkout_price().unwrap(), 35_000);
    }

    #[test]
    fn test_past_and_same_day_dates_rejected() {
        let mut draft = BookingDraft::new("standard", false).unwrap();
        let yesterday = NaiveDate::from_ymd_opt(2025, 3, 9).unwrap();
        assert!(draft.select_date(yesterday, today()).is_err());
        assert!(draft.select_date(today(), today()).is_err());
        assert!(draft.date().is_none());

        let tomorrow = NaiveDate::from_ymd_opt(2025, 3, 11).unwrap();
        draft.select_date(tomorrow, today()).unwrap();
        assert_eq!(draft.date(), Some(tomorrow));
    }

    #[test]
    fn test_premium_requires_quote() {
        let mut draft = BookingDraft::new("premium", false).unwrap();
        draft.select_date(NaiveDate::from_ymd_opt(2025, 4, 1).unwrap(), today()).unwrap();
        draft.select_time("1:00 PM").unwrap();
        assert!(!draft.night_unavailable());
        assert!(matches!(draft.checkout_price(), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_unknown_package_and_slot() {
        assert!(matches!(BookingDraft::new("deluxe", false), Err(AppError::NotFound(_))));
        let mut draft = BookingDraft::new("basic", false).unwrap();
        assert!(draft.select_time("11:00 PM").is_err());
        assert!(draft.time().is_none());
    }
}
