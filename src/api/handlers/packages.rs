use axum::Json;
use serde::Serialize;

use crate::domain::{PhotoPackage, COUPLES_SURCHARGE, EVENING_SLOTS, PACKAGES, TIME_SLOTS};

#[derive(Debug, Serialize)]
pub struct Catalogue {
    pub packages: &'static [PhotoPackage],
    pub time_slots: &'static [&'static str],
    pub evening_slots: &'static [&'static str],
    pub couples_surcharge: i64,
}

pub async fn list() -> Json<Catalogue> {
    Json(Catalogue {
        packages: &PACKAGES,
        time_slots: &TIME_SLOTS,
        evening_slots: &EVENING_SLOTS,
        couples_surcharge: COUPLES_SURCHARGE,
    })
}
