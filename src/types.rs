use serde::{Deserialize, Serialize};
use tabled::Tabled;

/// Sentinel used in the listings dataset for units with no tourist license.
pub const UNLICENSED_SENTINEL: &str = "sin datos";

#[derive(Debug, Deserialize)]
pub struct RawListingRow {
    #[serde(rename = "id")]
    pub id: Option<String>,
    #[serde(rename = "latitude")]
    pub latitude: Option<String>,
    #[serde(rename = "longitude")]
    pub longitude: Option<String>,
    #[serde(rename = "neighbourhood")]
    pub neighbourhood: Option<String>,
    #[serde(rename = "tipo_anfitrion")]
    pub tipo_anfitrion: Option<String>,
    #[serde(rename = "room_type")]
    pub room_type: Option<String>,
    #[serde(rename = "license")]
    pub license: Option<String>,
    #[serde(rename = "rendimiento_economico_mensual")]
    pub rendimiento_economico_mensual: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RawPriceRow {
    #[serde(rename = "Year")]
    pub year: Option<String>,
    #[serde(rename = "Avg_Purchase_Price_EUR_m2")]
    pub avg_purchase_price_eur_m2: Option<String>,
    #[serde(rename = "Avg_Rental_Price_EUR_month")]
    pub avg_rental_price_eur_month: Option<String>,
}

/// One tourist-accommodation unit, cleaned and typed.
#[derive(Debug, Clone)]
pub struct Listing {
    pub id: u64,
    pub lat: f64,
    pub lon: f64,
    pub neighbourhood: String,
    pub host_type: String,
    pub room_type: String,
    pub license: String,
    pub monthly_yield: Option<f64>,
}

impl Listing {
    /// License status is a two-way partition derived from the sentinel value.
    pub fn is_licensed(&self) -> bool {
        self.license != UNLICENSED_SENTINEL
    }
}

/// One row per calendar year of the 2015-2025 Barcelona price series.
#[derive(Debug, Clone)]
pub struct HousingPriceYear {
    pub year: i32,
    pub purchase_eur_m2: f64,
    pub rental_eur_month: f64,
}

/// Official tourist-housing registry. Loaded for completeness and surfaced
/// in diagnostics only; the metrics engine does not consume it.
#[derive(Debug, Clone)]
pub struct OfficialRegistry {
    pub headers: Vec<String>,
    pub rows: usize,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct HostTypeRow {
    #[serde(rename = "HostType")]
    #[tabled(rename = "HostType")]
    pub host_type: String,
    #[serde(rename = "Listings")]
    #[tabled(rename = "Listings")]
    pub listings: usize,
    #[serde(rename = "ShareOfTotal")]
    #[tabled(rename = "ShareOfTotal")]
    pub share_of_total: String,
    #[serde(rename = "Unlicensed")]
    #[tabled(rename = "Unlicensed")]
    pub unlicensed: usize,
    #[serde(rename = "UnlicensedShare")]
    #[tabled(rename = "UnlicensedShare")]
    pub unlicensed_share: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct RoomTypeCrossRow {
    #[serde(rename = "RoomType")]
    #[tabled(rename = "RoomType")]
    pub room_type: String,
    #[serde(rename = "HostType")]
    #[tabled(rename = "HostType")]
    pub host_type: String,
    #[serde(rename = "Listings")]
    #[tabled(rename = "Listings")]
    pub listings: usize,
    #[serde(rename = "ShareOfTotal")]
    #[tabled(rename = "ShareOfTotal")]
    pub share_of_total: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct NeighbourhoodYieldRow {
    #[serde(rename = "Rank")]
    #[tabled(rename = "Rank")]
    pub rank: usize,
    #[serde(rename = "Neighbourhood")]
    #[tabled(rename = "Neighbourhood")]
    pub neighbourhood: String,
    #[serde(rename = "AvgMonthlyYield")]
    #[tabled(rename = "AvgMonthlyYield")]
    pub avg_monthly_yield: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct TouristShareRow {
    #[serde(rename = "Rank")]
    #[tabled(rename = "Rank")]
    pub rank: usize,
    #[serde(rename = "Neighbourhood")]
    #[tabled(rename = "Neighbourhood")]
    pub neighbourhood: String,
    #[serde(rename = "Listings")]
    #[tabled(rename = "Listings")]
    pub listings: usize,
    #[serde(rename = "ShareOfTotal")]
    #[tabled(rename = "ShareOfTotal")]
    pub share_of_total: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct LicenseComplianceRow {
    #[serde(rename = "Neighbourhood")]
    #[tabled(rename = "Neighbourhood")]
    pub neighbourhood: String,
    #[serde(rename = "Listings")]
    #[tabled(rename = "Listings")]
    pub listings: usize,
    #[serde(rename = "Unlicensed")]
    #[tabled(rename = "Unlicensed")]
    pub unlicensed: usize,
    #[serde(rename = "UnlicensedShare")]
    #[tabled(rename = "UnlicensedShare")]
    pub unlicensed_share: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct PriceIndexRow {
    #[serde(rename = "Year")]
    #[tabled(rename = "Year")]
    pub year: i32,
    #[serde(rename = "PurchaseEURm2")]
    #[tabled(rename = "PurchaseEURm2")]
    pub purchase_eur_m2: String,
    #[serde(rename = "RentalEURmonth")]
    #[tabled(rename = "RentalEURmonth")]
    pub rental_eur_month: String,
    #[serde(rename = "AirbnbListings")]
    #[tabled(rename = "AirbnbListings")]
    pub airbnb_listings: String,
    #[serde(rename = "PurchaseIndex")]
    #[tabled(rename = "PurchaseIndex")]
    pub purchase_index: String,
    #[serde(rename = "RentalIndex")]
    #[tabled(rename = "RentalIndex")]
    pub rental_index: String,
    #[serde(rename = "AirbnbIndex")]
    #[tabled(rename = "AirbnbIndex")]
    pub airbnb_index: String,
}

#[derive(Debug, Serialize)]
pub struct SummaryStats {
    pub total_listings: usize,
    pub total_neighbourhoods: usize,
    pub unlicensed_listings: usize,
    pub unlicensed_share_pct: f64,
    pub purchase_change_2022_2025_pct: Option<f64>,
    pub rental_change_2022_2025_pct: Option<f64>,
    pub purchase_annualized_rate_pct: Option<f64>,
    pub rental_annualized_rate_pct: Option<f64>,
    pub airbnb_purchase_correlation: Option<f64>,
    pub airbnb_rental_correlation: Option<f64>,
}
