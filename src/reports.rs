// Report sections of the Barcelona tourist-housing narrative.
//
// Each generator composes metrics-engine calls into display rows. A metric
// that comes back undefined (zero denominator, degenerate series) degrades
// its own cell or section to a dash instead of aborting the run.
use crate::metrics::{
    annualized_rate, count_by_category, cross_tabulate, filter_outliers_iqr, grouped_mean,
    normalize_to_index, pearson_correlation, percentage_change, percentage_share, value_for_year,
};
use crate::types::{
    HostTypeRow, HousingPriceYear, LicenseComplianceRow, Listing, NeighbourhoodYieldRow,
    PriceIndexRow, RoomTypeCrossRow, SummaryStats, TouristShareRow,
};
use crate::util::format_number;
use std::cmp::Ordering;

/// Estimated number of active Airbnb listings in Barcelona per year,
/// 2015-2025. The source report hard-codes this growth series.
pub const AIRBNB_VOLUME_2015_2025: [f64; 11] = [
    8000.0, 9500.0, 11450.0, 12800.0, 15600.0, 18200.0, 19422.0, 19422.0, 19800.0, 20100.0,
    20500.0,
];

const VOLUME_FIRST_YEAR: i32 = 2015;

fn share_str(count: usize, total: usize) -> String {
    match percentage_share(count, total) {
        Ok(pct) => format!("{}%", format_number(pct, 1)),
        Err(_) => "-".to_string(),
    }
}

/// Host-type market structure: counts, shares of the total market, and the
/// unlicensed share within each host type.
pub fn market_structure(listings: &[Listing]) -> Vec<HostTypeRow> {
    let total = listings.len();
    let counts = count_by_category(listings, |l| l.host_type.as_str());
    let unlicensed: Vec<&Listing> = listings.iter().filter(|l| !l.is_licensed()).collect();
    let unlicensed_counts = count_by_category(&unlicensed, |l| l.host_type.as_str());

    let mut rows: Vec<HostTypeRow> = counts
        .into_iter()
        .map(|(host_type, n)| {
            let unl = unlicensed_counts.get(&host_type).copied().unwrap_or(0);
            HostTypeRow {
                share_of_total: share_str(n, total),
                unlicensed_share: share_str(unl, n),
                host_type,
                listings: n,
                unlicensed: unl,
            }
        })
        .collect();
    rows.sort_by(|a, b| b.listings.cmp(&a.listings));
    rows
}

/// Room type against host type, one row per populated cell.
pub fn room_type_cross(listings: &[Listing]) -> Vec<RoomTypeCrossRow> {
    let total = listings.len();
    let table = cross_tabulate(listings, |l| l.room_type.as_str(), |l| l.host_type.as_str());
    let mut rows: Vec<RoomTypeCrossRow> = table
        .into_iter()
        .flat_map(|(room_type, cols)| {
            cols.into_iter()
                .map(move |(host_type, n)| RoomTypeCrossRow {
                    room_type: room_type.clone(),
                    host_type,
                    share_of_total: share_str(n, total),
                    listings: n,
                })
                .collect::<Vec<_>>()
        })
        .collect();
    rows.sort_by(|a, b| {
        a.room_type
            .cmp(&b.room_type)
            .then_with(|| b.listings.cmp(&a.listings))
    });
    rows
}

/// Mean monthly yield per neighbourhood, with IQR outlier exclusion applied
/// to the per-neighbourhood means, ranked descending.
pub fn neighbourhood_yield_ranking(listings: &[Listing]) -> Vec<NeighbourhoodYieldRow> {
    let means = grouped_mean(listings, |l| l.neighbourhood.as_str(), |l| l.monthly_yield);
    let filtered = filter_outliers_iqr(&means);

    let mut ranked: Vec<(String, f64)> = filtered.into_iter().collect();
    ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
    ranked
        .into_iter()
        .enumerate()
        .map(|(idx, (neighbourhood, avg))| NeighbourhoodYieldRow {
            rank: idx + 1,
            neighbourhood,
            avg_monthly_yield: format_number(avg, 2),
        })
        .collect()
}

/// Share of all listings held by each neighbourhood, top `n` descending.
pub fn tourist_share_top(listings: &[Listing], n: usize) -> Vec<TouristShareRow> {
    let total = listings.len();
    let counts = count_by_category(listings, |l| l.neighbourhood.as_str());
    let mut ranked: Vec<(String, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked
        .into_iter()
        .take(n)
        .enumerate()
        .map(|(idx, (neighbourhood, count))| TouristShareRow {
            rank: idx + 1,
            share_of_total: share_str(count, total),
            neighbourhood,
            listings: count,
        })
        .collect()
}

/// Unlicensed share per neighbourhood, sorted descending so the least
/// compliant zones come first.
pub fn license_compliance(listings: &[Listing]) -> Vec<LicenseComplianceRow> {
    let totals = count_by_category(listings, |l| l.neighbourhood.as_str());
    let unlicensed: Vec<&Listing> = listings.iter().filter(|l| !l.is_licensed()).collect();
    let unlicensed_counts = count_by_category(&unlicensed, |l| l.neighbourhood.as_str());

    let mut rows: Vec<(f64, LicenseComplianceRow)> = totals
        .into_iter()
        .map(|(neighbourhood, total)| {
            let unl = unlicensed_counts.get(&neighbourhood).copied().unwrap_or(0);
            let pct = percentage_share(unl, total).unwrap_or(0.0);
            let row = LicenseComplianceRow {
                unlicensed_share: share_str(unl, total),
                neighbourhood,
                listings: total,
                unlicensed: unl,
            };
            (pct, row)
        })
        .collect();
    rows.sort_by(|a, b| {
        b.0.partial_cmp(&a.0)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.1.neighbourhood.cmp(&b.1.neighbourhood))
    });
    rows.into_iter().map(|(_, row)| row).collect()
}

fn volume_for_year(year: i32) -> Option<f64> {
    let idx = year.checked_sub(VOLUME_FIRST_YEAR)?;
    if idx < 0 {
        return None;
    }
    AIRBNB_VOLUME_2015_2025.get(idx as usize).copied()
}

/// Price evolution table: raw purchase/rental prices and Airbnb volume per
/// year, each series also rescaled to a base-100 index for comparison on a
/// shared scale.
pub fn price_index_series(prices: &[HousingPriceYear]) -> Vec<PriceIndexRow> {
    let aligned: Vec<(&HousingPriceYear, f64)> = prices
        .iter()
        .filter_map(|row| volume_for_year(row.year).map(|v| (row, v)))
        .collect();

    let purchase: Vec<f64> = aligned.iter().map(|(r, _)| r.purchase_eur_m2).collect();
    let rental: Vec<f64> = aligned.iter().map(|(r, _)| r.rental_eur_month).collect();
    let volume: Vec<f64> = aligned.iter().map(|(_, v)| *v).collect();

    let purchase_idx = normalize_to_index(&purchase).ok();
    let rental_idx = normalize_to_index(&rental).ok();
    let volume_idx = normalize_to_index(&volume).ok();
    let idx_str = |series: &Option<Vec<f64>>, i: usize| match series {
        Some(v) => format_number(v[i], 1),
        None => "-".to_string(),
    };

    aligned
        .iter()
        .enumerate()
        .map(|(i, (row, vol))| PriceIndexRow {
            year: row.year,
            purchase_eur_m2: format_number(row.purchase_eur_m2, 0),
            rental_eur_month: format_number(row.rental_eur_month, 0),
            airbnb_listings: format_number(*vol, 0),
            purchase_index: idx_str(&purchase_idx, i),
            rental_index: idx_str(&rental_idx, i),
            airbnb_index: idx_str(&volume_idx, i),
        })
        .collect()
}

/// Pearson correlation of the Airbnb volume estimate against both price
/// series, over the years present in the loaded table. `None` when the
/// correlation is undefined (too few aligned years, constant series).
pub fn volume_price_correlations(prices: &[HousingPriceYear]) -> (Option<f64>, Option<f64>) {
    let aligned: Vec<(&HousingPriceYear, f64)> = prices
        .iter()
        .filter_map(|row| volume_for_year(row.year).map(|v| (row, v)))
        .collect();
    let purchase: Vec<f64> = aligned.iter().map(|(r, _)| r.purchase_eur_m2).collect();
    let rental: Vec<f64> = aligned.iter().map(|(r, _)| r.rental_eur_month).collect();
    let volume: Vec<f64> = aligned.iter().map(|(_, v)| *v).collect();
    (
        pearson_correlation(&volume, &purchase).ok(),
        pearson_correlation(&volume, &rental).ok(),
    )
}

/// Headline figures for the executive summary and the JSON export.
pub fn generate_summary(listings: &[Listing], prices: &[HousingPriceYear]) -> SummaryStats {
    let total_listings = listings.len();
    let unlicensed_listings = listings.iter().filter(|l| !l.is_licensed()).count();
    let unlicensed_share_pct = percentage_share(unlicensed_listings, total_listings).unwrap_or(0.0);
    let total_neighbourhoods = count_by_category(listings, |l| l.neighbourhood.as_str()).len();

    let change_over = |field: fn(&HousingPriceYear) -> f64| -> Option<f64> {
        let start = value_for_year(prices, 2022, field).ok()?;
        let end = value_for_year(prices, 2025, field).ok()?;
        percentage_change(start, end).ok()
    };
    let purchase_change = change_over(|r| r.purchase_eur_m2);
    let rental_change = change_over(|r| r.rental_eur_month);

    let (airbnb_purchase_correlation, airbnb_rental_correlation) =
        volume_price_correlations(prices);

    SummaryStats {
        total_listings,
        total_neighbourhoods,
        unlicensed_listings,
        unlicensed_share_pct,
        purchase_change_2022_2025_pct: purchase_change,
        rental_change_2022_2025_pct: rental_change,
        purchase_annualized_rate_pct: purchase_change.and_then(|c| annualized_rate(c, 3).ok()),
        rental_annualized_rate_pct: rental_change.and_then(|c| annualized_rate(c, 3).ok()),
        airbnb_purchase_correlation,
        airbnb_rental_correlation,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(id: u64, neighbourhood: &str, host: &str, room: &str, license: &str, yield_: Option<f64>) -> Listing {
        Listing {
            id,
            lat: 41.38,
            lon: 2.17,
            neighbourhood: neighbourhood.to_string(),
            host_type: host.to_string(),
            room_type: room.to_string(),
            license: license.to_string(),
            monthly_yield: yield_,
        }
    }

    fn sample_listings() -> Vec<Listing> {
        vec![
            listing(1, "el Raval", "particular", "Entire home/apt", "sin datos", Some(1200.0)),
            listing(2, "el Raval", "particular", "Private room", "HUTB-1", Some(800.0)),
            listing(3, "el Raval", "empresa", "Entire home/apt", "HUTB-2", Some(2000.0)),
            listing(4, "Gracia", "particular", "Entire home/apt", "sin datos", Some(900.0)),
            listing(5, "Gracia", "particular", "Private room", "HUTB-3", None),
        ]
    }

    fn sample_prices() -> Vec<HousingPriceYear> {
        let purchase = [
            2800.0, 2950.0, 3150.0, 3350.0, 3500.0, 3400.0, 3550.0, 3850.0, 4400.0, 5000.0, 5505.0,
        ];
        let rental = [
            750.0, 800.0, 870.0, 930.0, 980.0, 940.0, 1000.0, 1150.0, 1300.0, 1450.0, 1587.0,
        ];
        (0..11)
            .map(|i| HousingPriceYear {
                year: 2015 + i as i32,
                purchase_eur_m2: purchase[i],
                rental_eur_month: rental[i],
            })
            .collect()
    }

    #[test]
    fn market_structure_counts_and_shares() {
        let rows = market_structure(&sample_listings());
        assert_eq!(rows.len(), 2);
        // Sorted by size: particulares first.
        assert_eq!(rows[0].host_type, "particular");
        assert_eq!(rows[0].listings, 4);
        assert_eq!(rows[0].share_of_total, "80.0%");
        assert_eq!(rows[0].unlicensed, 2);
        assert_eq!(rows[0].unlicensed_share, "50.0%");
        assert_eq!(rows[1].host_type, "empresa");
        assert_eq!(rows[1].unlicensed, 0);
    }

    #[test]
    fn market_structure_on_empty_table_degrades() {
        let rows = market_structure(&[]);
        assert!(rows.is_empty());
    }

    #[test]
    fn cross_rows_cover_every_listing_once() {
        let rows = room_type_cross(&sample_listings());
        let total: usize = rows.iter().map(|r| r.listings).sum();
        assert_eq!(total, 5);
    }

    #[test]
    fn yield_ranking_sorts_descending_and_skips_empty_groups() {
        let mut listings = sample_listings();
        // A neighbourhood with no yield figures at all must not be ranked.
        listings.push(listing(6, "Sants", "particular", "Private room", "sin datos", None));
        let rows = neighbourhood_yield_ranking(&listings);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].neighbourhood, "el Raval");
        assert_eq!(rows[0].rank, 1);
        assert_eq!(rows[1].neighbourhood, "Gracia");
        assert!(!rows.iter().any(|r| r.neighbourhood == "Sants"));
    }

    #[test]
    fn tourist_share_top_limits_and_ranks() {
        let rows = tourist_share_top(&sample_listings(), 1);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].neighbourhood, "el Raval");
        assert_eq!(rows[0].listings, 3);
        assert_eq!(rows[0].share_of_total, "60.0%");
    }

    #[test]
    fn compliance_ranks_least_compliant_first() {
        let rows = license_compliance(&sample_listings());
        assert_eq!(rows.len(), 2);
        // Gracia: 1 of 2 unlicensed (50%) vs el Raval: 1 of 3 (33%).
        assert_eq!(rows[0].neighbourhood, "Gracia");
        assert_eq!(rows[0].unlicensed, 1);
        assert_eq!(rows[1].neighbourhood, "el Raval");
    }

    #[test]
    fn price_index_peaks_at_100_in_the_max_year() {
        let rows = price_index_series(&sample_prices());
        assert_eq!(rows.len(), 11);
        let last = rows.last().unwrap();
        assert_eq!(last.year, 2025);
        assert_eq!(last.purchase_index, "100.0");
        assert_eq!(last.rental_index, "100.0");
        assert_eq!(last.airbnb_index, "100.0");
    }

    #[test]
    fn correlations_are_strongly_positive_on_the_sample() {
        let (purchase_corr, rental_corr) = volume_price_correlations(&sample_prices());
        // Volume vs purchase on this fixture sits just below 0.8 (0.78);
        // volume vs rental just above (0.81).
        assert!(purchase_corr.unwrap() > 0.75);
        assert!(rental_corr.unwrap() > 0.8);
    }

    #[test]
    fn summary_headline_figures() {
        let summary = generate_summary(&sample_listings(), &sample_prices());
        assert_eq!(summary.total_listings, 5);
        assert_eq!(summary.unlicensed_listings, 2);
        assert!((summary.unlicensed_share_pct - 40.0).abs() < 1e-9);
        assert_eq!(summary.total_neighbourhoods, 2);
        let rental = summary.rental_change_2022_2025_pct.unwrap();
        assert!((rental - 38.0).abs() < 0.1);
        let annualized = summary.rental_annualized_rate_pct.unwrap();
        assert!((annualized - rental / 3.0).abs() < 1e-9);
    }

    #[test]
    fn summary_without_reference_years_degrades_to_none() {
        let prices = vec![HousingPriceYear {
            year: 2015,
            purchase_eur_m2: 2800.0,
            rental_eur_month: 750.0,
        }];
        let summary = generate_summary(&sample_listings(), &prices);
        assert_eq!(summary.rental_change_2022_2025_pct, None);
        assert_eq!(summary.rental_annualized_rate_pct, None);
    }
}
