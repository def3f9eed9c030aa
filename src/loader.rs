use crate::types::{HousingPriceYear, Listing, OfficialRegistry, RawListingRow, RawPriceRow};
use crate::util::{parse_f64_safe, parse_i32_safe, parse_u64_safe};
use csv::ReaderBuilder;
use std::error::Error;

#[derive(Debug, Clone)]
pub struct LoadReport {
    pub total_rows: usize,
    pub kept_rows: usize,
    pub parse_errors: usize,
    pub missing_yield: usize,
}

/// Load and clean the Airbnb listings CSV.
///
/// Rows that fail validation are counted and skipped; a bad row never aborts
/// the whole load. A missing or negative monthly yield keeps the row but
/// leaves the yield absent, so averages downstream only see real figures.
pub fn load_listings(path: &str) -> Result<(Vec<Listing>, LoadReport), Box<dyn Error>> {
    let mut rdr = ReaderBuilder::new().flexible(true).from_path(path)?;
    let mut total_rows = 0usize;
    let mut parse_errors = 0usize;
    let mut missing_yield = 0usize;
    let mut listings: Vec<Listing> = Vec::new();

    for result in rdr.deserialize::<RawListingRow>() {
        total_rows += 1;
        let row = match result {
            Ok(r) => r,
            Err(_) => {
                parse_errors += 1;
                continue;
            }
        };

        let id = match parse_u64_safe(row.id.as_deref()) {
            Some(v) => v,
            None => {
                parse_errors += 1;
                continue;
            }
        };
        let lat = match parse_f64_safe(row.latitude.as_deref()) {
            Some(v) => v,
            None => {
                parse_errors += 1;
                continue;
            }
        };
        let lon = match parse_f64_safe(row.longitude.as_deref()) {
            Some(v) => v,
            None => {
                parse_errors += 1;
                continue;
            }
        };

        let neighbourhood = match row.neighbourhood.as_deref().map(str::trim) {
            Some(n) if !n.is_empty() => n.to_string(),
            _ => {
                parse_errors += 1;
                continue;
            }
        };
        let host_type = match row.tipo_anfitrion.as_deref().map(str::trim) {
            Some(h) if !h.is_empty() => h.to_string(),
            _ => {
                parse_errors += 1;
                continue;
            }
        };
        let room_type = row
            .room_type
            .unwrap_or_else(|| "Unspecified".to_string())
            .trim()
            .to_string();
        let license = row
            .license
            .unwrap_or_else(|| crate::types::UNLICENSED_SENTINEL.to_string())
            .trim()
            .to_string();

        let monthly_yield = match parse_f64_safe(row.rendimiento_economico_mensual.as_deref()) {
            Some(v) if v >= 0.0 => Some(v),
            _ => {
                missing_yield += 1;
                None
            }
        };

        listings.push(Listing {
            id,
            lat,
            lon,
            neighbourhood,
            host_type,
            room_type,
            license,
            monthly_yield,
        });
    }

    let kept_rows = listings.len();
    let report = LoadReport {
        total_rows,
        kept_rows,
        parse_errors,
        missing_yield,
    };
    Ok((listings, report))
}

/// Load the yearly housing price series.
///
/// This table is strict: the year-lookup metrics rely on a dense, unique
/// series, so an unparsable row or a duplicate year is a hard error rather
/// than a skip. Rows come back sorted ascending by year.
pub fn load_prices(path: &str) -> Result<Vec<HousingPriceYear>, Box<dyn Error>> {
    let mut rdr = ReaderBuilder::new().flexible(true).from_path(path)?;
    let mut series: Vec<HousingPriceYear> = Vec::new();

    for result in rdr.deserialize::<RawPriceRow>() {
        let row = result?;
        let year = parse_i32_safe(row.year.as_deref())
            .ok_or("price series: missing or invalid Year")?;
        let purchase = parse_f64_safe(row.avg_purchase_price_eur_m2.as_deref())
            .ok_or_else(|| format!("price series: invalid purchase price for {}", year))?;
        let rental = parse_f64_safe(row.avg_rental_price_eur_month.as_deref())
            .ok_or_else(|| format!("price series: invalid rental price for {}", year))?;
        if series.iter().any(|r| r.year == year) {
            return Err(format!("price series: duplicate year {}", year).into());
        }
        series.push(HousingPriceYear {
            year,
            purchase_eur_m2: purchase,
            rental_eur_month: rental,
        });
    }

    series.sort_by_key(|r| r.year);
    let gaps = missing_years(&series);
    if !gaps.is_empty() {
        eprintln!(
            "Warning: price series has no data for {} year(s) within its range: {:?}",
            gaps.len(),
            gaps
        );
    }
    Ok(series)
}

/// Years absent from the min-max span of an ascending-sorted series.
/// The reference data is expected to be dense; a gap means lookups for
/// those years will fail downstream.
fn missing_years(series: &[HousingPriceYear]) -> Vec<i32> {
    let (Some(first), Some(last)) = (series.first(), series.last()) else {
        return Vec::new();
    };
    (first.year..=last.year)
        .filter(|y| !series.iter().any(|r| r.year == *y))
        .collect()
}

/// Load the official tourist-housing registry as an opaque table: headers
/// and row count only.
pub fn load_official(path: &str) -> Result<OfficialRegistry, Box<dyn Error>> {
    let mut rdr = ReaderBuilder::new().flexible(true).from_path(path)?;
    let headers = rdr
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    let mut rows = 0usize;
    for record in rdr.records() {
        record?;
        rows += 1;
    }
    Ok(OfficialRegistry { headers, rows })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(name: &str, contents: &str) -> std::path::PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!("bcn_report_{}_{}", std::process::id(), name));
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn listings_loader_skips_bad_rows_and_counts_them() {
        let csv = "\
id,latitude,longitude,neighbourhood,tipo_anfitrion,room_type,license,rendimiento_economico_mensual
1,41.38,2.17,el Raval,particular,Entire home/apt,HUTB-1234,1500.0
2,not-a-lat,2.17,el Raval,empresa,Private room,sin datos,900.0
3,41.40,2.15,la Dreta de l'Eixample,empresa,Entire home/apt,sin datos,
";
        let path = write_temp("listings.csv", csv);
        let (listings, report) = load_listings(path.to_str().unwrap()).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(report.total_rows, 3);
        assert_eq!(report.kept_rows, 2);
        assert_eq!(report.parse_errors, 1);
        assert_eq!(report.missing_yield, 1);
        assert_eq!(listings[0].id, 1);
        assert!((listings[0].lat - 41.38).abs() < 1e-9);
        assert!((listings[0].lon - 2.17).abs() < 1e-9);
        assert!(listings[0].is_licensed());
        assert!(!listings[1].is_licensed());
        assert_eq!(listings[1].monthly_yield, None);
    }

    #[test]
    fn price_loader_rejects_duplicate_years() {
        let csv = "\
Year,Avg_Purchase_Price_EUR_m2,Avg_Rental_Price_EUR_month
2022,3850,1150
2022,3900,1175
";
        let path = write_temp("prices_dup.csv", csv);
        let result = load_prices(path.to_str().unwrap());
        std::fs::remove_file(&path).ok();
        assert!(result.is_err());
    }

    #[test]
    fn price_loader_sorts_by_year() {
        let csv = "\
Year,Avg_Purchase_Price_EUR_m2,Avg_Rental_Price_EUR_month
2025,5505,1587
2022,3850,1150
";
        let path = write_temp("prices.csv", csv);
        let series = load_prices(path.to_str().unwrap()).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(series[0].year, 2022);
        assert_eq!(series[1].year, 2025);
    }

    #[test]
    fn price_loader_accepts_but_flags_gappy_series() {
        let csv = "\
Year,Avg_Purchase_Price_EUR_m2,Avg_Rental_Price_EUR_month
2022,3850,1150
2025,5505,1587
";
        let path = write_temp("prices_gap.csv", csv);
        // Gaps are a diagnostic, not a hard error: the series still loads.
        let series = load_prices(path.to_str().unwrap()).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(series.len(), 2);
        assert_eq!(missing_years(&series), vec![2023, 2024]);
    }

    #[test]
    fn dense_series_has_no_missing_years() {
        let series: Vec<HousingPriceYear> = (2015..=2025)
            .map(|year| HousingPriceYear {
                year,
                purchase_eur_m2: 3000.0,
                rental_eur_month: 1000.0,
            })
            .collect();
        assert!(missing_years(&series).is_empty());
        assert!(missing_years(&[]).is_empty());
    }
}
