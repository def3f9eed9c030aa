// Entry point and high-level CLI flow.
//
// - Option [1] loads the three Barcelona datasets, printing diagnostics.
// - Option [2] generates the report sections as CSV files plus a JSON
//   summary, previewing each as a markdown table.
// - After generating reports, the user can choose to go back to the
//   selection menu or exit.
mod loader;
mod metrics;
mod output;
mod reports;
mod types;
mod util;

use once_cell::sync::Lazy;
use std::io::{self, Write};
use std::sync::Mutex;
use types::{HousingPriceYear, Listing, OfficialRegistry};

const LISTINGS_PATH: &str = "data/limpio_airbnb_Barcelona.csv";
const OFFICIAL_PATH: &str = "data/datos vivienda turistica bcn oficiales.csv";
const PRICES_PATH: &str = "data/housing_prices_barcelona_2015_2025.csv";

// In-memory app state so the datasets are loaded once but reports can be
// generated multiple times in a single run.
static APP_STATE: Lazy<Mutex<AppState>> = Lazy::new(|| Mutex::new(AppState { data: None }));

struct Tables {
    listings: Vec<Listing>,
    prices: Vec<HousingPriceYear>,
    official: OfficialRegistry,
}

struct AppState {
    data: Option<std::sync::Arc<Tables>>,
}

/// Read a single line of input after printing the common "Enter choice:" prompt.
fn read_choice() -> String {
    print!("Enter choice: ");
    let _ = io::stdout().flush();
    let mut buf = String::new();
    io::stdin().read_line(&mut buf).ok();
    buf.trim().to_string()
}

/// Ask the user whether to go back to the report selection menu after
/// generating reports.
///
/// Returns `true` if the user chose `Y`, `false` if they chose `N`.
fn prompt_back_to_menu() -> bool {
    loop {
        print!("Back to Report Selection (Y/N): ");
        let _ = io::stdout().flush();
        let mut buf = String::new();
        io::stdin().read_line(&mut buf).ok();
        let resp = buf.trim().to_uppercase();
        match resp.as_str() {
            "Y" => return true,
            "N" => return false,
            _ => println!("Invalid choice. Please enter Y or N."),
        }
    }
}

/// Handle option [1]: load the three CSV datasets.
///
/// All three loads must succeed before any state is stored; the report
/// generators are never invoked against a partial load.
fn handle_load() {
    let (listings, load_report) = match loader::load_listings(LISTINGS_PATH) {
        Ok(v) => v,
        Err(e) => {
            eprintln!("Failed to load listings: {}\n", e);
            return;
        }
    };
    let prices = match loader::load_prices(PRICES_PATH) {
        Ok(v) => v,
        Err(e) => {
            eprintln!("Failed to load price series: {}\n", e);
            return;
        }
    };
    let official = match loader::load_official(OFFICIAL_PATH) {
        Ok(v) => v,
        Err(e) => {
            eprintln!("Failed to load official registry: {}\n", e);
            return;
        }
    };

    println!(
        "Processing listings... ({} rows read, {} kept)",
        util::format_int(load_report.total_rows as i64),
        util::format_int(load_report.kept_rows as i64)
    );
    println!(
        "Note: {} rows skipped due to parse/validation errors, {} rows without a yield figure.",
        util::format_int(load_report.parse_errors as i64),
        util::format_int(load_report.missing_yield as i64)
    );
    println!(
        "Price series: {} years loaded. Official registry: {} rows, {} columns.",
        util::format_int(prices.len() as i64),
        util::format_int(official.rows as i64),
        util::format_int(official.headers.len() as i64)
    );
    println!("");

    let mut state = APP_STATE.lock().unwrap();
    state.data = Some(std::sync::Arc::new(Tables {
        listings,
        prices,
        official,
    }));
}

/// Handle option [2]: generate all report sections and the JSON summary.
fn handle_generate_reports() {
    let data = {
        let state = APP_STATE.lock().unwrap();
        state.data.clone()
    };
    let Some(data) = data else {
        println!("Error: No data loaded. Please load the datasets first (option 1).\n");
        return;
    };

    println!("Generating reports...");
    println!("Outputs saved to individual files...\n");

    let r1 = reports::market_structure(&data.listings);
    let file1 = "report1_market_structure.csv";
    if let Err(e) = output::write_csv(file1, &r1) {
        eprintln!("Write error: {}", e);
    }
    println!("Report 1: Host Type Market Structure\n");
    output::preview_table_rows(&r1, 2);
    println!("(Full table exported to {})\n", file1);

    let r2 = reports::room_type_cross(&data.listings);
    let file2 = "report2_room_type_cross.csv";
    if let Err(e) = output::write_csv(file2, &r2) {
        eprintln!("Write error: {}", e);
    }
    println!("Report 2: Room Type by Host Type\n");
    output::preview_table_rows(&r2, 4);
    println!("(Full table exported to {})\n", file2);

    let r3 = reports::neighbourhood_yield_ranking(&data.listings);
    let file3 = "report3_neighbourhood_yield.csv";
    if let Err(e) = output::write_csv(file3, &r3) {
        eprintln!("Write error: {}", e);
    }
    println!("Report 3: Average Monthly Yield per Neighbourhood");
    println!("(IQR-filtered over neighbourhood means)\n");
    output::preview_table_rows(&r3, 5);
    println!("(Full table exported to {})\n", file3);

    let r4 = reports::tourist_share_top(&data.listings, 10);
    let file4 = "report4_tourist_share.csv";
    if let Err(e) = output::write_csv(file4, &r4) {
        eprintln!("Write error: {}", e);
    }
    println!("Report 4: Top 10 Neighbourhoods by Share of Listings\n");
    output::preview_table_rows(&r4, 5);
    println!("(Full table exported to {})\n", file4);

    let r5 = reports::license_compliance(&data.listings);
    let file5 = "report5_license_compliance.csv";
    if let Err(e) = output::write_csv(file5, &r5) {
        eprintln!("Write error: {}", e);
    }
    println!("Report 5: Unlicensed Share per Neighbourhood\n");
    output::preview_table_rows(&r5, 5);
    println!("(Full table exported to {})\n", file5);

    let r6 = reports::price_index_series(&data.prices);
    let file6 = "report6_price_index.csv";
    if let Err(e) = output::write_csv(file6, &r6) {
        eprintln!("Write error: {}", e);
    }
    println!("Report 6: Housing Prices vs Airbnb Volume (Base-100 Index)\n");
    output::preview_table_rows(&r6, 3);
    println!("(Full table exported to {})\n", file6);

    let summary = reports::generate_summary(&data.listings, &data.prices);
    if let Err(e) = output::write_json("summary.json", &summary) {
        eprintln!("Write error: {}", e);
    }
    println!("Summary Stats (summary.json):");
    println!(
        "  Official registry on file: {} rows.",
        util::format_int(data.official.rows as i64)
    );
    println!(
        "  {} listings across {} neighbourhoods, {} unlicensed ({}%).",
        util::format_int(summary.total_listings as i64),
        util::format_int(summary.total_neighbourhoods as i64),
        util::format_int(summary.unlicensed_listings as i64),
        util::format_number(summary.unlicensed_share_pct, 1)
    );
    match summary.rental_change_2022_2025_pct {
        Some(change) => println!(
            "  Rental prices 2022-2025: +{}% ({}%/year).",
            util::format_number(change, 1),
            util::format_number(summary.rental_annualized_rate_pct.unwrap_or(0.0), 1)
        ),
        None => println!("  Rental price change 2022-2025: not available."),
    }
    match summary.purchase_change_2022_2025_pct {
        Some(change) => println!(
            "  Purchase prices 2022-2025: +{}% per m2.",
            util::format_number(change, 1)
        ),
        None => println!("  Purchase price change 2022-2025: not available."),
    }
    println!("");
}

fn main() {
    loop {
        println!("Barcelona Tourist-Housing Report");
        println!("[1] Load the datasets");
        println!("[2] Generate Reports\n");
        match read_choice().as_str() {
            "1" => {
                handle_load();
            }
            "2" => {
                println!("");
                handle_generate_reports();
                if !prompt_back_to_menu() {
                    println!("Exiting the program.");
                    break;
                }
            }
            _ => {
                println!("Invalid choice. Please enter 1 or 2.\n");
            }
        }
    }
}
