//! Transit console demo
//!
//! This example demonstrates:
//! - Seeding in-memory sources for every console page
//! - Driving a server-paginated page (buses) through a query controller
//! - Driving a client-paginated page (tickets) and reading its stat cards
//! - Exposing every page over REST
//!
//! Run with `RUST_LOG=transit=debug cargo run --example console` to see the
//! controller's request and debounce logging.

use chrono::{Duration, TimeZone};
use tracing_subscriber::EnvFilter;
use transit::core::filter::DateWindow;
use transit::entities::BUS_TYPES;
use transit::prelude::*;

fn buses(now: DateTime<Utc>) -> Vec<Bus> {
    let operators = ["City Lines", "Metro Express", "Green Wheels"];
    (0..42)
        .map(|i| {
            let state = ["KA", "MH", "TN"][i % 3];
            Bus::new(
                format!("bus-{:03}", i),
                format!("{}-{:02}-F-{:04}", state, i % 20 + 1, 1000 + i),
                BUS_TYPES[i % BUS_TYPES.len()].to_string(),
                match i % 7 {
                    0 => "maintenance",
                    5 => "inactive",
                    _ => "active",
                }
                .to_string(),
                30 + (i as i64 * 7) % 40,
                operators[i % operators.len()].to_string(),
                (i % 4 != 0).then(|| format!("Route {}", i % 9 + 1)),
                now - Duration::days(i as i64 * 11),
            )
        })
        .collect()
}

fn routes() -> Vec<Route> {
    let stops = [
        ("Majestic", "Electronic City", "South", 18.5, 55),
        ("Majestic", "Whitefield", "East", 24.0, 70),
        ("Hebbal", "Silk Board", "Central", 21.2, 80),
        ("Yeshwanthpur", "Airport", "North", 32.8, 65),
        ("Banashankari", "KR Puram", "East", 27.4, 90),
    ];
    stops
        .iter()
        .enumerate()
        .map(|(i, (origin, destination, region, km, minutes))| {
            Route::new(
                format!("route-{}", i + 1),
                format!("Route {}", i + 1),
                origin.to_string(),
                destination.to_string(),
                region.to_string(),
                if i == 4 { "inactive" } else { "active" }.to_string(),
                *km,
                *minutes,
            )
        })
        .collect()
}

fn schedules(now: DateTime<Utc>) -> Vec<Schedule> {
    (0..60)
        .map(|i| {
            Schedule::new(
                format!("trip-{:03}", i),
                format!("Route {}", i % 5 + 1),
                format!("KA-01-F-{:04}", 1000 + i % 12),
                if i % 6 == 0 { "cancelled" } else { "completed" }.to_string(),
                now - Duration::hours(i as i64 * 5),
                i % 4 != 0,
            )
        })
        .collect()
}

fn tickets(now: DateTime<Utc>) -> Vec<Ticket> {
    let methods = ["cash", "card", "upi", "pass"];
    (0..180)
        .map(|i| {
            Ticket::new(
                format!("tkt-{:04}", i),
                format!("Route {}", i % 6 + 1),
                methods[i % methods.len()].to_string(),
                15.0 + (i % 8) as f64 * 5.0,
                now - Duration::minutes(i as i64 * 53),
            )
        })
        .collect()
}

fn salaries() -> Vec<SalaryEntry> {
    let roles = [("driver", 32_000.0), ("conductor", 24_000.0), ("mechanic", 28_000.0)];
    let effective = Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).single().unwrap_or_default();
    (0..24)
        .map(|i| {
            let (role, base) = roles[i % roles.len()];
            SalaryEntry::new(
                format!("emp-{:03}", i),
                format!("Employee {}", i + 1),
                ["City Lines", "Metro Express"][i % 2].to_string(),
                role.to_string(),
                if i % 9 == 0 { "on_leave" } else { "active" }.to_string(),
                base + (i as f64) * 250.0,
                effective,
            )
        })
        .collect()
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("transit=info")),
        )
        .init();

    println!("🚌 Transit Console Demo");
    println!("=======================\n");

    let config = match std::env::args().nth(1) {
        Some(path) => ConsoleConfig::merge(vec![
            ConsoleConfig::default_config(),
            ConsoleConfig::from_yaml_file(&path)?,
        ]),
        None => ConsoleConfig::default_config(),
    };
    let now = Utc::now();

    let bus_source = InMemorySource::with_records(config.page("buses")?.clone(), buses(now));
    let route_source = InMemorySource::with_records(config.page("routes")?.clone(), routes());
    let schedule_source =
        InMemorySource::with_records(config.page("schedules")?.clone(), schedules(now));
    let ticket_source = InMemorySource::with_records(config.page("tickets")?.clone(), tickets(now));
    let salary_source =
        InMemorySource::with_records(config.page("salaries")?.clone(), salaries());

    // Buses: every change is a backend query
    let fleet = QueryController::new(Arc::new(bus_source.clone()), config.page("buses")?.clone());
    fleet.load().await?;
    let view = fleet.view();
    println!("📋 Buses: {} total, page 1 of {}", view.total_elements, view.total_pages);
    if let Some(stats) = &view.stats {
        println!(
            "   active {} | maintenance {} | avg capacity {:.1}",
            stats.metric("active"),
            stats.metric("maintenance"),
            stats.metric("average_capacity"),
        );
    }

    fleet.set_search("KA");
    fleet.set_categorical("status", "active")?;
    fleet.flush().await;
    println!("🔎 Active KA buses: {}", fleet.view().total_elements);

    fleet.toggle_sort("capacity").await?;
    fleet.toggle_sort("capacity").await?;
    for bus in fleet.view().items.iter().take(3) {
        println!("   {} {:<8} {} seats", bus.plate_number, bus.bus_type, bus.capacity);
    }

    let (filename, csv) = fleet.export_page_csv(now.date_naive());
    println!("💾 {} ({} rows)\n", filename, csv.lines().count() - 1);

    // Tickets: snapshot once, filter and aggregate locally
    let revenue = QueryController::new(
        Arc::new(ticket_source.clone()),
        config.page("tickets")?.clone(),
    );
    revenue.load().await?;
    revenue.set_date_window("issued", DateWindow::Last7Days)?;
    revenue.flush().await;

    let view = revenue.view();
    if let Some(stats) = &view.stats {
        println!("💰 Revenue, last 7 days: ₹{:.0}", stats.metric("total_revenue"));
        for entry in stats.breakdown("revenue_by_route") {
            println!(
                "   {:<10} ₹{:>8.0} {:>3}%",
                entry.label, entry.value, entry.percentage_of_total
            );
        }
    }
    println!();

    let addr = std::env::var("TRANSIT_ADDR").unwrap_or_else(|_| "127.0.0.1:3000".to_string());
    println!("🌐 Serving on http://{}", addr);
    println!("   GET  /health");
    println!("   GET  /api/buses?page=0&size=10&sortBy=capacity&sortDir=desc&status=active");
    println!("   GET  /api/tickets/statistics");
    println!("   POST /api/routes\n");

    ServerBuilder::new()
        .register::<Bus>(bus_source)
        .register::<Route>(route_source)
        .register::<Schedule>(schedule_source)
        .register::<Ticket>(ticket_source)
        .register::<SalaryEntry>(salary_source)
        .serve(&addr)
        .await
}
