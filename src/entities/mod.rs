//! Typed records for the console pages

#[macro_use]
pub mod macros;

use crate::core::validation::{FormSchema, Validatable, filters, validators};
use chrono::{DateTime, Utc};
use regex::Regex;

pub const BUS_STATUSES: &[&str] = &["active", "inactive", "maintenance"];
pub const BUS_TYPES: &[&str] = &["AC", "Non-AC", "Sleeper", "Electric"];
pub const ROUTE_STATUSES: &[&str] = &["active", "inactive"];
pub const SCHEDULE_STATUSES: &[&str] = &["scheduled", "completed", "cancelled", "delayed"];

fn owned(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

impl_record!(
    Bus,
    "buses",
    {
        plate_number: String,
        bus_type: String,
        status: String,
        capacity: i64,
        operator_name: String,
        route_name: Option<String>,
        registered_at: DateTime<Utc>,
    }
);

impl Validatable for Bus {
    fn form_schema() -> FormSchema {
        let mut schema = FormSchema::new()
            .filter("plateNumber", filters::trim())
            .filter("plateNumber", filters::uppercase())
            .filter("capacity", filters::parse_number())
            .field("plateNumber", validators::required())
            .field("busType", validators::required())
            .field("busType", validators::in_list(owned(BUS_TYPES)))
            .field("status", validators::required())
            .field("status", validators::in_list(owned(BUS_STATUSES)))
            .field("capacity", validators::required())
            .field("capacity", validators::positive())
            .field("capacity", validators::max_value(120.0))
            .field("operatorName", validators::required())
            .field("registeredAt", validators::required())
            .field("registeredAt", validators::date_format());

        // Indian-style registration plates, e.g. KA-01-F-1234
        if let Ok(plate) = Regex::new(r"^[A-Z]{2}-\d{2}-[A-Z]{1,2}-\d{4}$") {
            schema = schema.field(
                "plateNumber",
                validators::pattern(plate, "a plate number like KA-01-F-1234"),
            );
        }
        schema
    }
}

impl_record!(
    Route,
    "routes",
    {
        name: String,
        origin: String,
        destination: String,
        region: String,
        status: String,
        distance_km: f64,
        duration_minutes: i64,
    }
);

impl Validatable for Route {
    fn form_schema() -> FormSchema {
        FormSchema::new()
            .filter("name", filters::trim())
            .filter("origin", filters::trim())
            .filter("destination", filters::trim())
            .filter("distanceKm", filters::parse_number())
            .filter("distanceKm", filters::round_decimals(1))
            .filter("durationMinutes", filters::parse_number())
            .field("name", validators::required())
            .field("name", validators::string_length(2, 80))
            .field("origin", validators::required())
            .field("destination", validators::required())
            .field("region", validators::required())
            .field("status", validators::required())
            .field("status", validators::in_list(owned(ROUTE_STATUSES)))
            .field("distanceKm", validators::required())
            .field("distanceKm", validators::positive())
            .field("durationMinutes", validators::required())
            .field("durationMinutes", validators::positive())
    }
}

impl_record!(
    Schedule,
    "schedules",
    {
        route_name: String,
        bus_plate: String,
        status: String,
        departure_at: DateTime<Utc>,
        on_time: bool,
    }
);

impl Validatable for Schedule {
    fn form_schema() -> FormSchema {
        FormSchema::new()
            .filter("routeName", filters::trim())
            .filter("busPlate", filters::trim())
            .filter("busPlate", filters::uppercase())
            .field("routeName", validators::required())
            .field("busPlate", validators::required())
            .field("status", validators::required())
            .field("status", validators::in_list(owned(SCHEDULE_STATUSES)))
            .field("departureAt", validators::required())
            .field("departureAt", validators::date_format())
    }
}

impl_record!(
    Ticket,
    "tickets",
    {
        route_name: String,
        payment_method: String,
        fare: f64,
        issued_at: DateTime<Utc>,
    }
);

impl Validatable for Ticket {}

impl_record!(
    SalaryEntry,
    "salaries",
    {
        employee_name: String,
        operator_name: String,
        role: String,
        status: String,
        amount: f64,
        effective_at: DateTime<Utc>,
    }
);

impl Validatable for SalaryEntry {}
