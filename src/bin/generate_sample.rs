//! Writes a synthetic passenger-satisfaction dataset for trying the app:
//! `dataset.csv` / `dataset.parquet` with a binary target and `test.csv`
//! with the same features but no target.

use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const ROWS: usize = 100;

struct Passenger {
    id: i64,
    age: i64,
    flight_distance: f64,
    seat_comfort: i64,
    travel_class: &'static str,
    departure_delay: f64,
    satisfaction: &'static str,
}

/// Box-Muller transform for a normal draw.
fn gauss(rng: &mut StdRng, mean: f64, std_dev: f64) -> f64 {
    let u1: f64 = rng.gen::<f64>().max(1e-15);
    let u2: f64 = rng.gen();
    mean + std_dev * (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}

fn passenger(id: i64, rng: &mut StdRng) -> Passenger {
    let age = gauss(rng, 40.0, 12.0).clamp(7.0, 85.0).round() as i64;
    let flight_distance = gauss(rng, 1200.0, 600.0).max(80.0).round();
    let seat_comfort = rng.gen_range(1..=5);
    let business = rng.gen_bool(0.45);
    let departure_delay = (-gauss(rng, 0.0, 1.0).abs().ln() * 10.0).max(0.0).round();

    let logit = 0.9 * (seat_comfort as f64 - 3.0) + if business { 1.4 } else { -0.8 }
        - 0.04 * departure_delay
        + 0.0004 * (flight_distance - 1200.0)
        + gauss(rng, 0.0, 0.6);

    Passenger {
        id,
        age,
        flight_distance,
        seat_comfort,
        travel_class: if business { "Business" } else { "Eco" },
        departure_delay,
        satisfaction: if logit > 0.0 { "satisfied" } else { "neutral or dissatisfied" },
    }
}

fn write_csv(path: &str, rows: &[Passenger], with_target: bool) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).with_context(|| format!("creating {path}"))?;
    let mut header = vec![
        "id",
        "Age",
        "Flight Distance",
        "Seat comfort",
        "Class",
        "Departure Delay in Minutes",
    ];
    if with_target {
        header.push("satisfaction");
    }
    writer.write_record(&header)?;
    for p in rows {
        let mut record = vec![
            p.id.to_string(),
            p.age.to_string(),
            p.flight_distance.to_string(),
            p.seat_comfort.to_string(),
            p.travel_class.to_string(),
            p.departure_delay.to_string(),
        ];
        if with_target {
            record.push(p.satisfaction.to_string());
        }
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

fn write_parquet(path: &str, rows: &[Passenger]) -> Result<()> {
    let schema = Arc::new(Schema::new(vec![
        Field::new("id", DataType::Int64, false),
        Field::new("Age", DataType::Int64, false),
        Field::new("Flight Distance", DataType::Float64, false),
        Field::new("Seat comfort", DataType::Int64, false),
        Field::new("Class", DataType::Utf8, false),
        Field::new("Departure Delay in Minutes", DataType::Float64, false),
        Field::new("satisfaction", DataType::Utf8, false),
    ]));

    let columns: Vec<ArrayRef> = vec![
        Arc::new(Int64Array::from_iter_values(rows.iter().map(|p| p.id))),
        Arc::new(Int64Array::from_iter_values(rows.iter().map(|p| p.age))),
        Arc::new(Float64Array::from_iter_values(rows.iter().map(|p| p.flight_distance))),
        Arc::new(Int64Array::from_iter_values(rows.iter().map(|p| p.seat_comfort))),
        Arc::new(StringArray::from_iter_values(rows.iter().map(|p| p.travel_class))),
        Arc::new(Float64Array::from_iter_values(rows.iter().map(|p| p.departure_delay))),
        Arc::new(StringArray::from_iter_values(rows.iter().map(|p| p.satisfaction))),
    ];
    let batch = RecordBatch::try_new(schema.clone(), columns).context("building record batch")?;

    let file = std::fs::File::create(path).with_context(|| format!("creating {path}"))?;
    let mut writer = ArrowWriter::try_new(file, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}

fn main() -> Result<()> {
    let mut rng = StdRng::seed_from_u64(42);

    let train: Vec<Passenger> = (0..ROWS as i64).map(|id| passenger(id, &mut rng)).collect();
    let test: Vec<Passenger> = (0..ROWS as i64)
        .map(|id| passenger(ROWS as i64 + id, &mut rng))
        .collect();

    write_csv("dataset.csv", &train, true)?;
    write_parquet("dataset.parquet", &train)?;
    write_csv("test.csv", &test, false)?;

    let satisfied = train.iter().filter(|p| p.satisfaction == "satisfied").count();
    println!(
        "Wrote {ROWS} training rows ({satisfied} satisfied) to dataset.csv and dataset.parquet, \
         {ROWS} test rows to test.csv"
    );
    Ok(())
}
