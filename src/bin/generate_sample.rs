use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{Date32Array, Float64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use chrono::{Datelike, NaiveDate};
use parquet::arrow::ArrowWriter;

use volumen_dashboard::data::normalize::format_volume;

const PRODUCTS: [(&str, f64); 6] = [
    ("DB5", 900.0),
    ("G90", 420.0),
    ("G95", 260.0),
    ("GLP", 310.0),
    ("GNV", 150.0),
    ("KRS", 40.0),
];

const DEPARTMENTS: [(&str, f64); 6] = [
    ("LIMA", 3.2),
    ("AREQUIPA", 1.1),
    ("LA LIBERTAD", 0.9),
    ("PIURA", 0.7),
    ("CUSCO", 0.5),
    ("LORETO", 0.3),
];

const SECTORS: [&str; 4] = ["COMERCIAL", "INDUSTRIAL", "TRANSPORTE", "RESIDENCIAL"];

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn pick<'a>(&mut self, items: &[&'a str]) -> &'a str {
        items[(self.next_u64() % items.len() as u64) as usize]
    }
}

struct Row {
    date: NaiveDate,
    product: &'static str,
    department: &'static str,
    sector: &'static str,
    volume: f64,
}

fn generate(rng: &mut SimpleRng) -> Result<Vec<Row>> {
    let start = NaiveDate::from_ymd_opt(2023, 1, 1).context("start date")?;
    let end = NaiveDate::from_ymd_opt(2024, 6, 30).context("end date")?;

    let mut rows = Vec::new();
    for date in start.iter_days().take_while(|d| *d <= end) {
        // Weekends are quieter, December is busier.
        let weekday = date.weekday().num_days_from_monday();
        let day_factor = if weekday >= 5 { 0.6 } else { 1.0 };
        let season = if date.month() == 12 { 1.3 } else { 1.0 };

        for &(product, base) in &PRODUCTS {
            for &(department, weight) in &DEPARTMENTS {
                // Not every department reports every product every day.
                if rng.next_f64() < 0.55 {
                    continue;
                }
                let noise = 0.75 + 0.5 * rng.next_f64();
                rows.push(Row {
                    date,
                    product,
                    department,
                    sector: rng.pick(&SECTORS),
                    volume: base * weight * day_factor * season * noise,
                });
            }
        }
    }
    Ok(rows)
}

fn write_csv(rows: &[Row], path: &str) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b';')
        .from_path(path)
        .with_context(|| format!("creating {path}"))?;
    writer.write_record(["FECHA", "PROD", "DEPARTAMENTO", "SECTOR", "VOLUMEN"])?;
    for row in rows {
        writer.write_record([
            row.date.format("%Y-%m-%d").to_string(),
            row.product.to_string(),
            row.department.to_string(),
            row.sector.to_string(),
            format_volume(row.volume),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn write_parquet(rows: &[Row], path: &str) -> Result<()> {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).context("epoch")?;

    let schema = Arc::new(Schema::new(vec![
        Field::new("FECHA", DataType::Date32, false),
        Field::new("PROD", DataType::Utf8, false),
        Field::new("DEPARTAMENTO", DataType::Utf8, false),
        Field::new("SECTOR", DataType::Utf8, false),
        Field::new("VOLUMEN", DataType::Float64, false),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(Date32Array::from(
                rows.iter()
                    .map(|r| (r.date - epoch).num_days() as i32)
                    .collect::<Vec<_>>(),
            )),
            Arc::new(StringArray::from(rows.iter().map(|r| r.product).collect::<Vec<_>>())),
            Arc::new(StringArray::from(rows.iter().map(|r| r.department).collect::<Vec<_>>())),
            Arc::new(StringArray::from(rows.iter().map(|r| r.sector).collect::<Vec<_>>())),
            Arc::new(Float64Array::from(
                rows.iter()
                    .map(|r| (r.volume * 100.0).round() / 100.0)
                    .collect::<Vec<_>>(),
            )),
        ],
    )
    .context("building record batch")?;

    let file = std::fs::File::create(path).with_context(|| format!("creating {path}"))?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing parquet batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);
    let rows = generate(&mut rng)?;

    let csv_path = "datos_sample.csv";
    let parquet_path = "datos_sample.parquet";
    write_csv(&rows, csv_path)?;
    write_parquet(&rows, parquet_path)?;

    println!("Wrote {} rows to {csv_path} and {parquet_path}", rows.len());
    Ok(())
}
