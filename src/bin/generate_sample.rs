use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Float64Array, StringArray};
use arrow::datatypes::{Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

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

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

const FEATURES: [&str; 4] = ["amplitude", "std", "skew", "max_slope"];
const SAMPLES_PER_CLASS: usize = 30;

/// Class name and per-feature cluster centers.
const CLASSES: [(&str, [f64; 4]); 3] = [
    ("Mira", [8.0, 2.5, 0.2, 1.0]),
    ("RR_Lyrae", [3.0, 1.0, -0.8, 4.0]),
    ("W_Ursae_Maj", [1.5, 0.6, 0.9, 2.5]),
];

fn write_parquet(path: &Path, columns: Vec<(String, ArrayRef)>) -> Result<()> {
    let schema = Arc::new(Schema::new(
        columns
            .iter()
            .map(|(name, array)| Field::new(name, array.data_type().clone(), false))
            .collect::<Vec<_>>(),
    ));
    let batch = RecordBatch::try_new(
        schema.clone(),
        columns.into_iter().map(|(_, array)| array).collect(),
    )
    .context("building record batch")?;

    let file = std::fs::File::create(path)
        .with_context(|| format!("creating {}", path.display()))?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing record batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let fset_path = PathBuf::from(args.next().unwrap_or_else(|| "sample_features.parquet".into()));
    let pset_path = PathBuf::from(args.next().unwrap_or_else(|| "sample_predictions.parquet".into()));

    let mut rng = SimpleRng::new(42);

    let mut names: Vec<String> = Vec::new();
    let mut targets: Vec<&str> = Vec::new();
    let mut features: Vec<Vec<f64>> = vec![Vec::new(); FEATURES.len()];
    let mut probabilities: Vec<Vec<f64>> = vec![Vec::new(); CLASSES.len()];

    for (class_idx, (class, centers)) in CLASSES.iter().enumerate() {
        for _ in 0..SAMPLES_PER_CLASS {
            names.push(format!("ts_{}", names.len()));
            targets.push(*class);
            for (f, &center) in centers.iter().enumerate() {
                features[f].push(rng.gauss(center, 0.15 * center.abs().max(1.0)));
            }

            // a noisy classifier that is right most of the time
            let raw: Vec<f64> = (0..CLASSES.len())
                .map(|k| {
                    let base = if k == class_idx { 2.0 } else { 0.5 };
                    (base + rng.gauss(0.0, 0.6)).exp()
                })
                .collect();
            let total: f64 = raw.iter().sum();
            for (k, p) in raw.into_iter().enumerate() {
                probabilities[k].push(p / total);
            }
        }
    }

    let name_array: ArrayRef = Arc::new(StringArray::from(
        names.iter().map(|s| s.as_str()).collect::<Vec<_>>(),
    ));
    let target_array: ArrayRef = Arc::new(StringArray::from(targets));

    let mut fset_columns = vec![
        ("name".to_string(), name_array.clone()),
        ("target".to_string(), target_array.clone()),
    ];
    for (name, values) in FEATURES.iter().zip(features) {
        fset_columns.push((name.to_string(), Arc::new(Float64Array::from(values)) as ArrayRef));
    }
    write_parquet(&fset_path, fset_columns)?;

    let mut pset_columns = vec![
        ("name".to_string(), name_array),
        ("target".to_string(), target_array),
    ];
    for ((class, _), values) in CLASSES.iter().zip(probabilities) {
        pset_columns.push((class.to_string(), Arc::new(Float64Array::from(values)) as ArrayRef));
    }
    write_parquet(&pset_path, pset_columns)?;

    println!(
        "Wrote {} samples ({} features, {} classes) to {} and predictions to {}",
        names.len(),
        FEATURES.len(),
        CLASSES.len(),
        fset_path.display(),
        pset_path.display()
    );
    Ok(())
}
