use std::path::PathBuf;
use std::sync::Arc;

use arrow::array::{Float64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use arrow::util::pretty::pretty_format_batches;
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

    fn pick<'a>(&mut self, items: &[&'a str]) -> &'a str {
        items[(self.next_u64() % items.len() as u64) as usize]
    }

    /// Log-uniform draw in `[10^lo, 10^hi)`.
    fn log_uniform(&mut self, lo: f64, hi: f64) -> f64 {
        10f64.powf(lo + (hi - lo) * self.next_f64())
    }
}

struct Event {
    name: String,
    class: &'static str,
    significant: bool,
    detectors: &'static str,
    far: f64,
    distance: f64,
}

const CLASSES: [&str; 4] = ["BBH", "NS", "Glitch", "Terrestrial"];
const NETWORKS: [&str; 7] = ["H1", "L1", "V1", "H1,L1", "H1,V1", "L1,V1", "H1,L1,V1"];

fn main() {
    let out_dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("sample_data"));
    std::fs::create_dir_all(&out_dir).expect("Failed to create output directory");

    let mut rng = SimpleRng::new(42);

    let events: Vec<Event> = (0..120)
        .map(|i| {
            let far = rng.log_uniform(-12.0, -3.0);
            Event {
                name: format!("S23{:02}{:02}{}", 1 + i % 12, 1 + i % 28, (b'a' + (i % 26) as u8) as char),
                class: rng.pick(&CLASSES),
                significant: far < 3.9e-8,
                detectors: rng.pick(&NETWORKS),
                far,
                distance: rng.log_uniform(1.5, 3.8),
            }
        })
        .collect();

    // ---- GraceDB: every event except each 9th ----
    let gracedb_path = out_dir.join("GraceDB.csv");
    let mut writer = csv::Writer::from_path(&gracedb_path).expect("Failed to create GraceDB.csv");
    writer
        .write_record(["EventName", "HierarchicalClass", "Significant", "Detectors", "FAR", "Distance"])
        .expect("Failed to write header");
    let mut gracedb_rows = 0;
    for (i, ev) in events.iter().enumerate() {
        if i % 9 == 8 {
            continue;
        }
        writer
            .write_record([
                ev.name.clone(),
                ev.class.to_string(),
                if ev.significant { "High" } else { "Low" }.to_string(),
                ev.detectors.to_string(),
                format!("{:e}", ev.far),
                format!("{:.1}", ev.distance),
            ])
            .expect("Failed to write GraceDB row");
        gracedb_rows += 1;
    }
    writer.flush().expect("Failed to flush GraceDB.csv");

    // ---- GWSkyNet: every event except each 7th, classifier mostly agrees ----
    let mut names = Vec::new();
    let mut classes = Vec::new();
    let mut sky_areas = Vec::new();
    let mut far_estimates = Vec::new();
    let mut log_bsn = Vec::new();
    let mut log_bci = Vec::new();
    for (i, ev) in events.iter().enumerate() {
        if i % 7 == 6 {
            continue;
        }
        let class = if rng.next_f64() < 0.8 {
            ev.class
        } else {
            rng.pick(&CLASSES)
        };
        names.push(ev.name.clone());
        classes.push(class);
        sky_areas.push(rng.log_uniform(0.5, 4.0));
        far_estimates.push(ev.far * (0.5 + rng.next_f64()));
        log_bsn.push(-2.0 + 12.0 * rng.next_f64());
        log_bci.push(-1.0 + 6.0 * rng.next_f64());
    }

    let gwskynet_csv = out_dir.join("GWSkyNet.csv");
    let mut writer = csv::Writer::from_path(&gwskynet_csv).expect("Failed to create GWSkyNet.csv");
    writer
        .write_record(["EventName", "GDB_Class", "SkyArea", "FAR", "LogBSN", "LogBCI"])
        .expect("Failed to write header");
    for i in 0..names.len() {
        writer
            .write_record([
                names[i].clone(),
                classes[i].to_string(),
                format!("{:.2}", sky_areas[i]),
                format!("{:e}", far_estimates[i]),
                format!("{:.3}", log_bsn[i]),
                format!("{:.3}", log_bci[i]),
            ])
            .expect("Failed to write GWSkyNet row");
    }
    writer.flush().expect("Failed to flush GWSkyNet.csv");

    // Same GWSkyNet table as Parquet
    let schema = Arc::new(Schema::new(vec![
        Field::new("EventName", DataType::Utf8, false),
        Field::new("GDB_Class", DataType::Utf8, false),
        Field::new("SkyArea", DataType::Float64, false),
        Field::new("FAR", DataType::Float64, false),
        Field::new("LogBSN", DataType::Float64, false),
        Field::new("LogBCI", DataType::Float64, false),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(StringArray::from(names.iter().map(|s| s.as_str()).collect::<Vec<_>>())),
            Arc::new(StringArray::from(classes.clone())),
            Arc::new(Float64Array::from(sky_areas)),
            Arc::new(Float64Array::from(far_estimates)),
            Arc::new(Float64Array::from(log_bsn)),
            Arc::new(Float64Array::from(log_bci)),
        ],
    )
    .expect("Failed to create RecordBatch");

    let parquet_path = out_dir.join("GWSkyNet.parquet");
    let file = std::fs::File::create(&parquet_path).expect("Failed to create output file");
    let mut writer = ArrowWriter::try_new(file, schema, None).expect("Failed to create writer");
    writer.write(&batch).expect("Failed to write batch");
    writer.close().expect("Failed to close writer");

    let preview = pretty_format_batches(&[batch.slice(0, 5.min(batch.num_rows()))])
        .expect("Failed to format preview");
    println!("{preview}");
    println!(
        "Wrote {gracedb_rows} GraceDB rows to {} and {} GWSkyNet rows to {} / {}",
        gracedb_path.display(),
        names.len(),
        gwskynet_csv.display(),
        parquet_path.display()
    );
}
