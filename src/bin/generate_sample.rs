use anyhow::{Context, Result};

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

    fn pick<'a>(&mut self, items: &[&'a str]) -> &'a str {
        items[(self.next_u64() % items.len() as u64) as usize]
    }

    fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }
}

const HEADER: [&str; 6] = ["id", "city", "department", "age", "salary", "rating"];
const CITIES: [&str; 5] = ["Lisbon", "Porto", "Braga", "Faro", "Coimbra"];
const DEPARTMENTS: [&str; 4] = ["Sales", "R&D", "Support", "Finance, Legal"];
const SENTINELS: [&str; 4] = ["NA", "-", "null", ""];

/// Rows with a sprinkle of sentinel tokens and repeated records, so every
/// cleaning step has something to do.
fn messy_rows(rng: &mut SimpleRng, n: usize) -> Vec<Vec<String>> {
    let mut rows = Vec::with_capacity(n + n / 20);
    for id in 0..n {
        let age = rng.gauss(40.0, 9.0).round().clamp(18.0, 70.0);
        let salary = 1200.0 + age * 45.0 + rng.gauss(0.0, 300.0);
        let rating = (salary / 1000.0 + rng.gauss(0.0, 0.8)).clamp(0.0, 5.0);

        let mut row = vec![
            id.to_string(),
            rng.pick(&CITIES).to_string(),
            rng.pick(&DEPARTMENTS).to_string(),
            format!("{age}"),
            format!("{salary:.2}"),
            format!("{rating:.1}"),
        ];
        // never blank the id column
        for field in row.iter_mut().skip(1) {
            if rng.chance(0.06) {
                *field = rng.pick(&SENTINELS).to_string();
            }
        }
        if rng.chance(0.05) {
            rows.push(row.clone());
        }
        rows.push(row);
    }
    rows
}

fn write_delimited(path: &str, delimiter: u8, rows: &[Vec<String>]) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_path(path)
        .with_context(|| format!("creating {path}"))?;
    writer.write_record(HEADER)?;
    for row in rows {
        writer.write_record(row)?;
    }
    writer.flush()?;
    Ok(())
}

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);
    let rows = messy_rows(&mut rng, 200);

    write_delimited("sample_data.csv", b',', &rows)?;
    write_delimited("sample_data.tsv", b'\t', &rows)?;

    // `.txt` goes through separator sniffing; `~` never appears in the data.
    let txt_rows: Vec<Vec<String>> = rows
        .iter()
        .map(|r| r.iter().map(|f| f.replace('~', "")).collect())
        .collect();
    write_delimited("sample_data.txt", b'~', &txt_rows)?;

    println!("Wrote {} rows to sample_data.csv, sample_data.tsv and sample_data.txt", rows.len());
    Ok(())
}
