use std::collections::HashSet;
use std::fs::File;
use std::io::BufReader;

use anyhow::{Context, Result};
use walkdir::WalkDir;

use cheapest_products::csv::BatchReader;
use cheapest_products::record::Record;

fn main() -> Result<()> {
    let dir = std::env::args().nth(1).unwrap_or_else(|| "data".to_string());

    for entry in WalkDir::new(&dir).min_depth(1).max_depth(1) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        if entry.path().extension().and_then(|e| e.to_str()) != Some("csv") {
            continue;
        }

        let file =
            File::open(entry.path()).with_context(|| format!("open {:?}", entry.path()))?;

        let mut ids = HashSet::<i64>::new();
        let mut rows = 0u64;
        let mut malformed = 0u64;
        let mut min_price = f64::INFINITY;
        let mut max_price = f64::NEG_INFINITY;

        for batch in BatchReader::new(BufReader::new(file), ',', 4096) {
            for row in batch? {
                rows += 1;
                match Record::from_raw(row) {
                    Some(r) => {
                        ids.insert(r.id);
                        min_price = min_price.min(r.price);
                        max_price = max_price.max(r.price);
                    }
                    None => malformed += 1,
                }
            }
        }

        println!(
            "{}: rows={rows} malformed={malformed} unique_ids={}",
            entry.path().display(),
            ids.len()
        );
        if rows > malformed {
            println!("  price_range={min_price}..{max_price}");
        }
    }

    Ok(())
}
