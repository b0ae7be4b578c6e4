use crate::engine::StepRecord;
use std::fs::File;
use std::io::{self, BufWriter, Write};

pub const RECORD_HEADER: &str =
    "pass,direction,site,window,energy,delta,truncation_error,kept,overlap,elapsed";

/// One CSV row, `pass` is empty for infinite growth.
pub fn record_row(r: &StepRecord) -> String {
    format!(
        "{},{},{},{},{},{},{},{},{},{}",
        r.pass.map(|p| p.to_string()).unwrap_or_default(),
        r.direction,
        r.site,
        r.window,
        r.energy,
        r.delta,
        r.truncation_error,
        r.kept,
        r.overlap,
        r.elapsed
    )
}

pub fn write_records(path: &str, records: &[StepRecord]) -> io::Result<()> {
    let mut f = BufWriter::new(File::create(path)?);
    writeln!(f, "{}", RECORD_HEADER)?;
    for r in records {
        writeln!(f, "{}", record_row(r))?;
    }
    f.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Direction;

    #[test]
    fn infinite_rows_leave_pass_empty() {
        let r = StepRecord {
            pass: None,
            direction: Direction::Right,
            site: 3,
            window: 8,
            energy: -1.25,
            delta: 0.5,
            truncation_error: 0.0,
            kept: 4,
            overlap: 1.0,
            spectrum_left: vec![],
            spectrum_right: vec![],
            elapsed: 0.0,
        };
        let row = record_row(&r);
        assert!(row.starts_with(",->,3,8,-1.25,"));
        assert_eq!(row.split(',').count(), RECORD_HEADER.split(',').count());
    }
}
