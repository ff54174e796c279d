/// Plain-text export of learned factor vectors
///
/// One line per feature: `<name> [v1, v2, ...]`, in feature column order.
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Write `names[i] factors[i]` lines to `writer`
pub fn write_factors<W: Write>(
    mut writer: W,
    names: &[String],
    factors: &[Vec<f32>],
) -> crate::Result<()> {
    if names.len() != factors.len() {
        return Err(crate::FmError::Data(format!(
            "{} feature names but {} factor vectors",
            names.len(),
            factors.len()
        )));
    }

    for (name, vector) in names.iter().zip(factors) {
        writeln!(writer, "{} {:?}", name, vector)?;
    }
    writer.flush()?;

    Ok(())
}

/// Create (or truncate) `path` and write the factor lines into it
pub fn dump_factors<P: AsRef<Path>>(
    path: P,
    names: &[String],
    factors: &[Vec<f32>],
) -> crate::Result<()> {
    let file = File::create(path.as_ref())?;
    write_factors(BufWriter::new(file), names, factors)
}
