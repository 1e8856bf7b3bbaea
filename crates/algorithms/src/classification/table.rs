//! CSV centre tables

use std::io::Write;

use rsgis_core::Result;

/// Write `Cluster,b1,...,bN` followed by one row per centre
pub(crate) fn write_centre_table<'c, W, I>(writer: W, bands: usize, centres: I) -> Result<()>
where
    W: Write,
    I: IntoIterator<Item = (u32, &'c [f64])>,
{
    let mut csv = csv::Writer::from_writer(writer);

    let mut header = Vec::with_capacity(bands + 1);
    header.push("Cluster".to_string());
    header.extend((1..=bands).map(|b| format!("b{}", b)));
    csv.write_record(&header)?;

    for (id, position) in centres {
        let mut record = Vec::with_capacity(position.len() + 1);
        record.push(id.to_string());
        record.extend(position.iter().map(|v| v.to_string()));
        csv.write_record(&record)?;
    }

    csv.flush()?;
    Ok(())
}
