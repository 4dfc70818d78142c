//! Reading the CSV files produced by the results fetcher.
//!
//! Each file starts with a header naming its columns. Rows that are short or hold values that
//! do not parse are skipped and counted, the rest of the file is still read.
use crate::{
    error::WxErr,
    record::{ErrorBreakdown, ForecastType, Record},
    schedule::ScheduleEntry,
    util::parse_date_string,
    verification::Verification,
};
use std::{io::Read, str::FromStr};

/// The rows read from one file.
#[derive(Debug)]
pub struct Parsed<T> {
    pub items: Vec<T>,
    /// Rows that were malformed and left out.
    pub skipped: usize,
}

/// Header positions by column name.
struct Header(csv::StringRecord);

impl Header {
    fn position(&self, name: &str) -> Option<usize> {
        self.0.iter().position(|h| h.trim().eq_ignore_ascii_case(name))
    }

    fn require(&self, names: &[&str]) -> Result<Vec<usize>, WxErr> {
        names
            .iter()
            .map(|name| {
                self.position(name)
                    .ok_or_else(|| WxErr::InvalidRecord(format!("missing column {}", name)))
            })
            .collect()
    }
}

/// One data row with its header.
struct Fields<'a> {
    header: &'a Header,
    row: &'a csv::StringRecord,
}

impl<'a> Fields<'a> {
    fn text(&self, idx: usize) -> Option<&'a str> {
        self.row.get(idx).map(str::trim)
    }

    fn value<T: FromStr>(&self, idx: usize) -> Option<T> {
        self.text(idx)?.parse().ok()
    }

    /// An optional numeric column; absent or blank reads as the default.
    fn or_default<T: FromStr + Default>(&self, name: &str) -> Option<T> {
        match self.header.position(name).and_then(|idx| self.text(idx)) {
            None | Some("") => Some(T::default()),
            Some(val) => val.parse().ok(),
        }
    }

    fn breakdown(&self, prefix: &str) -> Option<ErrorBreakdown> {
        let col = |name: &str| self.or_default::<f64>(&format!("{}{}", prefix, name));
        Some(ErrorBreakdown {
            max: col("max")?,
            min: col("min")?,
            wind: col("wind")?,
            precip: col("precip")?,
            penalty: col("penalty")?,
            total: col("total")?,
        })
    }
}

fn read_rows<R, T, F>(reader: R, required: &[&str], parse: F) -> Result<Parsed<T>, WxErr>
where
    R: Read,
    F: Fn(&Fields, &[usize]) -> Option<T>,
{
    let mut rdr = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let header = Header(rdr.headers()?.clone());
    let cols = header.require(required)?;

    let mut parsed = Parsed {
        items: vec![],
        skipped: 0,
    };

    for row in rdr.records() {
        let row = match row {
            Ok(row) => row,
            Err(_) => {
                parsed.skipped += 1;
                continue;
            }
        };

        let fields = Fields {
            header: &header,
            row: &row,
        };
        match parse(&fields, &cols) {
            Some(item) => parsed.items.push(item),
            None => parsed.skipped += 1,
        }
    }

    Ok(parsed)
}

/// Read forecast records. `name`, `school`, `category`, `date`, `identifier` and `day` are
/// required; every other column defaults to zero when absent or blank.
pub fn read_forecasts<R: Read>(reader: R) -> Result<Parsed<Record>, WxErr> {
    const REQUIRED: [&str; 6] = ["name", "school", "category", "date", "identifier", "day"];

    read_rows(reader, &REQUIRED, |f, cols| {
        let name = f.text(cols[0]).filter(|n| !n.is_empty())?;
        let school = f.text(cols[1]).filter(|s| !s.is_empty())?;
        let category: u8 = f.value(cols[2])?;
        let date = parse_date_string(f.text(cols[3])?).ok()?;
        let identifier = f.text(cols[4]).filter(|i| !i.is_empty())?;
        let day = f.value::<u8>(cols[5]).filter(|d| (1..=8).contains(d))?;

        let mut rec = Record::new(name, school, category, identifier, date, day);
        rec.abs = f.or_default("abs")?;
        rec.max = f.or_default("max")?;
        rec.min = f.or_default("min")?;
        rec.wind = f.or_default("wind")?;
        rec.precip = f.or_default("precip")?;
        rec.fcst_type = ForecastType::from_code(
            f.header
                .position("type")
                .and_then(|idx| f.text(idx))
                .unwrap_or(""),
        );
        rec.err = f.breakdown("err_")?;
        rec.cum_err = f.breakdown("cum_err_")?;
        rec.norm_city = f.or_default("norm_city")?;

        Some(rec)
    })
}

/// Read schedule entries with columns `city`, `state`, `ident`, `start` and `end`.
pub fn read_schedule<R: Read>(reader: R) -> Result<Parsed<ScheduleEntry>, WxErr> {
    read_rows(reader, &["city", "state", "ident", "start", "end"], |f, cols| {
        let start = parse_date_string(f.text(cols[3])?).ok()?;
        let end = parse_date_string(f.text(cols[4])?).ok()?;
        if end < start {
            return None;
        }

        Some(ScheduleEntry {
            city: f.text(cols[0])?.to_owned(),
            state: f.text(cols[1])?.to_owned(),
            ident: f.text(cols[2]).filter(|i| !i.is_empty())?.to_uppercase(),
            start,
            end,
        })
    })
}

/// Read verification rows with columns `city`, `state`, `ident`, `date`, `max`, `min`, `wind`
/// and `precip`.
pub fn read_verifications<R: Read>(reader: R) -> Result<Parsed<Verification>, WxErr> {
    const REQUIRED: [&str; 8] = [
        "city", "state", "ident", "date", "max", "min", "wind", "precip",
    ];

    read_rows(reader, &REQUIRED, |f, cols| {
        Some(Verification {
            city: f.text(cols[0])?.to_owned(),
            state: f.text(cols[1])?.to_owned(),
            ident: f.text(cols[2])?.to_uppercase(),
            date: parse_date_string(f.text(cols[3])?).ok()?,
            max: f.value(cols[4])?,
            min: f.value(cols[5])?,
            wind: f.value(cols[6])?,
            precip: f.value(cols[7])?,
        })
    })
}
