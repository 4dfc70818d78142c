use crate::error::WxErr;
use chrono::NaiveDate;

pub fn bail(msg: &str) -> ! {
    println!("{}", msg);
    ::std::process::exit(1);
}

/// Parse a `YYYY-MM-DD` date. Anything after the first ten characters (a time, say) is ignored.
pub fn parse_date_string(dt_str: &str) -> Result<NaiveDate, WxErr> {
    let dt_str = dt_str.trim();
    let date_part = dt_str.get(..10).unwrap_or(dt_str);

    Ok(NaiveDate::parse_from_str(date_part, "%Y-%m-%d")?)
}

/// Parse a vacation interval given as `START:END`, both inclusive.
pub fn parse_vacation(vac_str: &str) -> Result<(NaiveDate, NaiveDate), WxErr> {
    let mut parts = vac_str.splitn(2, ':');
    let (start, end) = match (parts.next(), parts.next()) {
        (Some(start), Some(end)) => (parse_date_string(start)?, parse_date_string(end)?),
        _ => {
            return Err(WxErr::InvalidArgument(format!(
                "vacation must look like START:END, found {}",
                vac_str
            )))
        }
    };

    if end < start {
        return Err(WxErr::InvalidArgument(format!(
            "vacation ends before it starts: {}",
            vac_str
        )));
    }

    Ok((start, end))
}

/// Round to two decimal places.
pub fn round2(val: f64) -> f64 {
    (val * 100.0).round() / 100.0
}
