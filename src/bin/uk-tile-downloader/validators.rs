use std::time::Duration;

use uk_tile_downloader::MAX_ZOOM;

pub fn is_zoom(v: &str) -> Result<u8, String> {
    let val = v.parse::<u8>().map_err(|_| "must be a non-negative integer".to_owned())?;

    if val > MAX_ZOOM {
        return Err(format!("must be <= {}", MAX_ZOOM));
    }

    Ok(val)
}

pub fn is_positive(v: &str) -> Result<u64, String> {
    let val = v.parse::<u64>().map_err(|_| "must be numeric".to_owned())?;

    if val == 0 {
        return Err("must be > 0".to_owned());
    }

    Ok(val)
}

pub fn is_seconds(v: &str) -> Result<Duration, String> {
    let val = v.parse::<f64>().map_err(|_| "must be numeric".to_owned())?;

    if !val.is_finite() || val < 0_f64 {
        return Err("must be a non-negative number of seconds".to_owned());
    }

    Duration::try_from_secs_f64(val).map_err(|_| "too large".to_owned())
}
