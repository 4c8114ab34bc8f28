//! # File Enumeration
//!
//! Builds the ordered list of model file names covered by a [`FileSchedule`].
//! Nothing here touches the filesystem; the list is a pure function of the
//! schedule, so it can be compared literally in tests.

use crate::error::{PointError, PointResult};
use crate::input::{DATE_FORMAT, FileSchedule};
use chrono::Duration;
use log::debug;
use std::path::{Path, PathBuf};

/// Renders one file name from the template.
///
/// `{date}` becomes `YYYYMMDD` and `{hour}` the zero-padded two-digit hour.
pub fn render_file_name(template: &str, date: &str, hour: u32) -> String {
    template
        .replace("{date}", date)
        .replace("{hour}", &format!("{:02}", hour))
}

/// Lists every file name in the schedule, day by day and hour by hour.
///
/// The result holds `num_days * (24 / step_hours)` names in chronological
/// order. Missing days or files are not detected here.
///
/// # Examples
///
/// ```rust
/// use ncpoint::files::enumerate_file_names;
/// use ncpoint::input::FileSchedule;
///
/// let schedule = FileSchedule {
///     num_days: 1,
///     ..FileSchedule::default()
/// };
/// let names = enumerate_file_names(&schedule)?;
/// assert_eq!(names.len(), 8);
/// assert_eq!(names[0], "GLDAS_NOAH025_3H.A20150201.0000.021.nc4");
/// assert_eq!(names[7], "GLDAS_NOAH025_3H.A20150201.2100.021.nc4");
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn enumerate_file_names(schedule: &FileSchedule) -> PointResult<Vec<String>> {
    let start = schedule.start()?;
    if schedule.step_hours == 0 || 24 % schedule.step_hours != 0 {
        return Err(PointError::InvalidConfig(format!(
            "step_hours must divide 24, got {}",
            schedule.step_hours
        )));
    }

    let mut file_names =
        Vec::with_capacity(schedule.num_days as usize * schedule.steps_per_day() as usize);

    for day in 0..schedule.num_days {
        let date = start + Duration::days(i64::from(day));
        let date_str = date.format(DATE_FORMAT).to_string();

        for hour in (0..24).step_by(schedule.step_hours as usize) {
            file_names.push(render_file_name(&schedule.template, &date_str, hour));
        }
    }

    debug!(
        "Enumerated {} file names starting {}",
        file_names.len(),
        schedule.start_date
    );
    Ok(file_names)
}

/// Same as [`enumerate_file_names`], joined onto `data_dir`.
pub fn enumerate_file_paths(schedule: &FileSchedule) -> PointResult<Vec<PathBuf>> {
    let data_dir = Path::new(&schedule.data_dir);
    Ok(enumerate_file_names(schedule)?
        .into_iter()
        .map(|name| data_dir.join(name))
        .collect())
}
