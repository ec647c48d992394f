//! Pure, allocation-free row/band selection with hysteresis.

use crate::profile::{ProfileRow, ProfileTable, TempVTerm};

/// Hysteresis parameters shared by [`PlotSelector::select`] and [`select_vterm_band`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Hysteresis {
    /// Degrees (deci-°C) added below a band's lower bound when approaching from below.
    pub temp_rise: i16,
    /// Degrees (deci-°C) subtracted from a band's upper bound when approaching from above.
    pub temp_fall: i16,
    /// Millivolts added below a band's lower bound when approaching from below.
    pub vol_rise: u16,
    /// Millivolts subtracted from a band's upper bound when approaching from above.
    pub vol_fall: u16,
}

/// The termination-voltage table has no data for the requested temperature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct NoVtermData;

/// Pure row-selection logic over a set of [`ProfileTable`]s.
pub struct PlotSelector;

impl PlotSelector {
    /// Resolves the `ProfileRow` for a `(temp, voltage, adapter)` measurement.
    ///
    /// Returns `None` if no table matches the adapter type, or no row in the matching
    /// table contains the measurement.
    pub fn select(
        tables: &[ProfileTable],
        temp: i16,
        voltage: u16,
        adapter_mask_bit: u32,
        last_row: Option<ProfileRow>,
        hys: Hysteresis,
    ) -> Option<ProfileRow> {
        let table = tables.iter().find(|t| t.matches_adapter(adapter_mask_bit))?;
        let candidate = *table.rows.iter().find(|row| row.contains(temp, voltage))?;

        if let Some(last) = last_row {
            if last != candidate
                && (temp_sticky(&last, &candidate, temp, hys.temp_rise, hys.temp_fall)
                    || vol_sticky(&last, &candidate, voltage, hys.vol_rise, hys.vol_fall))
            {
                return Some(last);
            }
        }

        Some(candidate)
    }
}

fn temp_sticky(last: &ProfileRow, candidate: &ProfileRow, temp: i16, rise: i16, fall: i16) -> bool {
    if candidate.temp_min == last.temp_min && candidate.temp_max == last.temp_max {
        return false;
    }
    if candidate.temp_min > last.temp_min {
        temp < candidate.temp_min.saturating_add(rise)
    } else {
        temp > candidate.temp_max.saturating_sub(fall)
    }
}

fn vol_sticky(last: &ProfileRow, candidate: &ProfileRow, voltage: u16, rise: u16, fall: u16) -> bool {
    if candidate.v_min == last.v_min && candidate.v_max == last.v_max {
        return false;
    }
    if candidate.v_min > last.v_min {
        voltage < candidate.v_min.saturating_add(rise)
    } else {
        voltage > candidate.v_max.saturating_sub(fall)
    }
}

/// Resolves the termination-voltage band index for `temp`, with hysteresis against
/// `last_index`.
///
/// Returns [`NoVtermData`] when `temp` is below the lowest band; clips to the highest
/// band when `temp` is above it.
pub fn select_vterm_band(
    table: &TempVTerm,
    temp: i16,
    last_index: Option<usize>,
    rise: i16,
    fall: i16,
) -> Result<usize, NoVtermData> {
    let bands = &table.bands;
    let first = bands.first().ok_or(NoVtermData)?;
    if temp < first.low {
        return Err(NoVtermData);
    }

    let candidate = match bands.iter().position(|b| temp >= b.low && temp <= b.high) {
        Some(idx) => idx,
        None => bands.len() - 1,
    };

    let Some(last_idx) = last_index else {
        return Ok(candidate);
    };
    if last_idx == candidate {
        return Ok(candidate);
    }
    let (Some(last), Some(cand)) = (bands.get(last_idx), bands.get(candidate)) else {
        return Ok(candidate);
    };
    let sticky = if cand.low > last.low {
        temp < cand.low.saturating_add(rise)
    } else {
        temp > cand.high.saturating_sub(fall)
    };

    Ok(if sticky { last_idx } else { candidate })
}
