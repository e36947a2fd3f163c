use super::error::{PrefsError, SerialError};
use super::schema::{PrefValue, PreferenceSet};

/// Typed view of the serial-number preferences
///
/// Several programming stations share one serial space: each station hands
/// out numbers congruent to its `station` id modulo `increment`.
///
/// Fields are private so `0 <= station < increment` always holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialNumbering {
    increment: u64,
    station: u64,
    service: Option<String>,
}

impl SerialNumbering {
    pub fn new(increment: i64, station: i64, service: Option<String>) -> Result<Self, SerialError> {
        if increment < 1 {
            return Err(SerialError::InvalidIncrement(increment));
        }
        if !(0..increment).contains(&station) {
            return Err(SerialError::StationOutOfRange { station, increment });
        }

        Ok(Self {
            increment: increment as u64,
            station: station as u64,
            service,
        })
    }

    /// Read and validate from a set built on [`PreferenceSchema::serial_numbering`](super::PreferenceSchema::serial_numbering)
    pub fn from_set(set: &PreferenceSet) -> Result<Self, PrefsError> {
        let increment = set.get_int("increment").ok_or_else(|| missing("increment"))?;
        let station = set.get_int("station").ok_or_else(|| missing("station"))?;
        let service = set.get_str("service").map(str::to_string);

        Ok(Self::new(increment, station, service)?)
    }

    pub fn increment(&self) -> u64 {
        self.increment
    }

    pub fn station(&self) -> u64 {
        self.station
    }

    /// External serial-number service; local allocation applies when absent
    pub fn service(&self) -> Option<&str> {
        self.service.as_deref()
    }

    /// Write these values back into a preference set
    pub fn apply(&self, set: &mut PreferenceSet) -> Result<(), PrefsError> {
        let to_i64 = |v: u64, key: &str| {
            i64::try_from(v)
                .map_err(|_| PrefsError::InvalidArgument(format!("{key} {v} is out of range")))
        };

        set.set("increment", PrefValue::Int(to_i64(self.increment, "increment")?))?;
        set.set("station", PrefValue::Int(to_i64(self.station, "station")?))?;
        set.set(
            "service",
            self.service
                .clone()
                .map_or(PrefValue::Null, PrefValue::Str),
        )
    }

    /// Smallest serial greater than `latest` that belongs to this station
    pub fn next_after(&self, latest: u64) -> Result<u64, SerialError> {
        let exhausted = SerialError::Exhausted { latest };
        let candidate = (latest - latest % self.increment)
            .checked_add(self.station)
            .ok_or(exhausted.clone())?;
        if candidate > latest {
            return Ok(candidate);
        }
        candidate.checked_add(self.increment).ok_or(exhausted)
    }
}

fn missing(key: &str) -> PrefsError {
    PrefsError::InvalidArgument(format!("preference set has no integer {key:?}"))
}
