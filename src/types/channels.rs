//! Channel capability sets
//!
//! Each pipeline resolves the channels it needs once, when a table is bound.
//! Required channels fail the bind with a `SkipReason`; optional ones become
//! `None` and the metrics that depend on them degrade to `null`.

use super::{SampleTable, SkipReason};
use crate::config::ChannelAliases;

fn label(aliases: &[String], logical: &str) -> String {
    aliases
        .first()
        .cloned()
        .unwrap_or_else(|| logical.to_string())
}

/// Channel that must be present
fn require<'a>(
    table: &'a SampleTable,
    aliases: &[String],
    logical: &str,
) -> Result<&'a [f64], SkipReason> {
    table
        .find_channel(aliases)
        .map(|(_, values)| values)
        .ok_or_else(|| SkipReason::MissingChannel(label(aliases, logical)))
}

/// Channel that must be present and carry at least one numeric value
fn require_numeric<'a>(
    table: &'a SampleTable,
    aliases: &[String],
    logical: &str,
) -> Result<&'a [f64], SkipReason> {
    let values = require(table, aliases, logical)?;
    if values.iter().all(|v| v.is_nan()) {
        return Err(SkipReason::AllMissingData(label(aliases, logical)));
    }
    Ok(values)
}

fn optional<'a>(table: &'a SampleTable, aliases: &[String]) -> Option<&'a [f64]> {
    table.find_channel(aliases).map(|(_, values)| values)
}

/// Channels of a segmented furnace log
#[derive(Debug, Clone, Copy)]
pub struct CycleChannels<'a> {
    pub pyrometer: &'a [f64],
    pub pressure: &'a [f64],
    pub form: &'a [f64],
    pub left_d: &'a [f64],
    pub right_d: &'a [f64],
    pub left_t: &'a [f64],
    pub right_t: &'a [f64],
    pub thermocouple: Option<&'a [f64]>,
}

impl<'a> CycleChannels<'a> {
    pub fn bind(table: &'a SampleTable, aliases: &ChannelAliases) -> Result<Self, SkipReason> {
        Ok(Self {
            pyrometer: require_numeric(table, &aliases.pyrometer, "pyrometer")?,
            pressure: require(table, &aliases.pressure, "pressure")?,
            form: require_numeric(table, &aliases.form, "form")?,
            left_d: require(table, &aliases.left_d, "left_d")?,
            right_d: require(table, &aliases.right_d, "right_d")?,
            left_t: require(table, &aliases.left_t, "left_t")?,
            right_t: require(table, &aliases.right_t, "right_t")?,
            thermocouple: optional(table, &aliases.thermocouple),
        })
    }
}

/// Channels of a pour report sheet
///
/// The pressure channel is structurally required too, but it is only
/// checked once heating has been found, so it is resolved lazily.
#[derive(Debug, Clone, Copy)]
pub struct PourChannels<'a> {
    pub pyrometer: &'a [f64],
    pressure: Option<&'a [f64]>,
}

impl<'a> PourChannels<'a> {
    pub fn bind(table: &'a SampleTable, aliases: &ChannelAliases) -> Result<Self, SkipReason> {
        Ok(Self {
            pyrometer: require_numeric(table, &aliases.pour_pyrometer, "pour_pyrometer")?,
            pressure: optional(table, &aliases.pour_pressure),
        })
    }

    pub fn pressure(&self, aliases: &ChannelAliases) -> Result<&'a [f64], SkipReason> {
        self.pressure
            .ok_or_else(|| SkipReason::MissingChannel(label(&aliases.pour_pressure, "pour_pressure")))
    }
}

/// Channels of a pour temperature sheet; all optional
#[derive(Debug, Clone)]
pub struct TemperatureSheetChannels<'a> {
    pub photo_pyrometer: Option<&'a [f64]>,
    pub companions: Vec<(String, &'a [f64])>,
}

impl<'a> TemperatureSheetChannels<'a> {
    pub fn bind(table: &'a SampleTable, aliases: &ChannelAliases) -> Self {
        let companions = aliases
            .companions
            .iter()
            .filter_map(|alias| {
                table
                    .find_channel(std::slice::from_ref(alias))
                    .map(|(_, values)| (alias.clone(), values))
            })
            .collect();
        Self {
            photo_pyrometer: optional(table, &aliases.photo_pyrometer),
            companions,
        }
    }
}

/// Channels needed by the leak-rate estimator
#[derive(Debug, Clone, Copy)]
pub struct LeakageChannels<'a> {
    pub pressure: &'a [f64],
    pub form: &'a [f64],
}

impl<'a> LeakageChannels<'a> {
    pub fn bind(table: &'a SampleTable, aliases: &ChannelAliases) -> Result<Self, SkipReason> {
        Ok(Self {
            pressure: require(table, &aliases.pressure, "pressure")?,
            form: require(table, &aliases.form, "form")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cycle_table(with_tp: bool) -> SampleTable {
        let mut table = SampleTable::new(3);
        for name in ["Piro", "BP2", "Form", "DL", "DR", "TL", "TR"] {
            table.insert_channel(name, vec![1.0, 2.0, 3.0]).unwrap();
        }
        if with_tp {
            table.insert_channel("TP", vec![1.0, 2.0, 3.0]).unwrap();
        }
        table
    }

    #[test]
    fn test_cycle_bind_optional_thermocouple() {
        let aliases = ChannelAliases::default();
        let without = cycle_table(false);
        assert!(CycleChannels::bind(&without, &aliases).unwrap().thermocouple.is_none());
        let with = cycle_table(true);
        assert!(CycleChannels::bind(&with, &aliases).unwrap().thermocouple.is_some());
    }

    #[test]
    fn test_cycle_bind_missing_required_channel() {
        let aliases = ChannelAliases::default();
        let table = SampleTable::new(2).with_channel("Piro", vec![1.0, 2.0]).unwrap();
        let err = CycleChannels::bind(&table, &aliases).unwrap_err();
        assert_eq!(err, SkipReason::MissingChannel("BP2".to_string()));
    }

    #[test]
    fn test_all_nan_pyrometer_is_all_missing() {
        let aliases = ChannelAliases::default();
        let mut table = cycle_table(false);
        table.insert_channel("Piro", vec![f64::NAN; 3]).unwrap();
        let err = CycleChannels::bind(&table, &aliases).unwrap_err();
        assert_eq!(err, SkipReason::AllMissingData("Piro".to_string()));
    }

    #[test]
    fn test_pour_pressure_resolved_lazily() {
        let aliases = ChannelAliases::default();
        let table = SampleTable::new(2)
            .with_channel("ПИРОМЕТР", vec![1500.0, 1510.0])
            .unwrap();
        let channels = PourChannels::bind(&table, &aliases).unwrap();
        assert_eq!(
            channels.pressure(&aliases).unwrap_err(),
            SkipReason::MissingChannel("PT6".to_string())
        );

        let table = table.with_channel("PT6 ", vec![0.1, 0.2]).unwrap();
        let channels = PourChannels::bind(&table, &aliases).unwrap();
        assert_eq!(channels.pressure(&aliases).unwrap(), &[0.1, 0.2]);
    }

    #[test]
    fn test_temperature_sheet_collects_present_companions() {
        let aliases = ChannelAliases::default();
        let first = aliases.companions[0].clone();
        let table = SampleTable::new(1).with_channel(first.clone(), vec![1500.0]).unwrap();
        let sheet = TemperatureSheetChannels::bind(&table, &aliases);
        assert!(sheet.photo_pyrometer.is_none());
        assert_eq!(sheet.companions.len(), 1);
        assert_eq!(sheet.companions[0].0, first);
    }
}
