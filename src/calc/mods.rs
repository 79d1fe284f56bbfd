use osu_db::ModSet;
use serde::{Serialize, Serializer};
use std::fmt;

const NIGHTCORE: u32 = 1 << 9;
const DOUBLE_TIME: u32 = 1 << 6;
const PERFECT: u32 = 1 << 14;
const SUDDEN_DEATH: u32 = 1 << 5;

// Bit position and acronym, in the order osu! lists them.
const ACRONYMS: &[(u32, &str)] = &[
    (1 << 0, "NF"),
    (1 << 1, "EZ"),
    (1 << 2, "TD"),
    (1 << 3, "HD"),
    (1 << 4, "HR"),
    (SUDDEN_DEATH, "SD"),
    (DOUBLE_TIME, "DT"),
    (1 << 7, "RX"),
    (1 << 8, "HT"),
    (NIGHTCORE, "NC"),
    (1 << 10, "FL"),
    (1 << 11, "AT"),
    (1 << 12, "SO"),
    (1 << 13, "AP"),
    (PERFECT, "PF"),
    (1 << 15, "4K"),
    (1 << 16, "5K"),
    (1 << 17, "6K"),
    (1 << 18, "7K"),
    (1 << 19, "8K"),
    (1 << 20, "FI"),
    (1 << 21, "RD"),
    (1 << 22, "CN"),
    (1 << 23, "TP"),
    (1 << 24, "9K"),
    (1 << 25, "CO"),
    (1 << 26, "1K"),
    (1 << 27, "3K"),
    (1 << 28, "2K"),
    (1 << 29, "SV2"),
    (1 << 30, "MR"),
];

/// Legacy (stable) modifier bitmask as stored in scores.db.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct LegacyMods(u32);

impl LegacyMods {
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Acronyms of the active mods. NC hides the DT bit it implies and PF
    /// hides SD.
    pub fn acronyms(self) -> Vec<&'static str> {
        let mut bits = self.0;
        if bits & NIGHTCORE != 0 {
            bits &= !DOUBLE_TIME;
        }
        if bits & PERFECT != 0 {
            bits &= !SUDDEN_DEATH;
        }
        ACRONYMS
            .iter()
            .filter(|(bit, _)| bits & bit != 0)
            .map(|(_, acronym)| *acronym)
            .collect()
    }
}

impl From<ModSet> for LegacyMods {
    fn from(mods: ModSet) -> Self {
        Self(mods.bits())
    }
}

impl fmt::Display for LegacyMods {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.acronyms().join("|"))
    }
}

impl Serialize for LegacyMods {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.acronyms())
    }
}
