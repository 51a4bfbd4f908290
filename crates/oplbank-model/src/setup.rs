//! Per-bank playback setup and the packed setup word.

use serde::{Deserialize, Serialize};

/// Deep tremolo bit in the setup word's OPL-flags byte.
pub const SETUP_FLAG_DEEP_TREMOLO: u16 = 0x01;

/// Deep vibrato bit in the setup word's OPL-flags byte.
pub const SETUP_FLAG_DEEP_VIBRATO: u16 = 0x02;

/// Volume scaling model applied by the playback driver.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum VolumeModel {
    /// Generic linear scaling.
    #[default]
    Generic,
    /// Driver-native scaling.
    Native,
    /// DMX (Doom engine) scaling.
    Dmx,
    /// Apogee Sound System scaling.
    Apogee,
    /// Windows 9x FM driver scaling.
    Win9x,
}

impl VolumeModel {
    /// Wire code stored in the setup word's low byte.
    pub fn code(&self) -> u8 {
        match self {
            VolumeModel::Generic => 0,
            VolumeModel::Native => 1,
            VolumeModel::Dmx => 2,
            VolumeModel::Apogee => 3,
            VolumeModel::Win9x => 4,
        }
    }
}

/// Playback configuration owned by one bank.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankSetup {
    /// Volume scaling model.
    pub volume_model: VolumeModel,
    /// Chip-global deep tremolo toggle.
    pub deep_tremolo: bool,
    /// Chip-global deep vibrato toggle.
    pub deep_vibrato: bool,
    /// Scale modulator levels with carrier volume. Driver-side state,
    /// not part of the setup word.
    pub scale_modulators: bool,
}

impl BankSetup {
    /// Suggested setup word for banks converted from generic AdLib data.
    pub const SUGGESTED_GENERIC: u16 = 0x0300;
    /// Suggested setup word for banks converted from the Windows 9x driver.
    pub const SUGGESTED_WIN9X: u16 = 0x0304;
    /// Suggested setup word for banks converted from DMX data.
    pub const SUGGESTED_DMX: u16 = 0x0002;
    /// Suggested setup word for banks converted from Apogee data.
    pub const SUGGESTED_APOGEE: u16 = 0x0003;
    /// Suggested setup word for banks converted from AIL data.
    pub const SUGGESTED_AIL: u16 = 0x0300;
    /// Suggested setup word for banks converted from IBK files.
    pub const SUGGESTED_IBK: u16 = 0x0301;
    /// Suggested setup word for banks converted from IMF data.
    pub const SUGGESTED_IMF: u16 = 0x0200;
    /// Suggested setup word for banks converted from CMF files.
    pub const SUGGESTED_CMF: u16 = 0x0201;

    /// Packs the setup into the dump's 16-bit word: `0xAABB`, high byte
    /// OPL flags, low byte volume model code.
    pub fn setup_word(&self) -> u16 {
        let mut flags = 0u16;
        if self.deep_tremolo {
            flags |= SETUP_FLAG_DEEP_TREMOLO;
        }
        if self.deep_vibrato {
            flags |= SETUP_FLAG_DEEP_VIBRATO;
        }
        (flags << 8) | u16::from(self.volume_model.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_setup_packs_to_zero() {
        assert_eq!(BankSetup::default().setup_word(), 0x0000);
    }

    #[test]
    fn setup_word_packs_flags_high_and_model_low() {
        let setup = BankSetup {
            volume_model: VolumeModel::Dmx,
            deep_tremolo: true,
            deep_vibrato: false,
            scale_modulators: false,
        };
        assert_eq!(setup.setup_word(), 0x0102);

        let setup = BankSetup {
            volume_model: VolumeModel::Win9x,
            deep_tremolo: true,
            deep_vibrato: true,
            scale_modulators: true,
        };
        assert_eq!(setup.setup_word(), 0x0304);
    }

    #[test]
    fn suggested_words_decode_to_known_models() {
        // Low byte is always a valid volume model code.
        for word in [
            BankSetup::SUGGESTED_GENERIC,
            BankSetup::SUGGESTED_WIN9X,
            BankSetup::SUGGESTED_DMX,
            BankSetup::SUGGESTED_APOGEE,
            BankSetup::SUGGESTED_IBK,
        ] {
            assert!((word & 0x00FF) <= u16::from(VolumeModel::Win9x.code()));
        }
        assert_eq!(
            BankSetup::SUGGESTED_DMX & 0x00FF,
            u16::from(VolumeModel::Dmx.code())
        );
    }

    #[test]
    fn scale_modulators_stays_out_of_the_word() {
        let with = BankSetup {
            scale_modulators: true,
            ..Default::default()
        };
        assert_eq!(with.setup_word(), BankSetup::default().setup_word());
    }
}
