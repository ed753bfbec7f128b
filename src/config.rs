//! Configuration Resolver
//!
//! Turns the host's named options into the engine's machine mode. Each option
//! resolves on its own; anything absent or unrecognized falls back to the
//! first value in its table. Resolution always starts from scratch, so it is
//! safe to rerun whenever the host reports a change.

use crate::host::OptionSource;

/// Engine mode bits
pub mod mode_bits {
    /// Hardware generation field
    pub const MODEL: u32 = 0x0000_0003;
    pub const MSX1: u32 = 0x0000_0000;
    pub const MSX2: u32 = 0x0000_0001;
    pub const MSX2P: u32 = 0x0000_0002;
    /// Video timing bit
    pub const VIDEO: u32 = 0x0000_0004;
    pub const NTSC: u32 = 0x0000_0000;
    pub const PAL: u32 = 0x0000_0004;
    /// Cartridge mapper detection heuristic
    pub const GUESSA: u32 = 0x0080_0000;
    pub const GUESSB: u32 = 0x0100_0000;
}

pub const OPT_MODE: &str = "fmsx_mode";
pub const OPT_VIDEO_MODE: &str = "fmsx_video_mode";
pub const OPT_MAPPER_TYPE: &str = "fmsx_mapper_type_mode";

/// A host-visible option. The first value is the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoreOption {
    pub key: &'static str,
    pub description: &'static str,
    pub values: &'static [&'static str],
}

impl CoreOption {
    /// libretro variable declaration: `"Description; A|B|C"`.
    pub fn declaration(&self) -> String {
        format!("{}; {}", self.description, self.values.join("|"))
    }

    pub fn default_value(&self) -> &'static str {
        self.values[0]
    }
}

/// Options announced to the host.
pub const OPTIONS: [CoreOption; 3] = [
    CoreOption {
        key: OPT_MODE,
        description: "MSX Mode",
        values: &["MSX1", "MSX2", "MSX2+"],
    },
    CoreOption {
        key: OPT_VIDEO_MODE,
        description: "MSX Video Mode",
        values: &["NTSC", "PAL"],
    },
    CoreOption {
        key: OPT_MAPPER_TYPE,
        description: "MSX Mapper Type Mode",
        values: &["Guess Mapper Type A", "Guess Mapper Type B"],
    },
];

/// Emulated hardware generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Generation {
    #[default]
    Msx1,
    Msx2,
    Msx2Plus,
}

impl Generation {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "MSX1" => Some(Generation::Msx1),
            "MSX2" => Some(Generation::Msx2),
            "MSX2+" => Some(Generation::Msx2Plus),
            _ => None,
        }
    }

    fn bits(self) -> u32 {
        match self {
            Generation::Msx1 => mode_bits::MSX1,
            Generation::Msx2 => mode_bits::MSX2,
            Generation::Msx2Plus => mode_bits::MSX2P,
        }
    }
}

/// Video timing standard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VideoStandard {
    #[default]
    Ntsc,
    Pal,
}

impl VideoStandard {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "NTSC" => Some(VideoStandard::Ntsc),
            "PAL" => Some(VideoStandard::Pal),
            _ => None,
        }
    }
}

/// Cartridge mapper detection heuristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MapperGuess {
    #[default]
    A,
    B,
}

impl MapperGuess {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Guess Mapper Type A" | "Guess A" => Some(MapperGuess::A),
            "Guess Mapper Type B" | "Guess B" => Some(MapperGuess::B),
            _ => None,
        }
    }
}

/// Resolved machine mode: one choice from each category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MachineMode {
    pub generation: Generation,
    pub video: VideoStandard,
    pub mapper: MapperGuess,
}

impl MachineMode {
    /// Engine bitmask.
    pub fn bits(self) -> u32 {
        let video = match self.video {
            VideoStandard::Ntsc => mode_bits::NTSC,
            VideoStandard::Pal => mode_bits::PAL,
        };
        let mapper = match self.mapper {
            MapperGuess::A => mode_bits::GUESSA,
            MapperGuess::B => mode_bits::GUESSB,
        };
        self.generation.bits() | video | mapper
    }

    /// Decode an engine bitmask. `None` unless exactly one value per
    /// category is set.
    #[cfg(test)]
    pub(crate) fn from_bits(bits: u32) -> Option<Self> {
        let generation = match bits & mode_bits::MODEL {
            mode_bits::MSX1 => Generation::Msx1,
            mode_bits::MSX2 => Generation::Msx2,
            mode_bits::MSX2P => Generation::Msx2Plus,
            _ => return None,
        };
        let video = if bits & mode_bits::VIDEO == mode_bits::PAL {
            VideoStandard::Pal
        } else {
            VideoStandard::Ntsc
        };
        let mapper = match (bits & mode_bits::GUESSA != 0, bits & mode_bits::GUESSB != 0) {
            (true, false) => MapperGuess::A,
            (false, true) => MapperGuess::B,
            _ => return None,
        };
        Some(Self {
            generation,
            video,
            mapper,
        })
    }
}

impl std::fmt::Display for MachineMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let generation = match self.generation {
            Generation::Msx1 => "MSX1",
            Generation::Msx2 => "MSX2",
            Generation::Msx2Plus => "MSX2+",
        };
        let video = match self.video {
            VideoStandard::Ntsc => "NTSC",
            VideoStandard::Pal => "PAL",
        };
        let mapper = match self.mapper {
            MapperGuess::A => "A",
            MapperGuess::B => "B",
        };
        write!(f, "{generation}/{video}/guess-{mapper} ({:#010x})", self.bits())
    }
}

fn lookup<S, T>(source: &S, key: &str, parse: fn(&str) -> Option<T>) -> Option<T>
where
    S: OptionSource + ?Sized,
{
    source.variable(key).as_deref().and_then(parse)
}

/// Resolve the machine mode from host options.
pub fn resolve<S: OptionSource + ?Sized>(source: &S) -> MachineMode {
    MachineMode {
        generation: lookup(source, OPT_MODE, Generation::parse).unwrap_or_default(),
        video: lookup(source, OPT_VIDEO_MODE, VideoStandard::parse).unwrap_or_default(),
        mapper: lookup(source, OPT_MAPPER_TYPE, MapperGuess::parse).unwrap_or_default(),
    }
}
