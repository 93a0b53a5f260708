// Copyright (c) 2026 rezky_nightky

use crate::particle::ParticleKind;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SkyMode {
    #[default]
    Clear,
    Partly,
    Cloudy,
    Rain,
    Snow,
}

impl SkyMode {
    #[cfg(test)]
    pub const ALL: [SkyMode; 5] = [
        SkyMode::Clear,
        SkyMode::Partly,
        SkyMode::Cloudy,
        SkyMode::Rain,
        SkyMode::Snow,
    ];

    /// Particle kind the effects layer draws for this mode.
    pub fn particle_kind(self) -> ParticleKind {
        match self {
            SkyMode::Snow => ParticleKind::Snow,
            SkyMode::Rain => ParticleKind::Rain,
            SkyMode::Clear => ParticleKind::Sun,
            SkyMode::Partly | SkyMode::Cloudy => ParticleKind::Cloud,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SkyMode::Clear => "clear",
            SkyMode::Partly => "partly",
            SkyMode::Cloudy => "cloudy",
            SkyMode::Rain => "rain",
            SkyMode::Snow => "snow",
        }
    }

    pub fn has_ambient_wash(self) -> bool {
        matches!(self, SkyMode::Rain | SkyMode::Snow)
    }
}

// Checked top to bottom; the first group with a hit decides the mode.
const KEYWORD_GROUPS: [(SkyMode, &[&str]); 4] = [
    (SkyMode::Snow, &["snow", "kar", "sleet", "blizzard", "buz"]),
    (
        SkyMode::Rain,
        &[
            "rain", "yağmur", "drizzle", "shower", "sağanak", "thunder", "storm", "fırtına",
        ],
    ),
    (SkyMode::Partly, &["partly", "parçalı", "scattered", "broken"]),
    (SkyMode::Cloudy, &["cloud", "bulut", "overcast", "çok bulut"]),
];

pub fn classify(condition: Option<&str>) -> SkyMode {
    let Some(text) = condition else {
        return SkyMode::Clear;
    };
    let text = text.trim().to_lowercase();
    if text.is_empty() {
        return SkyMode::Clear;
    }

    KEYWORD_GROUPS
        .iter()
        .find(|(_, words)| words.iter().any(|w| text.contains(w)))
        .map(|(mode, _)| *mode)
        .unwrap_or(SkyMode::Clear)
}
