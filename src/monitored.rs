//! Catalogue of the per-run profiles checked by the bad-run batch

use serde::{Deserialize, Serialize};
use std::fmt;

/// Event-level quantity averaged per run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventQuantity {
    RefMult,
    TofTrayMultiplicity,
    TofMatched,
    PrimaryTracks,
    GlobalTracks,
    ZdcAdc,
    BbcAdc,
    VertexX,
    VertexY,
    VertexZ,
}

/// Track-level quantity averaged per run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackQuantity {
    Phi,
    Pt,
    NHits,
    Dca,
    Beta,
    DeDx,
}

/// One monitored per-run profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MonitoredQuantity {
    Event(EventQuantity),
    Track(TrackQuantity),
    /// `<sin(n phi)>` for harmonic `n` in `1..=3`
    SinHarmonic(u8),
    /// `<cos(n phi)>` for harmonic `n` in `1..=3`
    CosHarmonic(u8),
}

const EVENT_QUANTITIES: [EventQuantity; 10] = [
    EventQuantity::RefMult,
    EventQuantity::TofTrayMultiplicity,
    EventQuantity::TofMatched,
    EventQuantity::PrimaryTracks,
    EventQuantity::GlobalTracks,
    EventQuantity::ZdcAdc,
    EventQuantity::BbcAdc,
    EventQuantity::VertexX,
    EventQuantity::VertexY,
    EventQuantity::VertexZ,
];

const TRACK_QUANTITIES: [TrackQuantity; 6] = [
    TrackQuantity::Phi,
    TrackQuantity::Pt,
    TrackQuantity::NHits,
    TrackQuantity::Dca,
    TrackQuantity::Beta,
    TrackQuantity::DeDx,
];

const HARMONICS: u8 = 3;

impl EventQuantity {
    fn index(self) -> usize {
        EVENT_QUANTITIES
            .iter()
            .position(|q| *q == self)
            .unwrap_or_default()
    }

    fn title(self) -> &'static str {
        match self {
            EventQuantity::RefMult => "Profile of refMult",
            EventQuantity::TofTrayMultiplicity => "Profile of TOF tray multiplicity",
            EventQuantity::TofMatched => "Profile of TOF-matched tracks",
            EventQuantity::PrimaryTracks => "Profile of number of primary tracks",
            EventQuantity::GlobalTracks => "Profile of number of global tracks",
            EventQuantity::ZdcAdc => "Profile of ZDC ADC",
            EventQuantity::BbcAdc => "Profile of BBC ADC",
            EventQuantity::VertexX => "Profile of primary vertex X position",
            EventQuantity::VertexY => "Profile of primary vertex Y position",
            EventQuantity::VertexZ => "Profile of primary vertex Z position",
        }
    }
}

impl TrackQuantity {
    fn index(self) -> usize {
        TRACK_QUANTITIES
            .iter()
            .position(|q| *q == self)
            .unwrap_or_default()
    }

    fn title(self) -> &'static str {
        match self {
            TrackQuantity::Phi => "Profile of track phi",
            TrackQuantity::Pt => "Profile of track pT",
            TrackQuantity::NHits => "Profile of track nHits",
            TrackQuantity::Dca => "Profile of track DCA",
            TrackQuantity::Beta => "Profile of track beta",
            TrackQuantity::DeDx => "Profile of track dE/dx",
        }
    }
}

impl MonitoredQuantity {
    /// Every monitored profile, in the order the batch visits them
    ///
    /// Event, track and harmonic profiles are interleaved by index:
    /// `hEventProfile_0, hTrackProfile_0, hSinPhi1, hCosPhi1, hEventProfile_1, ...`
    pub fn all() -> Vec<MonitoredQuantity> {
        let mut out = Vec::with_capacity(EVENT_QUANTITIES.len() + TRACK_QUANTITIES.len() + 6);
        for (i, event) in EVENT_QUANTITIES.iter().enumerate() {
            out.push(MonitoredQuantity::Event(*event));
            if let Some(track) = TRACK_QUANTITIES.get(i) {
                out.push(MonitoredQuantity::Track(*track));
            }
            if (i as u8) < HARMONICS {
                out.push(MonitoredQuantity::SinHarmonic(i as u8 + 1));
                out.push(MonitoredQuantity::CosHarmonic(i as u8 + 1));
            }
        }
        out
    }

    /// Name of the profile in the store
    pub fn profile_name(&self) -> String {
        match self {
            MonitoredQuantity::Event(q) => format!("hEventProfile_{}", q.index()),
            MonitoredQuantity::Track(q) => format!("hTrackProfile_{}", q.index()),
            MonitoredQuantity::SinHarmonic(n) => format!("hSinPhi{}", n),
            MonitoredQuantity::CosHarmonic(n) => format!("hCosPhi{}", n),
        }
    }

    /// Catalogue entry stored under `name`
    pub fn from_profile_name(name: &str) -> Option<MonitoredQuantity> {
        Self::all().into_iter().find(|q| q.profile_name() == name)
    }

    pub fn title(&self) -> String {
        match self {
            MonitoredQuantity::Event(q) => q.title().to_string(),
            MonitoredQuantity::Track(q) => q.title().to_string(),
            MonitoredQuantity::SinHarmonic(n) => format!("Profile of <sin({} phi)>", n),
            MonitoredQuantity::CosHarmonic(n) => format!("Profile of <cos({} phi)>", n),
        }
    }
}

impl fmt::Display for MonitoredQuantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.profile_name())
    }
}
