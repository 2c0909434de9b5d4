use ninja_regen::status::StatusSink;
use ninja_regen::types::PhaseMarker;

/// Status sink that records markers instead of printing them.
#[derive(Debug, Default)]
pub struct CollectingStatus {
    pub markers: Vec<PhaseMarker>,
}

impl CollectingStatus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.markers.iter().map(|m| m.to_string()).collect()
    }
}

impl StatusSink for CollectingStatus {
    fn phase_marker(&mut self, marker: PhaseMarker) {
        self.markers.push(marker);
    }
}
