use neoleon_material::MaterialAdapter;

/// Negative or non-finite frame deltas count as zero.
fn sanitize(delta_seconds: f32) -> f32 {
    if delta_seconds.is_finite() && delta_seconds > 0.0 {
        delta_seconds
    } else {
        0.0
    }
}

/// Per-frame update step: advance every adapter's time by `delta_seconds`.
///
/// Returns the delta actually applied. Never blocks and touches nothing but
/// the adapters it is handed.
pub fn advance_frame(delta_seconds: f32, adapters: &mut [&mut dyn MaterialAdapter]) -> f32 {
    let delta = sanitize(delta_seconds);
    for adapter in adapters.iter_mut() {
        let time = adapter.time();
        adapter.set_time(time + delta);
    }
    delta
}

/// Elapsed scene time and frame count.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameClock {
    elapsed: f64,
    frames: u64,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one frame. Returns the sanitized delta.
    pub fn advance(&mut self, delta_seconds: f32) -> f32 {
        let delta = sanitize(delta_seconds);
        self.elapsed += delta as f64;
        self.frames += 1;
        delta
    }

    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use neoleon_material::{GridMaterial, StarfieldMaterial};

    #[test]
    fn advances_every_adapter() {
        let mut grid = GridMaterial::new(-100.0, 100.0, 1.0).unwrap();
        let mut stars = StarfieldMaterial::new(true).unwrap();
        stars.set_time(10.0);
        let applied = advance_frame(0.5, &mut [&mut grid, &mut stars]);
        assert_eq!(applied, 0.5);
        assert_eq!(grid.time(), 0.5);
        assert_eq!(stars.time(), 10.5);
    }

    #[test]
    fn time_never_decreases() {
        let mut grid = GridMaterial::new(-100.0, 100.0, 1.0).unwrap();
        let mut last = 0.0;
        for delta in [0.016, -1.0, f32::NAN, 0.0, f32::INFINITY, 0.033] {
            advance_frame(delta, &mut [&mut grid]);
            assert!(grid.time() >= last);
            assert!(grid.time().is_finite());
            last = grid.time();
        }
        assert!((grid.time() - 0.049).abs() < 1e-6);
    }

    #[test]
    fn long_stall_is_applied_in_full() {
        let mut grid = GridMaterial::new(-100.0, 100.0, 1.0).unwrap();
        advance_frame(0.016, &mut [&mut grid]);
        let applied = advance_frame(4.0, &mut [&mut grid]);
        assert_eq!(applied, 4.0);
        assert!((grid.time() - 4.016).abs() < 1e-6);
    }

    #[test]
    fn empty_adapter_list_is_fine() {
        assert_eq!(advance_frame(1.0, &mut []), 1.0);
    }

    #[test]
    fn clock_counts_frames() {
        let mut clock = FrameClock::new();
        clock.advance(0.25);
        clock.advance(-3.0);
        clock.advance(0.25);
        assert_eq!(clock.frames(), 3);
        assert_eq!(clock.elapsed(), 0.5);
    }
}
