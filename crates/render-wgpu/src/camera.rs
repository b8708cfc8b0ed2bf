use glam::Vec3;
use neoleon_render::RenderView;

/// Orbit camera around a fixed target point.
/// Camera motion lives outside the scene: it never touches material time.
#[derive(Debug, Clone, PartialEq)]
pub struct OrbitCamera {
    pub target: Vec3,
    pub distance: f32,
    /// Radians around +Y, 0 looking down -Z.
    pub yaw: f32,
    /// Radians above the horizon.
    pub pitch: f32,
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    pub sensitivity: f32,
    pub min_distance: f32,
    pub max_distance: f32,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self::from_view(&RenderView::default())
    }
}

impl OrbitCamera {
    pub fn from_view(view: &RenderView) -> Self {
        let offset = view.eye - view.target;
        let distance = offset.length().max(1e-3);
        Self {
            target: view.target,
            distance,
            yaw: offset.x.atan2(offset.z),
            pitch: (offset.y / distance).clamp(-1.0, 1.0).asin(),
            fov_degrees: view.fov_degrees,
            near: view.near,
            far: view.far,
            sensitivity: 0.005,
            min_distance: 5.0,
            max_distance: 500.0,
        }
    }

    pub fn eye(&self) -> Vec3 {
        let ring = self.distance * self.pitch.cos();
        self.target
            + Vec3::new(
                ring * self.yaw.sin(),
                self.distance * self.pitch.sin(),
                ring * self.yaw.cos(),
            )
    }

    /// Drag by `(dx, dy)` pixels.
    pub fn rotate(&mut self, dx: f32, dy: f32) {
        self.yaw -= dx * self.sensitivity;
        self.pitch += dy * self.sensitivity;
        self.pitch = self
            .pitch
            .clamp(-89.0_f32.to_radians(), 89.0_f32.to_radians());
    }

    /// Slide the target in the view plane by `(dx, dy)` pixels.
    pub fn pan(&mut self, dx: f32, dy: f32) {
        let forward = (self.target - self.eye()).normalize_or_zero();
        let right = forward.cross(Vec3::Y).normalize_or_zero();
        let up = right.cross(forward);
        let scale = self.distance * self.sensitivity * 0.2;
        self.target += (up * dy - right * dx) * scale;
    }

    /// Positive `steps` move closer.
    pub fn zoom(&mut self, steps: f32) {
        self.distance = (self.distance * 0.9_f32.powf(steps))
            .clamp(self.min_distance, self.max_distance);
    }

    pub fn view(&self) -> RenderView {
        RenderView {
            eye: self.eye(),
            target: self.target,
            fov_degrees: self.fov_degrees,
            near: self.near,
            far: self.far,
        }
    }
}
