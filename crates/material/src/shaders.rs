//! WGSL sources for the procedural materials.
//!
//! Stage sources are assembled from shared blocks so each stage is a
//! self-contained module. Other crates prepend [`VIEW_BLOCK`] and
//! [`LIGHTING_BLOCK`] to their own shaders to share the same view binding,
//! lights and fog.

/// Per-frame view binding. Layout matches [`ViewUniforms`](crate::ViewUniforms).
pub const VIEW_BLOCK: &str = r#"
struct View {
    view: mat4x4<f32>,
    proj: mat4x4<f32>,
    eye: vec4<f32>,
    fog_color: vec4<f32>,
    fog_range: vec4<f32>,
    viewport: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> frame: View;
"#;

/// Scene lights (white key, warm fill, white ambient) and linear fog.
/// Requires [`VIEW_BLOCK`].
pub const LIGHTING_BLOCK: &str = r#"
fn scene_lighting(normal: vec3<f32>) -> vec3<f32> {
    let key_dir = normalize(vec3<f32>(10.0, 1.0, 1.0));
    let fill_dir = normalize(vec3<f32>(-1.0, -1.0, -1.0));
    let key = max(dot(normal, key_dir), 0.0) * vec3<f32>(1.0, 1.0, 1.0);
    let fill = max(dot(normal, fill_dir), 0.0) * vec3<f32>(1.0, 0.679, 0.0395);
    let ambient = vec3<f32>(1.0, 1.0, 1.0);
    return ambient + key + fill;
}

fn apply_fog(color: vec3<f32>, world_position: vec3<f32>) -> vec3<f32> {
    if (frame.fog_range.z < 0.5) {
        return color;
    }
    let depth = -(frame.view * vec4<f32>(world_position, 1.0)).z;
    let factor = smoothstep(frame.fog_range.x, frame.fog_range.y, depth);
    return mix(color, frame.fog_color.rgb, vec3<f32>(factor));
}
"#;

const GRID_PARAMS: &str = r#"
struct GridParams {
    limits: vec2<f32>,
    time: f32,
    speed: f32,
};

@group(1) @binding(0)
var<uniform> grid: GridParams;
"#;

const GRID_VERTEX_MAIN: &str = r#"
struct GridVertex {
    @location(0) position: vec3<f32>,
    @location(1) color: vec4<f32>,
    @location(2) moveable: f32,
};

struct GridOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) color: vec4<f32>,
};

// GLSL-style modulo: result takes the sign of the divisor.
fn wrap_mod(x: f32, y: f32) -> f32 {
    return x - y * floor(x / y);
}

@vertex
fn vs_grid(vertex: GridVertex) -> GridOutput {
    var pos = vertex.position;
    if (floor(vertex.moveable + 0.5) > 0.5) {
        let len = grid.limits.y - grid.limits.x;
        let dist = grid.speed * grid.time;
        pos.z = wrap_mod((pos.z + dist) - grid.limits.x, len) + grid.limits.x;
    }
    var out: GridOutput;
    out.clip_position = frame.proj * frame.view * vec4<f32>(pos, 1.0);
    out.color = vertex.color;
    return out;
}
"#;

const GRID_FRAGMENT_MAIN: &str = r#"
struct GridOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) color: vec4<f32>,
};

@fragment
fn fs_grid(in: GridOutput) -> @location(0) vec4<f32> {
    return in.color;
}
"#;

const GROUND_PARAMS: &str = r#"
struct GroundParams {
    model: mat4x4<f32>,
    time: f32,
    _pad0: f32,
    _pad1: f32,
    _pad2: f32,
};

@group(1) @binding(0)
var<uniform> ground: GroundParams;

struct GroundOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) local_position: vec3<f32>,
};
"#;

const GROUND_VERTEX_MAIN: &str = r#"
@vertex
fn vs_ground(@location(0) position: vec3<f32>) -> GroundOutput {
    let t = ground.time;
    let s1 = sin((position.x + position.y) * 0.2 + t * 0.5);
    let s2 = sin((position.x - position.y) * 0.4 + t * 2.0);
    let s3 = sin((position.x + position.y) * -0.6 + t);
    let displaced = vec3<f32>(
        position.x,
        position.y,
        position.z + s1 * 5.0 + s2 * 2.0 + s3 * 4.0,
    );
    var out: GroundOutput;
    out.clip_position = frame.proj * frame.view * ground.model * vec4<f32>(displaced, 1.0);
    out.local_position = position;
    return out;
}
"#;

const GROUND_FRAGMENT_MAIN: &str = r#"
const DURATION: f32 = 8.0;
const DELAY: f32 = 4.0;

fn hsv_to_rgb(c: vec3<f32>) -> vec3<f32> {
    let k = vec4<f32>(1.0, 2.0 / 3.0, 1.0 / 3.0, 3.0);
    let p = abs(fract(c.xxx + k.xyz) * 6.0 - k.www);
    let rgb = clamp(p - k.xxx, vec3<f32>(0.0), vec3<f32>(1.0));
    return c.z * mix(k.xxx, rgb, vec3<f32>(c.y));
}

@fragment
fn fs_ground(in: GroundOutput) -> @location(0) vec4<f32> {
    let now = clamp((ground.time - DELAY) / DURATION, 0.0, 1.0);
    let fade = 1.0 - length(in.local_position.xy / vec2<f32>(512.0, 512.0));
    let opacity = max(fade * 0.6 * now, 0.0);
    var n = vec3<f32>(0.0, 0.0, 0.0);
    if (length(in.local_position) > 0.0) {
        n = normalize(in.local_position);
    }
    let hue = 0.5 + (n.x + n.y + n.x) / 40.0 + ground.time * 0.1;
    let rgb = hsv_to_rgb(vec3<f32>(hue, 0.4, 1.0));
    return vec4<f32>(rgb, opacity);
}
"#;

const FLOOR_PARAMS: &str = r#"
struct FloorParams {
    color: vec4<f32>,
    road_color: vec4<f32>,
    time: f32,
    speed: f32,
    line_overlay: f32,
    line_width: f32,
};

@group(1) @binding(0)
var<uniform> floor_params: FloorParams;

struct FloorOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_position: vec3<f32>,
};
"#;

const FLOOR_VERTEX_MAIN: &str = r#"
@vertex
fn vs_floor(@location(0) position: vec3<f32>) -> FloorOutput {
    var out: FloorOutput;
    out.clip_position = frame.proj * frame.view * vec4<f32>(position, 1.0);
    out.world_position = position;
    return out;
}
"#;

const FLOOR_FRAGMENT_MAIN: &str = r#"
// 0 on a line, 1 between lines. Width is in screen-space derivative units,
// so lines stay crisp at any distance.
fn grid_line(position: vec3<f32>, width: f32, cell: vec3<f32>) -> f32 {
    var coord = (position / cell).xz;
    coord.y = coord.y - floor_params.time * floor_params.speed / 2.0;
    let centre = vec2<f32>(0.5, 0.5);
    let dist = abs(fract(coord - centre) - centre) / fwidth(coord * width);
    return min(min(dist.x, dist.y), 1.0);
}

@fragment
fn fs_floor(in: FloorOutput) -> @location(0) vec4<f32> {
    let l = grid_line(in.world_position, floor_params.line_width, vec3<f32>(2.0, 2.0, 2.0));
    let lit = floor_params.color.rgb * scene_lighting(vec3<f32>(0.0, 1.0, 0.0));
    var color = lit;
    if (floor_params.line_overlay > 0.5) {
        let base = select(floor_params.road_color.rgb, vec3<f32>(0.0), abs(in.world_position.x) > 0.0);
        color = mix(lit, base, vec3<f32>(l));
    }
    return vec4<f32>(apply_fog(color, in.world_position), floor_params.color.a);
}
"#;

const STAR_PARAMS: &str = r#"
struct StarParams {
    time: f32,
    fade: f32,
    _pad0: f32,
    _pad1: f32,
};

@group(1) @binding(0)
var<uniform> stars: StarParams;

struct StarOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) color: vec3<f32>,
    @location(1) uv: vec2<f32>,
};
"#;

const STAR_VERTEX_MAIN: &str = r#"
struct StarInstance {
    @location(0) position: vec3<f32>,
    @location(1) color: vec3<f32>,
    @location(2) size: f32,
};

@vertex
fn vs_stars(@builtin(vertex_index) vertex_index: u32, star: StarInstance) -> StarOutput {
    var corners = array<vec2<f32>, 6>(
        vec2<f32>(-0.5, -0.5),
        vec2<f32>(0.5, -0.5),
        vec2<f32>(0.5, 0.5),
        vec2<f32>(-0.5, -0.5),
        vec2<f32>(0.5, 0.5),
        vec2<f32>(-0.5, 0.5),
    );
    let corner = corners[vertex_index % 6u];
    let view_position = frame.view * vec4<f32>(star.position, 1.0);
    let depth = max(-view_position.z, 0.001);
    let point_size = star.size * (30.0 / depth) * (3.0 + sin(stars.time + 100.0));
    let clip = frame.proj * view_position;
    let offset = corner * point_size * 2.0 * frame.viewport.zw * clip.w;

    var out: StarOutput;
    out.clip_position = vec4<f32>(clip.xy + offset, clip.z, clip.w);
    out.color = star.color;
    out.uv = corner + vec2<f32>(0.5, 0.5);
    return out;
}
"#;

const STAR_FRAGMENT_MAIN: &str = r#"
@fragment
fn fs_stars(in: StarOutput) -> @location(0) vec4<f32> {
    var opacity = 1.0;
    if (stars.fade > 0.5) {
        let d = length(in.uv - vec2<f32>(0.5, 0.5));
        opacity = 1.0 / (1.0 + exp(16.0 * (d - 0.25)));
    }
    return vec4<f32>(in.color * opacity, opacity);
}
"#;

pub fn grid_vertex() -> String {
    [VIEW_BLOCK, GRID_PARAMS, GRID_VERTEX_MAIN].concat()
}

pub fn grid_fragment() -> String {
    GRID_FRAGMENT_MAIN.to_string()
}

pub fn ground_vertex() -> String {
    [VIEW_BLOCK, GROUND_PARAMS, GROUND_VERTEX_MAIN].concat()
}

pub fn ground_fragment() -> String {
    [GROUND_PARAMS, GROUND_FRAGMENT_MAIN].concat()
}

pub fn floor_vertex() -> String {
    [VIEW_BLOCK, FLOOR_PARAMS, FLOOR_VERTEX_MAIN].concat()
}

pub fn floor_fragment() -> String {
    [VIEW_BLOCK, LIGHTING_BLOCK, FLOOR_PARAMS, FLOOR_FRAGMENT_MAIN].concat()
}

pub fn star_vertex() -> String {
    [VIEW_BLOCK, STAR_PARAMS, STAR_VERTEX_MAIN].concat()
}

pub fn star_fragment() -> String {
    [STAR_PARAMS, STAR_FRAGMENT_MAIN].concat()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::{FloorMaterial, GridMaterial, GroundSketchMaterial, MaterialAdapter, StarfieldMaterial};

    /// Parse and validate a WGSL module, asserting the entry point exists.
    pub(crate) fn validate_wgsl(source: &str, entry_point: &str) {
        let module = naga::front::wgsl::parse_str(source)
            .unwrap_or_else(|e| panic!("parse failed:\n{}", e.emit_to_string(source)));
        naga::valid::Validator::new(
            naga::valid::ValidationFlags::all(),
            naga::valid::Capabilities::all(),
        )
        .validate(&module)
        .unwrap_or_else(|e| panic!("validation failed: {e:?}"));
        assert!(
            module.entry_points.iter().any(|ep| ep.name == entry_point),
            "missing entry point {entry_point}"
        );
    }

    fn validate_adapter(adapter: &dyn MaterialAdapter) {
        let program = adapter.program();
        validate_wgsl(&program.vertex().source, program.vertex().entry_point);
        validate_wgsl(&program.fragment().source, program.fragment().entry_point);
    }

    #[test]
    fn grid_program_is_valid_wgsl() {
        validate_adapter(&GridMaterial::new(-100.0, 100.0, 1.0).unwrap());
    }

    #[test]
    fn ground_program_is_valid_wgsl() {
        validate_adapter(&GroundSketchMaterial::new(glam::Mat4::IDENTITY).unwrap());
    }

    #[test]
    fn floor_program_is_valid_wgsl() {
        validate_adapter(&FloorMaterial::new([0.5, 0.0, 0.1], 6.0, true).unwrap());
    }

    #[test]
    fn star_program_is_valid_wgsl() {
        validate_adapter(&StarfieldMaterial::new(true).unwrap());
    }

    #[test]
    fn shared_blocks_compose() {
        let main = r#"
@fragment
fn fs() -> @location(0) vec4<f32> {
    let lit = scene_lighting(vec3<f32>(0.0, 1.0, 0.0));
    return vec4<f32>(apply_fog(lit, vec3<f32>(0.0)), 1.0);
}
"#;
        let source = [VIEW_BLOCK, LIGHTING_BLOCK, main].concat();
        validate_wgsl(&source, "fs");
    }
}
