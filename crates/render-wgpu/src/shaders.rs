//! Backend-only WGSL: city blocks, terrain wireframe and the post chain.
//! Material shaders live in `neoleon_material::shaders`.

use neoleon_material::shaders::{LIGHTING_BLOCK, VIEW_BLOCK};

const CITY_MAIN: &str = r#"
struct CityParams {
    color: vec4<f32>,
};

@group(1) @binding(0)
var<uniform> city: CityParams;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
};

struct InstanceInput {
    @location(2) model_0: vec4<f32>,
    @location(3) model_1: vec4<f32>,
    @location(4) model_2: vec4<f32>,
    @location(5) model_3: vec4<f32>,
};

struct CityOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_position: vec3<f32>,
    @location(1) @interpolate(flat) normal: vec3<f32>,
};

@vertex
fn vs_city(vertex: VertexInput, instance: InstanceInput) -> CityOutput {
    let model = mat4x4<f32>(
        instance.model_0,
        instance.model_1,
        instance.model_2,
        instance.model_3,
    );
    let world = model * vec4<f32>(vertex.position, 1.0);

    var out: CityOutput;
    out.clip_position = frame.proj * frame.view * world;
    out.world_position = world.xyz;
    // Axis-aligned scale only, so the model matrix keeps normals' direction.
    out.normal = normalize((model * vec4<f32>(vertex.normal, 0.0)).xyz);
    return out;
}

@fragment
fn fs_city(in: CityOutput) -> @location(0) vec4<f32> {
    let lit = city.color.rgb * scene_lighting(in.normal);
    return vec4<f32>(apply_fog(lit, in.world_position), city.color.a);
}
"#;

const TERRAIN_MAIN: &str = r#"
struct TerrainParams {
    model: mat4x4<f32>,
    color: vec4<f32>,
};

@group(1) @binding(0)
var<uniform> terrain: TerrainParams;

@vertex
fn vs_terrain(@location(0) position: vec3<f32>) -> @builtin(position) vec4<f32> {
    return frame.proj * frame.view * terrain.model * vec4<f32>(position, 1.0);
}

@fragment
fn fs_terrain() -> @location(0) vec4<f32> {
    return terrain.color;
}
"#;

/// Full-screen triangle shared by every post pass.
const FULLSCREEN: &str = r#"
struct ScreenOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@vertex
fn vs_fullscreen(@builtin(vertex_index) vertex_index: u32) -> ScreenOutput {
    let x = f32((vertex_index << 1u) & 2u);
    let y = f32(vertex_index & 2u);
    var out: ScreenOutput;
    out.clip_position = vec4<f32>(x * 2.0 - 1.0, 1.0 - y * 2.0, 0.0, 1.0);
    out.uv = vec2<f32>(x, y);
    return out;
}
"#;

const POST_BINDINGS: &str = r#"
// bloom: (strength, threshold, radius, 0)
// film: (noise, scanlines, scanline count, grayscale)
// pass_info: (time, 0, blur direction in uv units)
struct PostParams {
    bloom: vec4<f32>,
    film: vec4<f32>,
    pass_info: vec4<f32>,
};

@group(0) @binding(0)
var input_texture: texture_2d<f32>;
@group(0) @binding(1)
var linear_sampler: sampler;
@group(0) @binding(2)
var<uniform> post: PostParams;
"#;

const BRIGHT_MAIN: &str = r#"
@fragment
fn fs_bright(in: ScreenOutput) -> @location(0) vec4<f32> {
    let color = textureSample(input_texture, linear_sampler, in.uv);
    let luma = dot(color.rgb, vec3<f32>(0.299, 0.587, 0.114));
    let threshold = post.bloom.y;
    let keep = smoothstep(threshold, threshold + 0.01, luma);
    return vec4<f32>(color.rgb * keep, 1.0);
}
"#;

const BLUR_MAIN: &str = r#"
@fragment
fn fs_blur(in: ScreenOutput) -> @location(0) vec4<f32> {
    var weights = array<f32, 5>(0.227027, 0.1945946, 0.1216216, 0.054054, 0.016216);
    let spread = 1.0 + post.bloom.z * 4.0;
    let stride = post.pass_info.zw * spread;
    var sum = textureSample(input_texture, linear_sampler, in.uv).rgb * weights[0];
    for (var i = 1; i < 5; i = i + 1) {
        let offset = stride * f32(i);
        sum += textureSample(input_texture, linear_sampler, in.uv + offset).rgb * weights[i];
        sum += textureSample(input_texture, linear_sampler, in.uv - offset).rgb * weights[i];
    }
    return vec4<f32>(sum, 1.0);
}
"#;

const COMPOSITE_MAIN: &str = r#"
@group(1) @binding(0)
var bloom_texture: texture_2d<f32>;

fn film_random(co: vec2<f32>) -> f32 {
    let a = 12.9898;
    let b = 78.233;
    let c = 43758.5453;
    let dt = dot(co, vec2<f32>(a, b));
    let sn = dt % 3.14;
    return fract(sin(sn) * c);
}

@fragment
fn fs_composite(in: ScreenOutput) -> @location(0) vec4<f32> {
    let scene = textureSample(input_texture, linear_sampler, in.uv).rgb;
    let glow = textureSample(bloom_texture, linear_sampler, in.uv).rgb;

    // Film grain and scanlines on the unbloomed scene.
    let noise = film_random(in.uv + vec2<f32>(post.pass_info.x, post.pass_info.x));
    var film = scene + scene * clamp(0.1 + noise, 0.0, 1.0);
    let sc = vec2<f32>(sin(in.uv.y * post.film.z), cos(in.uv.y * post.film.z));
    film += scene * vec3<f32>(sc.x, sc.y, sc.x) * post.film.y;
    film = scene + clamp(post.film.x, 0.0, 1.0) * (film - scene);
    if (post.film.w > 0.5) {
        film = vec3<f32>(film.r * 0.3 + film.g * 0.59 + film.b * 0.11);
    }

    let result = film + glow * post.bloom.x;
    return vec4<f32>(clamp(result, vec3<f32>(0.0), vec3<f32>(1.0)), 1.0);
}
"#;

pub fn city_shader() -> String {
    [VIEW_BLOCK, LIGHTING_BLOCK, CITY_MAIN].concat()
}

pub fn terrain_shader() -> String {
    [VIEW_BLOCK, TERRAIN_MAIN].concat()
}

pub fn bright_shader() -> String {
    [FULLSCREEN, POST_BINDINGS, BRIGHT_MAIN].concat()
}

pub fn blur_shader() -> String {
    [FULLSCREEN, POST_BINDINGS, BLUR_MAIN].concat()
}

pub fn composite_shader() -> String {
    [FULLSCREEN, POST_BINDINGS, COMPOSITE_MAIN].concat()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validate(source: &str, entry_points: &[&str]) {
        let module = naga::front::wgsl::parse_str(source)
            .unwrap_or_else(|e| panic!("parse failed:\n{}", e.emit_to_string(source)));
        naga::valid::Validator::new(
            naga::valid::ValidationFlags::all(),
            naga::valid::Capabilities::all(),
        )
        .validate(&module)
        .unwrap_or_else(|e| panic!("validation failed: {e:?}"));
        for entry in entry_points {
            assert!(
                module.entry_points.iter().any(|ep| ep.name == *entry),
                "missing entry point {entry}"
            );
        }
    }

    #[test]
    fn city_shader_is_valid() {
        validate(&city_shader(), &["vs_city", "fs_city"]);
    }

    #[test]
    fn terrain_shader_is_valid() {
        validate(&terrain_shader(), &["vs_terrain", "fs_terrain"]);
    }

    #[test]
    fn post_shaders_are_valid() {
        validate(&bright_shader(), &["vs_fullscreen", "fs_bright"]);
        validate(&blur_shader(), &["vs_fullscreen", "fs_blur"]);
        validate(&composite_shader(), &["vs_fullscreen", "fs_composite"]);
    }

    #[test]
    fn composite_adds_bloom_after_film() {
        let source = composite_shader();
        let film = source.find("film_random(in.uv").unwrap();
        let grayscale = source.find("post.film.w").unwrap();
        let bloom = source.find("glow * post.bloom.x").unwrap();
        assert!(film < bloom && grayscale < bloom);
    }
}
