// renderer/programs.rs
// Reference-counted cache of linked programs keyed by their generated
// parameter string.

use std::collections::HashMap;

use crate::renderer::error::RenderError;
use crate::renderer::gl::{GlContext, GlProgram, GlShader, ShaderStage};
use crate::renderer::material::Material;
use crate::renderer::program::{source_id, Program, ProgramHandle, ProgramParameters};
use crate::renderer::shader_lib::{self, STANDARD_ATTRIBUTES, STANDARD_UNIFORMS};
use crate::renderer::uniforms::Uniforms;

#[derive(Debug, Default)]
pub struct ProgramCache {
    programs: HashMap<ProgramHandle, Program>,
    by_key: HashMap<String, ProgramHandle>,
    next_id: u32,
}

impl ProgramCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the program for `parameters`, linking it on first use.
    /// Every successful call takes one reference that `release` gives back.
    pub fn acquire(
        &mut self,
        gl: &mut dyn GlContext,
        material: &Material,
        parameters: &ProgramParameters,
        uniforms: &Uniforms,
    ) -> Result<ProgramHandle, RenderError> {
        let key = parameters.cache_key(&source_id(&material.kind));
        if let Some(&handle) = self.by_key.get(&key) {
            if let Some(program) = self.programs.get_mut(&handle) {
                program.used_times += 1;
                return Ok(handle);
            }
        }

        let shader_name = if material.name.is_empty() {
            material.kind.name().to_string()
        } else {
            material.name.clone()
        };
        let (vertex_body, fragment_body) = shader_lib::sources(&material.kind);
        let vertex_source = parameters.vertex_prefix(&shader_name) + &vertex_body;
        let fragment_source = parameters.fragment_prefix(&shader_name) + &fragment_body;

        let gl_program = link(gl, &vertex_source, &fragment_source)?;

        let mut attribute_names: Vec<&str> = STANDARD_ATTRIBUTES.to_vec();
        if let Some(shader) = material.shader_material() {
            attribute_names.extend(shader.attributes.iter().map(String::as_str));
        }
        let mut attributes = Vec::new();
        for name in attribute_names {
            if attributes.iter().any(|(existing, _): &(String, u32)| existing == name) {
                continue;
            }
            if let Some(location) = gl.get_attrib_location(gl_program, name) {
                attributes.push((name.to_string(), location));
            }
        }

        let mut locations = HashMap::new();
        let names = STANDARD_UNIFORMS
            .iter()
            .copied()
            .chain(uniforms.keys().map(String::as_str));
        for name in names {
            if let Some(location) = gl.get_uniform_location(gl_program, name) {
                locations.insert(name.to_string(), location);
            }
        }

        self.next_id += 1;
        let handle = ProgramHandle::new(self.next_id);
        log::debug!(
            "Linked program {} for {} ({} attributes, {} uniforms)",
            handle.id(),
            shader_name,
            attributes.len(),
            locations.len()
        );
        self.programs.insert(
            handle,
            Program::new(handle, key.clone(), gl_program, attributes, locations),
        );
        self.by_key.insert(key, handle);
        Ok(handle)
    }

    /// Drops one reference. The GL program is deleted with the last one.
    pub fn release(&mut self, gl: &mut dyn GlContext, handle: ProgramHandle) {
        let Some(program) = self.programs.get_mut(&handle) else {
            return;
        };
        program.used_times = program.used_times.saturating_sub(1);
        if program.used_times > 0 {
            return;
        }
        if let Some(program) = self.programs.remove(&handle) {
            gl.delete_program(program.gl_program());
            self.by_key.remove(program.key());
            log::debug!("Deleted program {}", handle.id());
        }
    }

    pub fn get(&self, handle: ProgramHandle) -> Option<&Program> {
        self.programs.get(&handle)
    }

    pub fn get_mut(&mut self, handle: ProgramHandle) -> Option<&mut Program> {
        self.programs.get_mut(&handle)
    }

    pub fn count(&self) -> usize {
        self.programs.len()
    }
}

fn compile(
    gl: &mut dyn GlContext,
    stage: ShaderStage,
    source: &str,
) -> Result<GlShader, RenderError> {
    let shader = gl
        .create_shader(stage)
        .map_err(|err| RenderError::ResourceCreation(format!("{} shader: {}", stage.label(), err)))?;
    gl.shader_source(shader, source);
    gl.compile_shader(shader);
    if gl.shader_compile_status(shader) {
        return Ok(shader);
    }

    let info = gl.shader_info_log(shader);
    log::error!(
        "Could not compile {} shader:\n{}\n{}",
        stage.label(),
        info,
        numbered(source)
    );
    gl.delete_shader(shader);
    Err(RenderError::ShaderCompile { stage, log: info })
}

pub(crate) fn link(gl: &mut dyn GlContext, vertex: &str, fragment: &str) -> Result<GlProgram, RenderError> {
    let vertex_shader = compile(gl, ShaderStage::Vertex, vertex)?;
    let fragment_shader = match compile(gl, ShaderStage::Fragment, fragment) {
        Ok(shader) => shader,
        Err(err) => {
            gl.delete_shader(vertex_shader);
            return Err(err);
        }
    };

    let program = match gl.create_program() {
        Ok(program) => program,
        Err(err) => {
            gl.delete_shader(vertex_shader);
            gl.delete_shader(fragment_shader);
            return Err(RenderError::ResourceCreation(format!("program: {}", err)));
        }
    };
    gl.attach_shader(program, vertex_shader);
    gl.attach_shader(program, fragment_shader);
    gl.link_program(program);
    gl.delete_shader(vertex_shader);
    gl.delete_shader(fragment_shader);

    if !gl.program_link_status(program) {
        let info = gl.program_info_log(program);
        log::error!("Could not link program: {}", info);
        gl.delete_program(program);
        return Err(RenderError::ProgramLink { log: info });
    }
    Ok(program)
}

fn numbered(source: &str) -> String {
    source
        .lines()
        .enumerate()
        .map(|(i, line)| format!("{}: {}", i + 1, line))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::capabilities::Capabilities;
    use crate::renderer::gl::{GlCall, Precision, RecordingContext};
    use crate::renderer::lights::LightsHash;
    use crate::renderer::program::ParameterContext;
    use crate::scene::FogMode;
    use crate::settings::RenderSettings;
    use glam::Vec3;

    fn parameters(gl: &RecordingContext, material: &Material) -> ProgramParameters {
        let caps = Capabilities::detect(gl, Precision::High);
        let settings = RenderSettings::default();
        ProgramParameters::from_material(
            material,
            &ParameterContext {
                caps: &caps,
                settings: &settings,
                lights: LightsHash::default(),
                fog: FogMode::None,
                skeleton: None,
                receive_shadow: false,
            },
        )
    }

    #[test]
    fn equal_parameters_share_one_program() {
        let mut gl = RecordingContext::new();
        let log = gl.log();
        let mut cache = ProgramCache::new();
        let red = Material::basic(Vec3::X);
        let blue = Material::basic(Vec3::Z);
        let uniforms = shader_lib::default_uniforms(&red.kind);

        let red_parameters = parameters(&gl, &red);
        let blue_parameters = parameters(&gl, &blue);
        let a = cache.acquire(&mut gl, &red, &red_parameters, &uniforms).unwrap();
        let b = cache.acquire(&mut gl, &blue, &blue_parameters, &uniforms).unwrap();
        assert_eq!(a, b);
        assert_eq!(cache.count(), 1);
        assert_eq!(cache.get(a).unwrap().used_times(), 2);
        assert_eq!(log.borrow().count(|c| matches!(c, GlCall::LinkProgram(_))), 1);

        let program = cache.get(a).unwrap();
        assert_eq!(program.attribute("position"), Some(0));
        assert!(program.uniform("diffuse").is_some());
        assert!(program.uniform("modelViewMatrix").is_some());

        cache.release(&mut gl, a);
        assert_eq!(log.borrow().count(|c| matches!(c, GlCall::DeleteProgram(_))), 0);
        cache.release(&mut gl, a);
        assert_eq!(cache.count(), 0);
        assert_eq!(log.borrow().count(|c| matches!(c, GlCall::DeleteProgram(_))), 1);
    }

    #[test]
    fn compile_failure_cleans_up_shaders() {
        let mut gl = RecordingContext::new().with_compile_failure("BROKEN");
        let log = gl.log();
        let mut cache = ProgramCache::new();
        let material = Material::shader(crate::renderer::material::ShaderMaterial {
            vertex_shader: "void main() { gl_Position = vec4( 0.0 ); }\n".into(),
            fragment_shader: "void main() { BROKEN }\n".into(),
            ..Default::default()
        });

        let params = parameters(&gl, &material);
        let err = cache
            .acquire(&mut gl, &material, &params, &Uniforms::new())
            .unwrap_err();
        assert!(matches!(
            err,
            RenderError::ShaderCompile {
                stage: ShaderStage::Fragment,
                ..
            }
        ));
        assert_eq!(cache.count(), 0);
        let log = log.borrow();
        assert_eq!(log.count(|c| matches!(c, GlCall::DeleteShader(_))), 2);
        assert_eq!(log.count(|c| matches!(c, GlCall::CreateProgram(_))), 0);
    }
}
