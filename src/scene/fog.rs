use glam::Vec3;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Fog {
    Linear { color: Vec3, near: f32, far: f32 },
    Exp2 { color: Vec3, density: f32 },
}

/// What a compiled program was built for. Switching between modes needs a
/// different program, changing the values does not.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum FogMode {
    #[default]
    None,
    Linear,
    Exp2,
}

impl FogMode {
    pub fn of(fog: Option<&Fog>) -> Self {
        match fog {
            None => FogMode::None,
            Some(Fog::Linear { .. }) => FogMode::Linear,
            Some(Fog::Exp2 { .. }) => FogMode::Exp2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FogMode::None => "none",
            FogMode::Linear => "linear",
            FogMode::Exp2 => "exp2",
        }
    }
}

impl Fog {
    pub fn color(&self) -> Vec3 {
        match self {
            Fog::Linear { color, .. } | Fog::Exp2 { color, .. } => *color,
        }
    }
}
