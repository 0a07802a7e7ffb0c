//! Per-model shadow policy.

use serde::{Deserialize, Serialize};

fn default_alpha() -> f32 {
    1.0
}

/// Shadow and material policy attached to a renderable model (world or
/// brush entity).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    /// The world model (model 0).
    #[serde(default)]
    pub is_world: bool,
    /// Casts shadows on everything.
    #[serde(default)]
    pub shadow: bool,
    /// Casts shadows only on itself.
    #[serde(default)]
    pub shadow_self: bool,
    /// Casts shadows only on the world.
    #[serde(default)]
    pub shadow_world_only: bool,
    /// Shadow is toggled at runtime through `switch_shadow_style`.
    #[serde(default)]
    pub switchable_shadow: bool,
    /// Light style controlling a switchable shadow.
    #[serde(default)]
    pub switch_shadow_style: i32,
    /// Model opacity in `[0, 1]`.
    #[serde(default = "default_alpha")]
    pub alpha: f32,
    /// Faces of this model are sampled when gathering sky light.
    #[serde(default)]
    pub contributes_to_sky: bool,
}

impl ModelInfo {
    /// Policy of the world model.
    pub fn world() -> Self {
        Self {
            is_world: true,
            ..Self::default()
        }
    }

    /// A brush entity casting shadows on everything.
    pub fn shadow_caster() -> Self {
        Self {
            shadow: true,
            ..Self::default()
        }
    }

    /// A brush entity whose shadow follows light style `style`.
    pub fn switchable(style: i32) -> Self {
        Self {
            switchable_shadow: true,
            switch_shadow_style: style,
            ..Self::default()
        }
    }

    /// Whether any shadow policy applies. Faces of models without one never
    /// take part in tracing.
    pub fn casts_shadows(&self) -> bool {
        self.is_world
            || self.shadow
            || self.shadow_self
            || self.shadow_world_only
            || self.switchable_shadow
    }
}

impl Default for ModelInfo {
    fn default() -> Self {
        Self {
            is_world: false,
            shadow: false,
            shadow_self: false,
            shadow_world_only: false,
            switchable_shadow: false,
            switch_shadow_style: 0,
            alpha: default_alpha(),
            contributes_to_sky: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_casts_nothing() {
        let info = ModelInfo::default();
        assert!(!info.casts_shadows());
        assert_eq!(info.alpha, 1.0);
    }

    #[test]
    fn test_constructors() {
        assert!(ModelInfo::world().casts_shadows());
        assert!(ModelInfo::shadow_caster().casts_shadows());
        let sw = ModelInfo::switchable(3);
        assert!(sw.casts_shadows());
        assert_eq!(sw.switch_shadow_style, 3);
    }

    #[test]
    fn test_alpha_defaults_when_missing() {
        let info: ModelInfo = serde_json::from_str(r#"{"shadow": true}"#).unwrap();
        assert!(info.shadow);
        assert_eq!(info.alpha, 1.0);
    }
}
