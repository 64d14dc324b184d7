//! Lighting Rig
//!
//! Tiered light setup for the card scene: a hemisphere fill plus one to three
//! directional lights. A tier change replaces the whole [`LightSet`]; only the
//! cast-shadow flag may be toggled on live lights.

use glam::Vec3;
use smallvec::SmallVec;

use candela_core::QualityTier;

use crate::quality::RenderConfig;
use crate::{LightHandle, RenderBackend, RendererResult};

/// Canonical high-angle key light position
pub const KEY_LIGHT_POSITION: Vec3 = Vec3::new(8.0, 10.0, 6.0);

const FILL_LIGHT_POSITION: Vec3 = Vec3::new(-5.0, 8.0, -3.0);
const RIM_LIGHT_POSITION: Vec3 = Vec3::new(-8.0, 5.0, 8.0);

/// Convert a `0xRRGGBB` color to linear-ish RGB in [0, 1]
pub fn rgb_hex(hex: u32) -> Vec3 {
    Vec3::new(
        ((hex >> 16) & 0xff) as f32 / 255.0,
        ((hex >> 8) & 0xff) as f32 / 255.0,
        (hex & 0xff) as f32 / 255.0,
    )
}

/// Light types
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LightKind {
    /// Directional light shining from `position` toward the origin
    Directional,
    /// Sky/ground gradient ambient light
    Hemisphere { ground_color: Vec3 },
}

/// Light shadow settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowSettings {
    /// Shadow map resolution (square)
    pub map_size: u32,
    /// Depth bias
    pub bias: f32,
    /// Normal offset bias
    pub normal_bias: f32,
    /// Shadow camera near plane
    pub near: f32,
    /// Shadow camera far plane
    pub far: f32,
    /// Half-extent of the orthographic shadow frustum
    pub extent: f32,
}

impl Default for ShadowSettings {
    fn default() -> Self {
        Self {
            map_size: 512,
            bias: 0.0,
            normal_bias: 0.0,
            near: 0.5,
            far: 500.0,
            extent: 5.0,
        }
    }
}

/// Light description
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Light {
    /// Light type
    pub kind: LightKind,
    /// Light color
    pub color: Vec3,
    /// Light intensity
    pub intensity: f32,
    /// World position (directional lights aim at the origin)
    pub position: Vec3,
    /// Whether the light casts shadows
    pub cast_shadow: bool,
    /// Shadow settings, used while `cast_shadow` is set
    pub shadow: ShadowSettings,
}

impl Light {
    /// Create a directional light
    pub fn directional(color: Vec3, intensity: f32, position: Vec3) -> Self {
        Self {
            kind: LightKind::Directional,
            color,
            intensity,
            position,
            cast_shadow: false,
            shadow: ShadowSettings::default(),
        }
    }

    /// Create a hemisphere light
    pub fn hemisphere(sky_color: Vec3, ground_color: Vec3, intensity: f32) -> Self {
        Self {
            kind: LightKind::Hemisphere { ground_color },
            color: sky_color,
            intensity,
            position: Vec3::Y,
            cast_shadow: false,
            shadow: ShadowSettings::default(),
        }
    }

    /// Enable shadow casting with the given settings
    pub fn with_shadow(mut self, shadow: ShadowSettings) -> Self {
        self.cast_shadow = true;
        self.shadow = shadow;
        self
    }

    /// Direction the light travels (toward the origin)
    pub fn direction(&self) -> Vec3 {
        (-self.position).normalize_or_zero()
    }

    /// Get the effective color (color * intensity)
    pub fn effective_color(&self) -> Vec3 {
        self.color * self.intensity
    }
}

/// Complete set of scene lights for one tier
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LightSet {
    /// Directional lights, key light first
    pub directional: SmallVec<[Light; 3]>,
    /// Ambient fill
    pub hemisphere: Option<Light>,
}

impl LightSet {
    /// Iterate hemisphere first, then directional lights in order
    pub fn iter(&self) -> impl Iterator<Item = &Light> + '_ {
        self.hemisphere.iter().chain(self.directional.iter())
    }

    /// Total number of lights
    pub fn len(&self) -> usize {
        self.directional.len() + usize::from(self.hemisphere.is_some())
    }

    /// Check if the set holds no lights
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Toggle the cast-shadow flag on every directional light
    pub fn set_shadows_enabled(&mut self, enabled: bool) {
        for light in &mut self.directional {
            light.cast_shadow = enabled;
        }
    }

    /// Key light, if any
    pub fn key_light(&self) -> Option<&Light> {
        self.directional.first()
    }
}

/// Owns the installed light set and swaps it on tier changes
#[derive(Debug, Default)]
pub struct LightingRig {
    lights: LightSet,
    /// Backend handles, in [`LightSet::iter`] order
    handles: SmallVec<[LightHandle; 4]>,
    rebuilds: u64,
}

impl LightingRig {
    /// Create an empty rig
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the light set for a configuration
    pub fn build(config: &RenderConfig) -> LightSet {
        let white = rgb_hex(0xffffff);
        let fill_color = rgb_hex(0xaabbff);
        let rim_color = rgb_hex(0xffccaa);

        // Stronger ambient fill compensates for fewer directional lights
        let ambient = if config.tier == QualityTier::High { 0.5 } else { 0.9 };
        let hemisphere = Light::hemisphere(white, rgb_hex(0x444466), ambient);

        let mut directional: SmallVec<[Light; 3]> = match config.tier {
            QualityTier::High => SmallVec::from_buf([
                Light::directional(white, 1.3, KEY_LIGHT_POSITION).with_shadow(ShadowSettings {
                    map_size: config.shadow_map_size.unwrap_or(2048),
                    bias: -0.0001,
                    normal_bias: 0.01,
                    far: 100.0,
                    extent: 50.0,
                    ..ShadowSettings::default()
                }),
                Light::directional(fill_color, 0.6, FILL_LIGHT_POSITION),
                Light::directional(rim_color, 0.4, RIM_LIGHT_POSITION),
            ]),
            QualityTier::Medium => SmallVec::from_slice(&[
                Light::directional(white, 1.0, KEY_LIGHT_POSITION).with_shadow(ShadowSettings {
                    map_size: config.shadow_map_size.unwrap_or(1024),
                    bias: -0.0005,
                    far: 100.0,
                    ..ShadowSettings::default()
                }),
                Light::directional(fill_color, 0.4, FILL_LIGHT_POSITION),
            ]),
            QualityTier::Low => SmallVec::from_slice(&[Light::directional(white, 1.2, KEY_LIGHT_POSITION)]),
        };

        directional.truncate(config.directional_light_count as usize);
        if !config.shadows_enabled {
            directional.iter_mut().for_each(|light| light.cast_shadow = false);
        }

        log::info!("Lighting setup: {}", config.tier.as_str().to_uppercase());

        LightSet {
            directional,
            hemisphere: Some(hemisphere),
        }
    }

    /// Tear down `old` and rebuild from scratch for `config`
    pub fn reconfigure(old: LightSet, config: &RenderConfig) -> LightSet {
        log::debug!("Tearing down {} lights", old.len());
        drop(old);
        Self::build(config)
    }

    /// Install every light of `lights`, or none of them.
    ///
    /// If the backend rejects a light, the lights already installed by this
    /// call are removed again and the error is returned.
    pub fn install<B: RenderBackend + ?Sized>(
        backend: &mut B,
        lights: &LightSet,
    ) -> RendererResult<SmallVec<[LightHandle; 4]>> {
        let mut installed: SmallVec<[LightHandle; 4]> = SmallVec::new();
        for light in lights.iter() {
            match backend.add_light(light) {
                Ok(handle) => installed.push(handle),
                Err(err) => {
                    for handle in installed {
                        if let Err(rollback) = backend.remove_light(handle) {
                            log::warn!("Failed to roll back light {:?}: {}", handle, rollback);
                        }
                    }
                    return Err(err);
                }
            }
        }
        Ok(installed)
    }

    /// Replace the installed lights with the set for `config`.
    ///
    /// The new set is installed before the old one is removed, so on failure
    /// the previous set stays live and unchanged.
    pub fn swap<B: RenderBackend + ?Sized>(&mut self, backend: &mut B, config: &RenderConfig) -> RendererResult<()> {
        let next = Self::reconfigure(self.lights.clone(), config);
        let installed = Self::install(backend, &next)?;

        for handle in std::mem::replace(&mut self.handles, installed) {
            if let Err(err) = backend.remove_light(handle) {
                log::warn!("Failed to remove light {:?}: {}", handle, err);
            }
        }

        self.lights = next;
        self.rebuilds += 1;
        Ok(())
    }

    /// Toggle shadow casting on the live directional lights without a rebuild
    pub fn set_shadows_enabled<B: RenderBackend + ?Sized>(&mut self, backend: &mut B, enabled: bool) -> RendererResult<()> {
        self.lights.set_shadows_enabled(enabled);
        backend.set_shadows_enabled(enabled);

        let offset = usize::from(self.lights.hemisphere.is_some());
        for (light, handle) in self.lights.directional.iter().zip(self.handles.iter().skip(offset)) {
            backend.update_light(*handle, light)?;
        }

        log::info!("Shadows: {}", if enabled { "enabled" } else { "disabled" });
        Ok(())
    }

    /// Currently installed lights
    pub fn lights(&self) -> &LightSet {
        &self.lights
    }

    /// Backend handles of the installed lights
    pub fn handles(&self) -> &[LightHandle] {
        &self.handles
    }

    /// Number of successful rebuilds
    pub fn rebuild_count(&self) -> u64 {
        self.rebuilds
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quality::build_render_config;
    use crate::{HeadlessRenderer, RendererError};

    #[test]
    fn test_rgb_hex() {
        assert_eq!(rgb_hex(0xffffff), Vec3::ONE);
        assert_eq!(rgb_hex(0x000000), Vec3::ZERO);
        let fill = rgb_hex(0xaabbff);
        assert!((fill.x - 170.0 / 255.0).abs() < 1e-6);
        assert!((fill.y - 187.0 / 255.0).abs() < 1e-6);
        assert_eq!(fill.z, 1.0);
    }

    #[test]
    fn test_directional_count_matches_config() {
        for tier in QualityTier::ALL {
            let config = build_render_config(tier);
            let lights = LightingRig::build(&config);
            assert_eq!(lights.directional.len(), config.directional_light_count as usize);
            assert!(lights.hemisphere.is_some());
        }
    }

    #[test]
    fn test_hemisphere_intensity() {
        let high = LightingRig::build(&build_render_config(QualityTier::High));
        assert_eq!(high.hemisphere.unwrap().intensity, 0.5);

        for tier in [QualityTier::Medium, QualityTier::Low] {
            let lights = LightingRig::build(&build_render_config(tier));
            assert_eq!(lights.hemisphere.unwrap().intensity, 0.9);
        }
    }

    #[test]
    fn test_only_key_light_casts_shadows() {
        let high = LightingRig::build(&build_render_config(QualityTier::High));
        let key = high.key_light().unwrap();
        assert!(key.cast_shadow);
        assert_eq!(key.position, KEY_LIGHT_POSITION);
        assert_eq!(key.shadow.map_size, 2048);
        assert_eq!(key.shadow.extent, 50.0);
        assert!(high.directional[1..].iter().all(|light| !light.cast_shadow));

        let medium = LightingRig::build(&build_render_config(QualityTier::Medium));
        assert!(medium.key_light().unwrap().cast_shadow);
        assert_eq!(medium.key_light().unwrap().shadow.map_size, 1024);

        let low = LightingRig::build(&build_render_config(QualityTier::Low));
        assert!(!low.key_light().unwrap().cast_shadow);
        assert_eq!(low.key_light().unwrap().intensity, 1.2);
    }

    #[test]
    fn test_build_is_deterministic() {
        let config = build_render_config(QualityTier::High);
        assert_eq!(LightingRig::build(&config), LightingRig::build(&config));
    }

    #[test]
    fn test_reconfigure_replaces_set() {
        let old = LightingRig::build(&build_render_config(QualityTier::High));
        let new = LightingRig::reconfigure(old, &build_render_config(QualityTier::Low));
        assert_eq!(new.directional.len(), 1);
        assert_eq!(new.hemisphere.unwrap().intensity, 0.9);
    }

    #[test]
    fn test_directional_lights_aim_at_origin() {
        let lights = LightingRig::build(&build_render_config(QualityTier::High));
        for light in &lights.directional {
            let toward_origin = (Vec3::ZERO - light.position).normalize();
            assert!((light.direction() - toward_origin).length() < 1e-6);
        }
    }

    #[test]
    fn test_swap_installs_and_replaces() {
        let mut backend = HeadlessRenderer::default();
        let mut rig = LightingRig::new();

        rig.swap(&mut backend, &build_render_config(QualityTier::High)).unwrap();
        assert_eq!(backend.light_count(), 4);
        assert_eq!(rig.handles().len(), 4);

        rig.swap(&mut backend, &build_render_config(QualityTier::Low)).unwrap();
        assert_eq!(backend.light_count(), 2);
        assert_eq!(rig.lights().directional.len(), 1);
        assert_eq!(rig.rebuild_count(), 2);
        assert_eq!(backend.stats().lights_removed, 4);
    }

    #[test]
    fn test_failed_swap_keeps_previous_set() {
        let mut backend = HeadlessRenderer::default().with_light_budget(4);
        let mut rig = LightingRig::new();

        rig.swap(&mut backend, &build_render_config(QualityTier::Low)).unwrap();
        let before = rig.lights().clone();

        // 2 live + 4 new exceeds the budget
        let result = rig.swap(&mut backend, &build_render_config(QualityTier::High));
        assert!(matches!(result, Err(RendererError::OutOfLightSlots(4))));

        assert_eq!(rig.lights(), &before);
        assert_eq!(backend.light_count(), 2);
        assert_eq!(rig.rebuild_count(), 1);
        for handle in rig.handles() {
            assert!(backend.light(*handle).is_some());
        }
    }

    #[test]
    fn test_toggle_shadows_without_rebuild() {
        let mut backend = HeadlessRenderer::default();
        let mut rig = LightingRig::new();
        rig.swap(&mut backend, &build_render_config(QualityTier::High)).unwrap();

        rig.set_shadows_enabled(&mut backend, false).unwrap();
        assert!(rig.lights().directional.iter().all(|light| !light.cast_shadow));
        assert!(!backend.shadows_enabled());
        assert_eq!(rig.rebuild_count(), 1);

        let key_handle = rig.handles()[1];
        assert!(!backend.light(key_handle).unwrap().cast_shadow);

        rig.set_shadows_enabled(&mut backend, true).unwrap();
        assert!(rig.lights().directional.iter().all(|light| light.cast_shadow));
        assert_eq!(backend.stats().light_updates, 6);
    }
}
