// Host-side tests for settings parsing and the quality/DPR policy.

use backdrop_core::{
    device_pixel_ratio, dpr_for_name, stage_for_digit, CorrectionMode, EffectSettings, QualityLevel, SettingsError,
    StageKind, ViewportGeometry, FALLBACK_DPR,
};
use glam::{Vec2, Vec3};

#[test]
fn performance_is_always_one() {
    for device in [0.75, 1.0, 2.0, 4.0] {
        assert_eq!(QualityLevel::Performance.device_pixel_ratio(device), 1.0);
    }
}

#[test]
fn maximum_follows_the_device() {
    for device in [1.0, 2.5, 4.0] {
        assert_eq!(dpr_for_name("maximum", device), device);
    }
}

#[test]
fn capped_levels_never_exceed_their_cap() {
    for device in [1.0, 1.25, 1.5, 2.0, 3.0, 4.0] {
        assert!(QualityLevel::High.device_pixel_ratio(device) <= device.min(2.0));
        assert_eq!(QualityLevel::Balanced.device_pixel_ratio(device), device.min(1.5));
        assert_eq!(QualityLevel::Ultra.device_pixel_ratio(device), device.min(3.0));
    }
}

#[test]
fn unknown_quality_uses_fallback() {
    assert_eq!(dpr_for_name("cinematic", 3.0), FALLBACK_DPR);
    assert_eq!(device_pixel_ratio(None, 1.0), 2.0);
    assert_eq!(dpr_for_name(" HIGH ", 3.0), 2.0);
}

#[test]
fn quality_names_round_trip() {
    for q in QualityLevel::ALL {
        assert_eq!(q.to_string().parse::<QualityLevel>(), Ok(q));
    }
}

#[test]
fn defaults_enable_every_stage() {
    let s = EffectSettings::default();
    assert!(StageKind::ORDER.into_iter().all(|k| s.stage_enabled(k)));
    let off = EffectSettings::all_disabled();
    assert!(StageKind::ORDER.into_iter().all(|k| !off.stage_enabled(k)));
}

#[test]
fn pairs_override_defaults() {
    let s = EffectSettings::from_pairs([
        "enableBloom=false",
        "crtDistortion=0.2",
        "crtDistortionScale = 0.9",
        "chromaticAberrationOffset=0.004,-0.001",
        "phosphorGlowColor=#ff0080",
        "vignetteDarkness=0.6",
        "enableNoise=off",
        "pointerCorrectionMode=inverse",
        "quality=ultra",
    ])
    .unwrap();
    assert!(!s.enable_bloom);
    assert!(!s.enable_noise);
    assert_eq!(s.crt_distortion, 0.2);
    assert_eq!(s.crt_distortion_scale, 0.9);
    assert_eq!(s.chromatic_offset, Vec2::new(0.004, -0.001));
    assert_eq!(s.phosphor_glow_color, Vec3::new(1.0, 0.0, 128.0 / 255.0));
    assert_eq!(s.vignette_darkness, 0.6);
    assert_eq!(s.pointer_correction_mode, CorrectionMode::Inverse);
    assert_eq!(s.quality, Some(QualityLevel::Ultra));
}

#[test]
fn color_accepts_float_triples() {
    let s = EffectSettings::from_pairs(["phosphorGlowColor=0.1, 0.2, 0.3"]).unwrap();
    assert_eq!(s.phosphor_glow_color, Vec3::new(0.1, 0.2, 0.3));
}

#[test]
fn bad_pairs_are_rejected() {
    assert_eq!(
        EffectSettings::from_pairs(["enableSparkles=true"]),
        Err(SettingsError::UnknownKey("enableSparkles".into()))
    );
    assert!(matches!(
        EffectSettings::from_pairs(["crtDistortion=lots"]),
        Err(SettingsError::InvalidValue { .. })
    ));
    assert!(matches!(
        EffectSettings::from_pairs(["crtDistortion=inf"]),
        Err(SettingsError::InvalidValue { .. })
    ));
    assert!(matches!(
        EffectSettings::from_pairs(["phosphorGlowColor=#ff00"]),
        Err(SettingsError::InvalidValue { .. })
    ));
    assert!(matches!(
        EffectSettings::from_pairs(["phosphorGlowColor=#ffé0a"]),
        Err(SettingsError::InvalidValue { .. })
    ));
    assert_eq!(
        EffectSettings::from_pairs(["enableBloom"]),
        Err(SettingsError::MalformedPair("enableBloom".into()))
    );
}

#[test]
fn unknown_quality_is_accepted_as_none() {
    let s = EffectSettings::from_pairs(["quality=cinematic"]).unwrap();
    assert_eq!(s.quality, None);
    assert_eq!(device_pixel_ratio(s.quality, 3.0), FALLBACK_DPR);
}

#[test]
fn distortion_params_follow_settings() {
    let mut s = EffectSettings::default();
    s.crt_distortion = 0.0;
    assert!(s.distortion_params().is_identity());
}

#[test]
fn digit_keys_follow_chain_order() {
    for (i, kind) in StageKind::ORDER.into_iter().enumerate() {
        assert_eq!(stage_for_digit(&(i + 1).to_string()), Some(kind));
    }
    assert_eq!(stage_for_digit("0"), None);
    assert_eq!(stage_for_digit("8"), None);
    assert_eq!(stage_for_digit("+1"), None);
}

#[test]
fn toggle_stage_flips_one_flag() {
    let mut s = EffectSettings::default();
    assert!(s.enable_noise);
    assert!(!s.toggle_stage(StageKind::Noise));
    assert!(!s.enable_noise);
    assert!(s.enable_bloom, "other stages untouched");
    assert!(s.toggle_stage(StageKind::Noise));
}

#[test]
fn render_size_follows_the_device_ratio() {
    // same logical window moved from a 1x to a 2x monitor
    let low = ViewportGeometry::new(800.0, 600.0, 1.0);
    let high = ViewportGeometry::new(800.0, 600.0, 2.0);
    let max = Some(QualityLevel::Maximum);
    assert_eq!(low.render_size(max, 8192), (800, 600));
    assert_eq!(high.render_size(max, 8192), (1600, 1200));

    let balanced = Some(QualityLevel::Balanced);
    assert_eq!(low.render_size(balanced, 8192), (800, 600));
    assert_eq!(high.render_size(balanced, 8192), (1200, 900));

    assert_eq!(low.render_size(None, 8192), (1600, 1200), "unknown quality uses the fallback ratio");
    assert_eq!(high.render_size(max, 1024), (1024, 1024));
}
