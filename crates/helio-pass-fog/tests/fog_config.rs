use helio_pass_fog::features::fog::FogSkip;
use helio_pass_fog::{
    CameraTypes, FogCamera, FogConfig, FogDensityMode, FogFeature, FogFeatureSettings, FogMode,
    FogNoiseMode, InjectionPoint,
};

#[test]
fn partial_json_fills_in_defaults() {
    let _ = env_logger::builder().is_test(true).try_init();

    let config: FogConfig = serde_json::from_str(
        r#"{ "mode": "Height", "density_mode": "Linear", "start_height": 1.5, "intensity": 0.8 }"#,
    )
    .expect("valid fog config");

    assert_eq!(config.mode, FogMode::Height);
    assert_eq!(config.density_mode, FogDensityMode::Linear);
    assert_eq!(config.start_height, 1.5);
    assert_eq!(config.intensity, 0.8);
    assert_eq!(config.end_height, FogConfig::default().end_height);
    assert_eq!(config.noise_mode, FogNoiseMode::Off);
    assert!(config.exclusion_zones.is_empty());
}

#[test]
fn config_round_trips_through_json() {
    let config = FogConfig::default()
        .with_mode(FogMode::Depth)
        .with_noise_mode(FogNoiseMode::Procedural)
        .with_intensity(0.3);
    let json = serde_json::to_string(&config).expect("serialize");
    let back: FogConfig = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(back, config);
}

#[test]
fn feature_settings_select_cameras() {
    let fog = FogFeature::new(
        FogFeatureSettings::default()
            .with_render_cameras(CameraTypes::GAME)
            .with_injection_point(InjectionPoint::AfterRenderingPostProcessing),
    );
    let config = FogConfig::default().with_intensity(1.0);
    let scene_view = FogCamera::new(glam::Mat4::IDENTITY, glam::Mat4::IDENTITY, 8, 8)
        .with_camera_type(CameraTypes::SCENE_VIEW);

    assert_eq!(fog.skip_reason(&scene_view, &config), Some(FogSkip::CameraType));
    assert_eq!(fog.injection_point(), InjectionPoint::AfterRenderingPostProcessing);
}
