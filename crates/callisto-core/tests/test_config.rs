use callisto_core::config::{AlignConfig, AlignMethod, CombineMethod, QualityMetric};
use callisto_core::consts::{
    DEFAULT_CROSS_CORRELATION_UPSAMPLE, DEFAULT_MAX_CONTROL_POINTS, DEFAULT_MAX_HYPOTHESES,
};
use callisto_core::error::CallistoError;

// ---------------------------------------------------------------------------
// Method names
// ---------------------------------------------------------------------------

#[test]
fn test_align_method_names_roundtrip() {
    for method in AlignMethod::ALL {
        assert_eq!(method.name().parse::<AlignMethod>().unwrap(), method);
        assert_eq!(format!("{}", method), method.name());
    }
}

#[test]
fn test_align_method_default_is_astroalign() {
    assert_eq!(AlignMethod::default(), AlignMethod::Astroalign);
}

#[test]
fn test_combine_method_parse() {
    assert_eq!("numpy".parse::<CombineMethod>().unwrap(), CombineMethod::Numpy);
    assert_eq!("swarp".parse::<CombineMethod>().unwrap(), CombineMethod::Swarp);
    assert!(matches!(
        "median".parse::<CombineMethod>(),
        Err(CallistoError::NotImplemented(_))
    ));
}

// ---------------------------------------------------------------------------
// TOML
// ---------------------------------------------------------------------------

#[test]
fn test_default_config_toml_roundtrip() {
    let config = AlignConfig::default();
    let text = config.to_toml_string().unwrap();
    assert_eq!(AlignConfig::from_toml_str(&text).unwrap(), config);
}

#[test]
fn test_empty_toml_is_default() {
    assert_eq!(AlignConfig::from_toml_str("").unwrap(), AlignConfig::default());
}

#[test]
fn test_partial_toml_keeps_other_defaults() {
    let config = AlignConfig::from_toml_str(
        r#"
method = "imreg"
reference_metric = "gradient"
combine_method = "swarp"

[chi2]
upsample_factor = 20

[triangle]
pixel_tolerance = 3.5
"#,
    )
    .unwrap();

    assert_eq!(config.method, AlignMethod::Imreg);
    assert_eq!(config.reference_metric, QualityMetric::Gradient);
    assert_eq!(config.combine_method, CombineMethod::Swarp);
    assert_eq!(config.chi2.upsample_factor, Some(20));
    assert_eq!(config.triangle.pixel_tolerance, 3.5);
    assert_eq!(config.triangle.max_control_points, DEFAULT_MAX_CONTROL_POINTS);
    assert_eq!(config.triangle.max_hypotheses, DEFAULT_MAX_HYPOTHESES);
    assert_eq!(
        config.cross_correlation.upsample_factor,
        DEFAULT_CROSS_CORRELATION_UPSAMPLE
    );
}

#[test]
fn test_unknown_method_in_toml_is_config_error() {
    let err = AlignConfig::from_toml_str(r#"method = "fourier""#).unwrap_err();
    assert!(matches!(err, CallistoError::Config(_)));
}

#[test]
fn test_load_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("callisto.toml");
    std::fs::write(&path, "method = \"chi2\"\n").unwrap();
    assert_eq!(AlignConfig::load(&path).unwrap().method, AlignMethod::Chi2);
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = AlignConfig::load(&dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, CallistoError::Io(_)));
}

// ---------------------------------------------------------------------------
// JSON (serde)
// ---------------------------------------------------------------------------

#[test]
fn test_config_serde_json_roundtrip() {
    let mut config = AlignConfig::with_method(AlignMethod::Skimage);
    config.log_polar.angles = 180;
    let json = serde_json::to_string(&config).unwrap();
    assert!(json.contains("\"skimage\""), "got: {json}");
    let back: AlignConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(back, config);
}
