use super::*;
use tempfile::TempDir;

#[test]
fn defaults_when_file_absent() {
    let temp_dir = TempDir::new().expect("can create temp dir");
    let config = Config::load(temp_dir.path()).expect("can load default config");

    assert_eq!(config.encoder.port, 11434);
    assert_eq!(config.encoder.model, "medembed-base");
    assert_eq!(config.retrieval.top_k, DEFAULT_TOP_K);
    assert_eq!(config.base_dir, temp_dir.path());
}

#[test]
fn save_and_reload_round_trip() {
    let temp_dir = TempDir::new().expect("can create temp dir");
    let mut config = Config::load(temp_dir.path()).expect("can load default config");
    config.encoder.host = "encoder-host".to_string();
    config.retrieval.top_k = 5;
    config.save().expect("can save config");

    let reloaded = Config::load(temp_dir.path()).expect("can reload config");
    assert_eq!(reloaded.encoder.host, "encoder-host");
    assert_eq!(reloaded.retrieval.top_k, 5);
}

#[test]
fn rejects_invalid_protocol() {
    let config = EncoderConfig {
        protocol: "ftp".to_string(),
        ..EncoderConfig::default()
    };
    assert!(matches!(
        config.validate(),
        Err(ConfigError::InvalidProtocol(_))
    ));
}

#[test]
fn rejects_zero_port() {
    let config = EncoderConfig {
        port: 0,
        ..EncoderConfig::default()
    };
    assert!(matches!(config.validate(), Err(ConfigError::InvalidPort(0))));
}

#[test]
fn rejects_empty_model() {
    let config = EncoderConfig {
        model: "  ".to_string(),
        ..EncoderConfig::default()
    };
    assert!(matches!(
        config.validate(),
        Err(ConfigError::InvalidModel(_))
    ));
}

#[test]
fn rejects_zero_top_k() {
    let config = RetrievalConfig {
        top_k: 0,
        ..RetrievalConfig::default()
    };
    assert!(matches!(config.validate(), Err(ConfigError::InvalidTopK(0))));
}

#[test]
fn rejects_out_of_range_temperature() {
    let config = LlmConfig {
        temperature: 3.5,
        ..LlmConfig::default()
    };
    assert!(matches!(
        config.validate(),
        Err(ConfigError::InvalidTemperature(_))
    ));
}

#[test]
fn endpoint_url_from_parts() {
    let config = EncoderConfig::default();
    let url = config.endpoint_url().expect("can build URL");
    assert_eq!(url.host_str(), Some("localhost"));
    assert_eq!(url.port(), Some(11434));
}

#[test]
fn malformed_toml_is_rejected() {
    let temp_dir = TempDir::new().expect("can create temp dir");
    std::fs::write(temp_dir.path().join("config.toml"), "not [valid toml")
        .expect("can write file");
    assert!(Config::load(temp_dir.path()).is_err());
}
