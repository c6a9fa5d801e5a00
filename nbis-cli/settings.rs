use nbis_bozorth::BozorthParams;
use nbis_core::{NbisConfig, NbisError, NbisResult};
use nbis_lfs::{DetectorBuilder, LfsParams};
use serde::{Deserialize, Serialize};

/// Everything needed to build an engine: the shared configuration context
/// plus tuning for the reference detector and matcher.
///
/// Any section may be left out of a file; missing sections take defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    pub nbis: NbisConfig,
    pub detector: LfsParams,
    pub matcher: BozorthParams,
}

impl EngineSettings {
    pub fn new(nbis: NbisConfig) -> Self {
        Self {
            nbis,
            ..Self::default()
        }
    }

    pub fn with_detector(mut self, detector: LfsParams) -> Self {
        self.detector = detector;
        self
    }

    /// Replace detector tuning with a named preset: `default`, `fast` or
    /// `sensitive`.
    pub fn with_detector_preset(self, preset: &str) -> NbisResult<Self> {
        let builder = DetectorBuilder::new();
        let builder = match preset {
            "default" => builder,
            "fast" => builder.preset_fast(),
            "sensitive" => builder.preset_sensitive(),
            other => {
                return Err(NbisError::Config(format!(
                    "unknown detector preset '{}'",
                    other
                )));
            }
        };
        Ok(self.with_detector(builder.to_params()))
    }

    pub fn with_matcher(mut self, matcher: BozorthParams) -> Self {
        self.matcher = matcher;
        self
    }

    pub fn validate(&self) -> NbisResult<()> {
        self.nbis.validate()?;
        self.detector
            .validate()
            .map_err(|e| NbisError::Config(e.to_string()))?;
        self.matcher
            .validate()
            .map_err(|e| NbisError::Config(e.to_string()))?;
        Ok(())
    }

    pub fn summary(&self) -> String {
        format!(
            "{}\n{}\n{}",
            self.nbis.summary(),
            self.detector.summary(),
            self.matcher.summary()
        )
    }

    pub fn to_json(&self) -> NbisResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| NbisError::Config(e.to_string()))
    }

    pub fn from_json(json: &str) -> NbisResult<Self> {
        let settings: Self =
            serde_json::from_str(json).map_err(|e| NbisError::Config(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn to_toml(&self) -> NbisResult<String> {
        toml::to_string_pretty(self).map_err(|e| NbisError::Config(e.to_string()))
    }

    pub fn from_toml(toml_str: &str) -> NbisResult<Self> {
        let settings: Self =
            toml::from_str(toml_str).map_err(|e| NbisError::Config(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load from a `.json` or `.toml` file, chosen by extension.
    pub fn load<P: AsRef<std::path::Path>>(path: P) -> NbisResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Self::from_toml(&content),
            Some("json") => Self::from_json(&content),
            other => Err(NbisError::Config(format!(
                "unsupported config extension: {:?}",
                other
            ))),
        }
    }

    pub fn save<P: AsRef<std::path::Path>>(&self, path: P) -> NbisResult<()> {
        let path = path.as_ref();
        let content = match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => self.to_toml()?,
            _ => self.to_json()?,
        };
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        assert!(EngineSettings::default().validate().is_ok());
    }

    #[test]
    fn test_toml_roundtrip() {
        let settings = EngineSettings::new(NbisConfig::default().with_ppi(1000).with_threads(2))
            .with_detector(LfsParams::fast_preset())
            .with_matcher(BozorthParams::default().with_angle_tolerance(15.0));
        let back = EngineSettings::from_toml(&settings.to_toml().unwrap()).unwrap();
        assert_eq!(settings, back);
    }

    #[test]
    fn test_partial_json_takes_defaults() {
        let settings =
            EngineSettings::from_json(r#"{"nbis": {"ppi": 600}, "detector": {"trace_length": 12}}"#)
                .unwrap();
        assert_eq!(settings.nbis.ppi, 600);
        assert_eq!(settings.detector.trace_length, 12);
        assert_eq!(settings.detector.block_size, LfsParams::default().block_size);
        assert_eq!(settings.matcher, BozorthParams::default());
    }

    #[test]
    fn test_detector_preset_by_name() {
        let fast = EngineSettings::default().with_detector_preset("fast").unwrap();
        assert_eq!(fast.detector, LfsParams::fast_preset());
        let back = fast.with_detector_preset("default").unwrap();
        assert_eq!(back.detector, LfsParams::default());
        assert!(matches!(
            EngineSettings::default().with_detector_preset("turbo"),
            Err(NbisError::Config(_))
        ));
    }

    #[test]
    fn test_invalid_section_rejected() {
        let err = EngineSettings::from_json(r#"{"detector": {"window_size": 2}}"#).unwrap_err();
        assert!(matches!(err, NbisError::Config(_)));
    }
}
