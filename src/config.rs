use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// File looked up in the working directory at startup.
pub const CONFIG_FILE: &str = "dashboard.json";

pub const DEFAULT_SOURCE: &str = "datos.xlsx";
pub const DEFAULT_SHEET: &str = "DINAMIZADO";

// ---------------------------------------------------------------------------
// Normalization rules applied by the loader
// ---------------------------------------------------------------------------

/// Load-time normalization steps. Both can be switched off.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Normalization {
    /// Read text volumes as `1.234,50` (`.` thousands, `,` decimal).
    pub decimal_comma: bool,
    /// Product codes dropped from the relation at load time.
    pub excluded_products: BTreeSet<String>,
}

impl Default for Normalization {
    fn default() -> Self {
        Self {
            decimal_comma: true,
            excluded_products: BTreeSet::new(),
        }
    }
}

impl Normalization {
    /// Rules used by the billing report: natural gas and kerosene are
    /// reported elsewhere.
    pub fn billing() -> Self {
        Self {
            decimal_comma: true,
            excluded_products: ["GNV", "KRS"].iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn is_excluded(&self, product: &str) -> bool {
        self.excluded_products.contains(product)
    }
}

// ---------------------------------------------------------------------------
// Source
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub path: PathBuf,
    /// Only consulted for workbook formats.
    pub sheet: String,
    pub normalization: Normalization,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_SOURCE),
            sheet: DEFAULT_SHEET.to_string(),
            normalization: Normalization::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Presentation
// ---------------------------------------------------------------------------

/// A static report image shown in its own tab.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportImage {
    pub title: String,
    pub path: PathBuf,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartPalette {
    /// Sequential blues, darkest first.
    #[default]
    Blues,
    /// Evenly spaced hues.
    Spectrum,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub source: SourceConfig,
    pub report_images: Vec<ReportImage>,
    pub palette: ChartPalette,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            source: SourceConfig::default(),
            report_images: vec![
                ReportImage {
                    title: "Billing report".to_string(),
                    path: PathBuf::from("reporte_facturacion.png"),
                },
                ReportImage {
                    title: "Sales report".to_string(),
                    path: PathBuf::from("reporte_ventas.png"),
                },
            ],
            palette: ChartPalette::default(),
        }
    }
}

impl DashboardConfig {
    /// Read a configuration file. Missing fields take their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("parsing config file {}", path.display()))
    }

    /// Load `path` if it exists, otherwise fall back to defaults. A broken
    /// file is logged and ignored so the dashboard still starts.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            log::debug!("No config at {}, using defaults", path.display());
            return Self::default();
        }
        match Self::load(path) {
            Ok(cfg) => {
                log::info!("Loaded configuration from {}", path.display());
                cfg
            }
            Err(e) => {
                log::error!("Ignoring configuration: {e:#}");
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("serializing config")?;
        std::fs::write(path, format!("{json}\n"))
            .with_context(|| format!("writing config file {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = DashboardConfig::default();
        assert_eq!(cfg.source.path, PathBuf::from("datos.xlsx"));
        assert_eq!(cfg.source.sheet, "DINAMIZADO");
        assert!(cfg.source.normalization.decimal_comma);
        assert!(cfg.source.normalization.excluded_products.is_empty());
        assert_eq!(cfg.report_images.len(), 2);
        assert_eq!(cfg.palette, ChartPalette::Blues);
    }

    #[test]
    fn test_billing_excludes_gnv_and_krs() {
        let n = Normalization::billing();
        assert!(n.is_excluded("GNV"));
        assert!(n.is_excluded("KRS"));
        assert!(!n.is_excluded("gnv"));
        assert!(!n.is_excluded("DSL"));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dashboard.json");
        std::fs::write(
            &path,
            r#"{
                "source": {
                    "path": "facturacion.xlsx",
                    "normalization": { "excluded_products": ["GNV", "KRS"] }
                },
                "palette": "spectrum"
            }"#,
        )
        .unwrap();

        let cfg = DashboardConfig::load(&path).unwrap();
        assert_eq!(cfg.source.path, PathBuf::from("facturacion.xlsx"));
        assert_eq!(cfg.source.sheet, "DINAMIZADO");
        assert_eq!(cfg.source.normalization, Normalization::billing());
        assert_eq!(cfg.palette, ChartPalette::Spectrum);
        assert_eq!(cfg.report_images, DashboardConfig::default().report_images);
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dashboard.json");
        let mut cfg = DashboardConfig::default();
        cfg.source.normalization.decimal_comma = false;
        cfg.save(&path).unwrap();
        assert_eq!(DashboardConfig::load(&path).unwrap(), cfg);
    }

    #[test]
    fn test_broken_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dashboard.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(DashboardConfig::load(&path).is_err());
        assert_eq!(DashboardConfig::load_or_default(&path), DashboardConfig::default());
        assert_eq!(
            DashboardConfig::load_or_default(&dir.path().join("absent.json")),
            DashboardConfig::default()
        );
    }
}
