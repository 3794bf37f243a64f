//! Pipeline configuration for full extraction runs.
//!
//! Defines the YAML-serializable configuration that controls extraction
//! behaviour and where the relational projection lands.
//!
//! # Example YAML
//!
//! ```yaml
//! version: "1.0"
//! extraction:
//!   parallel: true
//! projection:
//!   database: report_ui.db
//!   table_prefix: pbi_
//! ```

use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Settings controlling how layout members are analysed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractionSettings {
    /// Analyse layout members on a thread pool instead of sequentially.
    #[serde(default)]
    pub parallel: bool,
}

/// Settings controlling the relational projection target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectionSettings {
    /// Path of the SQLite database to project into.
    pub database: String,
    /// Prefix applied to every projected table and view name.
    pub table_prefix: String,
}

impl Default for ProjectionSettings {
    fn default() -> Self {
        Self {
            database: "report_ui.db".to_string(),
            table_prefix: "pbi_".to_string(),
        }
    }
}

/// Top-level pipeline configuration.
///
/// Loaded from a YAML file to control full extraction-and-projection runs.
///
/// # Examples
///
/// ```no_run
/// use pbix_extract_datamodel::PipelineConfig;
///
/// let config = PipelineConfig::load("pipeline.yml").unwrap();
/// println!("projecting into {}", config.projection.database);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Configuration format version (e.g., `"1.0"`).
    #[serde(default)]
    pub version: String,
    /// Layout analysis settings.
    #[serde(default)]
    pub extraction: ExtractionSettings,
    /// Relational projection settings.
    #[serde(default)]
    pub projection: ProjectionSettings,
}

impl PipelineConfig {
    /// Loads configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](crate::DataModelError::IoError) if the file cannot
    /// be read, or [`YamlError`](crate::DataModelError::YamlError) if parsing
    /// fails.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let config = serde_yaml::from_reader(reader)?;
        Ok(config)
    }

    /// Saves the configuration as YAML.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](crate::DataModelError::IoError) if the file cannot
    /// be written, or [`YamlError`](crate::DataModelError::YamlError) if
    /// serialization fails.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = BufWriter::new(file);
        serde_yaml::to_writer(writer, self)?;
        Ok(())
    }
}
