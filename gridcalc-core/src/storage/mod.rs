//! Plot files of the macroscopic state.
//!
//! Every plot file holds one base node with one zone per partition.
//! Each zone stores the coordinates of its vertices and the cell-centred solution fields.
//! The file is serialized with one of the formats listed in [PlotFormat].
//!
//! | Format | Crate | Extension |
//! | --- | --- | --- |
//! | [PlotFormat::Json] | [serde_json] | `json` |
//! | [PlotFormat::Ron] | [ron] | `ron` |
//! | [PlotFormat::Xml] | [quick_xml] | `xml` |

mod plot_file;

pub use plot_file::*;

use serde::{Deserialize, Serialize};

/// Serialization format of plot files
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq, Serialize)]
pub enum PlotFormat {
    /// Save plot files as [json](https://www.json.org/json-en.html) file.
    #[default]
    Json,
    /// Save plot files as [ron](https://github.com/ron-rs/ron) file.
    Ron,
    /// Save plot files as [xml](https://www.xml.org/) file.
    Xml,
}

impl PlotFormat {
    /// File extension without the leading dot
    pub fn extension(&self) -> &'static str {
        match self {
            PlotFormat::Json => "json",
            PlotFormat::Ron => "ron",
            PlotFormat::Xml => "xml",
        }
    }
}

/// Where and how plot files are written.
///
/// ```
/// # use gridcalc_core::storage::PlotSettings;
/// let settings = PlotSettings::default();
/// assert_eq!(
///     settings.file_path(17),
///     std::path::PathBuf::from("plot/solution0017.json")
/// );
/// ```
#[derive(Clone, Debug, Deserialize, PartialEq, Eq, Serialize)]
pub struct PlotSettings {
    /// Directory which contains all plot files
    pub directory: std::path::PathBuf,
    /// Name of each file in front of the iteration number
    pub prefix: String,
    /// See [PlotFormat]
    pub format: PlotFormat,
}

impl Default for PlotSettings {
    fn default() -> Self {
        Self {
            directory: "plot".into(),
            prefix: "solution".to_owned(),
            format: PlotFormat::Json,
        }
    }
}

impl PlotSettings {
    /// Path of the plot file of the given iteration.
    ///
    /// The iteration is padded with zeros to at least four digits.
    pub fn file_path(&self, iteration: usize) -> std::path::PathBuf {
        self.directory.join(format!(
            "{}{:04}.{}",
            self.prefix,
            iteration,
            self.format.extension()
        ))
    }

    /// Creates the plot directory if it does not exist yet.
    pub fn create_directory(&self) -> Result<(), gridcalc_concepts::FileIoError> {
        if !self.directory.is_dir() {
            std::fs::create_dir_all(&self.directory).map_err(|e| {
                gridcalc_concepts::FileIoError(format!(
                    "Could not create plot directory {}: {}",
                    self.directory.display(),
                    e
                ))
            })?;
        }
        Ok(())
    }

    /// Creates a new writer for the configured format.
    pub fn writer<const D: usize>(&self) -> PlotFileWriter<D> {
        PlotFileWriter::new(self.format)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn file_names_are_padded() {
        let settings = PlotSettings {
            directory: "out".into(),
            prefix: "flow_".to_owned(),
            format: PlotFormat::Xml,
        };
        assert_eq!(
            settings.file_path(0),
            std::path::PathBuf::from("out/flow_0000.xml")
        );
        assert_eq!(
            settings.file_path(123456),
            std::path::PathBuf::from("out/flow_123456.xml")
        );
    }

    #[test]
    fn settings_from_ron() {
        let settings: PlotSettings =
            ron::from_str(r#"(directory: "results", prefix: "solution", format: Ron)"#).unwrap();
        assert_eq!(settings.format, PlotFormat::Ron);
        assert_eq!(
            settings.file_path(3),
            std::path::PathBuf::from("results/solution0003.ron")
        );
    }

    #[test]
    fn create_nested_directory() {
        let dir = tempfile::tempdir().unwrap();
        let settings = PlotSettings {
            directory: dir.path().join("a").join("b"),
            ..Default::default()
        };
        settings.create_directory().unwrap();
        assert!(settings.directory.is_dir());
        settings.create_directory().unwrap();
    }
}
