use gridcalc_concepts::{FileIoError, SolutionField, ZoneGeometry, ZoneWriter};
use serde::{Deserialize, Serialize};

use super::PlotFormat;

/// Content of one plot file
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct PlotFile {
    /// The single base node
    pub base: BaseNode,
}

/// Base node holding all zones of a plot file
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct BaseNode {
    /// Name of the base
    pub name: String,
    /// Dimension of the cells
    pub cell_dim: usize,
    /// Dimension of the physical space
    pub phys_dim: usize,
    /// Zones ordered as they were written
    #[serde(default)]
    pub zones: Vec<ZoneNode>,
}

/// Structured zone with vertex coordinates and cell-centred solution
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct ZoneNode {
    /// Name of the zone, eg. `"Zone1"`
    pub name: String,
    /// Zone number which is unique within the file
    pub number: usize,
    /// Global index of the lower corner cell
    #[serde(default)]
    pub lower_corner: Vec<i64>,
    /// Number of vertices along every axis
    #[serde(default)]
    pub n_vertices: Vec<usize>,
    /// Number of cells along every axis
    #[serde(default)]
    pub n_cells: Vec<usize>,
    /// One coordinate array per axis
    #[serde(default)]
    pub coordinates: Vec<CoordinateArray>,
    /// Location of the solution values
    pub location: String,
    /// Solution fields of this zone
    #[serde(default)]
    pub solution: Vec<SolutionField>,
}

/// Coordinates of all vertices of a zone along one axis
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct CoordinateArray {
    /// Name of the array, eg. `"CoordinateX"`
    pub name: String,
    /// One value per vertex
    #[serde(default)]
    pub values: Vec<f64>,
}

fn coordinate_name(axis: usize) -> String {
    match axis {
        0 => "CoordinateX".to_owned(),
        1 => "CoordinateY".to_owned(),
        2 => "CoordinateZ".to_owned(),
        n => format!("Coordinate{}", n),
    }
}

/// [ZoneWriter] which assembles a [PlotFile] in memory and serializes it on
/// [close](ZoneWriter::close).
///
/// ```
/// # use gridcalc_concepts::{IndexBox, SolutionField, ZoneGeometry, ZoneWriter};
/// # use gridcalc_core::storage::{read_plot_file, PlotFileWriter, PlotFormat};
/// let dir = tempfile::tempdir()?;
/// let path = dir.path().join("solution0000.json");
/// let geometry = ZoneGeometry {
///     cells: IndexBox::new([0, 0], [1, 2])?,
///     origin: [0.0, 0.0].into(),
///     dx: 0.5,
/// };
/// let mut writer = PlotFileWriter::<2>::new(PlotFormat::Json);
/// writer.open(&path)?;
/// writer.write_zone_grid(1, &geometry)?;
/// writer.write_solution(1, &[SolutionField {
///     name: "Density".to_owned(),
///     values: vec![1.0; 6],
/// }])?;
/// writer.close()?;
///
/// let plot_file = read_plot_file(&path, PlotFormat::Json)?;
/// assert_eq!(plot_file.base.zones[0].name, "Zone1");
/// assert_eq!(plot_file.base.zones[0].coordinates[1].values.len(), 12);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug)]
pub struct PlotFileWriter<const D: usize> {
    format: PlotFormat,
    file: Option<(std::path::PathBuf, std::fs::File)>,
    content: Option<PlotFile>,
}

impl<const D: usize> PlotFileWriter<D> {
    /// Constructs a new writer which has no open file.
    pub fn new(format: PlotFormat) -> Self {
        Self {
            format,
            file: None,
            content: None,
        }
    }

    /// See [PlotFormat]
    pub fn format(&self) -> PlotFormat {
        self.format
    }

    fn zone_mut(&mut self, zone: usize) -> Result<&mut ZoneNode, FileIoError> {
        let content = self
            .content
            .as_mut()
            .ok_or(FileIoError("No plot file is open".to_owned()))?;
        content
            .base
            .zones
            .iter_mut()
            .find(|z| z.number == zone)
            .ok_or(FileIoError(format!(
                "Zone {} has no grid. Write the grid before the solution.",
                zone
            )))
    }
}

impl<const D: usize> ZoneWriter<D> for PlotFileWriter<D> {
    fn open(&mut self, path: &std::path::Path) -> Result<(), FileIoError> {
        if let Some((open_path, _)) = &self.file {
            return Err(FileIoError(format!(
                "Cannot open {} while {} is still open",
                path.display(),
                open_path.display()
            )));
        }
        let file = std::fs::File::create(path).map_err(|e| {
            FileIoError(format!("Could not open plot file {}: {}", path.display(), e))
        })?;
        self.file = Some((path.to_path_buf(), file));
        self.content = Some(PlotFile {
            base: BaseNode {
                name: "Base".to_owned(),
                cell_dim: D,
                phys_dim: D,
                zones: Vec::new(),
            },
        });
        Ok(())
    }

    fn write_zone_grid(
        &mut self,
        zone: usize,
        geometry: &ZoneGeometry<D>,
    ) -> Result<(), FileIoError> {
        let content = self
            .content
            .as_mut()
            .ok_or(FileIoError("No plot file is open".to_owned()))?;
        if content.base.zones.iter().any(|z| z.number == zone) {
            return Err(FileIoError(format!("Zone {} was already written", zone)));
        }
        content.base.zones.push(ZoneNode {
            name: format!("Zone{}", zone),
            number: zone,
            lower_corner: geometry.cells.lo().to_vec(),
            n_vertices: geometry.n_vertices().to_vec(),
            n_cells: geometry.cells.dimensions().to_vec(),
            coordinates: (0..D)
                .map(|axis| CoordinateArray {
                    name: coordinate_name(axis),
                    values: geometry.vertex_coordinates(axis),
                })
                .collect(),
            location: "CellCenter".to_owned(),
            solution: Vec::new(),
        });
        Ok(())
    }

    fn write_solution(&mut self, zone: usize, fields: &[SolutionField]) -> Result<(), FileIoError> {
        let node = self.zone_mut(zone)?;
        let n_cells: usize = node.n_cells.iter().product();
        for field in fields.iter() {
            if field.values.len() != n_cells {
                return Err(FileIoError(format!(
                    "Field {} of zone {} has {} values but the zone has {} cells",
                    field.name,
                    zone,
                    field.values.len(),
                    n_cells
                )));
            }
        }
        node.solution.extend(fields.iter().cloned());
        Ok(())
    }

    fn close(&mut self) -> Result<(), FileIoError> {
        let (path, file) = self
            .file
            .take()
            .ok_or(FileIoError("No plot file is open".to_owned()))?;
        let content = self
            .content
            .take()
            .ok_or(FileIoError("No plot file is open".to_owned()))?;
        let with_path = |e: String| {
            FileIoError(format!("Could not write plot file {}: {}", path.display(), e))
        };
        let mut writer = std::io::BufWriter::new(file);
        write_content(self.format, &mut writer, &content).map_err(with_path)?;
        std::io::Write::flush(&mut writer).map_err(|e| with_path(e.to_string()))?;
        #[cfg(feature = "tracing")]
        tracing::debug!(path = %path.display(), "wrote plot file");
        Ok(())
    }
}

fn write_content<W: std::io::Write>(
    format: PlotFormat,
    writer: &mut W,
    content: &PlotFile,
) -> Result<(), String> {
    match format {
        PlotFormat::Json => {
            serde_json::to_writer_pretty(writer, content).map_err(|e| e.to_string())
        }
        PlotFormat::Ron => {
            let config = ron::ser::PrettyConfig::new()
                .depth_limit(usize::MAX)
                .struct_names(true)
                .separate_tuple_members(false)
                .compact_arrays(true)
                .indentor("  ".to_owned());
            ron::Options::default()
                .to_io_writer_pretty(writer, content, config)
                .map_err(|e| e.to_string())
        }
        PlotFormat::Xml => {
            let mut save_string = String::new();
            let mut serializer = quick_xml::se::Serializer::new(&mut save_string);
            serializer.indent(' ', 4);
            content.serialize(serializer).map_err(|e| e.to_string())?;
            writer
                .write_all(save_string.as_bytes())
                .map_err(|e| e.to_string())
        }
    }
}

/// Reads a plot file which was written by [PlotFileWriter].
pub fn read_plot_file(path: &std::path::Path, format: PlotFormat) -> Result<PlotFile, FileIoError> {
    let file = std::fs::File::open(path)?;
    let reader = std::io::BufReader::new(file);
    let with_path = |e: String| {
        FileIoError(format!("Could not read plot file {}: {}", path.display(), e))
    };
    match format {
        PlotFormat::Json => serde_json::from_reader(reader).map_err(|e| with_path(e.to_string())),
        PlotFormat::Ron => ron::de::from_reader(reader).map_err(|e| with_path(e.to_string())),
        PlotFormat::Xml => {
            quick_xml::de::from_reader(reader).map_err(|e| with_path(e.to_string()))
        }
    }
}
